//! Runs the position lifecycle scenario once against a fresh mainnet fork and
//! prints what it observed.

use alloy::primitives::Address;
use clap::Parser;
use position_types::constants::{FORK_END_BLOCK, FORK_START_BLOCK, TEST_ACTOR};
use testing_tools::{init_tracing, run_scenario, ScenarioConfig};
use tracing::error;
use url::Url;

#[derive(Debug, Parser)]
#[command(about = "Mint, age, withdraw and burn a Uniswap V3 position on a mainnet fork")]
struct Args {
    /// Archive node the fork is sourced from.
    #[arg(long, env = "MAINNET_RPC_URL")]
    rpc_url:     Url,
    #[arg(long, default_value_t = FORK_START_BLOCK)]
    start_block: u64,
    #[arg(long, default_value_t = FORK_END_BLOCK)]
    end_block:   u64,
    /// Account that is funded and impersonated.
    #[arg(long, default_value_t = TEST_ACTOR)]
    actor:       Address
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = ScenarioConfig::mainnet(args.rpc_url)
        .with_fork_window(args.start_block, args.end_block)
        .with_actor(args.actor);

    match run_scenario(config).await {
        Ok(report) => {
            println!("{report}");
            Ok(())
        }
        Err(failure) => {
            error!(phase = %failure.phase, error = %failure.error, "scenario failed");
            println!("{}", failure.report);
            Err(failure.into())
        }
    }
}
