//! The position lifecycle scenario: fork, mint, advance, withdraw, collect,
//! burn, verify.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod harness;
pub mod report;

#[cfg(test)]
mod mock;

pub use config::ScenarioConfig;
pub use error::{AssertionFailure, ConfigError, ScenarioError, ScenarioFailure};
pub use harness::ScenarioHarness;
pub use report::{Phase, ScenarioReport};

use crate::contracts::AnvilFork;

/// Forks the configured network with anvil and runs the scenario against the
/// deployed position manager. Every call spawns a fresh fork.
pub async fn run_scenario(config: ScenarioConfig) -> Result<ScenarioReport, ScenarioFailure> {
    if let Err(error) = config.validate() {
        return Err(ScenarioFailure::new(Phase::Configure, error, ScenarioReport::default()))
    }

    let fork = AnvilFork::spawn(&config.rpc_url, config.start_block).map_err(|error| {
        ScenarioFailure::new(
            Phase::Initialize,
            ScenarioError::rejected("fork_at")(error),
            ScenarioReport::default()
        )
    })?;
    let manager = fork.position_manager(config.position_manager);
    let ledger = fork.erc20();

    ScenarioHarness::new(fork, manager, ledger, config).run().await
}
