use alloy::{
    contract::CallBuilder,
    primitives::Address,
    rpc::types::TransactionReceipt,
    sol_types::SolEvent
};
use eyre::eyre;

pub mod anvil;
pub mod erc20;
pub mod position_manager;

pub use anvil::AnvilFork;
pub use erc20::Erc20Client;
pub use position_manager::PositionManagerClient;

/// Gas limit for every transaction sent against the fork. Anvil fills in the
/// rest of the fee fields for impersonated senders.
const TX_GAS_LIMIT: u128 = 30_000_000;

/// This trait is used to provide safe run and potentially debug capabilities
/// for our contract calls against the fork.
pub trait DebugTransaction {
    #[allow(async_fn_in_trait)] // OK because this is not for public consumption
    async fn run_safe(self) -> eyre::Result<TransactionReceipt>;
}

impl<T, P, D> DebugTransaction for CallBuilder<T, P, D>
where
    T: Clone + Send + Sync + alloy::transports::Transport,
    P: alloy::providers::Provider<T>,
    D: alloy::contract::CallDecoder
{
    async fn run_safe(self) -> eyre::Result<TransactionReceipt> {
        let receipt = self
            .gas(TX_GAS_LIMIT)
            .send()
            .await?
            .get_receipt()
            .await?;
        if receipt.inner.status() {
            Ok(receipt)
        } else {
            Err(eyre!("Transaction with hash {} failed", receipt.transaction_hash))
        }
    }
}

/// Finds the first `E` emitted by `emitter` in the receipt.
pub fn decode_event<E: SolEvent>(
    receipt: &TransactionReceipt,
    emitter: Address
) -> eyre::Result<E> {
    receipt
        .inner
        .logs()
        .iter()
        .filter(|log| log.address() == emitter)
        .find_map(|log| E::decode_log_data(log.data(), true).ok())
        .ok_or_else(|| {
            eyre!(
                "no {} event from {} in transaction {}",
                E::SIGNATURE,
                emitter,
                receipt.transaction_hash
            )
        })
}
