//! The external pieces a scenario drives. None of them are implemented here
//! beyond thin clients: the position manager's accounting, the token
//! contracts and the fork itself all belong to someone else.

use alloy::primitives::{Address, U256};
use position_types::{
    balances::AmountPair,
    position::{CollectRequest, MintOutcome, MintRequest, PositionInfo, WithdrawRequest}
};
use url::Url;

/// Capability to issue transactions as `actor`. Mutating collaborator calls
/// take one by reference, so they can only happen while it is held. It is
/// handed back through [`ChainState::release_authority`].
#[derive(Debug, PartialEq, Eq)]
pub struct Authority {
    actor: Address
}

impl Authority {
    /// Only [`ChainState`] implementations should create one, after the chain
    /// actually accepts transactions from `actor`.
    pub fn new(actor: Address) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> Address {
        self.actor
    }
}

/// Test-only control over a forked chain. None of this exists on a live
/// network.
pub trait ChainState {
    /// Throws away all local state and forks `source` at `height`.
    #[allow(async_fn_in_trait)]
    async fn fork_at(&self, source: &Url, height: u64) -> eyre::Result<()>;

    #[allow(async_fn_in_trait)]
    async fn height(&self) -> eyre::Result<u64>;

    /// Moves the chain forward to `height` without executing transactions.
    #[allow(async_fn_in_trait)]
    async fn advance_to(&self, height: u64) -> eyre::Result<()>;

    /// Overwrites `actor`'s balance of `token`.
    #[allow(async_fn_in_trait)]
    async fn set_balance(&self, token: Address, actor: Address, amount: U256) -> eyre::Result<()>;

    /// Overwrites `actor`'s native balance so it can pay for gas.
    #[allow(async_fn_in_trait)]
    async fn fund_native(&self, actor: Address, amount: U256) -> eyre::Result<()>;

    #[allow(async_fn_in_trait)]
    async fn assume_authority(&self, actor: Address) -> eyre::Result<Authority>;

    #[allow(async_fn_in_trait)]
    async fn release_authority(&self, authority: Authority) -> eyre::Result<()>;
}

/// Operations of the deployed `NonfungiblePositionManager` the scenario uses.
pub trait PositionManager {
    #[allow(async_fn_in_trait)]
    async fn mint(&self, authority: &Authority, request: MintRequest) -> eyre::Result<MintOutcome>;

    #[allow(async_fn_in_trait)]
    async fn positions(&self, token_id: U256) -> eyre::Result<PositionInfo>;

    /// Returns the amounts unlocked. They stay in the position until collected.
    #[allow(async_fn_in_trait)]
    async fn decrease_liquidity(
        &self,
        authority: &Authority,
        request: WithdrawRequest
    ) -> eyre::Result<AmountPair>;

    #[allow(async_fn_in_trait)]
    async fn collect(
        &self,
        authority: &Authority,
        request: CollectRequest
    ) -> eyre::Result<AmountPair>;

    #[allow(async_fn_in_trait)]
    async fn burn(&self, authority: &Authority, token_id: U256) -> eyre::Result<()>;
}

pub trait TokenLedger {
    #[allow(async_fn_in_trait)]
    async fn balance_of(&self, token: Address, holder: Address) -> eyre::Result<U256>;

    #[allow(async_fn_in_trait)]
    async fn approve(
        &self,
        authority: &Authority,
        token: Address,
        spender: Address,
        amount: U256
    ) -> eyre::Result<()>;
}
