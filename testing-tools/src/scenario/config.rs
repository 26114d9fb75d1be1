use alloy::primitives::{Address, U256};
use position_types::{
    balances::AmountPair,
    constants::{
        DAI, DAI_DESIRED, DAI_ENDOWMENT, FEE_TIER, FORK_END_BLOCK, FORK_START_BLOCK,
        GAS_ENDOWMENT, NONFUNGIBLE_POSITION_MANAGER, RPC_URL_ENV, TEST_ACTOR, WETH,
        WETH_DESIRED, WETH_ENDOWMENT
    },
    position::{FeeTier, MintRequest, TickRange, TokenPair}
};
use url::Url;

use super::error::ConfigError;

/// Blocks mined while provisioning: one per approve plus one for the mint.
/// The fork automines every transaction.
pub const PROVISION_BLOCKS: u64 = 3;

/// Reads the fork source endpoint from `MAINNET_RPC_URL`.
pub fn rpc_url_from_env() -> Result<Url, ConfigError> {
    parse_rpc_url(std::env::var(RPC_URL_ENV).ok().as_deref())
}

fn parse_rpc_url(value: Option<&str>) -> Result<Url, ConfigError> {
    let value = value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingRpcUrl(RPC_URL_ENV))?;

    Url::parse(value).map_err(|source| ConfigError::InvalidRpcUrl { var: RPC_URL_ENV, source })
}

/// Inputs to one scenario run. Amounts are ordered like `pair`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioConfig {
    pub rpc_url:          Url,
    pub start_block:      u64,
    pub end_block:        u64,
    pub position_manager: Address,
    pub pair:             TokenPair,
    pub fee_tier:         FeeTier,
    pub ticks:            TickRange,
    pub endowment:        AmountPair,
    pub desired:          AmountPair,
    pub minimum:          AmountPair,
    pub gas_endowment:    U256,
    pub actor:            Address,
    pub deadline:         U256
}

impl ScenarioConfig {
    /// Full range DAI/WETH liquidity in the 0.3% pool.
    pub fn mainnet(rpc_url: Url) -> Self {
        let (pair, endowment) = TokenPair::with_amounts(DAI, DAI_ENDOWMENT, WETH, WETH_ENDOWMENT);
        let (_, desired) = TokenPair::with_amounts(DAI, DAI_DESIRED, WETH, WETH_DESIRED);

        Self {
            rpc_url,
            start_block: FORK_START_BLOCK,
            end_block: FORK_END_BLOCK,
            position_manager: NONFUNGIBLE_POSITION_MANAGER,
            pair,
            fee_tier: FEE_TIER,
            ticks: TickRange::full_range(FEE_TIER),
            endowment,
            desired,
            minimum: AmountPair::default(),
            gas_endowment: GAS_ENDOWMENT,
            actor: TEST_ACTOR,
            deadline: U256::MAX
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::mainnet(rpc_url_from_env()?))
    }

    pub fn with_fork_window(mut self, start_block: u64, end_block: u64) -> Self {
        self.start_block = start_block;
        self.end_block = end_block;
        self
    }

    pub fn with_actor(mut self, actor: Address) -> Self {
        self.actor = actor;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.end_block <= self.start_block {
            return Err(ConfigError::EmptyForkWindow {
                start: self.start_block,
                end:   self.end_block
            })
        }
        let reached = self.start_block.saturating_add(PROVISION_BLOCKS);
        if self.end_block <= reached {
            return Err(ConfigError::ForkWindowTooShort { end: self.end_block, reached })
        }
        Ok(())
    }

    pub fn mint_request(&self) -> MintRequest {
        MintRequest {
            pair:      self.pair,
            fee_tier:  self.fee_tier,
            ticks:     self.ticks,
            desired:   self.desired,
            minimum:   self.minimum,
            recipient: self.actor,
            deadline:  self.deadline
        }
    }
}
