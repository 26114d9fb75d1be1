use alloy::primitives::{Address, U256};
use position_types::{
    balances::AmountPair,
    contract_bindings::nonfungible_position_manager::INonfungiblePositionManager::{
        self, Collect, DecreaseLiquidity, IncreaseLiquidity
    },
    position::{
        CollectRequest, MintOutcome, MintRequest, PositionHandle, PositionInfo, WithdrawRequest
    }
};

use super::{anvil::HttpProvider, decode_event, DebugTransaction};
use crate::scenario::collaborators::{Authority, PositionManager};

/// Client for the deployed `NonfungiblePositionManager`. Results of mutating
/// calls are read from the events in their receipts.
#[derive(Clone)]
pub struct PositionManagerClient {
    address:  Address,
    provider: HttpProvider
}

impl PositionManagerClient {
    pub fn new(address: Address, provider: HttpProvider) -> Self {
        Self { address, provider }
    }
}

impl PositionManager for PositionManagerClient {
    async fn mint(&self, authority: &Authority, request: MintRequest) -> eyre::Result<MintOutcome> {
        let receipt = INonfungiblePositionManager::new(self.address, &self.provider)
            .mint(request.to_params()?)
            .from(authority.actor())
            .run_safe()
            .await?;
        let minted: IncreaseLiquidity = decode_event(&receipt, self.address)?;

        Ok(MintOutcome {
            handle: PositionHandle { token_id: minted.tokenId, liquidity: minted.liquidity },
            used:   AmountPair::new(minted.amount0, minted.amount1)
        })
    }

    async fn positions(&self, token_id: U256) -> eyre::Result<PositionInfo> {
        let position = INonfungiblePositionManager::new(self.address, &self.provider)
            .positions(token_id)
            .call()
            .await?;

        Ok(PositionInfo {
            liquidity:   position.liquidity,
            tokens_owed: AmountPair::from_u128(position.tokensOwed0, position.tokensOwed1)
        })
    }

    async fn decrease_liquidity(
        &self,
        authority: &Authority,
        request: WithdrawRequest
    ) -> eyre::Result<AmountPair> {
        let receipt = INonfungiblePositionManager::new(self.address, &self.provider)
            .decreaseLiquidity(request.to_params())
            .from(authority.actor())
            .run_safe()
            .await?;
        let decreased: DecreaseLiquidity = decode_event(&receipt, self.address)?;

        Ok(AmountPair::new(decreased.amount0, decreased.amount1))
    }

    async fn collect(
        &self,
        authority: &Authority,
        request: CollectRequest
    ) -> eyre::Result<AmountPair> {
        let receipt = INonfungiblePositionManager::new(self.address, &self.provider)
            .collect(request.to_params())
            .from(authority.actor())
            .run_safe()
            .await?;
        let collected: Collect = decode_event(&receipt, self.address)?;

        Ok(AmountPair::new(collected.amount0, collected.amount1))
    }

    async fn burn(&self, authority: &Authority, token_id: U256) -> eyre::Result<()> {
        INonfungiblePositionManager::new(self.address, &self.provider)
            .burn(token_id)
            .from(authority.actor())
            .run_safe()
            .await?;
        Ok(())
    }
}
