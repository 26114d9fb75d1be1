use alloy::primitives::{Address, U256};
use position_types::contract_bindings::erc20::IERC20;

use super::{anvil::HttpProvider, DebugTransaction};
use crate::scenario::collaborators::{Authority, TokenLedger};

#[derive(Clone)]
pub struct Erc20Client {
    provider: HttpProvider
}

impl Erc20Client {
    pub fn new(provider: HttpProvider) -> Self {
        Self { provider }
    }
}

impl TokenLedger for Erc20Client {
    async fn balance_of(&self, token: Address, holder: Address) -> eyre::Result<U256> {
        Ok(IERC20::new(token, &self.provider)
            .balanceOf(holder)
            .call()
            .await?
            .balance)
    }

    async fn approve(
        &self,
        authority: &Authority,
        token: Address,
        spender: Address,
        amount: U256
    ) -> eyre::Result<()> {
        IERC20::new(token, &self.provider)
            .approve(spender, amount)
            .from(authority.actor())
            .run_safe()
            .await?;
        Ok(())
    }
}
