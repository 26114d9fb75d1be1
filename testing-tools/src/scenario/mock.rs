//! In-memory stand-in for the fork, the position manager and the tokens. It
//! keeps just enough bookkeeping to exercise the harness and can be told to
//! misbehave.

use std::{collections::HashMap, sync::Arc};

use alloy::primitives::{Address, U256};
use eyre::{bail, eyre, OptionExt};
use parking_lot::Mutex;
use position_types::{
    balances::AmountPair,
    position::{
        CollectRequest, MintOutcome, MintRequest, PositionHandle, PositionInfo, WithdrawRequest
    }
};
use url::Url;

use super::collaborators::{Authority, ChainState, PositionManager, TokenLedger};

#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    /// decreaseLiquidity pays out straight away instead of crediting the
    /// position.
    pub auto_collect_on_decrease: bool,
    pub reject_approve:           bool,
    pub zero_token_id:            bool,
    /// collect reports one unit more of token0 than it transfers.
    pub overstate_collect:        bool,
    pub panic_on_collect:         bool,
    /// collect leaves one unit of token0 owed, so the burn is refused.
    pub residual_on_collect:      bool,
    pub reject_release:           bool
}

#[derive(Debug, Clone)]
struct MockPosition {
    owner:     Address,
    token0:    Address,
    token1:    Address,
    liquidity: u128,
    principal: AmountPair,
    owed:      AmountPair
}

#[derive(Debug, Default)]
struct MockState {
    height:        u64,
    balances:      HashMap<(Address, Address), U256>,
    allowances:    HashMap<(Address, Address, Address), U256>,
    impersonating: Option<Address>,
    positions:     HashMap<U256, MockPosition>,
    next_token_id: u64,
    calls:         Vec<&'static str>
}

impl MockState {
    fn balance(&self, token: Address, holder: Address) -> U256 {
        self.balances
            .get(&(token, holder))
            .copied()
            .unwrap_or_default()
    }

    fn transfer_in(&mut self, token: Address, from: Address, amount: U256) -> eyre::Result<()> {
        let balance = self.balance(token, from);
        let remaining = balance
            .checked_sub(amount)
            .ok_or_eyre("STF: insufficient balance")?;
        self.balances.insert((token, from), remaining);
        Ok(())
    }

    fn transfer_out(&mut self, token: Address, to: Address, amount: U256) {
        *self.balances.entry((token, to)).or_default() += amount;
    }

    fn check_authority(&self, authority: &Authority) -> eyre::Result<()> {
        if self.impersonating != Some(authority.actor()) {
            bail!("{} is not being impersonated", authority.actor())
        }
        Ok(())
    }

    /// Sends a transaction as `authority`. Like an automining fork, every
    /// transaction that is accepted for inclusion mines a block, reverted or
    /// not.
    fn send(&mut self, authority: &Authority) -> eyre::Result<()> {
        self.check_authority(authority)?;
        self.height += 1;
        Ok(())
    }

    fn owned_position(
        &mut self,
        token_id: U256,
        owner: Address
    ) -> eyre::Result<&mut MockPosition> {
        let position = self
            .positions
            .get_mut(&token_id)
            .ok_or_eyre("Invalid token ID")?;
        if position.owner != owner {
            bail!("Not approved")
        }
        Ok(position)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockChain {
    state:          Arc<Mutex<MockState>>,
    faults:         Faults,
    /// Added to every open position's owed tokens for each block advanced.
    fees_per_block: AmountPair
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_faults(faults: Faults) -> Self {
        Self { faults, ..Self::default() }
    }

    pub fn with_fees_per_block(mut self, fees: AmountPair) -> Self {
        self.fees_per_block = fees;
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().calls.clone()
    }

    pub fn impersonating(&self) -> Option<Address> {
        self.state.lock().impersonating
    }

    pub fn open_positions(&self) -> usize {
        self.state.lock().positions.len()
    }

    fn record(&self, call: &'static str) -> parking_lot::MutexGuard<'_, MockState> {
        let mut state = self.state.lock();
        state.calls.push(call);
        state
    }
}

impl ChainState for MockChain {
    async fn fork_at(&self, _source: &Url, height: u64) -> eyre::Result<()> {
        let mut state = self.record("fork_at");
        let calls = std::mem::take(&mut state.calls);
        *state = MockState { height, calls, ..MockState::default() };
        Ok(())
    }

    async fn height(&self) -> eyre::Result<u64> {
        Ok(self.state.lock().height)
    }

    async fn advance_to(&self, height: u64) -> eyre::Result<()> {
        let mut state = self.record("advance_to");
        if height < state.height {
            bail!("cannot move back from {} to {height}", state.height)
        }
        let blocks = U256::from(height - state.height);
        for position in state.positions.values_mut().filter(|p| p.liquidity > 0) {
            position.owed.amount0 += self.fees_per_block.amount0 * blocks;
            position.owed.amount1 += self.fees_per_block.amount1 * blocks;
        }
        state.height = height;
        Ok(())
    }

    async fn set_balance(&self, token: Address, actor: Address, amount: U256) -> eyre::Result<()> {
        self.record("set_balance")
            .balances
            .insert((token, actor), amount);
        Ok(())
    }

    async fn fund_native(&self, _actor: Address, _amount: U256) -> eyre::Result<()> {
        self.record("fund_native");
        Ok(())
    }

    async fn assume_authority(&self, actor: Address) -> eyre::Result<Authority> {
        let mut state = self.record("assume_authority");
        if let Some(current) = state.impersonating {
            bail!("already impersonating {current}")
        }
        state.impersonating = Some(actor);
        Ok(Authority::new(actor))
    }

    async fn release_authority(&self, authority: Authority) -> eyre::Result<()> {
        let mut state = self.record("release_authority");
        state.check_authority(&authority)?;
        state.impersonating = None;
        if self.faults.reject_release {
            bail!("stop impersonating failed")
        }
        Ok(())
    }
}

impl TokenLedger for MockChain {
    async fn balance_of(&self, token: Address, holder: Address) -> eyre::Result<U256> {
        Ok(self.state.lock().balance(token, holder))
    }

    async fn approve(
        &self,
        authority: &Authority,
        token: Address,
        spender: Address,
        amount: U256
    ) -> eyre::Result<()> {
        let mut state = self.record("approve");
        state.send(authority)?;
        if self.faults.reject_approve {
            bail!("approve reverted")
        }
        state
            .allowances
            .insert((token, authority.actor(), spender), amount);
        Ok(())
    }
}

impl PositionManager for MockChain {
    async fn mint(&self, authority: &Authority, request: MintRequest) -> eyre::Result<MintOutcome> {
        let mut state = self.record("mint");
        state.send(authority)?;
        if request.deadline < U256::from(state.height) {
            bail!("Transaction too old")
        }

        // only half of token1 is taken so used differs from desired
        let used =
            AmountPair::new(request.desired.amount0, request.desired.amount1 / U256::from(2));
        let minimum = request.minimum;
        if used.amount0 < minimum.amount0 || used.amount1 < minimum.amount1 {
            bail!("Price slippage check")
        }

        let actor = authority.actor();
        let pair = request.pair;
        for (token, amount) in [(pair.token0, used.amount0), (pair.token1, used.amount1)] {
            // the spender is whoever was approved, the mock does not know its
            // own address
            let allowed = state.allowances.iter().any(|((t, owner, _), allowance)| {
                *t == token && *owner == actor && *allowance >= amount
            });
            if !allowed {
                bail!("STF: insufficient allowance")
            }
            state.transfer_in(token, actor, amount)?;
        }

        let liquidity: u128 = (used.amount0 + used.amount1).saturating_to();
        let token_id = if self.faults.zero_token_id {
            U256::ZERO
        } else {
            state.next_token_id += 1;
            U256::from(state.next_token_id)
        };
        state.positions.insert(
            token_id,
            MockPosition {
                owner: request.recipient,
                token0: pair.token0,
                token1: pair.token1,
                liquidity,
                principal: used,
                owed: AmountPair::default()
            }
        );

        Ok(MintOutcome { handle: PositionHandle { token_id, liquidity }, used })
    }

    async fn positions(&self, token_id: U256) -> eyre::Result<PositionInfo> {
        let state = self.record("positions");
        let position = state
            .positions
            .get(&token_id)
            .ok_or_eyre("Invalid token ID")?;
        Ok(PositionInfo { liquidity: position.liquidity, tokens_owed: position.owed })
    }

    async fn decrease_liquidity(
        &self,
        authority: &Authority,
        request: WithdrawRequest
    ) -> eyre::Result<AmountPair> {
        let mut state = self.record("decreaseLiquidity");
        state.send(authority)?;
        if request.deadline < U256::from(state.height) {
            bail!("Transaction too old")
        }

        let position = state.owned_position(request.handle.token_id, authority.actor())?;
        let liquidity = request.liquidity();
        if liquidity == 0 || liquidity > position.liquidity {
            bail!("invalid liquidity {liquidity}")
        }

        let total = U256::from(position.liquidity);
        let share = |amount: U256| amount * U256::from(liquidity) / total;
        let principal = position.principal;
        let unlocked = AmountPair::new(share(principal.amount0), share(principal.amount1));
        let minimum = request.minimum;
        if unlocked.amount0 < minimum.amount0 || unlocked.amount1 < minimum.amount1 {
            bail!("Price slippage check")
        }

        position.principal.amount0 -= unlocked.amount0;
        position.principal.amount1 -= unlocked.amount1;
        position.liquidity -= liquidity;
        position.owed.amount0 += unlocked.amount0;
        position.owed.amount1 += unlocked.amount1;

        if self.faults.auto_collect_on_decrease {
            let (owner, token0, token1, owed) =
                (position.owner, position.token0, position.token1, position.owed);
            position.owed = AmountPair::default();
            state.transfer_out(token0, owner, owed.amount0);
            state.transfer_out(token1, owner, owed.amount1);
        }

        Ok(unlocked)
    }

    async fn collect(
        &self,
        authority: &Authority,
        request: CollectRequest
    ) -> eyre::Result<AmountPair> {
        if self.faults.panic_on_collect {
            panic!("collect blew up");
        }

        let mut state = self.record("collect");
        state.send(authority)?;

        let position = state.owned_position(request.token_id, authority.actor())?;
        let mut collected = AmountPair::new(
            position.owed.amount0.min(U256::from(request.amount0_max)),
            position.owed.amount1.min(U256::from(request.amount1_max))
        );
        if self.faults.residual_on_collect {
            collected.amount0 = collected.amount0.saturating_sub(U256::from(1));
        }
        position.owed.amount0 -= collected.amount0;
        position.owed.amount1 -= collected.amount1;
        let (token0, token1) = (position.token0, position.token1);

        state.transfer_out(token0, request.recipient, collected.amount0);
        state.transfer_out(token1, request.recipient, collected.amount1);

        if self.faults.overstate_collect {
            return Ok(AmountPair::new(collected.amount0 + U256::from(1), collected.amount1))
        }
        Ok(collected)
    }

    async fn burn(&self, authority: &Authority, token_id: U256) -> eyre::Result<()> {
        let mut state = self.record("burn");
        state.send(authority)?;

        let position = state.owned_position(token_id, authority.actor())?;
        if position.liquidity != 0 || !position.owed.is_zero() {
            return Err(eyre!("Not cleared"))
        }
        state.positions.remove(&token_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;
    use position_types::position::{FeeTier, TickRange, TokenPair};

    use super::*;

    const ACTOR: Address = address!("00000000000000000000000000000000000a11ce");
    const TOKEN0: Address = address!("0000000000000000000000000000000000000010");
    const TOKEN1: Address = address!("0000000000000000000000000000000000000020");

    async fn minted(chain: &MockChain) -> (Authority, PositionHandle) {
        chain.fork_at(&Url::parse("http://localhost").unwrap(), 1).await.unwrap();
        chain.set_balance(TOKEN0, ACTOR, U256::from(1_000)).await.unwrap();
        chain.set_balance(TOKEN1, ACTOR, U256::from(1_000)).await.unwrap();
        let authority = chain.assume_authority(ACTOR).await.unwrap();
        chain.approve(&authority, TOKEN0, Address::ZERO, U256::MAX).await.unwrap();
        chain.approve(&authority, TOKEN1, Address::ZERO, U256::MAX).await.unwrap();
        let request = MintRequest {
            pair:      TokenPair::new(TOKEN0, TOKEN1),
            fee_tier:  FeeTier::Medium,
            ticks:     TickRange::full_range(FeeTier::Medium),
            desired:   AmountPair::new(U256::from(100), U256::from(100)),
            minimum:   AmountPair::default(),
            recipient: ACTOR,
            deadline:  U256::MAX
        };
        let outcome = chain.mint(&authority, request).await.unwrap();
        (authority, outcome.handle)
    }

    #[tokio::test]
    async fn burn_is_refused_until_position_is_cleared() {
        let chain = MockChain::new();
        let (authority, handle) = minted(&chain).await;

        assert!(chain.burn(&authority, handle.token_id).await.is_err());

        chain
            .decrease_liquidity(&authority, WithdrawRequest::full(handle, U256::MAX))
            .await
            .unwrap();
        assert!(chain.burn(&authority, handle.token_id).await.is_err());

        chain
            .collect(&authority, CollectRequest::everything(handle.token_id, ACTOR))
            .await
            .unwrap();
        chain.burn(&authority, handle.token_id).await.unwrap();
        assert_eq!(chain.open_positions(), 0);
    }

    #[tokio::test]
    async fn every_transaction_mines_a_block() {
        let chain = MockChain::new();
        let (authority, handle) = minted(&chain).await;
        // two approves and the mint
        assert_eq!(chain.height().await.unwrap(), 4);

        chain
            .decrease_liquidity(&authority, WithdrawRequest::full(handle, U256::MAX))
            .await
            .unwrap();
        assert!(chain.burn(&authority, handle.token_id).await.is_err());
        assert_eq!(chain.height().await.unwrap(), 6);
    }

    #[tokio::test]
    async fn mutations_need_the_matching_authority() {
        let chain = MockChain::new();
        let (authority, handle) = minted(&chain).await;
        chain.release_authority(authority).await.unwrap();

        let stale = Authority::new(ACTOR);
        assert!(chain
            .decrease_liquidity(&stale, WithdrawRequest::full(handle, U256::MAX))
            .await
            .is_err());
    }
}
