use std::panic::{resume_unwind, AssertUnwindSafe};

use alloy::primitives::U256;
use futures::FutureExt;
use position_types::{
    balances::{BalanceDelta, BalanceSnapshot},
    position::{CollectRequest, PositionHandle, WithdrawRequest}
};
use tracing::{info, info_span, warn, Instrument};

use super::{
    collaborators::{Authority, ChainState, PositionManager, TokenLedger},
    config::ScenarioConfig,
    error::{AssertionFailure, ConfigError, ScenarioError, ScenarioFailure},
    report::{Phase, ScenarioReport}
};

/// Chain forked and the actor endowed.
#[derive(Debug)]
pub struct Initialized {
    initial: BalanceSnapshot
}

/// Position minted and still holding its liquidity.
#[derive(Debug)]
pub struct Provisioned {
    initial:  BalanceSnapshot,
    position: PositionHandle
}

#[derive(Debug)]
pub struct TimeAdvanced {
    initial:  BalanceSnapshot,
    position: PositionHandle
}

/// Liquidity withdrawn, proceeds collected and the position burned.
#[derive(Debug)]
pub struct Withdrawn {
    initial: BalanceSnapshot
}

fn failed_at(
    phase: Phase,
    report: &ScenarioReport
) -> impl FnOnce(ScenarioError) -> ScenarioFailure + '_ {
    move |error| ScenarioFailure::new(phase, error, report.clone())
}

/// Drives the mint, advance, withdraw, collect, burn sequence against a
/// forked chain. Each phase consumes the state produced by the one before it.
pub struct ScenarioHarness<C, M, L> {
    chain:   C,
    manager: M,
    ledger:  L,
    config:  ScenarioConfig
}

impl<C, M, L> ScenarioHarness<C, M, L>
where
    C: ChainState,
    M: PositionManager,
    L: TokenLedger
{
    pub fn new(chain: C, manager: M, ledger: L, config: ScenarioConfig) -> Self {
        Self { chain, manager, ledger, config }
    }

    /// Runs every phase once. Stops at the first failure and never retries.
    pub async fn run(&self) -> Result<ScenarioReport, ScenarioFailure> {
        let span = info_span!(
            "scenario",
            actor = %self.config.actor,
            start_block = self.config.start_block,
            end_block = self.config.end_block
        );
        self.run_phases().instrument(span).await
    }

    async fn run_phases(&self) -> Result<ScenarioReport, ScenarioFailure> {
        let mut report = ScenarioReport::default();

        if let Err(error) = self.config.validate() {
            return Err(ScenarioFailure::new(Phase::Configure, error, report))
        }
        report.completed = Some(Phase::Configure);

        let outcome = self
            .initialize(&mut report)
            .instrument(info_span!("initialize"))
            .await;
        let initialized = outcome.map_err(failed_at(Phase::Initialize, &report))?;
        report.completed = Some(Phase::Initialize);

        let outcome = self
            .provision(initialized, &mut report)
            .instrument(info_span!("provision"))
            .await;
        let provisioned = outcome.map_err(failed_at(Phase::Provision, &report))?;
        report.completed = Some(Phase::Provision);

        let outcome = self
            .advance_time(provisioned, &mut report)
            .instrument(info_span!("advance_time"))
            .await;
        let advanced = outcome.map_err(failed_at(Phase::AdvanceTime, &report))?;
        report.completed = Some(Phase::AdvanceTime);

        let outcome = self
            .withdraw_and_collect(advanced, &mut report)
            .instrument(info_span!("withdraw_and_collect"))
            .await;
        let withdrawn = outcome.map_err(failed_at(Phase::WithdrawAndCollect, &report))?;
        report.completed = Some(Phase::WithdrawAndCollect);

        let outcome = self
            .verify(withdrawn, &mut report)
            .instrument(info_span!("verify"))
            .await;
        outcome.map_err(failed_at(Phase::Verify, &report))?;
        report.completed = Some(Phase::Verify);

        Ok(report)
    }

    pub async fn initialize(
        &self,
        report: &mut ScenarioReport
    ) -> Result<Initialized, ScenarioError> {
        let config = &self.config;

        self.chain
            .fork_at(&config.rpc_url, config.start_block)
            .await
            .map_err(ScenarioError::rejected("fork_at"))?;
        self.expect_height(config.start_block).await?;

        self.chain
            .fund_native(config.actor, config.gas_endowment)
            .await
            .map_err(ScenarioError::rejected("fund_native"))?;
        self.chain
            .set_balance(config.pair.token0, config.actor, config.endowment.amount0)
            .await
            .map_err(ScenarioError::rejected("set_balance"))?;
        self.chain
            .set_balance(config.pair.token1, config.actor, config.endowment.amount1)
            .await
            .map_err(ScenarioError::rejected("set_balance"))?;

        let initial = self.snapshot().await?;
        report.initial = Some(initial);
        info!(%initial, "endowed actor");

        Ok(Initialized { initial })
    }

    pub async fn provision(
        &self,
        state: Initialized,
        report: &mut ScenarioReport
    ) -> Result<Provisioned, ScenarioError> {
        let authority = self.assume_authority().await?;
        let outcome = AssertUnwindSafe(self.provision_as(&authority, state, report))
            .catch_unwind()
            .await;
        self.release(authority, outcome).await
    }

    async fn provision_as(
        &self,
        authority: &Authority,
        state: Initialized,
        report: &mut ScenarioReport
    ) -> Result<Provisioned, ScenarioError> {
        let config = &self.config;

        for token in [config.pair.token0, config.pair.token1] {
            self.ledger
                .approve(authority, token, config.position_manager, U256::MAX)
                .await
                .map_err(ScenarioError::rejected("approve"))?;
        }

        let minted = self
            .manager
            .mint(authority, config.mint_request())
            .await
            .map_err(ScenarioError::rejected("mint"))?;
        report.position = Some(minted.handle);
        report.used = Some(minted.used);
        info!(
            token_id = %minted.handle.token_id,
            liquidity = minted.handle.liquidity,
            used = %minted.used,
            "minted position"
        );

        if !minted.handle.is_valid() {
            return Err(AssertionFailure::InvalidHandle(minted.handle).into())
        }

        let after_mint = self.snapshot().await?;
        report.after_mint = Some(after_mint);
        info!(%after_mint, "balances after mint");

        Ok(Provisioned { initial: state.initial, position: minted.handle })
    }

    pub async fn advance_time(
        &self,
        state: Provisioned,
        report: &mut ScenarioReport
    ) -> Result<TimeAdvanced, ScenarioError> {
        let end = self.config.end_block;
        let reached = self
            .chain
            .height()
            .await
            .map_err(ScenarioError::rejected("height"))?;
        if end <= reached {
            return Err(ConfigError::ForkWindowTooShort { end, reached }.into())
        }
        info!(from = reached, to = end, "advancing chain");

        self.chain
            .advance_to(end)
            .await
            .map_err(ScenarioError::rejected("advance_to"))?;
        self.expect_height(end).await?;

        // Fees are only reported. Nothing swaps on the fork so they are
        // usually zero.
        let position = self
            .manager
            .positions(state.position.token_id)
            .await
            .map_err(ScenarioError::rejected("positions"))?;
        report.fees_owed = Some(position.tokens_owed);
        info!(
            liquidity = position.liquidity,
            fees_owed = %position.tokens_owed,
            "position after advancing"
        );

        Ok(TimeAdvanced { initial: state.initial, position: state.position })
    }

    pub async fn withdraw_and_collect(
        &self,
        state: TimeAdvanced,
        report: &mut ScenarioReport
    ) -> Result<Withdrawn, ScenarioError> {
        let authority = self.assume_authority().await?;
        let outcome = AssertUnwindSafe(self.withdraw_and_collect_as(&authority, state, report))
            .catch_unwind()
            .await;
        self.release(authority, outcome).await
    }

    async fn withdraw_and_collect_as(
        &self,
        authority: &Authority,
        state: TimeAdvanced,
        report: &mut ScenarioReport
    ) -> Result<Withdrawn, ScenarioError> {
        let position = state.position;

        let before = self.snapshot().await?;
        report.before_withdraw = Some(before);

        let unlocked = self
            .manager
            .decrease_liquidity(authority, WithdrawRequest::full(position, self.config.deadline))
            .await
            .map_err(ScenarioError::rejected("decreaseLiquidity"))?;
        report.unlocked = Some(unlocked);

        // decreasing liquidity only credits the position, nothing is sent yet
        let after = self.snapshot().await?;
        report.after_withdraw = Some(after);
        info!(%unlocked, %after, "decreased liquidity");
        if after != before {
            return Err(AssertionFailure::BalanceMovedOnWithdraw { before, after }.into())
        }

        let collected = self
            .manager
            .collect(authority, CollectRequest::everything(position.token_id, self.config.actor))
            .await
            .map_err(ScenarioError::rejected("collect"))?;
        report.collected = Some(collected);

        let after_collect = self.snapshot().await?;
        info!(%collected, balances = %after_collect, "collected");
        match after_collect.gained_since(&before) {
            (Some(gained0), Some(gained1))
                if gained0 >= collected.amount0 && gained1 >= collected.amount1 => {}
            _ => {
                return Err(AssertionFailure::CollectShortfall {
                    collected,
                    before,
                    after: after_collect
                }
                .into())
            }
        }

        self.manager
            .burn(authority, position.token_id)
            .await
            .map_err(ScenarioError::rejected("burn"))?;
        info!(token_id = %position.token_id, "burned position");

        Ok(Withdrawn { initial: state.initial })
    }

    pub async fn verify(
        &self,
        state: Withdrawn,
        report: &mut ScenarioReport
    ) -> Result<(), ScenarioError> {
        let final_balances = self.snapshot().await?;
        report.final_balances = Some(final_balances);

        let delta = BalanceDelta::between(&state.initial, &final_balances)
            .map_err(AssertionFailure::from)?;
        report.delta = Some(delta);
        info!(initial = %state.initial, %final_balances, %delta, "final balances");

        if !final_balances.both_positive() {
            return Err(AssertionFailure::NonPositiveFinalBalance(final_balances).into())
        }
        Ok(())
    }

    async fn snapshot(&self) -> Result<BalanceSnapshot, ScenarioError> {
        let (actor, pair) = (self.config.actor, self.config.pair);
        let amount0 = self
            .ledger
            .balance_of(pair.token0, actor)
            .await
            .map_err(ScenarioError::rejected("balanceOf"))?;
        let amount1 = self
            .ledger
            .balance_of(pair.token1, actor)
            .await
            .map_err(ScenarioError::rejected("balanceOf"))?;

        Ok(BalanceSnapshot::new(amount0, amount1))
    }

    async fn expect_height(&self, expected: u64) -> Result<(), ScenarioError> {
        let actual = self
            .chain
            .height()
            .await
            .map_err(ScenarioError::rejected("height"))?;
        if actual != expected {
            return Err(AssertionFailure::HeightMismatch { expected, actual }.into())
        }
        Ok(())
    }

    async fn assume_authority(&self) -> Result<Authority, ScenarioError> {
        self.chain
            .assume_authority(self.config.actor)
            .await
            .map_err(ScenarioError::rejected("assume_authority"))
    }

    /// Hands the authority back regardless of how the phase ended, then
    /// surfaces the phase's own outcome. A panic inside the phase resumes once
    /// the authority is released.
    async fn release<T>(
        &self,
        authority: Authority,
        outcome: std::thread::Result<Result<T, ScenarioError>>
    ) -> Result<T, ScenarioError> {
        let actor = authority.actor();
        let released = self.chain.release_authority(authority).await;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(panic) => {
                if let Err(error) = released {
                    warn!(%actor, ?error, "failed to release authority while unwinding");
                }
                resume_unwind(panic)
            }
        };

        match (outcome, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(error)) => Err(ScenarioError::rejected("release_authority")(error)),
            (Err(error), Ok(())) => Err(error),
            (Err(error), Err(release_error)) => {
                warn!(
                    %actor,
                    ?release_error,
                    "failed to release authority after an earlier failure"
                );
                Err(error)
            }
        }
    }
}
