use std::fmt;

use position_types::{
    balances::{AmountPair, BalanceDelta, BalanceSnapshot},
    position::PositionHandle
};

/// Steps of a scenario run, in the only order they can happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Checking the configuration, before anything touches the chain.
    Configure,
    Initialize,
    Provision,
    AdvanceTime,
    WithdrawAndCollect,
    Verify
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configure => "configure",
            Self::Initialize => "initialize",
            Self::Provision => "provision",
            Self::AdvanceTime => "advance time",
            Self::WithdrawAndCollect => "withdraw and collect",
            Self::Verify => "verify"
        };
        f.write_str(name)
    }
}

/// Everything observed during a run. Fields fill in as phases complete, so a
/// failed run still carries whatever was seen up to the failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioReport {
    /// Last phase that finished.
    pub completed:       Option<Phase>,
    pub initial:         Option<BalanceSnapshot>,
    pub position:        Option<PositionHandle>,
    /// Amounts the position manager pulled in on mint.
    pub used:            Option<AmountPair>,
    pub after_mint:      Option<BalanceSnapshot>,
    /// `tokensOwed` after advancing. Read for visibility only.
    pub fees_owed:       Option<AmountPair>,
    pub before_withdraw: Option<BalanceSnapshot>,
    pub unlocked:        Option<AmountPair>,
    pub after_withdraw:  Option<BalanceSnapshot>,
    pub collected:       Option<AmountPair>,
    pub final_balances:  Option<BalanceSnapshot>,
    pub delta:           Option<BalanceDelta>
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn line<T: fmt::Display>(
            f: &mut fmt::Formatter<'_>,
            label: &str,
            value: &Option<T>
        ) -> fmt::Result {
            match value {
                Some(value) => writeln!(f, "{label:<18}{value}"),
                None => writeln!(f, "{label:<18}-")
            }
        }

        match self.completed {
            Some(phase) => writeln!(f, "{:<18}{phase}", "completed")?,
            None => writeln!(f, "{:<18}-", "completed")?
        }
        line(f, "initial", &self.initial)?;
        match &self.position {
            Some(handle) => writeln!(
                f,
                "{:<18}token {} liquidity {}",
                "position", handle.token_id, handle.liquidity
            )?,
            None => writeln!(f, "{:<18}-", "position")?
        }
        line(f, "used", &self.used)?;
        line(f, "after mint", &self.after_mint)?;
        line(f, "fees owed", &self.fees_owed)?;
        line(f, "before withdraw", &self.before_withdraw)?;
        line(f, "unlocked", &self.unlocked)?;
        line(f, "after withdraw", &self.after_withdraw)?;
        line(f, "collected", &self.collected)?;
        line(f, "final", &self.final_balances)?;
        line(f, "delta", &self.delta)
    }
}
