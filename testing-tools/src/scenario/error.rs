use position_types::{
    balances::{AmountPair, BalanceSnapshot, UnrepresentableBalance},
    position::PositionHandle
};

use super::report::{Phase, ScenarioReport};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingRpcUrl(&'static str),
    #[error("{var} is not a valid url")]
    InvalidRpcUrl {
        var:    &'static str,
        #[source]
        source: url::ParseError
    },
    #[error("end block {end} is not after start block {start}")]
    EmptyForkWindow { start: u64, end: u64 },
    /// Provisioning mines blocks, so the chain can already be at or past the
    /// end block when it is time to advance.
    #[error("end block {end} is not after height {reached} reached before advancing")]
    ForkWindowTooShort { end: u64, reached: u64 }
}

/// An observed outcome contradicted what the scenario expects.
#[derive(Debug, thiserror::Error)]
pub enum AssertionFailure {
    #[error("mint returned an invalid position {0:?}")]
    InvalidHandle(PositionHandle),
    #[error("chain is at height {actual}, expected {expected}")]
    HeightMismatch { expected: u64, actual: u64 },
    #[error("balances moved from {before} to {after} when liquidity was decreased")]
    BalanceMovedOnWithdraw { before: BalanceSnapshot, after: BalanceSnapshot },
    #[error("collect reported {collected} but balances only went from {before} to {after}")]
    CollectShortfall { collected: AmountPair, before: BalanceSnapshot, after: BalanceSnapshot },
    #[error("final balances {0} are not both positive")]
    NonPositiveFinalBalance(BalanceSnapshot),
    #[error(transparent)]
    UnrepresentableDelta(#[from] UnrepresentableBalance)
}

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A collaborator call failed. Never retried.
    #[error("{call} was rejected: {source}")]
    Rejected {
        call:   &'static str,
        #[source]
        source: BoxError
    },
    #[error("assertion failed: {0}")]
    Assertion(#[from] AssertionFailure)
}

impl ScenarioError {
    /// For `map_err` on collaborator results.
    pub fn rejected(call: &'static str) -> impl FnOnce(eyre::Report) -> Self {
        move |report| Self::Rejected { call, source: report.into() }
    }

    pub fn rejected_call(&self) -> Option<&'static str> {
        match self {
            Self::Rejected { call, .. } => Some(call),
            _ => None
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("scenario failed during {phase}")]
pub struct ScenarioFailure {
    pub phase:  Phase,
    #[source]
    pub error:  ScenarioError,
    /// Diagnostics gathered before the failure.
    pub report: ScenarioReport
}

impl ScenarioFailure {
    pub fn new(phase: Phase, error: impl Into<ScenarioError>, report: ScenarioReport) -> Self {
        Self { phase, error: error.into(), report }
    }
}
