use std::fmt;

use alloy::primitives::{I256, U256};

/// A pair of token amounts ordered like the pool's tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AmountPair {
    pub amount0: U256,
    pub amount1: U256
}

impl AmountPair {
    pub const fn new(amount0: U256, amount1: U256) -> Self {
        Self { amount0, amount1 }
    }

    pub fn from_u128(amount0: u128, amount1: u128) -> Self {
        Self { amount0: U256::from(amount0), amount1: U256::from(amount1) }
    }

    pub fn is_zero(&self) -> bool {
        self.amount0.is_zero() && self.amount1.is_zero()
    }
}

impl fmt::Display for AmountPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.amount0, self.amount1)
    }
}

/// The actor's balances of both pool tokens at one point in the scenario.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BalanceSnapshot(pub AmountPair);

impl BalanceSnapshot {
    pub const fn new(amount0: U256, amount1: U256) -> Self {
        Self(AmountPair::new(amount0, amount1))
    }

    pub fn amount0(&self) -> U256 {
        self.0.amount0
    }

    pub fn amount1(&self) -> U256 {
        self.0.amount1
    }

    pub fn both_positive(&self) -> bool {
        !self.0.amount0.is_zero() && !self.0.amount1.is_zero()
    }

    /// How much each balance rose since `earlier`. `None` for a token whose
    /// balance fell.
    pub fn gained_since(&self, earlier: &Self) -> (Option<U256>, Option<U256>) {
        (
            self.0.amount0.checked_sub(earlier.0.amount0),
            self.0.amount1.checked_sub(earlier.0.amount1)
        )
    }
}

impl fmt::Display for BalanceSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("balance {0} does not fit in a signed 256 bit integer")]
pub struct UnrepresentableBalance(pub U256);

/// Signed change of both balances between two snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BalanceDelta {
    pub delta0: I256,
    pub delta1: I256
}

impl BalanceDelta {
    pub fn between(
        before: &BalanceSnapshot,
        after: &BalanceSnapshot
    ) -> Result<Self, UnrepresentableBalance> {
        Ok(Self {
            delta0: signed_diff(after.amount0(), before.amount0())?,
            delta1: signed_diff(after.amount1(), before.amount1())?
        })
    }
}

impl fmt::Display for BalanceDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.delta0, self.delta1)
    }
}

fn signed_diff(after: U256, before: U256) -> Result<I256, UnrepresentableBalance> {
    let after = I256::try_from(after).map_err(|_| UnrepresentableBalance(after))?;
    let before = I256::try_from(before).map_err(|_| UnrepresentableBalance(before))?;
    // both sides are non-negative so the difference cannot overflow
    Ok(after - before)
}
