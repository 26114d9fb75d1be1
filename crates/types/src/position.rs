use alloy::primitives::{
    aliases::{I24, U24},
    Address, U256
};
use uniswap_v3_math::tick_math::{MAX_TICK, MIN_TICK};

use crate::{
    balances::AmountPair,
    contract_bindings::nonfungible_position_manager::INonfungiblePositionManager::{
        CollectParams, DecreaseLiquidityParams, MintParams
    }
};

#[derive(Debug, thiserror::Error)]
pub enum PositionError {
    #[error("tick {0} does not fit in an int24")]
    TickOutOfBounds(i32)
}

/// Fee tiers enabled on the V3 factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeeTier {
    Lowest,
    Low,
    Medium,
    High
}

impl FeeTier {
    /// Fee in hundredths of a bip.
    pub const fn fee(&self) -> u32 {
        match self {
            Self::Lowest => 100,
            Self::Low => 500,
            Self::Medium => 3000,
            Self::High => 10000
        }
    }

    pub const fn tick_spacing(&self) -> i32 {
        match self {
            Self::Lowest => 1,
            Self::Low => 10,
            Self::Medium => 60,
            Self::High => 200
        }
    }
}

/// Two tokens ordered the way the pool orders them: `token0` is the
/// numerically smaller address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenPair {
    pub token0: Address,
    pub token1: Address
}

impl TokenPair {
    pub fn new(a: Address, b: Address) -> Self {
        if a <= b {
            Self { token0: a, token1: b }
        } else {
            Self { token0: b, token1: a }
        }
    }

    /// Orders the pair and lines up per-token amounts with the sorted tokens.
    /// `amount_a` belongs to `a` and `amount_b` to `b`.
    pub fn with_amounts(
        a: Address,
        amount_a: U256,
        b: Address,
        amount_b: U256
    ) -> (Self, AmountPair) {
        let pair = Self::new(a, b);
        let amounts = if pair.token0 == a {
            AmountPair::new(amount_a, amount_b)
        } else {
            AmountPair::new(amount_b, amount_a)
        };
        (pair, amounts)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickRange {
    pub lower: i32,
    pub upper: i32
}

impl TickRange {
    pub fn new(lower: i32, upper: i32) -> Self {
        Self { lower, upper }
    }

    /// Widest range usable with the tier's spacing. Integer division rounds
    /// toward zero so both bounds land inside `[MIN_TICK, MAX_TICK]`.
    pub fn full_range(fee_tier: FeeTier) -> Self {
        let spacing = fee_tier.tick_spacing();
        Self { lower: MIN_TICK / spacing * spacing, upper: MAX_TICK / spacing * spacing }
    }

    /// Alignment is the position manager's precondition. This only exists so
    /// callers can report on it.
    pub fn is_aligned(&self, spacing: i32) -> bool {
        spacing > 0 && self.lower % spacing == 0 && self.upper % spacing == 0
    }

    fn to_i24(tick: i32) -> Result<I24, PositionError> {
        I24::try_from(tick).map_err(|_| PositionError::TickOutOfBounds(tick))
    }
}

/// Identifies a minted position along with the liquidity it was minted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionHandle {
    pub token_id:  U256,
    pub liquidity: u128
}

impl PositionHandle {
    pub fn is_valid(&self) -> bool {
        !self.token_id.is_zero() && self.liquidity > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintRequest {
    pub pair:      TokenPair,
    pub fee_tier:  FeeTier,
    pub ticks:     TickRange,
    pub desired:   AmountPair,
    pub minimum:   AmountPair,
    pub recipient: Address,
    pub deadline:  U256
}

impl MintRequest {
    pub fn to_params(&self) -> Result<MintParams, PositionError> {
        Ok(MintParams {
            token0:         self.pair.token0,
            token1:         self.pair.token1,
            fee:            U24::from(self.fee_tier.fee()),
            tickLower:      TickRange::to_i24(self.ticks.lower)?,
            tickUpper:      TickRange::to_i24(self.ticks.upper)?,
            amount0Desired: self.desired.amount0,
            amount1Desired: self.desired.amount1,
            amount0Min:     self.minimum.amount0,
            amount1Min:     self.minimum.amount1,
            recipient:      self.recipient,
            deadline:       self.deadline
        })
    }
}

/// What the position manager reported for a mint. `used` can be below the
/// desired amounts since only one side is fully consumed at the current price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintOutcome {
    pub handle: PositionHandle,
    pub used:   AmountPair
}

/// Removes liquidity from a position. The harness always withdraws the full
/// liquidity the position was minted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawRequest {
    pub handle:   PositionHandle,
    pub minimum:  AmountPair,
    pub deadline: U256
}

impl WithdrawRequest {
    pub fn full(handle: PositionHandle, deadline: U256) -> Self {
        Self { handle, minimum: AmountPair::default(), deadline }
    }

    pub fn liquidity(&self) -> u128 {
        self.handle.liquidity
    }

    pub fn to_params(&self) -> DecreaseLiquidityParams {
        DecreaseLiquidityParams {
            tokenId:    self.handle.token_id,
            liquidity:  self.handle.liquidity,
            amount0Min: self.minimum.amount0,
            amount1Min: self.minimum.amount1,
            deadline:   self.deadline
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectRequest {
    pub token_id:    U256,
    pub recipient:   Address,
    pub amount0_max: u128,
    pub amount1_max: u128
}

impl CollectRequest {
    /// Claims everything the position owes.
    pub fn everything(token_id: U256, recipient: Address) -> Self {
        Self { token_id, recipient, amount0_max: u128::MAX, amount1_max: u128::MAX }
    }

    pub fn to_params(&self) -> CollectParams {
        CollectParams {
            tokenId:    self.token_id,
            recipient:  self.recipient,
            amount0Max: self.amount0_max,
            amount1Max: self.amount1_max
        }
    }
}

/// Subset of `positions(tokenId)` the harness looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionInfo {
    pub liquidity:   u128,
    pub tokens_owed: AmountPair
}

impl PositionInfo {
    /// A position can only be burned once nothing is left in it.
    pub fn is_cleared(&self) -> bool {
        self.liquidity == 0 && self.tokens_owed.is_zero()
    }
}
