//! Mainnet deployment addresses and the default scenario parameters.

use alloy::primitives::{address, uint, Address, U256};

use crate::position::FeeTier;

/// Uniswap V3 `NonfungiblePositionManager` on Ethereum mainnet.
pub const NONFUNGIBLE_POSITION_MANAGER: Address =
    address!("C36442b4a4522E871399CD717aBDD847Ab11FE88");

pub const DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");
pub const WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

/// Anvil's first default account. Any address works since it is impersonated.
pub const TEST_ACTOR: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

/// Block the fork is created at.
pub const FORK_START_BLOCK: u64 = 17_000_000;
/// Block the fork is advanced to before liquidity is withdrawn.
pub const FORK_END_BLOCK: u64 = 17_000_100;

pub const FEE_TIER: FeeTier = FeeTier::Medium;

pub const DAI_ENDOWMENT: U256 = uint!(100_000_000000000000000000_U256);
pub const WETH_ENDOWMENT: U256 = uint!(100_000000000000000000_U256);

pub const DAI_DESIRED: U256 = uint!(2_000_000000000000000000_U256);
pub const WETH_DESIRED: U256 = uint!(1_000000000000000000_U256);

/// Native balance handed to the actor so impersonated transactions can pay gas.
pub const GAS_ENDOWMENT: U256 = uint!(1_000_000000000000000000_U256);

/// Environment variable holding the archive node endpoint the fork is sourced
/// from.
pub const RPC_URL_ENV: &str = "MAINNET_RPC_URL";
