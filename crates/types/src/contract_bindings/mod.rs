#[rustfmt::skip]
pub mod nonfungible_position_manager {
    alloy::sol!(
        #[allow(missing_docs)]
        #[sol(rpc)]
        #[derive(Debug)]
        interface INonfungiblePositionManager {
            struct MintParams {
                address token0;
                address token1;
                uint24 fee;
                int24 tickLower;
                int24 tickUpper;
                uint256 amount0Desired;
                uint256 amount1Desired;
                uint256 amount0Min;
                uint256 amount1Min;
                address recipient;
                uint256 deadline;
            }

            struct DecreaseLiquidityParams {
                uint256 tokenId;
                uint128 liquidity;
                uint256 amount0Min;
                uint256 amount1Min;
                uint256 deadline;
            }

            struct CollectParams {
                uint256 tokenId;
                address recipient;
                uint128 amount0Max;
                uint128 amount1Max;
            }

            event IncreaseLiquidity(uint256 indexed tokenId, uint128 liquidity, uint256 amount0, uint256 amount1);
            event DecreaseLiquidity(uint256 indexed tokenId, uint128 liquidity, uint256 amount0, uint256 amount1);
            event Collect(uint256 indexed tokenId, address recipient, uint256 amount0, uint256 amount1);

            function mint(MintParams calldata params) external payable returns (uint256 tokenId, uint128 liquidity, uint256 amount0, uint256 amount1);

            function positions(uint256 tokenId) external view returns (
                uint96 nonce,
                address operator,
                address token0,
                address token1,
                uint24 fee,
                int24 tickLower,
                int24 tickUpper,
                uint128 liquidity,
                uint256 feeGrowthInside0LastX128,
                uint256 feeGrowthInside1LastX128,
                uint128 tokensOwed0,
                uint128 tokensOwed1
            );

            function decreaseLiquidity(DecreaseLiquidityParams calldata params) external payable returns (uint256 amount0, uint256 amount1);

            function collect(CollectParams calldata params) external payable returns (uint256 amount0, uint256 amount1);

            function burn(uint256 tokenId) external payable;
        }
    );
}

#[rustfmt::skip]
pub mod erc20 {
    alloy::sol!(
        #[allow(missing_docs)]
        #[sol(rpc)]
        interface IERC20 {
            function balanceOf(address account) external view returns (uint256 balance);
            function approve(address spender, uint256 amount) external returns (bool approved);
        }
    );
}
