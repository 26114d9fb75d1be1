use alloy::{
    node_bindings::{Anvil, AnvilInstance},
    primitives::{keccak256, Address, B256, U256},
    providers::{ext::AnvilApi, Provider, RootProvider},
    rpc::types::anvil::Forking,
    sol_types::SolValue,
    transports::http::{Client, Http}
};
use eyre::{bail, eyre};
use position_types::contract_bindings::erc20::IERC20;
use tracing::debug;
use url::Url;

use super::{Erc20Client, PositionManagerClient};
use crate::scenario::collaborators::{Authority, ChainState};

pub type HttpProvider = RootProvider<Http<Client>>;

/// Mapping slots tried when looking for a token's `balanceOf` storage.
const MAX_PROBED_SLOTS: u64 = 32;
/// Written into candidate slots while probing. Unlikely to be anyone's real
/// balance.
const PROBE_VALUE: U256 = U256::from_limbs([0x5eed_ba1a_5eed_ba1a, 0, 0, 1]);

/// A local anvil node forking a remote network. The node lives as long as
/// this value does.
pub struct AnvilFork {
    _anvil:   AnvilInstance,
    provider: HttpProvider
}

impl AnvilFork {
    /// Starts anvil forked from `source` at `height`.
    pub fn spawn(source: &Url, height: u64) -> eyre::Result<Self> {
        let anvil = Anvil::new()
            .fork(source.as_str())
            .fork_block_number(height)
            .try_spawn()?;
        let provider = RootProvider::new_http(anvil.endpoint_url());
        debug!(endpoint = %anvil.endpoint(), height, "spawned anvil fork");

        Ok(Self { _anvil: anvil, provider })
    }

    pub fn position_manager(&self, address: Address) -> PositionManagerClient {
        PositionManagerClient::new(address, self.provider.clone())
    }

    pub fn erc20(&self) -> Erc20Client {
        Erc20Client::new(self.provider.clone())
    }

    /// Locates the storage slot backing `balanceOf(holder)`. Each candidate
    /// slot is overwritten with a marker, read back through `balanceOf`, then
    /// restored.
    async fn balance_slot(&self, token: Address, holder: Address) -> eyre::Result<U256> {
        let erc20 = IERC20::new(token, &self.provider);

        for index in 0..MAX_PROBED_SLOTS {
            let index = U256::from(index);
            for slot in [solidity_mapping_slot(holder, index), vyper_mapping_slot(holder, index)] {
                let original = self.provider.get_storage_at(token, slot).await?;
                self.provider
                    .anvil_set_storage_at(token, slot, PROBE_VALUE.into())
                    .await?;
                let observed = erc20.balanceOf(holder).call().await?.balance;
                self.provider
                    .anvil_set_storage_at(token, slot, original.into())
                    .await?;

                if observed == PROBE_VALUE {
                    return Ok(slot)
                }
            }
        }

        Err(eyre!("could not find the balance slot of {holder} in token {token}"))
    }
}

/// `keccak256(abi.encode(key, index))`, the layout solc uses for mappings.
fn solidity_mapping_slot(key: Address, index: U256) -> U256 {
    keccak256((key, index).abi_encode()).into()
}

/// `keccak256(abi.encode(index, key))`, the layout older vyper compilers use.
fn vyper_mapping_slot(key: Address, index: U256) -> U256 {
    keccak256((index, key).abi_encode()).into()
}

impl ChainState for AnvilFork {
    async fn fork_at(&self, source: &Url, height: u64) -> eyre::Result<()> {
        self.provider
            .anvil_reset(Some(Forking {
                json_rpc_url: Some(source.to_string()),
                block_number: Some(height)
            }))
            .await?;
        Ok(())
    }

    async fn height(&self) -> eyre::Result<u64> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn advance_to(&self, height: u64) -> eyre::Result<()> {
        let current = self.height().await?;
        if height < current {
            bail!("cannot move the fork back from {current} to {height}")
        }
        if height > current {
            self.provider
                .anvil_mine(Some(U256::from(height - current)), None)
                .await?;
        }
        Ok(())
    }

    async fn set_balance(&self, token: Address, actor: Address, amount: U256) -> eyre::Result<()> {
        let slot = self.balance_slot(token, actor).await?;
        self.provider
            .anvil_set_storage_at(token, slot, B256::from(amount))
            .await?;

        let balance = IERC20::new(token, &self.provider)
            .balanceOf(actor)
            .call()
            .await?
            .balance;
        if balance != amount {
            bail!("balance of {actor} in {token} is {balance} after writing {amount}")
        }
        Ok(())
    }

    async fn fund_native(&self, actor: Address, amount: U256) -> eyre::Result<()> {
        self.provider.anvil_set_balance(actor, amount).await?;
        Ok(())
    }

    async fn assume_authority(&self, actor: Address) -> eyre::Result<Authority> {
        self.provider.anvil_impersonate_account(actor).await?;
        Ok(Authority::new(actor))
    }

    async fn release_authority(&self, authority: Authority) -> eyre::Result<()> {
        self.provider
            .anvil_stop_impersonating_account(authority.actor())
            .await?;
        Ok(())
    }
}
