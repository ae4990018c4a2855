//! Presale contract client.
//!
//! The app only sees the [`PresaleClient`] trait so the purchase flow can be
//! driven against a mock in tests. [`EvmPresaleClient`] is the alloy-backed
//! implementation; it is built once at startup and shared read-only.

use std::str::FromStr;

use alloy::{
    network::{EthereumWallet, ReceiptResponse},
    primitives::{Address, B256, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use async_trait::async_trait;
use color_eyre::eyre::{Result, WrapErr};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    domain::token_info::{ChainSnapshot, TokenInfo},
};

use super::contracts::{IERC20, IPresale};

/// Failure of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    /// The call could not be built (no signer, bad input).
    #[error("failed to prepare transaction: {0}")]
    Preparation(String),
    /// The wallet or node refused the transaction. Carries the revert signal.
    #[error("transaction rejected: {0}")]
    Rejected(String),
    /// Mined with a failed status.
    #[error("transaction {0} reverted")]
    Reverted(B256),
}

impl TxError {
    /// Text matched against known revert reasons.
    pub fn signal(&self) -> &str {
        match self {
            TxError::Preparation(s) | TxError::Rejected(s) => s,
            TxError::Reverted(_) => "",
        }
    }
}

#[async_trait]
pub trait PresaleReader: Send + Sync {
    async fn token_info(&self) -> Result<TokenInfo>;

    async fn total_sold(&self) -> Result<U256>;

    async fn stablecoin_balance(&self, owner: Address) -> Result<U256>;

    /// Allowance `owner` has granted the presale contract.
    async fn stablecoin_allowance(&self, owner: Address) -> Result<U256>;
}

/// Transaction submission. Both calls resolve only once the transaction is
/// mined, so a successful approval is on chain before the purchase is sent.
#[async_trait]
pub trait PresaleWriter: Send + Sync {
    async fn approve_stablecoin(&self, amount: U256) -> Result<B256, TxError>;

    async fn buy_tokens(&self, amount: U256) -> Result<B256, TxError>;
}

pub trait PresaleClient: PresaleReader + PresaleWriter {
    /// The connected buyer, if a signing key is configured.
    fn account(&self) -> Option<Address>;
}

/// Read the buyer's signing key from `var`. An unset variable means no
/// wallet is connected.
pub fn signer_from_env(var: &str) -> Result<Option<PrivateKeySigner>> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => {
            let signer = PrivateKeySigner::from_str(key.trim())
                .wrap_err_with(|| format!("{var} is not a valid private key"))?;
            Ok(Some(signer))
        }
        _ => Ok(None),
    }
}

/// Read everything the purchase screen needs. Individual read failures are
/// logged and left as `None`.
pub async fn fetch_snapshot<C: PresaleReader + ?Sized>(
    client: &C,
    account: Address,
) -> ChainSnapshot {
    let (token_info, total_sold, balance, allowance) = tokio::join!(
        client.token_info(),
        client.total_sold(),
        client.stablecoin_balance(account),
        client.stablecoin_allowance(account),
    );

    ChainSnapshot {
        token_info: log_read("token info", token_info),
        total_sold: log_read("total sold", total_sold),
        stablecoin_balance: log_read("USDC balance", balance),
        stablecoin_allowance: log_read("USDC allowance", allowance),
    }
}

fn log_read<T>(what: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Failed to read {}: {}", what, e);
            None
        }
    }
}

/// alloy-backed presale client.
pub struct EvmPresaleClient {
    provider: DynProvider,
    account: Option<Address>,
    presale: Address,
    stablecoin: Address,
}

impl EvmPresaleClient {
    pub fn new(config: &Config, signer: Option<PrivateKeySigner>) -> Result<Self> {
        let url: Url = config
            .network
            .rpc_url
            .parse()
            .wrap_err_with(|| format!("Invalid RPC URL {}", config.network.rpc_url))?;
        let presale = config.contracts.presale()?;
        let stablecoin = Address::from_str(&config.contracts.stablecoin_address)
            .wrap_err("Invalid stablecoin address")?;

        let (provider, account) = match signer {
            Some(signer) => {
                let account = signer.address();
                let provider = ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer))
                    .connect_http(url)
                    .erased();
                (provider, Some(account))
            }
            None => (ProviderBuilder::new().connect_http(url).erased(), None),
        };

        info!(
            "Presale client on {} (chain {}), presale {}, stablecoin {}",
            config.network.name, config.network.chain_id, presale, stablecoin
        );

        Ok(Self {
            provider,
            account,
            presale,
            stablecoin,
        })
    }

    fn presale(&self) -> IPresale::IPresaleInstance<DynProvider> {
        IPresale::new(self.presale, self.provider.clone())
    }

    fn stablecoin(&self) -> IERC20::IERC20Instance<DynProvider> {
        IERC20::new(self.stablecoin, self.provider.clone())
    }

    fn require_signer(&self) -> Result<Address, TxError> {
        self.account
            .ok_or_else(|| TxError::Preparation("no wallet connected".to_string()))
    }
}

/// Prefer the decoded presale error name; fall back to the provider message.
fn revert_signal(err: &alloy::contract::Error) -> String {
    match err.as_decoded_interface_error::<IPresale::IPresaleErrors>() {
        Some(decoded) => decoded.signal().to_string(),
        None => err.to_string(),
    }
}

#[async_trait]
impl PresaleReader for EvmPresaleClient {
    async fn token_info(&self) -> Result<TokenInfo> {
        let ret = self.presale().getTokenInfo().call().await?;
        Ok(ret.into())
    }

    async fn total_sold(&self) -> Result<U256> {
        Ok(self.presale().totalSoldTokens().call().await?)
    }

    async fn stablecoin_balance(&self, owner: Address) -> Result<U256> {
        Ok(self.stablecoin().balanceOf(owner).call().await?)
    }

    async fn stablecoin_allowance(&self, owner: Address) -> Result<U256> {
        Ok(self
            .stablecoin()
            .allowance(owner, self.presale)
            .call()
            .await?)
    }
}

#[async_trait]
impl PresaleWriter for EvmPresaleClient {
    async fn approve_stablecoin(&self, amount: U256) -> Result<B256, TxError> {
        self.require_signer()?;
        debug!("Approving {} raw USDC for {}", amount, self.presale);

        let pending = self
            .stablecoin()
            .approve(self.presale, amount)
            .send()
            .await
            .map_err(|e| TxError::Rejected(revert_signal(&e)))?;
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| TxError::Rejected(e.to_string()))?;

        if !ReceiptResponse::status(&receipt) {
            return Err(TxError::Reverted(receipt.transaction_hash));
        }
        Ok(receipt.transaction_hash)
    }

    async fn buy_tokens(&self, amount: U256) -> Result<B256, TxError> {
        self.require_signer()?;
        debug!("Buying {} tokens", amount);

        let pending = self
            .presale()
            .buyTokenWithUSDT(amount)
            .send()
            .await
            .map_err(|e| TxError::Rejected(revert_signal(&e)))?;
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| TxError::Rejected(e.to_string()))?;

        if !ReceiptResponse::status(&receipt) {
            return Err(TxError::Reverted(receipt.transaction_hash));
        }
        Ok(receipt.transaction_hash)
    }
}

impl PresaleClient for EvmPresaleClient {
    fn account(&self) -> Option<Address> {
        self.account
    }
}
