use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy::primitives::Address;
use color_eyre::eyre::{Result, WrapErr, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment variable holding the buyer's signing key.
pub const PRIVATE_KEY_ENV: &str = "MOTRA_PRESALE_PRIVATE_KEY";

/// Name of the optional config file in the config directory.
pub const CONFIG_FILE: &str = "config.json";

/// Get the data directory for the application.
pub fn get_data_dir() -> PathBuf {
    if let Ok(s) = std::env::var("MOTRA_PRESALE_DATA") {
        PathBuf::from(s)
    } else if let Some(proj_dirs) = ProjectDirs::from("com", "motra", "motra-presale") {
        proj_dirs.data_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".data")
    }
}

/// Get the config directory for the application.
pub fn get_config_dir() -> PathBuf {
    if let Ok(s) = std::env::var("MOTRA_PRESALE_CONFIG") {
        PathBuf::from(s)
    } else if let Some(proj_dirs) = ProjectDirs::from("com", "motra", "motra-presale") {
        proj_dirs.config_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".config")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractConfig {
    pub presale_address: String,
    pub stablecoin_address: String,
}

impl ContractConfig {
    /// Parsed presale address. The presets ship the zero address, which
    /// means no presale is deployed on that network yet.
    pub fn presale(&self) -> Result<Address> {
        let address =
            Address::from_str(&self.presale_address).wrap_err("Invalid presale address")?;
        if address == Address::ZERO {
            bail!("No presale contract configured; set contracts.presale_address in {CONFIG_FILE}");
        }
        Ok(address)
    }
}

/// Fiat on-ramp widget settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnRampConfig {
    pub widget_url: String,
    pub client_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresaleConfig {
    /// Token name used in titles ("Purchase MOTRA Tokens").
    pub token_label: String,
    /// Raw stablecoin allowance granted by the approval step.
    pub approval_amount: u64,
    /// Seconds between chain state refreshes.
    pub poll_interval_secs: u64,
}

impl Default for PresaleConfig {
    fn default() -> Self {
        Self {
            token_label: "MOTRA".to_string(),
            // 1 million USDC (6 decimals)
            approval_amount: 1_000_000_000_000,
            poll_interval_secs: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    pub contracts: ContractConfig,
    pub onramp: OnRampConfig,
    #[serde(default)]
    pub presale: PresaleConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::base()
    }
}

impl Config {
    /// Create config from CLI args.
    pub fn new(network: &str, rpc_url: Option<&str>) -> Self {
        let mut config = Self::from_network(network);
        if let Some(url) = rpc_url {
            config.network.rpc_url = url.to_string();
        }
        config
    }

    /// Load `config.json` from `dir` when present, otherwise fall back to
    /// the network preset. The RPC override applies in both cases.
    pub fn load(dir: &Path, network: &str, rpc_url: Option<&str>) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::new(network, rpc_url));
        }

        let mut config = Self::from_file(&path)?;
        if ignores_requested_network(&config, network) {
            warn!(
                "{} is for network {}; ignoring requested network {}",
                path.display(),
                config.network.name,
                network
            );
        }
        if let Some(url) = rpc_url {
            config.network.rpc_url = url.to_string();
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .wrap_err_with(|| format!("Failed to read config {}", path.display()))?;
        let config = serde_json::from_slice(&bytes)
            .wrap_err_with(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn base() -> Self {
        Self {
            network: NetworkConfig {
                name: "base".to_string(),
                chain_id: 8453,
                rpc_url: "https://mainnet.base.org".to_string(),
            },
            contracts: ContractConfig {
                presale_address: "0x0000000000000000000000000000000000000000".to_string(),
                stablecoin_address: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".to_string(),
            },
            onramp: OnRampConfig::default(),
            presale: PresaleConfig::default(),
        }
    }

    pub fn base_sepolia() -> Self {
        Self {
            network: NetworkConfig {
                name: "base-sepolia".to_string(),
                chain_id: 84532,
                rpc_url: "https://sepolia.base.org".to_string(),
            },
            contracts: ContractConfig {
                presale_address: "0x0000000000000000000000000000000000000000".to_string(),
                stablecoin_address: "0x036CbD53842c5426634e7929541eC2318f3dCF7e".to_string(),
            },
            onramp: OnRampConfig::default(),
            presale: PresaleConfig::default(),
        }
    }

    pub fn devnet() -> Self {
        Self {
            network: NetworkConfig {
                name: "devnet".to_string(),
                chain_id: 31337,
                rpc_url: "http://127.0.0.1:8545".to_string(),
            },
            contracts: ContractConfig {
                presale_address: "0x0000000000000000000000000000000000000000".to_string(),
                stablecoin_address: "0x0000000000000000000000000000000000000000".to_string(),
            },
            onramp: OnRampConfig::default(),
            presale: PresaleConfig::default(),
        }
    }

    pub fn from_network(network: &str) -> Self {
        match network {
            "base-sepolia" => Self::base_sepolia(),
            "devnet" => Self::devnet(),
            _ => Self::base(),
        }
    }
}

/// Whether a loaded config file overrides the network asked for on the
/// command line.
fn ignores_requested_network(config: &Config, requested: &str) -> bool {
    config.network.name != requested
}

impl Default for OnRampConfig {
    fn default() -> Self {
        Self {
            widget_url: "https://pay.thirdweb.com/buy".to_string(),
            client_id: String::new(),
        }
    }
}
