// Configuration is resolved once in `main` and passed explicitly to the
// uploader and the wallet so neither reads the environment on its own.

use std::fmt;
use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_PINNING_ENDPOINT: &str = "https://api.pinata.cloud/pinning/pinFileToIPFS";
pub const DEFAULT_LOCATOR_SCHEME: &str = "ipfs";
/// Local JSON-RPC port exposed by desktop signing wallets such as Frame.
pub const DEFAULT_WALLET_RPC_URL: &str = "http://127.0.0.1:1248";
/// Camp Network Basecamp testnet.
pub const DEFAULT_CHAIN_ID: u64 = 123_420_001_114;
pub const DEFAULT_EXPLORER_URL: &str = "https://basecamp.cloud.blockscout.com";

const ENV_PINATA_JWT: &str = "CAMPNFT_PINATA_JWT";
const ENV_CONTRACT_ADDRESS: &str = "CAMPNFT_CONTRACT_ADDRESS";
const ENV_PINNING_ENDPOINT: &str = "CAMPNFT_PINNING_ENDPOINT";
const ENV_LOCATOR_SCHEME: &str = "CAMPNFT_LOCATOR_SCHEME";
const ENV_WALLET_RPC_URL: &str = "CAMPNFT_WALLET_RPC_URL";
const ENV_CHAIN_ID: &str = "CAMPNFT_CHAIN_ID";
const ENV_EXPLORER_URL: &str = "CAMPNFT_EXPLORER_URL";

/// Everything the uploader and minter need from the outside world.
#[derive(Clone)]
pub struct MintConfig {
    /// Bearer token for the pinning service.
    pub pinata_jwt: String,
    /// Target NFT contract exposing `mintTo(address,string)`.
    pub contract_address: Address,
    pub pinning_endpoint: String,
    pub locator_scheme: String,
    pub wallet_rpc_url: String,
    pub chain_id: u64,
    pub explorer_url: String,
}

/// Shape of the optional `config.json`. Every field may be left out and
/// supplied through the environment instead.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub pinata_jwt: Option<String>,
    pub contract_address: Option<String>,
    pub pinning_endpoint: Option<String>,
    pub locator_scheme: Option<String>,
    pub wallet_rpc_url: Option<String>,
    pub chain_id: Option<u64>,
    pub explorer_url: Option<String>,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl MintConfig {
    /// Configuration with the public defaults and the two required values.
    pub fn with_defaults(pinata_jwt: impl Into<String>, contract_address: Address) -> Self {
        Self {
            pinata_jwt: pinata_jwt.into(),
            contract_address,
            pinning_endpoint: DEFAULT_PINNING_ENDPOINT.into(),
            locator_scheme: DEFAULT_LOCATOR_SCHEME.into(),
            wallet_rpc_url: DEFAULT_WALLET_RPC_URL.into(),
            chain_id: DEFAULT_CHAIN_ID,
            explorer_url: DEFAULT_EXPLORER_URL.into(),
        }
    }

    /// Load `<config_dir>/campnft/config.json` if it exists, then apply
    /// `CAMPNFT_*` environment variables on top.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match default_config_path() {
            Some(path) if path.exists() => FileConfig::read(&path)?,
            _ => FileConfig::default(),
        };
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Merge file values with overrides from `env`; `env` wins.
    pub fn resolve<F>(file: FileConfig, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |key: &str, fallback: Option<String>| {
            env(key).filter(|v| !v.trim().is_empty()).or(fallback)
        };

        let pinata_jwt = pick(ENV_PINATA_JWT, file.pinata_jwt)
            .ok_or(ConfigError::Missing(ENV_PINATA_JWT))?;
        let contract = pick(ENV_CONTRACT_ADDRESS, file.contract_address)
            .ok_or(ConfigError::Missing(ENV_CONTRACT_ADDRESS))?;
        let contract_address = contract
            .trim()
            .parse::<Address>()
            .map_err(|_| ConfigError::InvalidAddress(contract.clone()))?;

        let chain_id = match env(ENV_CHAIN_ID).filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidChainId(raw.clone()))?,
            None => file.chain_id.unwrap_or(DEFAULT_CHAIN_ID),
        };

        Ok(Self {
            pinata_jwt,
            contract_address,
            pinning_endpoint: pick(ENV_PINNING_ENDPOINT, file.pinning_endpoint)
                .unwrap_or_else(|| DEFAULT_PINNING_ENDPOINT.into()),
            locator_scheme: pick(ENV_LOCATOR_SCHEME, file.locator_scheme)
                .unwrap_or_else(|| DEFAULT_LOCATOR_SCHEME.into()),
            wallet_rpc_url: pick(ENV_WALLET_RPC_URL, file.wallet_rpc_url)
                .unwrap_or_else(|| DEFAULT_WALLET_RPC_URL.into()),
            chain_id,
            explorer_url: pick(ENV_EXPLORER_URL, file.explorer_url)
                .unwrap_or_else(|| DEFAULT_EXPLORER_URL.into()),
        })
    }
}

impl fmt::Debug for MintConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MintConfig")
            .field("pinata_jwt", &"<redacted>")
            .field("contract_address", &self.contract_address)
            .field("pinning_endpoint", &self.pinning_endpoint)
            .field("locator_scheme", &self.locator_scheme)
            .field("wallet_rpc_url", &self.wallet_rpc_url)
            .field("chain_id", &self.chain_id)
            .field("explorer_url", &self.explorer_url)
            .finish()
    }
}

/// `config.json` inside the platform config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("campnft").join("config.json"))
}
