use crate::adapters::wallet::SimulatedBehavior;
use crate::domain::model::{CommitmentLevel, WalletAddress};
use crate::utils::error::{BookingError, Result};
use crate::utils::validation::{
    validate_base58_address, validate_path, validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

/// 預設的模擬錢包地址
pub const DEFAULT_WALLET_ADDRESS: &str = "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingConfig {
    #[serde(default)]
    pub payment: PaymentConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub sink: SinkConfig,
    pub catalog: Option<CatalogConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    pub destination: Option<String>,
    #[serde(default)]
    pub commitment: CommitmentLevel,
    pub confirmation_timeout_seconds: Option<u64>,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            destination: None,
            commitment: CommitmentLevel::Processed,
            confirmation_timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    #[default]
    Devnet,
    Testnet,
    MainnetBeta,
}

impl Cluster {
    /// 叢集的公開 RPC 端點
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
        }
    }
}

impl std::fmt::Display for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cluster::Devnet => write!(f, "devnet"),
            Cluster::Testnet => write!(f, "testnet"),
            Cluster::MainnetBeta => write!(f, "mainnet-beta"),
        }
    }
}

/// Cluster the wallet session talks to. `rpc_endpoint` overrides the
/// cluster's public endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub cluster: Cluster,
    pub rpc_endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletConfig {
    pub address: Option<String>,
    #[serde(default)]
    pub behavior: SimulatedBehavior,
    pub confirmation_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkType {
    #[default]
    Log,
    Http,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SinkConfig {
    #[serde(default)]
    pub r#type: SinkType,
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub commit_attempts: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub path: String,
}

impl BookingConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BookingError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| BookingError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${BOOKING_DESTINATION})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static env var pattern"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    pub fn destination(&self) -> Result<WalletAddress> {
        let destination =
            self.payment
                .destination
                .as_ref()
                .ok_or_else(|| BookingError::MissingConfigError {
                    field: "payment.destination".to_string(),
                })?;
        validate_base58_address("payment.destination", destination)?;
        Ok(WalletAddress(destination.clone()))
    }

    pub fn rpc_url(&self) -> &str {
        self.network
            .rpc_endpoint
            .as_deref()
            .unwrap_or_else(|| self.network.cluster.default_rpc_url())
    }

    pub fn wallet_address(&self) -> WalletAddress {
        WalletAddress(
            self.wallet
                .address
                .clone()
                .unwrap_or_else(|| DEFAULT_WALLET_ADDRESS.to_string()),
        )
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.payment.confirmation_timeout_seconds.unwrap_or(30))
    }

    pub fn confirmation_delay(&self) -> Duration {
        Duration::from_millis(self.wallet.confirmation_delay_ms.unwrap_or(0))
    }

    pub fn sink_timeout(&self) -> Duration {
        Duration::from_secs(self.sink.timeout_seconds.unwrap_or(10))
    }

    pub fn commit_attempts(&self) -> u32 {
        self.sink.commit_attempts.unwrap_or(3)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        self.destination()?;

        if let Some(endpoint) = &self.network.rpc_endpoint {
            validate_url("network.rpc_endpoint", endpoint)?;
        }

        if let Some(address) = &self.wallet.address {
            validate_base58_address("wallet.address", address)?;
        }

        if let Some(timeout) = self.payment.confirmation_timeout_seconds {
            validate_range("payment.confirmation_timeout_seconds", timeout, 1, 300)?;
        }

        if let Some(attempts) = self.sink.commit_attempts {
            validate_range("sink.commit_attempts", attempts, 1, 10)?;
        }

        if self.sink.r#type == SinkType::Http {
            let endpoint =
                self.sink
                    .endpoint
                    .as_deref()
                    .ok_or_else(|| BookingError::MissingConfigError {
                        field: "sink.endpoint".to_string(),
                    })?;
            validate_url("sink.endpoint", endpoint)?;
        }

        if let Some(catalog) = &self.catalog {
            validate_path("catalog.path", &catalog.path)?;
        }

        Ok(())
    }
}

impl Validate for BookingConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
