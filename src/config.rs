//! Configuration management
//!
//! All file locations are carried in an explicit [`AuthConfig`] that is passed
//! into every component; nothing looks paths up on its own.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::Result;
use crate::error::Error;

/// OAuth2 scope for the Merchant API
pub const MERCHANT_SCOPE: &str = "https://www.googleapis.com/auth/content";

/// Directory holding the key, secrets, and merchant list by default
pub const AUTHFILES_DIR: &str = "authfiles";

/// Paths and callback settings for credential acquisition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Service account key (highest precedence)
    #[serde(default = "default_service_account_path")]
    pub service_account_path: PathBuf,

    /// OAuth2 client secrets document with a `web` client entry
    #[serde(default = "default_client_secrets_path")]
    pub client_secrets_path: PathBuf,

    /// Stored refresh token, relative to the working directory by default
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,

    /// JSON array of merchant account IDs
    #[serde(default = "default_merchant_info_path")]
    pub merchant_info_path: PathBuf,

    #[serde(default = "default_scope")]
    pub scope: String,

    /// Address the one-shot callback listener binds to
    #[serde(default = "default_callback_host")]
    pub callback_host: IpAddr,

    #[serde(default = "default_callback_port")]
    pub callback_port: u16,

    /// Give up waiting for the browser redirect after this many seconds.
    /// `None` waits indefinitely.
    #[serde(default)]
    pub callback_timeout_secs: Option<u64>,
}

fn default_service_account_path() -> PathBuf {
    Path::new(AUTHFILES_DIR).join("service-account.json")
}

fn default_client_secrets_path() -> PathBuf {
    Path::new(AUTHFILES_DIR).join("client-secrets.json")
}

fn default_token_path() -> PathBuf {
    PathBuf::from("token.json")
}

fn default_merchant_info_path() -> PathBuf {
    Path::new(AUTHFILES_DIR).join("merchant-info.json")
}

fn default_scope() -> String {
    MERCHANT_SCOPE.to_string()
}

fn default_callback_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_callback_port() -> u16 {
    crate::auth::CALLBACK_PORT
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            service_account_path: default_service_account_path(),
            client_secrets_path: default_client_secrets_path(),
            token_path: default_token_path(),
            merchant_info_path: default_merchant_info_path(),
            scope: default_scope(),
            callback_host: default_callback_host(),
            callback_port: default_callback_port(),
            callback_timeout_secs: None,
        }
    }
}

impl AuthConfig {
    /// Point the key, secrets, and merchant list at a different directory
    pub fn with_authfiles_dir(mut self, dir: &Path) -> Self {
        self.service_account_path = dir.join("service-account.json");
        self.client_secrets_path = dir.join("client-secrets.json");
        self.merchant_info_path = dir.join("merchant-info.json");
        self
    }

    pub fn callback_addr(&self) -> SocketAddr {
        SocketAddr::new(self.callback_host, self.callback_port)
    }

    pub fn callback_timeout(&self) -> Option<Duration> {
        self.callback_timeout_secs.map(Duration::from_secs)
    }
}

/// Get the config directory path
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".merchant-auth")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Load configuration from the default location, or defaults if absent
pub fn load() -> Result<AuthConfig> {
    let path = config_path();
    if !path.exists() {
        tracing::debug!("No config at {:?}, using defaults", path);
        return Ok(AuthConfig::default());
    }
    load_from(&path)
}

/// Load configuration from an explicit file
pub fn load_from(path: &Path) -> Result<AuthConfig> {
    if !path.exists() {
        return Err(Error::Config(format!("Config not found at {:?}", path)));
    }

    let content = std::fs::read_to_string(path)?;
    let config: AuthConfig = serde_json::from_str(&content)?;
    Ok(config)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MerchantId {
    Numeric(u64),
    Text(String),
}

/// Read the list of merchant account IDs
pub fn read_merchant_ids(path: &Path) -> Result<Vec<String>> {
    if !path.is_file() {
        return Err(Error::Config(format!(
            "Merchant info file not found or missing IDs in file: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let ids: Vec<MerchantId> = serde_json::from_str(&content)?;
    Ok(ids
        .into_iter()
        .map(|id| match id {
            MerchantId::Numeric(n) => n.to_string(),
            MerchantId::Text(s) => s,
        })
        .collect())
}
