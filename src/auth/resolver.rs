//! Credential source selection
//!
//! Sources are tried in a fixed order; the first whose file exists is used
//! and nothing else is consulted, even if loading it fails.

use reqwest::Client;
use std::fmt;
use std::path::PathBuf;
use crate::Result;
use crate::config::AuthConfig;
use crate::error::Error;
use super::credentials::Credentials;
use super::flow::OAuthFlow;
use super::service_account::ServiceAccountLoader;
use super::token_store::{StoredCredentials, TokenStore};

/// Where this run's credentials come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    ServiceAccount { key_file: PathBuf },
    StoredToken { token_file: PathBuf, client_secrets: PathBuf },
    InteractiveFlow { client_secrets: PathBuf },
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::ServiceAccount { key_file } => {
                write!(f, "service account key {}", key_file.display())
            }
            CredentialSource::StoredToken { token_file, .. } => {
                write!(f, "stored refresh token {}", token_file.display())
            }
            CredentialSource::InteractiveFlow { client_secrets } => {
                write!(f, "interactive authorization with {}", client_secrets.display())
            }
        }
    }
}

type Probe = fn(&AuthConfig) -> bool;
type Build = fn(&AuthConfig) -> CredentialSource;

/// Highest precedence first
fn candidates() -> [(Probe, Build); 3] {
    [
        (
            |c: &AuthConfig| c.service_account_path.is_file(),
            |c: &AuthConfig| CredentialSource::ServiceAccount {
                key_file: c.service_account_path.clone(),
            },
        ),
        (
            |c: &AuthConfig| c.token_path.is_file(),
            |c: &AuthConfig| CredentialSource::StoredToken {
                token_file: c.token_path.clone(),
                client_secrets: c.client_secrets_path.clone(),
            },
        ),
        (
            |c: &AuthConfig| c.client_secrets_path.is_file(),
            |c: &AuthConfig| CredentialSource::InteractiveFlow {
                client_secrets: c.client_secrets_path.clone(),
            },
        ),
    ]
}

/// Pick the source for `config` by file existence alone
pub fn select_source(config: &AuthConfig) -> Result<CredentialSource> {
    candidates()
        .into_iter()
        .find(|(present, _)| present(config))
        .map(|(_, build)| build(config))
        .ok_or(Error::NoCredentialSource)
}

/// Resolves usable credentials from the configured files
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    config: AuthConfig,
    http: Client,
}

impl CredentialResolver {
    pub fn new(config: AuthConfig) -> Self {
        Self::with_http_client(config, Client::new())
    }

    pub fn with_http_client(config: AuthConfig, http: Client) -> Self {
        Self { config, http }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn select_source(&self) -> Result<CredentialSource> {
        select_source(&self.config)
    }

    /// Select a source and load credentials from it
    pub async fn resolve(&self) -> Result<Credentials> {
        let source = self.select_source()?;
        tracing::info!("Using {}", source);
        self.load(&source).await
    }

    /// Load credentials from an already selected source
    pub async fn load(&self, source: &CredentialSource) -> Result<Credentials> {
        match source {
            CredentialSource::ServiceAccount { .. } => {
                ServiceAccountLoader::new(&self.config).load().await
            }
            CredentialSource::StoredToken { token_file, .. } => {
                match TokenStore::new(&self.config, self.http.clone()).get().await? {
                    StoredCredentials::Refreshed(creds) => Ok(creds),
                    StoredCredentials::Unusable(reason) => Err(Error::StoredTokenUnusable {
                        path: token_file.clone(),
                        reason,
                    }),
                }
            }
            CredentialSource::InteractiveFlow { .. } => {
                OAuthFlow::new(&self.config, self.http.clone())?.run().await
            }
        }
    }
}
