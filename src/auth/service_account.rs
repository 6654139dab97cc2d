//! Service account credentials
//!
//! The key file is handed to `yup_oauth2` as is; it reads the key, signs the
//! assertion and talks to the key's `token_uri`.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use yup_oauth2::{read_service_account_key, ServiceAccountAuthenticator};
use crate::Result;
use crate::config::AuthConfig;
use crate::error::Error;
use super::credentials::{CredentialKind, Credentials};

/// Loads credentials for the configured service account key
#[derive(Debug, Clone)]
pub struct ServiceAccountLoader {
    key_path: PathBuf,
    scope: String,
}

impl ServiceAccountLoader {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            key_path: config.service_account_path.clone(),
            scope: config.scope.clone(),
        }
    }

    /// Any failure, from reading the key to the token request, is an
    /// [`Error::ServiceAccount`]
    pub async fn load(&self) -> Result<Credentials> {
        let key = read_service_account_key(&self.key_path).await.map_err(|e| {
            Error::ServiceAccount(format!("Cannot read {}: {}", self.key_path.display(), e))
        })?;
        tracing::info!("Authenticating as service account {}", key.client_email);

        let auth = ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .map_err(|e| Error::ServiceAccount(format!("Invalid service account key: {}", e)))?;

        let token = auth
            .token(&[self.scope.as_str()])
            .await
            .map_err(|e| Error::ServiceAccount(format!("Token request failed: {}", e)))?;

        let access_token = token
            .token()
            .ok_or_else(|| Error::ServiceAccount("Token response had no access token".to_string()))?;

        let mut creds = Credentials::new(CredentialKind::ServiceAccount, access_token.to_string(), None, None);
        creds.expires_at = token
            .expiration_time()
            .and_then(|at| DateTime::<Utc>::from_timestamp(at.unix_timestamp(), 0));
        Ok(creds)
    }
}
