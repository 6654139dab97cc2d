//! Refresh token storage
//!
//! Handles saving and loading the refresh token from `token.json`. Access
//! tokens are never written; every load refreshes against the token endpoint.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::Result;
use crate::config::AuthConfig;
use crate::error::Error;
use super::client_secrets::{load_client_config, ClientConfig};
use super::credentials::{CredentialKind, Credentials};
use super::token_endpoint::request_token;

/// On-disk shape of the token file
#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    refresh_token: String,
}

/// Token refresh request
#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    refresh_token: &'a str,
    grant_type: &'a str,
}

/// Result of [`TokenStore::get`]
#[derive(Debug)]
pub enum StoredCredentials {
    Refreshed(Credentials),
    /// No credential; why the token file could not be used
    Unusable(String),
}

/// Simple store for refresh-token based clients
#[derive(Debug, Clone)]
pub struct TokenStore {
    token_path: PathBuf,
    client_secrets_path: PathBuf,
    http: Client,
}

impl TokenStore {
    pub fn new(config: &AuthConfig, http: Client) -> Self {
        Self {
            token_path: config.token_path.clone(),
            client_secrets_path: config.client_secrets_path.clone(),
            http,
        }
    }

    pub fn path(&self) -> &Path {
        &self.token_path
    }

    /// Load the stored refresh token and trade it for a fresh access token.
    ///
    /// The token file being unreadable or malformed, or the token endpoint
    /// refusing the refresh token (expired or revoked), yields
    /// [`StoredCredentials::Unusable`] with the reason. Client secrets
    /// problems and transport failures are errors.
    pub async fn get(&self) -> Result<StoredCredentials> {
        let stored = match self.read_stored() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::debug!("Token file {:?} not usable: {}", self.token_path, e);
                return Ok(StoredCredentials::Unusable(e.to_string()));
            }
        };

        let client = load_client_config(&self.client_secrets_path)?;

        match self.refresh(&client, &stored.refresh_token).await {
            Ok(creds) => {
                tracing::info!("Using stored credentials from {}", self.token_path.display());
                Ok(StoredCredentials::Refreshed(creds))
            }
            Err(Error::TokenEndpoint { status, detail }) => {
                tracing::warn!(
                    "The stored credentials in {} cannot be refreshed ({}: {})",
                    self.token_path.display(),
                    status,
                    detail
                );
                Ok(StoredCredentials::Unusable(format!(
                    "refresh rejected by the token endpoint ({}): {}",
                    status, detail
                )))
            }
            Err(e) => Err(e),
        }
    }

    /// Persist the refresh token of `credentials`, overwriting the file
    pub fn put(&self, credentials: &Credentials) -> Result<()> {
        let refresh_token = credentials
            .refresh_token
            .as_deref()
            .ok_or(Error::MissingRefreshToken)?;

        if let Some(parent) = self.token_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(&StoredToken {
            refresh_token: refresh_token.to_string(),
        })?;
        std::fs::write(&self.token_path, content)?;

        // Set restrictive permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.token_path, perms)?;
        }

        tracing::info!("Refresh token stored in {}", self.token_path.display());
        Ok(())
    }

    /// Remove the token file. Returns whether a file was deleted.
    pub fn delete(&self) -> Result<bool> {
        if !self.token_path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.token_path)?;
        Ok(true)
    }

    fn read_stored(&self) -> Result<StoredToken> {
        let content = std::fs::read_to_string(&self.token_path)?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn refresh(&self, client: &ClientConfig, refresh_token: &str) -> Result<Credentials> {
        let request = RefreshRequest {
            client_id: &client.client_id,
            client_secret: &client.client_secret,
            refresh_token,
            grant_type: "refresh_token",
        };

        let response = request_token(&self.http, &client.token_uri, &request).await?;
        Ok(Credentials::from_response(
            CredentialKind::AuthorizedUser,
            response,
            Some(refresh_token),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_in(dir: &Path, token_uri: &str) -> TokenStore {
        let config = AuthConfig {
            token_path: dir.join("token.json"),
            ..AuthConfig::default().with_authfiles_dir(dir)
        };
        std::fs::write(
            &config.client_secrets_path,
            serde_json::json!({
                "web": {
                    "client_id": "cid",
                    "client_secret": "csecret",
                    "token_uri": token_uri
                }
            })
            .to_string(),
        )
        .unwrap();
        TokenStore::new(&config, Client::new())
    }

    fn user_credentials(refresh: Option<&str>) -> Credentials {
        Credentials::new(
            CredentialKind::AuthorizedUser,
            "ya29.access".to_string(),
            refresh.map(str::to_string),
            Some(3600),
        )
    }

    #[test]
    fn test_put_writes_only_refresh_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), "http://127.0.0.1:1/token");

        store.put(&user_credentials(Some("abc123"))).unwrap();

        let written = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(written, "{\n  \"refresh_token\": \"abc123\"\n}");
    }

    #[test]
    fn test_put_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), "http://127.0.0.1:1/token");
        std::fs::write(store.path(), r#"{"refresh_token": "old", "access_token": "x"}"#).unwrap();

        store.put(&user_credentials(Some("new"))).unwrap();

        let written = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(written, "{\n  \"refresh_token\": \"new\"\n}");
    }

    #[test]
    fn test_put_without_refresh_token_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), "http://127.0.0.1:1/token");

        let err = store.put(&user_credentials(None)).unwrap_err();
        assert!(matches!(err, Error::MissingRefreshToken));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), "http://127.0.0.1:1/token");
        assert!(!store.delete().unwrap());

        store.put(&user_credentials(Some("abc"))).unwrap();
        assert!(store.delete().unwrap());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_get_refreshes_stored_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=1%2F%2Fstored"))
            .and(body_string_contains("client_id=cid"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.fresh",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), &format!("{}/token", server.uri()));
        std::fs::write(store.path(), r#"{"refresh_token": "1//stored"}"#).unwrap();

        let StoredCredentials::Refreshed(creds) = store.get().await.unwrap() else {
            panic!("stored token was not refreshed");
        };
        assert_eq!(creds.access_token, "ya29.fresh");
        assert_eq!(creds.refresh_token.as_deref(), Some("1//stored"));
        assert_eq!(creds.kind, CredentialKind::AuthorizedUser);
    }

    #[tokio::test]
    async fn test_get_revoked_token_carries_endpoint_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Token has been expired or revoked."
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), &format!("{}/token", server.uri()));
        std::fs::write(store.path(), r#"{"refresh_token": "1//revoked"}"#).unwrap();

        match store.get().await.unwrap() {
            StoredCredentials::Unusable(reason) => {
                assert!(reason.contains("400"), "{reason}");
                assert!(reason.contains("invalid_grant"), "{reason}");
                assert!(reason.contains("Token has been expired or revoked."), "{reason}");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_malformed_token_file_is_unusable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), &format!("{}/token", server.uri()));

        std::fs::write(store.path(), "not json").unwrap();
        assert!(matches!(store.get().await.unwrap(), StoredCredentials::Unusable(_)));

        std::fs::write(store.path(), r#"{"token": "missing key"}"#).unwrap();
        assert!(matches!(store.get().await.unwrap(), StoredCredentials::Unusable(_)));

        std::fs::remove_file(store.path()).unwrap();
        assert!(matches!(store.get().await.unwrap(), StoredCredentials::Unusable(_)));
    }

    #[tokio::test]
    async fn test_get_without_web_client_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), "http://127.0.0.1:1/token");
        std::fs::write(dir.path().join("client-secrets.json"), r#"{"installed": {}}"#).unwrap();
        std::fs::write(store.path(), r#"{"refresh_token": "1//stored"}"#).unwrap();

        let err = store.get().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
