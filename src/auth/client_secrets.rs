//! OAuth2 client secrets document
//!
//! Only the `web` application client type is supported; the redirect back to
//! `http://127.0.0.1:<port>` must be listed under the client's authorized
//! redirect URIs in the cloud console.

use serde::Deserialize;
use std::path::Path;
use crate::Result;
use crate::error::Error;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// The `web` entry of a client secrets document
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token_uri: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

impl ClientConfig {
    /// Whether `uri` is listed under the client's redirect URIs, ignoring a
    /// trailing slash. A document that lists none accepts anything.
    pub fn allows_redirect(&self, uri: &str) -> bool {
        self.redirect_uris.is_empty()
            || self
                .redirect_uris
                .iter()
                .any(|registered| registered.trim_end_matches('/') == uri.trim_end_matches('/'))
    }
}

#[derive(Deserialize)]
struct ClientSecretsDocument {
    web: Option<serde_json::Value>,
}

/// Load the `web` client configuration.
///
/// A missing file, unparseable JSON, or a document without a `web` entry are
/// all configuration errors.
pub fn load_client_config(path: &Path) -> Result<ClientConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Cannot read client secrets {}: {}", path.display(), e))
    })?;

    let document: ClientSecretsDocument = serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Malformed client secrets {}: {}", path.display(), e))
    })?;

    let web = document.web.ok_or_else(|| {
        Error::Config(format!(
            "{} has no \"web\" client entry; only web application OAuth2 clients are supported",
            path.display()
        ))
    })?;

    serde_json::from_value(web).map_err(|e| {
        Error::Config(format!("Incomplete \"web\" client in {}: {}", path.display(), e))
    })
}
