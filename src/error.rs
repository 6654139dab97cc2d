//! Error types for merchant-auth

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for merchant-auth operations
pub type Result<T> = std::result::Result<T, Error>;

const SETUP_HINT: &str =
    "Please read the note about OAuth2 client IDs and service accounts in the top-level README.";

/// Errors that can occur while acquiring credentials
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Service account file, token file, and client secrets file do not exist")]
    NoCredentialSource,

    #[error("Service account error: {0}")]
    ServiceAccount(String),

    #[error("The stored credentials in the file {} cannot be used: {reason}", .path.display())]
    StoredTokenUnusable { path: PathBuf, reason: String },

    #[error("Token endpoint returned {status}: {detail}")]
    TokenEndpoint { status: u16, detail: String },

    #[error("Token response did not include a refresh token")]
    MissingRefreshToken,

    #[error("Failed to start callback server on {addr}: {source}")]
    CallbackBind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("No authorization callback received within {0:?}")]
    CallbackTimeout(Duration),

    #[error("Malformed callback request: {0}")]
    CallbackParse(String),

    #[error("Failed to retrieve authorization code. Error: {0}")]
    AuthorizationDenied(String),

    #[error("State token does not match the expected state.")]
    StateMismatch,

    #[error("OAuth error: {0}")]
    OAuth(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Human-facing next step for errors the operator can fix locally
    pub fn remediation(&self) -> Option<String> {
        match self {
            Error::Config(_) | Error::NoCredentialSource | Error::ServiceAccount(_) => {
                Some(SETUP_HINT.to_string())
            }
            Error::StoredTokenUnusable { path, .. } => Some(format!(
                "Delete `{}` (or run `merchant-auth logout`) and retry.",
                path.display()
            )),
            Error::CallbackBind { addr, .. } => Some(format!(
                "Another process is using {}. Finish or cancel the other authorization first.",
                addr
            )),
            _ => None,
        }
    }
}
