//! Credential acquisition for the Merchant API
//!
//! This module provides:
//! - Credential source selection (service account > stored token > browser)
//! - Service account authentication
//! - Refresh token storage and refresh
//! - The interactive OAuth2 flow and its one-shot callback server

mod callback_server;
mod client_secrets;
mod credentials;
mod flow;
mod flow_secrets;
mod resolver;
mod service_account;
mod token_endpoint;
mod token_store;

pub use callback_server::{CallbackServer, CALLBACK_PORT};
pub use client_secrets::{load_client_config, ClientConfig};
pub use credentials::{CredentialKind, Credentials};
pub use flow::OAuthFlow;
pub use flow_secrets::{AuthorizationState, PkcePair};
pub use resolver::{select_source, CredentialResolver, CredentialSource};
pub use service_account::ServiceAccountLoader;
pub use token_store::{StoredCredentials, TokenStore};
