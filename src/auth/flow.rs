//! Interactive OAuth2 authorization code flow
//!
//! Binds the callback listener, shows the consent URL, waits for the
//! redirect, exchanges the code, and stores the resulting refresh token.

use reqwest::Client;
use serde::Serialize;
use std::net::SocketAddr;
use std::time::Duration;
use url::Url;
use crate::Result;
use crate::config::AuthConfig;
use crate::error::Error;
use crate::ui;
use super::callback_server::CallbackServer;
use super::client_secrets::{load_client_config, ClientConfig};
use super::credentials::{CredentialKind, Credentials};
use super::flow_secrets::{AuthorizationState, PkcePair};
use super::token_endpoint::request_token;
use super::token_store::TokenStore;

/// Token exchange request
#[derive(Debug, Serialize)]
struct TokenExchangeRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    code_verifier: &'a str,
    redirect_uri: &'a str,
    grant_type: &'a str,
}

/// Drives one browser consent round trip
pub struct OAuthFlow {
    client: ClientConfig,
    scope: String,
    callback_addr: SocketAddr,
    callback_timeout: Option<Duration>,
    store: TokenStore,
    http: Client,
}

impl OAuthFlow {
    /// Load the `web` client from the configured secrets document
    pub fn new(config: &AuthConfig, http: Client) -> Result<Self> {
        let client = load_client_config(&config.client_secrets_path)?;
        Ok(Self {
            client,
            scope: config.scope.clone(),
            callback_addr: config.callback_addr(),
            callback_timeout: config.callback_timeout(),
            store: TokenStore::new(config, http.clone()),
            http,
        })
    }

    /// Run the flow, printing the consent URL for the operator
    pub async fn run(&self) -> Result<Credentials> {
        self.run_with(present_authorization_url).await
    }

    /// Run the flow, handing the consent URL and its redirect URI to `present`
    pub async fn run_with<P: FnOnce(&str, &str)>(&self, present: P) -> Result<Credentials> {
        let state = AuthorizationState::generate();
        let pkce = PkcePair::generate();

        // Bind before showing the URL so a busy port fails fast
        let server = CallbackServer::bind(self.callback_addr)?;
        let redirect_uri = server.redirect_uri();

        if !self.client.allows_redirect(&redirect_uri) {
            tracing::warn!("{} is not a registered redirect URI", redirect_uri);
            ui::print_prompt_warning(&format!(
                "{} is not among the client's authorized redirect URIs; the provider will refuse the redirect",
                redirect_uri
            ));
        }

        let auth_url = self.build_auth_url(&redirect_uri, &state, &pkce.challenge)?;
        present(&auth_url, &redirect_uri);

        let raw_code = server.wait_for_code(state.as_str(), self.callback_timeout).await?;
        let code = urlencoding::decode(&raw_code)
            .map_err(|e| Error::OAuth(format!("Authorization code is not valid UTF-8: {}", e)))?;

        tracing::info!("Authorization code received, exchanging for tokens");
        let creds = self.exchange_code(&code, &pkce.verifier, &redirect_uri).await?;

        self.store.put(&creds)?;
        Ok(creds)
    }

    /// Build the authorization URL
    fn build_auth_url(
        &self,
        redirect_uri: &str,
        state: &AuthorizationState,
        code_challenge: &str,
    ) -> Result<String> {
        let mut url = Url::parse(&self.client.auth_uri)
            .map_err(|e| Error::Config(format!("Invalid auth_uri in client secrets: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", &self.scope)
            .append_pair("state", state.as_str())
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent")
            .append_pair("include_granted_scopes", "true");

        Ok(url.to_string())
    }

    /// Exchange authorization code for tokens
    async fn exchange_code(&self, code: &str, code_verifier: &str, redirect_uri: &str) -> Result<Credentials> {
        let request = TokenExchangeRequest {
            client_id: &self.client.client_id,
            client_secret: &self.client.client_secret,
            code,
            code_verifier,
            redirect_uri,
            grant_type: "authorization_code",
        };

        let response = request_token(&self.http, &self.client.token_uri, &request)
            .await
            .map_err(|e| match e {
                Error::TokenEndpoint { status, detail } => {
                    Error::OAuth(format!("Token exchange failed ({}): {}", status, detail))
                }
                other => other,
            })?;

        Ok(Credentials::from_response(CredentialKind::AuthorizedUser, response, None))
    }
}

fn present_authorization_url(url: &str, redirect_uri: &str) {
    eprintln!();
    ui::print_prompt("Paste this URL into your browser:");
    eprintln!("\n{}\n", url);
    ui::print_waiting(&format!("Waiting for authorization and callback to: {}", redirect_uri));
}
