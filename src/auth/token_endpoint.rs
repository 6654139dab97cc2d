//! OAuth2 token endpoint requests
//!
//! The refresh and authorization code grants are form POSTs that answer with
//! the same JSON shape.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use crate::Result;
use crate::error::Error;

/// Token endpoint success response
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Token endpoint error body (RFC 6749 section 5.2)
#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// POST a grant to the token endpoint.
///
/// A non-2xx answer becomes [`Error::TokenEndpoint`]; transport failures stay
/// [`Error::Http`] so callers can tell a rejected grant from a dead network.
pub(crate) async fn request_token<F: Serialize + ?Sized>(
    http: &Client,
    token_uri: &str,
    form: &F,
) -> Result<TokenResponse> {
    tracing::debug!("POST {}", token_uri);

    let response = http.post(token_uri).form(form).send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await?;
        return Err(Error::TokenEndpoint {
            status: status.as_u16(),
            detail: describe_error_body(&body),
        });
    }

    Ok(response.json().await?)
}

fn describe_error_body(body: &str) -> String {
    match serde_json::from_str::<TokenErrorBody>(body) {
        Ok(TokenErrorBody { error, error_description: Some(description) }) => {
            format!("{}: {}", error, description)
        }
        Ok(TokenErrorBody { error, error_description: None }) => error,
        Err(_) => body.trim().to_string(),
    }
}
