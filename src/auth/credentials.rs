//! Bearer credentials handed to API callers
//!
//! Only the refresh token ever reaches disk (see `TokenStore`); the access
//! token lives for the process lifetime.

use chrono::{DateTime, Utc};
use super::token_endpoint::TokenResponse;

/// Which kind of identity produced the credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// Non-interactive service account key
    ServiceAccount,
    /// End user authorized through the browser, possibly on an earlier run
    AuthorizedUser,
}

/// OAuth2 credentials with access and refresh tokens
#[derive(Debug, Clone)]
pub struct Credentials {
    /// The access token for API requests
    pub access_token: String,

    /// The refresh token for obtaining new access tokens
    pub refresh_token: Option<String>,

    /// Token type (usually "Bearer")
    pub token_type: String,

    /// When the access token expires
    pub expires_at: Option<DateTime<Utc>>,

    /// Scopes granted
    pub scope: Option<String>,

    pub kind: CredentialKind,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl Credentials {
    /// Create new credentials from token values
    pub fn new(
        kind: CredentialKind,
        access_token: String,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
    ) -> Self {
        let expires_at = expires_in_secs.map(|secs| {
            Utc::now() + chrono::Duration::seconds(secs)
        });

        Self {
            access_token,
            refresh_token,
            token_type: default_token_type(),
            expires_at,
            scope: None,
            kind,
        }
    }

    /// Build credentials from a token endpoint response.
    ///
    /// Refresh responses usually omit the refresh token, so the one that was
    /// used for the request is carried over.
    pub(crate) fn from_response(
        kind: CredentialKind,
        response: TokenResponse,
        previous_refresh_token: Option<&str>,
    ) -> Self {
        let refresh_token = response
            .refresh_token
            .or_else(|| previous_refresh_token.map(str::to_string));

        let mut creds = Self::new(kind, response.access_token, refresh_token, response.expires_in);
        if let Some(token_type) = response.token_type {
            creds.token_type = token_type;
        }
        creds.scope = response.scope;
        creds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(refresh: Option<&str>) -> TokenResponse {
        TokenResponse {
            access_token: "ya29.access".to_string(),
            refresh_token: refresh.map(str::to_string),
            expires_in: Some(3599),
            token_type: Some("Bearer".to_string()),
            scope: Some("https://www.googleapis.com/auth/content".to_string()),
        }
    }

    #[test]
    fn test_expiry_from_expires_in() {
        let creds = Credentials::new(
            CredentialKind::AuthorizedUser,
            "test_token".to_string(),
            Some("refresh".to_string()),
            Some(3600),
        );
        let remaining = creds.expires_at.unwrap() - Utc::now();
        assert!(remaining > chrono::Duration::minutes(59));
        assert_eq!(creds.token_type, "Bearer");
    }

    #[test]
    fn test_refresh_token_carried_over() {
        let creds = Credentials::from_response(
            CredentialKind::AuthorizedUser,
            response(None),
            Some("1//stored"),
        );
        assert_eq!(creds.refresh_token.as_deref(), Some("1//stored"));
    }

    #[test]
    fn test_new_refresh_token_wins() {
        let creds = Credentials::from_response(
            CredentialKind::AuthorizedUser,
            response(Some("1//fresh")),
            Some("1//stored"),
        );
        assert_eq!(creds.refresh_token.as_deref(), Some("1//fresh"));
    }

    #[test]
    fn test_response_fields_copied() {
        let creds = Credentials::from_response(CredentialKind::ServiceAccount, response(None), None);
        assert_eq!(creds.access_token, "ya29.access");
        assert_eq!(creds.scope.as_deref(), Some("https://www.googleapis.com/auth/content"));
        assert!(creds.refresh_token.is_none());
    }
}
