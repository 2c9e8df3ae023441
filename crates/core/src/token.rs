//! Token endpoint contract

use crate::error::SessionResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// JSON body returned by the provider's token endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// What is being traded in at the token endpoint
#[derive(Clone, PartialEq, Eq)]
pub enum TokenGrant {
    RefreshToken {
        refresh_token: String,
    },
    AuthorizationCode {
        code: String,
        code_verifier: String,
    },
}

impl TokenGrant {
    /// OAuth2 `grant_type` value
    #[must_use]
    pub const fn grant_type(&self) -> &'static str {
        match self {
            Self::RefreshToken { .. } => "refresh_token",
            Self::AuthorizationCode { .. } => "authorization_code",
        }
    }
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TokenGrant").field(&self.grant_type()).finish()
    }
}

/// A single token endpoint exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub client_id: String,
    /// Must match the redirect URI used at login exactly
    pub redirect_uri: String,
    pub grant: TokenGrant,
}

impl TokenRequest {
    /// Form-encoded body fields, in the order the provider documents them
    #[must_use]
    pub fn form_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![
            ("grant_type", self.grant.grant_type()),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        match &self.grant {
            TokenGrant::RefreshToken { refresh_token } => {
                fields.push(("refresh_token", refresh_token.as_str()));
            }
            TokenGrant::AuthorizationCode {
                code,
                code_verifier,
            } => {
                fields.push(("code", code.as_str()));
                fields.push(("code_verifier", code_verifier.as_str()));
            }
        }
        fields
    }
}

/// Performs token endpoint exchanges (refresh and code exchange).
///
/// Implementations report every failure as an error; the caller does not
/// distinguish between revoked, expired or unreachable.
#[async_trait(?Send)]
pub trait TokenEndpoint {
    async fn request_tokens(&self, request: &TokenRequest) -> SessionResult<TokenResponse>;
}
