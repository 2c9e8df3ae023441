//! Session error types

use thiserror::Error;

/// Standard result type for session operations
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Errors raised by the session core and its seams.
///
/// None of these escape to the display layer: the manager resolves every
/// failure into a state transition.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Credential store error: {0}")]
    Storage(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Token endpoint unreachable: {0}")]
    Transport(String),

    #[error("Token endpoint returned {status}: {message}")]
    TokenEndpoint { status: u16, message: String },

    #[error("Token response did not include an identity token")]
    MissingIdentityToken,

    #[error("No refresh token stored")]
    NoRefreshToken,

    #[error("No PKCE code verifier stored for authorization code")]
    MissingCodeVerifier,

    #[error("Provider rejected the sign-in: {0}")]
    Provider(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SessionError {
    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a navigation error
    pub fn navigation(message: impl Into<String>) -> Self {
        Self::Navigation(message.into())
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Whether this error came from the token endpoint exchange
    #[must_use]
    pub const fn is_token_failure(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::TokenEndpoint { .. }
                | Self::MissingIdentityToken
                | Self::NoRefreshToken
                | Self::Serialization(_)
        )
    }
}

impl From<config::ConfigError> for SessionError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}
