//! Credential and session state types

use crate::error::{SessionError, SessionResult};
use crate::token::TokenResponse;
use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch
pub type EpochMillis = i64;

/// Lifetime assumed when the provider does not say how long a token lives
pub const DEFAULT_LIFETIME_SECS: u64 = 3600;

/// The unit of authentication state.
///
/// A set always carries a non-empty identity token and an absolute expiry
/// computed at the moment the tokens were received.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSet {
    pub identity_token: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: EpochMillis,
}

impl CredentialSet {
    /// Build a set from freshly delivered tokens.
    ///
    /// `expires_at` is `now + lifetime_secs * 1000`. An empty access token
    /// falls back to the identity token.
    pub fn issue(
        identity_token: impl Into<String>,
        access_token: Option<String>,
        refresh_token: Option<String>,
        lifetime_secs: u64,
        now: EpochMillis,
    ) -> SessionResult<Self> {
        let identity_token = identity_token.into();
        if identity_token.is_empty() {
            return Err(SessionError::MissingIdentityToken);
        }

        let access_token = access_token
            .filter(|token| !token.is_empty())
            .unwrap_or_else(|| identity_token.clone());
        let lifetime_ms = i64::try_from(lifetime_secs.saturating_mul(1000)).unwrap_or(i64::MAX);

        Ok(Self {
            identity_token,
            access_token,
            refresh_token: refresh_token.filter(|token| !token.is_empty()),
            expires_at: now.saturating_add(lifetime_ms),
        })
    }

    /// Build a set from a token endpoint response.
    ///
    /// The refresh token in the response wins; otherwise `previous_refresh`
    /// is carried over verbatim.
    pub fn from_token_response(
        response: TokenResponse,
        previous_refresh: Option<String>,
        default_lifetime_secs: u64,
        now: EpochMillis,
    ) -> SessionResult<Self> {
        let identity_token = response
            .id_token
            .filter(|token| !token.is_empty())
            .ok_or(SessionError::MissingIdentityToken)?;
        let refresh_token = response
            .refresh_token
            .filter(|token| !token.is_empty())
            .or(previous_refresh);

        Self::issue(
            identity_token,
            response.access_token,
            refresh_token,
            response.expires_in.unwrap_or(default_lifetime_secs),
            now,
        )
    }

    /// Whether the identity token has passed its expiry
    #[must_use]
    pub const fn is_expired(&self, now: EpochMillis) -> bool {
        now >= self.expires_at
    }

    /// Milliseconds left before expiry, negative once lapsed
    #[must_use]
    pub const fn remaining_ms(&self, now: EpochMillis) -> i64 {
        self.expires_at.saturating_sub(now)
    }
}

// Token material never goes into logs.
impl std::fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSet")
            .field("identity_token", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Raw view of what the credential store currently holds.
///
/// Every field is optional because the store is shared with other tabs and
/// may have been cleared or corrupted under us.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StoredCredentials {
    pub identity_token: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<EpochMillis>,
}

impl StoredCredentials {
    /// Nothing worth evaluating: no identity token and nothing to refresh with
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        self.identity_token.is_none() && self.refresh_token.is_none()
    }

    /// Convert to a well-formed set, if identity token and expiry are both present
    #[must_use]
    pub fn to_credential_set(&self) -> Option<CredentialSet> {
        let identity_token = self.identity_token.clone()?;
        let expires_at = self.expires_at?;
        Some(CredentialSet {
            access_token: self
                .access_token
                .clone()
                .unwrap_or_else(|| identity_token.clone()),
            identity_token,
            refresh_token: self.refresh_token.clone(),
            expires_at,
        })
    }
}

impl std::fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("has_identity_token", &self.identity_token.is_some())
            .field("has_access_token", &self.access_token.is_some())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Session state machine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No usable credentials
    #[default]
    Unauthenticated,
    /// Credentials held and judged fresh
    Authenticated(CredentialSet),
    /// A token endpoint call is in flight
    Refreshing {
        /// The set being replaced, kept visible until it lapses
        previous: Option<CredentialSet>,
    },
}

impl SessionState {
    /// Short name for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated(_) => "authenticated",
            Self::Refreshing { .. } => "refreshing",
        }
    }

    /// Credentials backing the current state, if any
    #[must_use]
    pub const fn credentials(&self) -> Option<&CredentialSet> {
        match self {
            Self::Authenticated(set) => Some(set),
            Self::Refreshing { previous } => previous.as_ref(),
            Self::Unauthenticated => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: EpochMillis = 1_700_000_000_000;

    #[test]
    fn test_issue_computes_expiry_from_lifetime() {
        let set = CredentialSet::issue("abc", None, None, 3600, NOW).unwrap();
        assert_eq!(set.expires_at, NOW + 3_600_000);
        assert_eq!(set.access_token, "abc");
        assert!(set.refresh_token.is_none());
    }

    #[test]
    fn test_issue_rejects_empty_identity_token() {
        let result = CredentialSet::issue("", Some("access".into()), None, 3600, NOW);
        assert!(matches!(result, Err(SessionError::MissingIdentityToken)));
    }

    #[test]
    fn test_from_token_response_keeps_previous_refresh_token() {
        let response = TokenResponse {
            id_token: Some("t2".into()),
            access_token: Some("a2".into()),
            refresh_token: None,
            expires_in: Some(600),
        };
        let set =
            CredentialSet::from_token_response(response, Some("r1".into()), 3600, NOW).unwrap();
        assert_eq!(set.identity_token, "t2");
        assert_eq!(set.access_token, "a2");
        assert_eq!(set.refresh_token.as_deref(), Some("r1"));
        assert_eq!(set.expires_at, NOW + 600_000);
    }

    #[test]
    fn test_from_token_response_prefers_rotated_refresh_token() {
        let response = TokenResponse {
            id_token: Some("t2".into()),
            access_token: None,
            refresh_token: Some("r2".into()),
            expires_in: None,
        };
        let set =
            CredentialSet::from_token_response(response, Some("r1".into()), 3600, NOW).unwrap();
        assert_eq!(set.refresh_token.as_deref(), Some("r2"));
        assert_eq!(set.access_token, "t2");
        assert_eq!(set.expires_at, NOW + 3_600_000);
    }

    #[test]
    fn test_from_token_response_without_id_token_fails() {
        let response = TokenResponse {
            id_token: None,
            access_token: Some("a2".into()),
            refresh_token: None,
            expires_in: Some(3600),
        };
        let result = CredentialSet::from_token_response(response, None, 3600, NOW);
        assert!(matches!(result, Err(SessionError::MissingIdentityToken)));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let set = CredentialSet::issue("secret-id", None, Some("secret-r".into()), 60, NOW)
            .unwrap();
        let rendered = format!("{set:?}");
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_stored_credentials_without_expiry_is_not_a_set() {
        let stored = StoredCredentials {
            identity_token: Some("abc".into()),
            ..StoredCredentials::default()
        };
        assert!(!stored.is_absent());
        assert!(stored.to_credential_set().is_none());
    }
}
