//! Redirect parsing
//!
//! Recognizes what the identity provider delivered when it sent the browser
//! back: tokens in the fragment (implicit flow), a one-time code in the query
//! (PKCE flow) or an error report.

use url::Url;
use url::form_urlencoded;

/// What a page address carries
#[derive(Clone, PartialEq, Eq)]
pub enum RedirectPayload {
    /// Nothing provider-related
    Nothing,
    /// Implicit-style delivery
    Tokens {
        identity_token: String,
        access_token: Option<String>,
        refresh_token: Option<String>,
        /// `None` when absent or not a number
        expires_in: Option<u64>,
    },
    /// Code-exchange delivery
    AuthorizationCode { code: String },
    /// The provider refused or failed the sign-in
    ProviderError {
        error: String,
        description: Option<String>,
    },
}

impl std::fmt::Debug for RedirectPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nothing => f.write_str("Nothing"),
            Self::Tokens {
                refresh_token,
                expires_in,
                ..
            } => f
                .debug_struct("Tokens")
                .field("has_refresh_token", &refresh_token.is_some())
                .field("expires_in", expires_in)
                .finish_non_exhaustive(),
            Self::AuthorizationCode { .. } => f.write_str("AuthorizationCode"),
            Self::ProviderError { error, description } => f
                .debug_struct("ProviderError")
                .field("error", error)
                .field("description", description)
                .finish(),
        }
    }
}

#[derive(Default)]
struct Params {
    id_token: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<String>,
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl Params {
    fn parse(raw: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_ref() {
                "id_token" => &mut params.id_token,
                "access_token" => &mut params.access_token,
                "refresh_token" => &mut params.refresh_token,
                "expires_in" => &mut params.expires_in,
                "code" => &mut params.code,
                "error" => &mut params.error,
                "error_description" => &mut params.error_description,
                _ => continue,
            };
            slot.get_or_insert_with(|| value.into_owned());
        }
        params
    }

    fn provider_error(&mut self) -> Option<RedirectPayload> {
        self.error.take().map(|error| RedirectPayload::ProviderError {
            error,
            description: self.error_description.take(),
        })
    }
}

/// Inspect an address for a provider delivery.
///
/// The fragment is checked before the query. In the fragment the identity
/// token falls back to `access_token` when `id_token` is missing.
#[must_use]
pub fn parse_redirect(url: &Url) -> RedirectPayload {
    if let Some(fragment) = url.fragment().filter(|f| !f.is_empty()) {
        let mut params = Params::parse(fragment);
        if let Some(identity_token) = params.id_token.take().or_else(|| params.access_token.clone())
        {
            return RedirectPayload::Tokens {
                identity_token,
                access_token: params.access_token,
                refresh_token: params.refresh_token,
                expires_in: params.expires_in.and_then(|v| v.trim().parse().ok()),
            };
        }
        if let Some(error) = params.provider_error() {
            return error;
        }
    }

    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        let mut params = Params::parse(query);
        if let Some(code) = params.code.take() {
            return RedirectPayload::AuthorizationCode { code };
        }
        if let Some(error) = params.provider_error() {
            return error;
        }
    }

    RedirectPayload::Nothing
}

/// Same address with query and fragment removed
#[must_use]
pub fn scrubbed(url: &Url) -> Url {
    let mut clean = url.clone();
    clean.set_query(None);
    clean.set_fragment(None);
    clean
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn test_plain_address_is_nothing() {
        assert_eq!(
            parse_redirect(&url("https://portal.example.com/")),
            RedirectPayload::Nothing
        );
    }

    #[test]
    fn test_fragment_with_id_token() {
        let payload = parse_redirect(&url(
            "https://portal.example.com/#id_token=abc&expires_in=3600&token_type=Bearer",
        ));
        assert_eq!(
            payload,
            RedirectPayload::Tokens {
                identity_token: "abc".into(),
                access_token: None,
                refresh_token: None,
                expires_in: Some(3600),
            }
        );
    }

    #[test]
    fn test_fragment_access_token_only_becomes_identity() {
        let payload = parse_redirect(&url(
            "https://portal.example.com/#access_token=xyz&refresh_token=r1",
        ));
        assert_eq!(
            payload,
            RedirectPayload::Tokens {
                identity_token: "xyz".into(),
                access_token: Some("xyz".into()),
                refresh_token: Some("r1".into()),
                expires_in: None,
            }
        );
    }

    #[test]
    fn test_garbled_expires_in_is_dropped() {
        let payload = parse_redirect(&url("https://portal.example.com/#id_token=abc&expires_in=soon"));
        assert!(matches!(
            payload,
            RedirectPayload::Tokens {
                expires_in: None,
                ..
            }
        ));
    }

    #[test]
    fn test_fragment_without_tokens_is_nothing() {
        assert_eq!(
            parse_redirect(&url("https://portal.example.com/#section-2")),
            RedirectPayload::Nothing
        );
    }

    #[test]
    fn test_query_code() {
        assert_eq!(
            parse_redirect(&url("https://portal.example.com/?code=c-123&state=s")),
            RedirectPayload::AuthorizationCode {
                code: "c-123".into()
            }
        );
    }

    #[test]
    fn test_provider_error_in_query() {
        let payload = parse_redirect(&url(
            "https://portal.example.com/?error=access_denied&error_description=User+cancelled",
        ));
        assert_eq!(
            payload,
            RedirectPayload::ProviderError {
                error: "access_denied".into(),
                description: Some("User cancelled".into()),
            }
        );
    }

    #[test]
    fn test_scrubbed_keeps_path() {
        let clean = scrubbed(&url("https://portal.example.com/app/?code=c#id_token=abc"));
        assert_eq!(clean.as_str(), "https://portal.example.com/app/");
    }

    #[test]
    fn test_debug_hides_tokens() {
        let payload = parse_redirect(&url("https://portal.example.com/#id_token=secret"));
        assert!(!format!("{payload:?}").contains("secret"));
    }
}
