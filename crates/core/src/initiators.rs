//! Provider URLs that start and end a hosted session

use crate::config::{AuthFlow, SessionConfig};
use crate::error::SessionResult;
use url::Url;

/// `GET {domain}/oauth2/authorize?...`
///
/// `code_challenge` is only sent for the PKCE flow.
pub fn authorize_url(
    config: &SessionConfig,
    redirect_uri: &str,
    code_challenge: Option<&str>,
) -> SessionResult<Url> {
    let mut url = Url::parse(&format!("{}/oauth2/authorize", config.provider.base()))?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("response_type", config.flow.response_type())
            .append_pair("client_id", &config.provider.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", &config.provider.scope());
        if let (AuthFlow::AuthorizationCode, Some(challenge)) = (config.flow, code_challenge) {
            query
                .append_pair("code_challenge_method", "S256")
                .append_pair("code_challenge", challenge);
        }
    }
    Ok(url)
}

/// `GET {domain}/logout?client_id=...&logout_uri=...`
pub fn logout_url(config: &SessionConfig, logout_uri: &str) -> SessionResult<Url> {
    let mut url = Url::parse(&format!("{}/logout", config.provider.base()))?;
    url.query_pairs_mut()
        .append_pair("client_id", &config.provider.client_id)
        .append_pair("logout_uri", logout_uri);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig::new("https://auth.example.com/", "client-1")
    }

    #[test]
    fn test_implicit_authorize_url() {
        let url = authorize_url(&config(), "https://portal.example.com/", None).unwrap();
        assert_eq!(
            url.as_str(),
            "https://auth.example.com/oauth2/authorize?response_type=token&client_id=client-1\
             &redirect_uri=https%3A%2F%2Fportal.example.com%2F&scope=openid+profile+email"
        );
    }

    #[test]
    fn test_implicit_ignores_challenge() {
        let url = authorize_url(&config(), "https://portal.example.com/", Some("abc")).unwrap();
        assert!(!url.as_str().contains("code_challenge"));
    }

    #[test]
    fn test_pkce_authorize_url() {
        let config = config().with_flow(AuthFlow::AuthorizationCode);
        let url = authorize_url(&config, "https://portal.example.com/", Some("chal")).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&("code_challenge_method".into(), "S256".into())));
        assert!(pairs.contains(&("code_challenge".into(), "chal".into())));
    }

    #[test]
    fn test_logout_url() {
        let url = logout_url(&config(), "https://portal.example.com/").unwrap();
        assert_eq!(
            url.as_str(),
            "https://auth.example.com/logout?client_id=client-1\
             &logout_uri=https%3A%2F%2Fportal.example.com%2F"
        );
    }
}
