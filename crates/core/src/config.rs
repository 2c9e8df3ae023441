//! Session configuration

use crate::types::DEFAULT_LIFETIME_SECS;
use config::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Which redirect flow `login()` starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthFlow {
    /// Tokens delivered in the address fragment
    #[default]
    Implicit,
    /// One-time code in the query, exchanged with a PKCE verifier
    #[serde(rename = "pkce", alias = "code")]
    AuthorizationCode,
}

impl AuthFlow {
    /// `response_type` sent to the authorization endpoint
    #[must_use]
    pub const fn response_type(self) -> &'static str {
        match self {
            Self::Implicit => "token",
            Self::AuthorizationCode => "code",
        }
    }
}

impl std::str::FromStr for AuthFlow {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "implicit" | "token" => Ok(Self::Implicit),
            "pkce" | "code" => Ok(Self::AuthorizationCode),
            other => Err(ConfigError::Message(format!("Unknown auth flow '{other}'"))),
        }
    }
}

/// Identity provider coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider base address, e.g. `https://auth.example.com`
    pub domain: String,

    /// Registered client identifier
    pub client_id: String,

    /// Requested scopes
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            client_id: String::new(),
            scopes: default_scopes(),
        }
    }
}

impl ProviderConfig {
    /// Provider domain without a trailing slash
    #[must_use]
    pub fn base(&self) -> &str {
        self.domain.trim_end_matches('/')
    }

    /// Scopes joined the way the authorization endpoint expects
    #[must_use]
    pub fn scope(&self) -> String {
        self.scopes.join(" ")
    }
}

/// Main session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub provider: ProviderConfig,

    #[serde(default)]
    pub flow: AuthFlow,

    /// When false, an expiring session is dropped instead of refreshed
    #[serde(default = "default_true")]
    pub supports_refresh: bool,

    /// Redirect URI override; defaults to the current origin root
    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// Expiry monitor period
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// How close to expiry a refresh is triggered
    #[serde(default = "default_margin")]
    pub refresh_margin_secs: u64,

    /// Lifetime assumed when the provider omits `expires_in`
    #[serde(default = "default_lifetime")]
    pub default_lifetime_secs: u64,
}

fn default_scopes() -> Vec<String> {
    vec!["openid".into(), "profile".into(), "email".into()]
}

const fn default_true() -> bool {
    true
}

const fn default_check_interval() -> u64 {
    60
}

const fn default_margin() -> u64 {
    60
}

const fn default_lifetime() -> u64 {
    DEFAULT_LIFETIME_SECS
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            flow: AuthFlow::default(),
            supports_refresh: default_true(),
            redirect_uri: None,
            check_interval_secs: default_check_interval(),
            refresh_margin_secs: default_margin(),
            default_lifetime_secs: default_lifetime(),
        }
    }
}

impl SessionConfig {
    /// Config for a provider with every other setting defaulted
    pub fn new(domain: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            provider: ProviderConfig {
                domain: domain.into(),
                client_id: client_id.into(),
                scopes: default_scopes(),
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_flow(mut self, flow: AuthFlow) -> Self {
        self.flow = flow;
        self
    }

    #[must_use]
    pub const fn with_refresh(mut self, supports_refresh: bool) -> Self {
        self.supports_refresh = supports_refresh;
        self
    }

    #[must_use]
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    /// Load configuration with defaults and `DEVPORTAL__*` environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables cannot be parsed or the
    /// result does not validate
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(config::Environment::with_prefix("DEVPORTAL"))
    }

    fn load(environment: config::Environment) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let settings = config::Config::builder()
            .set_default("provider.domain", defaults.provider.domain)?
            .set_default("provider.client_id", defaults.provider.client_id)?
            .set_default("provider.scopes", defaults.provider.scopes)?
            .set_default("flow", "implicit")?
            .set_default("supports_refresh", defaults.supports_refresh)?
            .set_default("check_interval_secs", defaults.check_interval_secs)?
            .set_default("refresh_margin_secs", defaults.refresh_margin_secs)?
            .set_default("default_lifetime_secs", defaults.default_lifetime_secs)?
            .add_source(
                environment
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("provider.scopes")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.client_id.trim().is_empty() {
            return Err(ConfigError::Message(
                "provider.client_id must not be empty".into(),
            ));
        }

        let domain = Url::parse(self.provider.base()).map_err(|e| {
            ConfigError::Message(format!(
                "provider.domain '{}' is not a valid URL: {e}",
                self.provider.domain
            ))
        })?;
        if !matches!(domain.scheme(), "http" | "https") {
            return Err(ConfigError::Message(format!(
                "provider.domain must be http(s), got '{}'",
                domain.scheme()
            )));
        }

        if let Some(redirect) = &self.redirect_uri {
            Url::parse(redirect).map_err(|e| {
                ConfigError::Message(format!("redirect_uri '{redirect}' is not a valid URL: {e}"))
            })?;
        }

        if self.check_interval_secs == 0 {
            return Err(ConfigError::Message(
                "check_interval_secs must be greater than zero".into(),
            ));
        }

        if self.refresh_margin_secs >= self.default_lifetime_secs {
            return Err(ConfigError::Message(format!(
                "refresh_margin_secs ({}) must be below default_lifetime_secs ({})",
                self.refresh_margin_secs, self.default_lifetime_secs
            )));
        }

        Ok(())
    }

    #[must_use]
    pub const fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Refresh margin in milliseconds
    #[must_use]
    pub fn refresh_margin_ms(&self) -> i64 {
        i64::try_from(self.refresh_margin_secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::new("https://auth.example.com", "client");
        assert_eq!(config.flow, AuthFlow::Implicit);
        assert!(config.supports_refresh);
        assert_eq!(config.check_interval(), Duration::from_secs(60));
        assert_eq!(config.refresh_margin_ms(), 60_000);
        assert_eq!(config.provider.scope(), "openid profile email");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_client_id() {
        let config = SessionConfig::new("https://auth.example.com", "  ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_placeholder_domain() {
        let config = SessionConfig::new("<COGNITO_DOMAIN>", "client");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = SessionConfig::new("https://auth.example.com", "client");
        config.check_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_margin_past_lifetime() {
        let mut config = SessionConfig::new("https://auth.example.com", "client");
        config.refresh_margin_secs = 3600;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provider_base_trims_slash() {
        let config = SessionConfig::new("https://auth.example.com/", "client");
        assert_eq!(config.provider.base(), "https://auth.example.com");
    }

    #[test]
    fn test_flow_parsing() {
        assert_eq!("pkce".parse::<AuthFlow>().unwrap(), AuthFlow::AuthorizationCode);
        assert_eq!("Implicit".parse::<AuthFlow>().unwrap(), AuthFlow::Implicit);
        assert!("saml".parse::<AuthFlow>().is_err());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: SessionConfig = serde_json::from_str(
            r#"{"provider":{"domain":"https://auth.example.com","client_id":"c"},"flow":"pkce"}"#,
        )
        .unwrap();
        assert_eq!(config.flow, AuthFlow::AuthorizationCode);
        assert_eq!(config.provider.scopes.len(), 3);
        assert_eq!(config.default_lifetime_secs, 3600);
    }

    fn environment(vars: &[(&str, &str)]) -> config::Environment {
        let source = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        config::Environment::with_prefix("DEVPORTAL").source(Some(source))
    }

    #[test]
    fn test_load_from_environment() {
        let config = SessionConfig::load(environment(&[
            ("DEVPORTAL__PROVIDER__DOMAIN", "https://auth.example.com"),
            ("DEVPORTAL__PROVIDER__CLIENT_ID", "client-1"),
            ("DEVPORTAL__PROVIDER__SCOPES", "openid,email"),
            ("DEVPORTAL__FLOW", "pkce"),
            ("DEVPORTAL__SUPPORTS_REFRESH", "false"),
        ]))
        .unwrap();

        assert_eq!(config.provider.client_id, "client-1");
        assert_eq!(config.provider.scope(), "openid email");
        assert_eq!(config.flow, AuthFlow::AuthorizationCode);
        assert!(!config.supports_refresh);
        assert_eq!(config.check_interval_secs, 60);
    }

    #[test]
    fn test_load_without_provider_fails_validation() {
        assert!(SessionConfig::load(environment(&[])).is_err());
    }
}
