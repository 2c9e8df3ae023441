//! Frontend configuration

use devportal_core::{AuthFlow, SessionConfig, SessionError, SessionResult};

/// Settings baked into the browser bundle at build time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    pub session: SessionConfig,
    /// Backend base handed to display panels; may be origin-relative
    pub api_base: String,
}

impl PortalConfig {
    pub const DEFAULT_API_BASE: &'static str = "/api";
    const PLACEHOLDER_DOMAIN: &'static str = "<COGNITO_DOMAIN>";
    const PLACEHOLDER_CLIENT_ID: &'static str = "<COGNITO_CLIENT_ID>";

    /// Read `DEVPORTAL_*` values captured when the bundle was compiled.
    ///
    /// Unset values fall back to placeholders that fail validation, so a
    /// bundle built without provider settings refuses to start a session.
    pub fn from_build_env() -> SessionResult<Self> {
        Self::from_values(
            option_env!("DEVPORTAL_PROVIDER_DOMAIN"),
            option_env!("DEVPORTAL_CLIENT_ID"),
            option_env!("DEVPORTAL_API_BASE"),
            option_env!("DEVPORTAL_AUTH_FLOW"),
        )
    }

    pub fn from_values(
        domain: Option<&str>,
        client_id: Option<&str>,
        api_base: Option<&str>,
        flow: Option<&str>,
    ) -> SessionResult<Self> {
        let flow = match flow.filter(|flow| !flow.is_empty()) {
            Some(flow) => flow.parse::<AuthFlow>()?,
            None => AuthFlow::default(),
        };
        let session = SessionConfig::new(
            non_empty(domain).unwrap_or(Self::PLACEHOLDER_DOMAIN),
            non_empty(client_id).unwrap_or(Self::PLACEHOLDER_CLIENT_ID),
        )
        .with_flow(flow);
        session.validate()?;

        Ok(Self {
            session,
            api_base: non_empty(api_base)
                .unwrap_or(Self::DEFAULT_API_BASE)
                .to_string(),
        })
    }

    /// Absolute API base; a relative base is resolved against `origin`
    pub fn api_base_url(&self, origin: &str) -> String {
        let base = self.api_base.trim_end_matches('/');
        if base.starts_with("http://") || base.starts_with("https://") {
            base.to_string()
        } else {
            format!(
                "{}/{}",
                origin.trim_end_matches('/'),
                base.trim_start_matches('/')
            )
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

impl From<PortalConfig> for SessionConfig {
    fn from(config: PortalConfig) -> Self {
        config.session
    }
}

/// Error text shown when the bundle cannot start a session
pub fn describe(err: &SessionError) -> String {
    format!("Sign-in is unavailable: {err}")
}
