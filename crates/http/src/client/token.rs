//! Provider token endpoint client

use super::{ClientError, build_client, decode};
use async_trait::async_trait;
use devportal_core::{SessionResult, TokenEndpoint, TokenRequest, TokenResponse};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Posts token requests to `{domain}/oauth2/token`
#[derive(Debug, Clone)]
pub struct TokenClient {
    client: Client,
    token_url: String,
}

impl TokenClient {
    pub fn new(provider_domain: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().provider_domain(provider_domain).build()
    }

    pub fn builder() -> TokenClientBuilder {
        TokenClientBuilder::default()
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Send the form and decode the provider's answer
    pub async fn exchange(&self, request: &TokenRequest) -> Result<TokenResponse, ClientError> {
        debug!(grant_type = request.grant.grant_type(), "Calling token endpoint");
        let response = self
            .client
            .post(&self.token_url)
            .form(&request.form_fields())
            .send()
            .await?;

        decode(response).await.inspect_err(|err| {
            warn!(grant_type = request.grant.grant_type(), error = %err, "Token endpoint rejected request");
        })
    }
}

#[async_trait(?Send)]
impl TokenEndpoint for TokenClient {
    async fn request_tokens(&self, request: &TokenRequest) -> SessionResult<TokenResponse> {
        Ok(self.exchange(request).await?)
    }
}

/// Builder for [`TokenClient`]
#[derive(Debug, Default)]
pub struct TokenClientBuilder {
    provider_domain: Option<String>,
    timeout: Option<Duration>,
}

impl TokenClientBuilder {
    pub fn provider_domain(mut self, domain: impl Into<String>) -> Self {
        self.provider_domain = Some(domain.into());
        self
    }

    /// Set the request timeout
    #[cfg(not(target_arch = "wasm32"))]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<TokenClient, ClientError> {
        let domain = self
            .provider_domain
            .filter(|domain| !domain.trim().is_empty())
            .ok_or_else(|| ClientError::Configuration("provider_domain is required".into()))?;

        let base = domain.trim_end_matches('/');
        url::Url::parse(base)
            .map_err(|err| ClientError::Configuration(format!("invalid provider domain: {err}")))?;
        let token_url = format!("{base}/oauth2/token");

        Ok(TokenClient {
            client: build_client(self.timeout)?,
            token_url,
        })
    }
}
