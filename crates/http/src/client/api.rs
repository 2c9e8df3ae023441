//! Bearer-authenticated client for the portal backend

use super::{ClientError, build_client, decode};
use reqwest::{Client, Method, RequestBuilder, header};
use serde::de::DeserializeOwned;

/// Calls the portal backend with the session's identity token.
///
/// Built fresh whenever the bearer token changes; holding one past a
/// refresh keeps sending the old token.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    bearer_token: String,
}

impl ApiClient {
    /// `api_base` must be absolute; the browser layer resolves a relative
    /// base such as `/api` against the page origin first.
    pub fn new(
        api_base: impl Into<String>,
        bearer_token: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let bearer_token = bearer_token.into();
        if bearer_token.is_empty() {
            return Err(ClientError::Configuration("bearer token is required".into()));
        }

        Ok(Self {
            client: build_client(None)?,
            base_url: api_base.into().trim_end_matches('/').to_string(),
            bearer_token,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a request builder with authentication
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.bearer_token))
    }

    /// Execute a request and handle common errors
    pub async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        decode(response).await
    }

    /// `GET {api_base}{path}` decoded as JSON
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute(self.request(Method::GET, path)).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
