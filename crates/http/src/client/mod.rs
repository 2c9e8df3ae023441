//! Portal HTTP clients

pub mod api;
pub mod token;

pub use crate::error::ClientError;
pub use api::ApiClient;
pub use token::{TokenClient, TokenClientBuilder};

use reqwest::{Client, ClientBuilder, Response};
use std::time::Duration;

const USER_AGENT: &str = concat!("devportal/", env!("CARGO_PKG_VERSION"));

fn build_client(timeout: Option<Duration>) -> Result<Client, ClientError> {
    #[cfg(not(target_arch = "wasm32"))]
    let client = {
        let mut builder = ClientBuilder::new().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()?
    };

    #[cfg(target_arch = "wasm32")]
    let client = {
        let _ = timeout; // Timeouts not supported on WASM
        ClientBuilder::new().user_agent(USER_AGENT).build()?
    };

    Ok(client)
}

/// Decode a JSON body or map the status into a [`ClientError`]
async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();

    if status.is_success() {
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    } else {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| status.to_string());
        Err(ClientError::from_status(status.as_u16(), message))
    }
}
