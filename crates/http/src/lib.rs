//! HTTP clients for the developer portal
//!
//! [`client::TokenClient`] talks to the identity provider's token endpoint on
//! behalf of the session manager. [`client::ApiClient`] is handed to display
//! panels and calls the portal backend with the session's bearer token.

#[cfg(feature = "client")]
pub mod client;
pub mod error;

pub use error::ClientError;
