//! Developer portal session core
//!
//! Owns the browser session lifecycle: capturing credentials from a provider
//! redirect, persisting them, deciding when they need a refresh, refreshing
//! them and tearing them down on logout. Browser side effects go through the
//! [`CredentialStore`], [`Navigator`], [`TokenEndpoint`] and [`Clock`] seams.

pub mod capture;
pub mod clock;
pub mod config;
pub mod error;
pub mod initiators;
pub mod manager;
pub mod monitor;
pub mod navigator;
pub mod pkce;
pub mod policy;
pub mod store;
pub mod token;
pub mod types;

#[cfg(any(test, feature = "tests"))]
pub mod testing;

pub use clock::{Clock, SystemClock};
pub use config::{AuthFlow, ProviderConfig, SessionConfig};
pub use error::{SessionError, SessionResult};
pub use manager::{
    CheckOutcome, ListenerId, SessionManager, SessionManagerBuilder, StartupOutcome,
};
pub use monitor::ExpiryMonitor;
pub use navigator::Navigator;
pub use store::{CredentialStore, MemoryCredentialStore};
pub use token::{TokenEndpoint, TokenGrant, TokenRequest, TokenResponse};
pub use types::{CredentialSet, EpochMillis, SessionState, StoredCredentials};
