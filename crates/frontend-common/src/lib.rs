pub mod components;
pub mod config;
pub mod hooks;
pub mod navigator;
pub mod session;
pub mod storage;

pub use components::{SessionButton, SessionNotice, Spinner};
pub use config::PortalConfig;
pub use hooks::{use_api_client, use_bearer_token, use_is_authenticated, use_session};
pub use navigator::BrowserNavigator;
pub use session::{SessionContext, SessionProvider};
pub use storage::LocalCredentialStore;
