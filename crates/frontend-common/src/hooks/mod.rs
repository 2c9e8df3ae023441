//! Session hooks for display components

use crate::session::SessionContext;
use devportal_http::client::ApiClient;
use tracing::warn;
use yew::prelude::*;

/// The surrounding session, or `None` outside a `SessionProvider`
#[hook]
pub fn use_session() -> Option<SessionContext> {
    use_context::<SessionContext>()
}

/// Token to send as `Authorization: Bearer ...`
#[hook]
pub fn use_bearer_token() -> Option<String> {
    use_session().and_then(|session| session.manager.bearer_token())
}

#[hook]
pub fn use_is_authenticated() -> bool {
    use_bearer_token().is_some()
}

/// Backend client carrying the current bearer token, rebuilt when the token
/// changes. `None` while signed out.
#[hook]
pub fn use_api_client() -> Option<ApiClient> {
    let api_base = use_session().map(|session| session.api_base);
    let token = use_bearer_token();

    let client = use_memo((api_base, token), |(api_base, token)| {
        let (Some(api_base), Some(token)) = (api_base, token) else {
            return None;
        };
        ApiClient::new(api_base.clone(), token.clone())
            .inspect_err(|err| warn!(error = %err, "Cannot build API client"))
            .ok()
    });
    (*client).clone()
}
