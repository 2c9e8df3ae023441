//! Sign in / sign out button

use super::Spinner;
use crate::hooks::use_session;
use devportal_core::SessionState;
use tracing::error;
use yew::prelude::*;

#[function_component(SessionButton)]
pub fn session_button() -> Html {
    let Some(session) = use_session() else {
        return html! {};
    };

    if !session.ready {
        return html! { <Spinner text={Some("Checking session".to_string())} /> };
    }
    if matches!(session.state, SessionState::Refreshing { previous: None }) {
        return html! { <Spinner text={Some("Signing in".to_string())} /> };
    }

    let signed_in = session.manager.is_authenticated();
    let onclick = {
        let manager = session.manager.clone();
        Callback::from(move |_: MouseEvent| {
            let result = if signed_in {
                manager.logout()
            } else {
                manager.login()
            };
            if let Err(err) = result {
                error!(error = %err, signed_in, "Sign-in navigation failed");
            }
        })
    };

    html! {
        <button class="px-4 py-2 rounded bg-blue-600 text-white hover:bg-blue-700" {onclick}>
            { if signed_in { "Sign out" } else { "Sign in" } }
        </button>
    }
}
