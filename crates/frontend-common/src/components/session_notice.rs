//! Banner explaining why the previous session ended

use crate::hooks::use_session;
use yew::prelude::*;

#[function_component(SessionNotice)]
pub fn session_notice() -> Html {
    let Some(session) = use_session() else {
        return html! {};
    };
    if session.manager.is_authenticated() {
        return html! {};
    }

    match session.manager.last_error() {
        Some(reason) => html! {
            <div class="p-3 mb-4 rounded bg-yellow-100 text-yellow-800 text-sm">
                { "Your session ended, please sign in again. " }
                <span class="text-yellow-600">{reason}</span>
            </div>
        },
        None => html! {},
    }
}
