use devportal_core::SessionState;
use devportal_frontend_common::{
    PortalConfig, SessionButton, SessionNotice, SessionProvider, Spinner, use_is_authenticated,
    use_session,
};
use yew::prelude::*;

#[function_component(App)]
pub fn app() -> Html {
    match PortalConfig::from_build_env() {
        Ok(config) => html! {
            <SessionProvider {config}>
                <AppContent />
            </SessionProvider>
        },
        Err(err) => {
            tracing::error!(error = %err, "Portal is not configured");
            html! {
                <div class="p-8 text-red-600">
                    { devportal_frontend_common::config::describe(&err) }
                </div>
            }
        }
    }
}

#[function_component(AppContent)]
fn app_content() -> Html {
    let is_authenticated = use_is_authenticated();

    html! {
        <div class="min-h-screen bg-gray-50">
            <header class="flex items-center justify-between px-6 py-4 bg-white shadow">
                <h1 class="text-xl font-semibold">{"Developer Portal"}</h1>
                <SessionButton />
            </header>
            <main class="max-w-4xl mx-auto p-6">
                <SessionNotice />
                if is_authenticated {
                    <SessionSummary />
                } else {
                    <div class="p-6 bg-white rounded shadow">
                        <h2 class="text-lg font-medium mb-2">{"Welcome"}</h2>
                        <p class="text-gray-600">
                            {"Sign in to see service health, metrics, logs and documentation."}
                        </p>
                    </div>
                }
            </main>
        </div>
    }
}

#[function_component(SessionSummary)]
fn session_summary() -> Html {
    let Some(session) = use_session() else {
        return html! {};
    };

    let status = match &session.state {
        SessionState::Refreshing { .. } => html! { <Spinner text={Some("Renewing session".to_string())} /> },
        state => html! { <span class="font-mono">{state.name()}</span> },
    };
    let expires = session
        .manager
        .credentials()
        .map(|set| set.expires_at.to_string())
        .unwrap_or_default();

    html! {
        <div class="p-6 bg-white rounded shadow space-y-2">
            <h2 class="text-lg font-medium">{"Session"}</h2>
            <p>{"Status: "}{status}</p>
            <p class="text-sm text-gray-600">{"Expires at (epoch ms): "}{expires}</p>
            <p class="text-sm text-gray-600">{"API base: "}{session.api_base.clone()}</p>
        </div>
    }
}
