//! Session provider and context
//!
//! [`SessionProvider`] owns the [`SessionManager`] for the lifetime of the
//! page: it runs the startup pass once, keeps an [`ExpiryMonitor`] ticking
//! and mirrors every state change into a yew context.

use crate::config::{self, PortalConfig};
use crate::navigator::BrowserNavigator;
use crate::storage::LocalCredentialStore;
use devportal_core::{ExpiryMonitor, SessionError, SessionManager, SessionResult, SessionState};
use devportal_http::client::TokenClient;
use futures::future::LocalBoxFuture;
use gloo::timers::future::IntervalStream;
use std::rc::Rc;
use tracing::{debug, error};
use yew::prelude::*;

/// What display components see of the session
#[derive(Clone, Debug)]
pub struct SessionContext {
    pub manager: SessionManager,
    pub state: SessionState,
    /// False until the startup pass has finished
    pub ready: bool,
    /// Absolute backend base for [`devportal_http::client::ApiClient`]
    pub api_base: String,
}

impl SessionContext {
    /// Re-run the expiry check now, e.g. after the backend answered 401
    pub fn recheck(&self) {
        let manager = self.manager.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = manager.check().await;
            debug!(?outcome, "Session re-checked");
        });
    }
}

impl PartialEq for SessionContext {
    fn eq(&self, other: &Self) -> bool {
        self.manager.ptr_eq(&other.manager)
            && self.state == other.state
            && self.ready == other.ready
            && self.api_base == other.api_base
    }
}

fn build_manager(config: &PortalConfig) -> SessionResult<SessionManager> {
    let token_client = TokenClient::new(config.session.provider.domain.clone())?;
    SessionManager::builder(config.session.clone())
        .store(Rc::new(LocalCredentialStore::new()))
        .token_endpoint(Rc::new(token_client))
        .navigator(Rc::new(BrowserNavigator::new()))
        .build()
}

fn spawn_local(task: LocalBoxFuture<'static, ()>) {
    wasm_bindgen_futures::spawn_local(task);
}

#[derive(Properties, PartialEq)]
pub struct SessionProviderProps {
    pub config: PortalConfig,
    pub children: Children,
}

#[function_component(SessionProvider)]
pub fn session_provider(props: &SessionProviderProps) -> Html {
    let manager = use_memo(props.config.clone(), |config| {
        build_manager(config).map_err(|err: SessionError| {
            error!(error = %err, "Session manager unavailable");
            config::describe(&err)
        })
    });
    let state = use_state(SessionState::default);
    let ready = use_state(|| false);

    {
        let manager = Rc::clone(&manager);
        let state = state.setter();
        let ready = ready.setter();
        use_effect_with(props.config.clone(), move |_| {
            let cleanup: Box<dyn FnOnce()> = match &*manager {
                Ok(manager) => {
                    let listener = manager.subscribe({
                        let state = state.clone();
                        move |next| state.set(next.clone())
                    });
                    state.set(manager.state());

                    let startup = manager.clone();
                    wasm_bindgen_futures::spawn_local(async move {
                        let outcome = startup.startup().await;
                        debug!(?outcome, "Session startup finished");
                        ready.set(true);
                    });

                    let interval_ms =
                        u32::try_from(manager.config().check_interval().as_millis()).unwrap_or(u32::MAX);
                    let monitor =
                        ExpiryMonitor::start(manager.clone(), IntervalStream::new(interval_ms), spawn_local);

                    let manager = manager.clone();
                    Box::new(move || {
                        monitor.stop();
                        manager.unsubscribe(listener);
                    })
                }
                Err(_) => Box::new(|| {}),
            };
            cleanup
        });
    }

    match &*manager {
        Ok(manager) => {
            let api_base = BrowserNavigator::origin()
                .map(|origin| props.config.api_base_url(&origin))
                .unwrap_or_else(|_| props.config.api_base.clone());
            let context = SessionContext {
                manager: manager.clone(),
                state: (*state).clone(),
                ready: *ready,
                api_base,
            };
            html! {
                <ContextProvider<SessionContext> {context}>
                    {props.children.clone()}
                </ContextProvider<SessionContext>>
            }
        }
        Err(message) => html! {
            <div class="p-4 text-red-600">{message.clone()}</div>
        },
    }
}
