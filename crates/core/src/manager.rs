//! Session state machine
//!
//! [`SessionManager`] owns the credential set. It is driven by three things:
//! the one-off [`startup`](SessionManager::startup) check, the periodic
//! [`check`](SessionManager::check) run by the expiry monitor, and the
//! user-triggered [`login`](SessionManager::login) /
//! [`logout`](SessionManager::logout). Every failure resolves into a state
//! transition; nothing is surfaced to the display layer except the state.
//!
//! The manager is single-threaded (`Rc` inside) and never holds an internal
//! borrow across an `.await` or while calling listeners.

use crate::capture::{self, RedirectPayload};
use crate::clock::{Clock, SystemClock};
use crate::config::{AuthFlow, SessionConfig};
use crate::error::{SessionError, SessionResult};
use crate::initiators;
use crate::navigator::{self, Navigator};
use crate::pkce;
use crate::policy::{self, Verdict};
use crate::store::{self, CredentialStore};
use crate::token::{TokenEndpoint, TokenGrant, TokenRequest};
use crate::types::{CredentialSet, SessionState, StoredCredentials};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, info, warn};
use url::Url;

/// Handle returned by [`SessionManager::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Result of the startup pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupOutcome {
    /// Credentials were taken from the redirect
    Captured,
    /// A code exchange failed; the session was purged
    CaptureFailed,
    /// The provider redirected back with an error
    ProviderError,
    /// A logout happened while the code exchange was in flight
    Superseded,
    /// No redirect delivery, stored credentials were judged instead
    Checked(CheckOutcome),
}

/// Result of one expiry check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Nothing stored
    Unauthenticated,
    /// Stored credentials are usable as-is
    Fresh,
    /// Credentials were refreshed
    Refreshed,
    /// Refresh failed or was impossible; the session was purged
    RefreshFailed,
    /// Credentials expired and refresh is disabled; the session was purged
    Expired,
    /// A token request was already in flight
    Skipped,
    /// The session was purged while this refresh was in flight
    Superseded,
}

type Listener = Rc<dyn Fn(&SessionState)>;

struct Inner {
    config: SessionConfig,
    store: Rc<dyn CredentialStore>,
    endpoint: Rc<dyn TokenEndpoint>,
    navigator: Rc<dyn Navigator>,
    clock: Rc<dyn Clock>,
    state: RefCell<SessionState>,
    in_flight: Cell<bool>,
    /// Bumped on every purge so late token responses can be discarded
    epoch: Cell<u64>,
    last_error: RefCell<Option<String>>,
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
    next_listener: Cell<u64>,
}

/// Owns the session and its transitions. Cheap to clone.
#[derive(Clone)]
pub struct SessionManager {
    inner: Rc<Inner>,
}

/// Builder for [`SessionManager`]
pub struct SessionManagerBuilder {
    config: SessionConfig,
    store: Option<Rc<dyn CredentialStore>>,
    endpoint: Option<Rc<dyn TokenEndpoint>>,
    navigator: Option<Rc<dyn Navigator>>,
    clock: Option<Rc<dyn Clock>>,
}

impl SessionManagerBuilder {
    pub fn store<S: CredentialStore + 'static>(mut self, store: Rc<S>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn token_endpoint<E: TokenEndpoint + 'static>(mut self, endpoint: Rc<E>) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn navigator<N: Navigator + 'static>(mut self, navigator: Rc<N>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Defaults to [`SystemClock`]
    pub fn clock<C: Clock + 'static>(mut self, clock: Rc<C>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate the configuration and assemble the manager.
    ///
    /// The manager starts `Unauthenticated`; call
    /// [`startup`](SessionManager::startup) to load a session.
    pub fn build(self) -> SessionResult<SessionManager> {
        self.config.validate()?;

        let store = self
            .store
            .ok_or_else(|| SessionError::configuration("credential store is required"))?;
        let endpoint = self
            .endpoint
            .ok_or_else(|| SessionError::configuration("token endpoint is required"))?;
        let navigator = self
            .navigator
            .ok_or_else(|| SessionError::configuration("navigator is required"))?;
        let clock = self.clock.unwrap_or_else(|| Rc::new(SystemClock));

        Ok(SessionManager {
            inner: Rc::new(Inner {
                config: self.config,
                store,
                endpoint,
                navigator,
                clock,
                state: RefCell::new(SessionState::Unauthenticated),
                in_flight: Cell::new(false),
                epoch: Cell::new(0),
                last_error: RefCell::new(None),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
            }),
        })
    }
}

/// Marks a token request in flight; cleared on drop even if the request
/// future is abandoned.
struct InFlightGuard<'a>(&'a Cell<bool>);

impl<'a> InFlightGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl SessionManager {
    pub fn builder(config: SessionConfig) -> SessionManagerBuilder {
        SessionManagerBuilder {
            config,
            store: None,
            endpoint: None,
            navigator: None,
            clock: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Credentials backing the current state
    pub fn credentials(&self) -> Option<CredentialSet> {
        self.inner.state.borrow().credentials().cloned()
    }

    /// The bearer token handed to display panels.
    ///
    /// While a refresh is in flight the previous identity token is still
    /// returned until it actually lapses.
    pub fn bearer_token(&self) -> Option<String> {
        let now = self.inner.clock.now_ms();
        match &*self.inner.state.borrow() {
            SessionState::Authenticated(set) => Some(set.identity_token.clone()),
            SessionState::Refreshing {
                previous: Some(set),
            } if !set.is_expired(now) => Some(set.identity_token.clone()),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer_token().is_some()
    }

    /// Why the last session was lost, if it was lost to a failure
    pub fn last_error(&self) -> Option<String> {
        self.inner.last_error.borrow().clone()
    }

    /// Whether two handles refer to the same manager
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Register a callback fired after every state change
    pub fn subscribe(&self, listener: impl Fn(&SessionState) + 'static) -> ListenerId {
        let id = ListenerId(self.inner.next_listener.get());
        self.inner.next_listener.set(id.0 + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) {
        self.inner
            .listeners
            .borrow_mut()
            .retain(|(listener_id, _)| *listener_id != id);
    }

    /// Run once when the page loads: capture a redirect delivery if there is
    /// one, otherwise judge whatever is stored.
    pub async fn startup(&self) -> StartupOutcome {
        match self.capture().await {
            Some(outcome) => outcome,
            None => StartupOutcome::Checked(self.check().await),
        }
    }

    /// Judge the stored credentials and refresh them when they are close to
    /// expiry. Skips when a token request is already in flight.
    pub async fn check(&self) -> CheckOutcome {
        if self.inner.in_flight.get() {
            debug!("Token request in flight, skipping check");
            return CheckOutcome::Skipped;
        }

        let now = self.inner.clock.now_ms();
        let stored = match store::load(&*self.inner.store) {
            Ok(stored) => stored,
            Err(err) => {
                warn!(error = %err, "Credential store unreadable, treating as signed out");
                None
            }
        };

        match policy::evaluate(stored.as_ref(), now, self.inner.config.refresh_margin_ms()) {
            Verdict::Absent => {
                self.transition(SessionState::Unauthenticated);
                CheckOutcome::Unauthenticated
            }
            Verdict::Fresh(set) => {
                debug!(remaining_ms = set.remaining_ms(now), "Session fresh");
                self.transition(SessionState::Authenticated(set));
                CheckOutcome::Fresh
            }
            Verdict::NeedsRefresh if !self.inner.config.supports_refresh => {
                info!("Session expiring and refresh is disabled, signing out");
                self.purge();
                self.transition(SessionState::Unauthenticated);
                CheckOutcome::Expired
            }
            Verdict::NeedsRefresh => self.refresh(stored.unwrap_or_default()).await,
        }
    }

    /// Navigate to the provider's authorization endpoint.
    ///
    /// For the PKCE flow a fresh verifier is stored first. The page leaves;
    /// the result comes back through [`startup`](Self::startup).
    pub fn login(&self) -> SessionResult<()> {
        let redirect_uri = self.redirect_uri()?;
        let challenge = match self.inner.config.flow {
            AuthFlow::Implicit => None,
            AuthFlow::AuthorizationCode => {
                let verifier = pkce::generate_code_verifier()?;
                store::stash_verifier(&*self.inner.store, &verifier)?;
                Some(pkce::code_challenge(&verifier))
            }
        };

        let url = initiators::authorize_url(&self.inner.config, &redirect_uri, challenge.as_deref())?;
        info!(flow = ?self.inner.config.flow, "Redirecting to identity provider");
        self.inner.navigator.navigate(&url)
    }

    /// Purge the local session, then navigate to the provider's logout
    /// endpoint. The purge happens first and regardless of navigation errors.
    pub fn logout(&self) -> SessionResult<()> {
        self.purge();
        self.set_error(None);
        self.transition(SessionState::Unauthenticated);

        let logout_uri = self.redirect_uri()?;
        let url = initiators::logout_url(&self.inner.config, &logout_uri)?;
        info!("Signing out at identity provider");
        self.inner.navigator.navigate(&url)
    }

    async fn capture(&self) -> Option<StartupOutcome> {
        let page = match self.inner.navigator.current_url() {
            Ok(page) => page,
            Err(err) => {
                warn!(error = %err, "Cannot read page address, skipping redirect capture");
                return None;
            }
        };

        match capture::parse_redirect(&page) {
            RedirectPayload::Nothing => None,
            RedirectPayload::Tokens {
                identity_token,
                access_token,
                refresh_token,
                expires_in,
            } => {
                self.scrub(&page);
                let issued = CredentialSet::issue(
                    identity_token,
                    access_token,
                    refresh_token,
                    expires_in.unwrap_or(self.inner.config.default_lifetime_secs),
                    self.inner.clock.now_ms(),
                );
                Some(match issued {
                    Ok(set) => {
                        info!("Captured credentials from redirect");
                        self.establish(set);
                        StartupOutcome::Captured
                    }
                    Err(err) => {
                        self.fail_closed(&err);
                        StartupOutcome::CaptureFailed
                    }
                })
            }
            RedirectPayload::AuthorizationCode { code } => match store::has_verifier(&*self.inner.store) {
                Ok(true) => Some(self.exchange_code(&page, code).await),
                Ok(false) => {
                    warn!("Authorization code without a stored PKCE verifier, ignoring");
                    None
                }
                Err(err) => {
                    warn!(error = %err, "Cannot read PKCE verifier, ignoring authorization code");
                    None
                }
            },
            RedirectPayload::ProviderError { error, description } => {
                self.scrub(&page);
                warn!(%error, ?description, "Identity provider returned an error");
                self.set_error(Some(
                    SessionError::Provider(description.unwrap_or(error)).to_string(),
                ));
                self.transition(SessionState::Unauthenticated);
                Some(StartupOutcome::ProviderError)
            }
        }
    }

    async fn exchange_code(&self, page: &Url, code: String) -> StartupOutcome {
        // A spent code must not survive a reload, whatever happens next.
        self.scrub(page);

        let code_verifier = match store::take_verifier(&*self.inner.store) {
            Ok(Some(verifier)) => verifier,
            Ok(None) => {
                self.fail_closed(&SessionError::MissingCodeVerifier);
                return StartupOutcome::CaptureFailed;
            }
            Err(err) => {
                self.fail_closed(&err);
                return StartupOutcome::CaptureFailed;
            }
        };

        let Some(guard) = InFlightGuard::enter(&self.inner.in_flight) else {
            return StartupOutcome::Checked(CheckOutcome::Skipped);
        };
        let epoch = self.inner.epoch.get();
        self.transition(SessionState::Refreshing { previous: None });

        let request = TokenRequest {
            client_id: self.inner.config.provider.client_id.clone(),
            redirect_uri: self.redirect_uri_for(page),
            grant: TokenGrant::AuthorizationCode {
                code,
                code_verifier,
            },
        };
        info!("Exchanging authorization code");
        let result = self.inner.endpoint.request_tokens(&request).await;
        drop(guard);

        if self.inner.epoch.get() != epoch {
            info!("Session purged during code exchange, discarding tokens");
            return StartupOutcome::Superseded;
        }

        let issued = result.and_then(|response| {
            CredentialSet::from_token_response(
                response,
                None,
                self.inner.config.default_lifetime_secs,
                self.inner.clock.now_ms(),
            )
        });
        match issued {
            Ok(set) => {
                info!("Authorization code exchanged");
                self.establish(set);
                StartupOutcome::Captured
            }
            Err(err) => {
                self.fail_closed(&err);
                StartupOutcome::CaptureFailed
            }
        }
    }

    async fn refresh(&self, stored: StoredCredentials) -> CheckOutcome {
        let Some(refresh_token) = stored.refresh_token.clone() else {
            self.fail_closed(&SessionError::NoRefreshToken);
            return CheckOutcome::RefreshFailed;
        };
        let redirect_uri = match self.redirect_uri() {
            Ok(uri) => uri,
            Err(err) => {
                self.fail_closed(&err);
                return CheckOutcome::RefreshFailed;
            }
        };

        let Some(guard) = InFlightGuard::enter(&self.inner.in_flight) else {
            return CheckOutcome::Skipped;
        };
        let epoch = self.inner.epoch.get();
        let now = self.inner.clock.now_ms();
        let previous = stored.to_credential_set().filter(|set| !set.is_expired(now));
        self.transition(SessionState::Refreshing { previous });

        let request = TokenRequest {
            client_id: self.inner.config.provider.client_id.clone(),
            redirect_uri,
            grant: TokenGrant::RefreshToken {
                refresh_token: refresh_token.clone(),
            },
        };
        info!("Refreshing session");
        let result = self.inner.endpoint.request_tokens(&request).await;
        drop(guard);

        if self.inner.epoch.get() != epoch {
            info!("Session purged during refresh, discarding tokens");
            return CheckOutcome::Superseded;
        }

        let issued = result.and_then(|response| {
            CredentialSet::from_token_response(
                response,
                Some(refresh_token),
                self.inner.config.default_lifetime_secs,
                self.inner.clock.now_ms(),
            )
        });
        match issued {
            Ok(set) => {
                info!("Session refreshed");
                self.establish(set);
                CheckOutcome::Refreshed
            }
            Err(err) => {
                self.fail_closed(&err);
                CheckOutcome::RefreshFailed
            }
        }
    }

    fn establish(&self, set: CredentialSet) {
        if let Err(err) = store::save(&*self.inner.store, &set) {
            warn!(error = %err, "Failed to persist credentials, session will not survive a reload");
        }
        self.set_error(None);
        self.transition(SessionState::Authenticated(set));
    }

    fn fail_closed(&self, err: &SessionError) {
        warn!(
            error = %err,
            token_failure = err.is_token_failure(),
            "Session lost, purging stored credentials"
        );
        self.purge();
        self.set_error(Some(err.to_string()));
        self.transition(SessionState::Unauthenticated);
    }

    fn purge(&self) {
        self.inner.epoch.set(self.inner.epoch.get().wrapping_add(1));
        if let Err(err) = store::purge(&*self.inner.store) {
            warn!(error = %err, "Failed to purge credential store");
        }
    }

    fn scrub(&self, page: &Url) {
        if let Err(err) = self.inner.navigator.replace_url(&capture::scrubbed(page)) {
            warn!(error = %err, "Failed to scrub credentials from the address");
        }
    }

    fn set_error(&self, error: Option<String>) {
        *self.inner.last_error.borrow_mut() = error;
    }

    fn redirect_uri(&self) -> SessionResult<String> {
        match &self.inner.config.redirect_uri {
            Some(uri) => Ok(uri.clone()),
            None => Ok(navigator::origin_root(&self.inner.navigator.current_url()?)),
        }
    }

    fn redirect_uri_for(&self, page: &Url) -> String {
        self.inner
            .config
            .redirect_uri
            .clone()
            .unwrap_or_else(|| navigator::origin_root(page))
    }

    fn transition(&self, next: SessionState) {
        let changed = {
            let mut state = self.inner.state.borrow_mut();
            if *state == next {
                false
            } else {
                info!(from = state.name(), to = next.name(), "Session state changed");
                *state = next;
                true
            }
        };

        if changed {
            self.notify();
        }
    }

    fn notify(&self) {
        let state = self.state();
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&state);
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.inner.state.borrow().name())
            .field("flow", &self.inner.config.flow)
            .field("in_flight", &self.inner.in_flight.get())
            .finish_non_exhaustive()
    }
}
