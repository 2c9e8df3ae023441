//! Test doubles for the session seams
//!
//! Enabled for unit tests and, through the `tests` feature, for integration
//! tests of crates that embed the session manager.

use crate::clock::Clock;
use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::manager::SessionManager;
use crate::navigator::Navigator;
use crate::store::MemoryCredentialStore;
use crate::token::{TokenEndpoint, TokenRequest, TokenResponse};
use crate::types::EpochMillis;
use async_trait::async_trait;
use futures::channel::oneshot;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use url::Url;

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<EpochMillis>,
}

impl ManualClock {
    pub fn new(now: EpochMillis) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn advance(&self, ms: i64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, now: EpochMillis) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> EpochMillis {
        self.now.get()
    }
}

/// Navigator that records every address change
#[derive(Debug)]
pub struct FakeNavigator {
    current: RefCell<Url>,
    replacements: RefCell<Vec<Url>>,
    navigations: RefCell<Vec<Url>>,
}

impl FakeNavigator {
    /// # Panics
    ///
    /// Panics if `url` is not absolute.
    pub fn at(url: &str) -> Self {
        Self {
            current: RefCell::new(Url::parse(url).expect("test page URL")),
            replacements: RefCell::new(Vec::new()),
            navigations: RefCell::new(Vec::new()),
        }
    }

    pub fn current(&self) -> Url {
        self.current.borrow().clone()
    }

    pub fn replacements(&self) -> Vec<Url> {
        self.replacements.borrow().clone()
    }

    pub fn navigations(&self) -> Vec<Url> {
        self.navigations.borrow().clone()
    }

    /// Simulate the browser landing on a new address
    ///
    /// # Panics
    ///
    /// Panics if `url` is not absolute.
    pub fn land_on(&self, url: &str) {
        *self.current.borrow_mut() = Url::parse(url).expect("test page URL");
    }
}

impl Navigator for FakeNavigator {
    fn current_url(&self) -> SessionResult<Url> {
        Ok(self.current())
    }

    fn replace_url(&self, url: &Url) -> SessionResult<()> {
        *self.current.borrow_mut() = url.clone();
        self.replacements.borrow_mut().push(url.clone());
        Ok(())
    }

    fn navigate(&self, url: &Url) -> SessionResult<()> {
        self.navigations.borrow_mut().push(url.clone());
        Ok(())
    }
}

/// Token endpoint answering from a queue of canned results
#[derive(Debug, Default)]
pub struct ScriptedTokenEndpoint {
    responses: RefCell<VecDeque<SessionResult<TokenResponse>>>,
    requests: RefCell<Vec<TokenRequest>>,
}

impl ScriptedTokenEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_with(&self, response: TokenResponse) {
        self.responses.borrow_mut().push_back(Ok(response));
    }

    pub fn fail_with(&self, error: SessionError) {
        self.responses.borrow_mut().push_back(Err(error));
    }

    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn requests(&self) -> Vec<TokenRequest> {
        self.requests.borrow().clone()
    }
}

#[async_trait(?Send)]
impl TokenEndpoint for ScriptedTokenEndpoint {
    async fn request_tokens(&self, request: &TokenRequest) -> SessionResult<TokenResponse> {
        self.requests.borrow_mut().push(request.clone());
        let next = self.responses.borrow_mut().pop_front();
        next.unwrap_or_else(|| Err(SessionError::Transport("no scripted response".into())))
    }
}

/// Token endpoint whose single answer is held back until released
#[derive(Debug)]
pub struct GatedTokenEndpoint {
    calls: Cell<usize>,
    gate: RefCell<Option<oneshot::Receiver<SessionResult<TokenResponse>>>>,
}

impl GatedTokenEndpoint {
    /// Returns the endpoint and the sender that releases its answer
    pub fn pair() -> (Self, oneshot::Sender<SessionResult<TokenResponse>>) {
        let (tx, rx) = oneshot::channel();
        let endpoint = Self {
            calls: Cell::new(0),
            gate: RefCell::new(Some(rx)),
        };
        (endpoint, tx)
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

#[async_trait(?Send)]
impl TokenEndpoint for GatedTokenEndpoint {
    async fn request_tokens(&self, _request: &TokenRequest) -> SessionResult<TokenResponse> {
        self.calls.set(self.calls.get() + 1);
        let gate = self.gate.borrow_mut().take();
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(SessionError::Transport("gate dropped".into()))),
            None => Err(SessionError::Transport("gate already used".into())),
        }
    }
}

/// Token endpoint response with identical identity and access tokens
pub fn token_response(token: &str, expires_in: u64) -> TokenResponse {
    TokenResponse {
        id_token: Some(token.to_string()),
        access_token: Some(token.to_string()),
        refresh_token: None,
        expires_in: Some(expires_in),
    }
}

/// A manager wired to in-memory doubles, with handles on each of them
pub struct TestSession<E: TokenEndpoint + 'static = ScriptedTokenEndpoint> {
    pub manager: SessionManager,
    pub store: Rc<MemoryCredentialStore>,
    pub clock: Rc<ManualClock>,
    pub navigator: Rc<FakeNavigator>,
    pub endpoint: Rc<E>,
}

impl TestSession<ScriptedTokenEndpoint> {
    /// # Panics
    ///
    /// Panics if the configuration does not validate.
    pub fn new(config: SessionConfig, page: &str, now: EpochMillis) -> Self {
        Self::with_endpoint(config, page, now, Rc::new(ScriptedTokenEndpoint::new()))
    }
}

impl<E: TokenEndpoint + 'static> TestSession<E> {
    /// # Panics
    ///
    /// Panics if the configuration does not validate.
    pub fn with_endpoint(config: SessionConfig, page: &str, now: EpochMillis, endpoint: Rc<E>) -> Self {
        Self::with_store(config, page, now, endpoint, Rc::new(MemoryCredentialStore::new()))
    }

    /// Share a store between sessions, like two tabs of one origin
    ///
    /// # Panics
    ///
    /// Panics if the configuration does not validate.
    pub fn with_store(
        config: SessionConfig,
        page: &str,
        now: EpochMillis,
        endpoint: Rc<E>,
        store: Rc<MemoryCredentialStore>,
    ) -> Self {
        let clock = Rc::new(ManualClock::new(now));
        let navigator = Rc::new(FakeNavigator::at(page));
        let manager = SessionManager::builder(config)
            .store(Rc::clone(&store))
            .token_endpoint(Rc::clone(&endpoint))
            .navigator(Rc::clone(&navigator))
            .clock(Rc::clone(&clock))
            .build()
            .expect("valid test session config");

        Self {
            manager,
            store,
            clock,
            navigator,
            endpoint,
        }
    }
}
