//! Address bar access through `window.location` and `window.history`

use devportal_core::{Navigator, SessionError, SessionResult};
use tracing::error;
use url::Url;
use wasm_bindgen::JsValue;
use web_sys::Window;

#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserNavigator;

impl BrowserNavigator {
    pub const fn new() -> Self {
        Self
    }

    /// `scheme://host[:port]` of the current page
    pub fn origin() -> SessionResult<String> {
        window()?
            .location()
            .origin()
            .map_err(|err| js_error("cannot read origin", &err))
    }
}

fn window() -> SessionResult<Window> {
    web_sys::window().ok_or_else(|| SessionError::navigation("no window"))
}

fn js_error(context: &str, err: &JsValue) -> SessionError {
    SessionError::navigation(format!("{context}: {err:?}"))
}

impl Navigator for BrowserNavigator {
    fn current_url(&self) -> SessionResult<Url> {
        let href = window()?
            .location()
            .href()
            .map_err(|err| js_error("cannot read address", &err))?;
        Ok(Url::parse(&href)?)
    }

    fn replace_url(&self, url: &Url) -> SessionResult<()> {
        window()?
            .history()
            .map_err(|err| js_error("history unavailable", &err))?
            .replace_state_with_url(&JsValue::NULL, "", Some(url.as_str()))
            .map_err(|err| js_error("history.replaceState failed", &err))
    }

    fn navigate(&self, url: &Url) -> SessionResult<()> {
        window()?
            .location()
            .set_href(url.as_str())
            .map_err(|err| {
                let err = js_error("navigation failed", &err);
                error!(error = %err, "Could not leave the page");
                err
            })
    }
}
