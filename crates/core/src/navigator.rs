//! Browser address seam

use crate::error::SessionResult;
use url::Url;

/// Access to the page address.
///
/// `replace_url` rewrites the visible address without reloading (history
/// replace); `navigate` leaves the page.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator {
    fn current_url(&self) -> SessionResult<Url>;
    fn replace_url(&self, url: &Url) -> SessionResult<()>;
    fn navigate(&self, url: &Url) -> SessionResult<()>;
}

/// `{origin}/` of the given page, the default redirect target
#[must_use]
pub fn origin_root(url: &Url) -> String {
    format!("{}/", url.origin().ascii_serialization())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_root_drops_path_and_fragment() {
        let url = Url::parse("https://portal.example.com:8443/app/view?x=1#id_token=abc").unwrap();
        assert_eq!(origin_root(&url), "https://portal.example.com:8443/");
    }
}
