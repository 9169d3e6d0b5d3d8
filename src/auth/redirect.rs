//! Helpers for the redirect URLs used when sending users to and from the log-in page.

use axum::http::{HeaderMap, Uri};
use tracing::{error, warn};

use crate::endpoints;

/// The query parameter on the log-in page holding where to go after logging in.
pub const REDIRECT_URL_PARAM: &str = "redirect_url";

/// Only local paths are allowed so the log-in page cannot be used to send
/// users to another site.
fn is_safe_redirect_url(redirect_url: &str) -> bool {
    if !redirect_url.starts_with('/') || redirect_url.starts_with("//") {
        return false;
    }

    let path = redirect_url
        .split_once('?')
        .map(|(path, _)| path)
        .unwrap_or(redirect_url);

    path != endpoints::LOG_IN_VIEW
}

/// The path and query of `raw_url` if it is a safe place to redirect to after logging in.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_url(path_and_query).then(|| path_and_query.to_owned())
}

/// Where to send the user after logging in or registering.
pub fn redirect_after_log_in(redirect_url: Option<&str>) -> String {
    redirect_url
        .and_then(normalize_redirect_url)
        .unwrap_or_else(|| endpoints::DASHBOARD_VIEW.to_owned())
}

/// The log-in page URL that returns the user to `redirect_target` afterwards.
pub fn build_log_in_redirect_url(redirect_target: Option<&str>) -> String {
    let Some(redirect_target) = redirect_target.and_then(normalize_redirect_url) else {
        return endpoints::LOG_IN_VIEW.to_owned();
    };

    match serde_urlencoded::to_string([(REDIRECT_URL_PARAM, &redirect_target)]) {
        Ok(param) => format!("{}?{}", endpoints::LOG_IN_VIEW, param),
        Err(error) => {
            error!("Could not encode redirect URL {redirect_target}: {error}");
            endpoints::LOG_IN_VIEW.to_owned()
        }
    }
}

/// The page an htmx request was sent from, taken from the `HX-Current-URL` header.
///
/// The header holds an absolute URL, so only its path and query are kept.
pub fn hx_current_path(headers: &HeaderMap) -> Option<String> {
    let current_url = headers
        .get("hx-current-url")
        .and_then(|header| header.to_str().ok())?;

    let path_and_query = current_url
        .parse::<Uri>()
        .ok()
        .and_then(|uri| uri.path_and_query().map(|path| path.as_str().to_owned()));

    if path_and_query.is_none() {
        warn!("Invalid HX-Current-URL header value: {current_url}");
    }

    path_and_query
}

#[cfg(test)]
mod redirect_tests {
    use axum::http::{HeaderMap, HeaderValue};

    use crate::endpoints;

    use super::{
        build_log_in_redirect_url, hx_current_path, normalize_redirect_url,
        redirect_after_log_in,
    };

    #[test]
    fn accepts_local_paths() {
        assert_eq!(
            normalize_redirect_url("/transactions?account_id=2"),
            Some("/transactions?account_id=2".to_owned())
        );
    }

    #[test]
    fn rejects_other_sites() {
        for url in [
            "https://evil.example.com/dashboard",
            "//evil.example.com",
            "dashboard",
            "/log_in?redirect_url=%2Fdashboard",
        ] {
            assert_eq!(normalize_redirect_url(url), None, "want {url} rejected");
        }
    }

    #[test]
    fn redirect_after_log_in_falls_back_to_dashboard() {
        assert_eq!(redirect_after_log_in(None), endpoints::DASHBOARD_VIEW);
        assert_eq!(
            redirect_after_log_in(Some("https://evil.example.com")),
            endpoints::DASHBOARD_VIEW
        );
        assert_eq!(redirect_after_log_in(Some("/goals")), "/goals");
    }

    #[test]
    fn log_in_url_encodes_target() {
        assert_eq!(
            build_log_in_redirect_url(Some("/goals?account_id=1")),
            "/log_in?redirect_url=%2Fgoals%3Faccount_id%3D1"
        );
        assert_eq!(build_log_in_redirect_url(None), endpoints::LOG_IN_VIEW);
    }

    #[test]
    fn hx_current_path_strips_origin() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "hx-current-url",
            HeaderValue::from_static("http://localhost:3000/schedule?account_id=4"),
        );

        assert_eq!(
            hx_current_path(&headers),
            Some("/schedule?account_id=4".to_owned())
        );
    }
}
