//! Logging out clears the session cookie.

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use axum_htmx::{HxRedirect, HxRequest};

use crate::{auth::cookie::clear_session_cookie, endpoints, rpc::success};

/// Clear the session cookie and send the user to the log-in page.
pub async fn get_log_out(jar: CookieJar) -> Response {
    (clear_session_cookie(jar), Redirect::to(endpoints::LOG_IN_VIEW)).into_response()
}

/// Clear the session cookie.
///
/// This always succeeds, even if the user was not logged in.
pub async fn log_out_endpoint(HxRequest(is_htmx): HxRequest, jar: CookieJar) -> Response {
    let hx_redirect = is_htmx.then(|| HxRedirect(endpoints::LOG_IN_VIEW.to_owned()));

    (clear_session_cookie(jar), hx_redirect, success()).into_response()
}

#[cfg(test)]
mod log_out_tests {
    use axum::http::{HeaderMap, HeaderValue, StatusCode, header::COOKIE};
    use axum_extra::extract::CookieJar;
    use axum_htmx::HxRequest;

    use crate::{auth::COOKIE_SESSION, endpoints, test_utils::get_header};

    use super::{get_log_out, log_out_endpoint};

    /// A jar holding the session cookie the way a browser sends it.
    fn logged_in_jar() -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("session=token"));

        CookieJar::from_headers(&headers)
    }

    #[track_caller]
    fn assert_cookie_cleared(response: &axum::response::Response) {
        let set_cookie = get_header(response, "set-cookie");

        assert!(set_cookie.starts_with(&format!("{COOKIE_SESSION}=")));
        assert!(set_cookie.contains("Max-Age=0"), "got {set_cookie}");
    }

    #[tokio::test]
    async fn log_out_page_clears_cookie_and_redirects() {
        let response = get_log_out(logged_in_jar()).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            endpoints::LOG_IN_VIEW
        );
        assert_cookie_cleared(&response);
    }

    #[tokio::test]
    async fn log_out_endpoint_clears_cookie() {
        let response = log_out_endpoint(HxRequest(true), logged_in_jar()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("hx-redirect").unwrap(),
            endpoints::LOG_IN_VIEW
        );
        assert_cookie_cleared(&response);
    }

    #[tokio::test]
    async fn log_out_without_session_still_succeeds() {
        let response = log_out_endpoint(HxRequest(false), CookieJar::new()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("hx-redirect").is_none());
    }
}
