//! Authentication middleware that validates the session cookie and handles redirects.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use axum_htmx::{HxRedirect, HxRequest};
use rusqlite::Connection;

use crate::{
    AppState, Error, PageError,
    auth::{
        cookie::get_session_token,
        redirect::{build_log_in_redirect_url, hx_current_path},
        token::{SessionConfig, decode_token},
    },
    db::lock_connection,
    user::{UserId, touch_last_signed_in},
};

/// The state needed for the auth middleware and the auth endpoints.
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The keys and settings for issuing session cookies.
    pub session: SessionConfig,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            session: state.session.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Get the ID of the logged in user from the session cookie.
///
/// The user's `last_signed_in` time is refreshed on success.
///
/// # Errors
/// Returns [Error::Unauthorized] if there is no session cookie, the token is
/// invalid or expired, or the user no longer exists.
pub(crate) fn authenticate(jar: &CookieJar, state: &AuthState) -> Result<UserId, Error> {
    let token = get_session_token(jar).ok_or(Error::Unauthorized)?;
    let user_id = decode_token(token, &state.session.keys)?.user_id()?;

    let connection = lock_connection(&state.db_connection)?;

    match touch_last_signed_in(user_id, &connection) {
        Ok(()) => Ok(user_id),
        Err(Error::NotFound) => Err(Error::Unauthorized),
        Err(error) => Err(error),
    }
}

/// Middleware function for pages that checks for a valid session cookie.
///
/// The user ID is placed into the request and the request executed normally if
/// the cookie is valid, otherwise a redirect to the log-in page is returned.
///
/// Route handlers receive the user ID with `Extension(user_id): Extension<UserId>`.
pub async fn auth_guard(
    State(state): State<AuthState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&jar, &state) {
        Ok(user_id) => {
            request.extensions_mut().insert(user_id);
            next.run(request).await
        }
        Err(Error::Unauthorized) => {
            let target = request
                .uri()
                .path_and_query()
                .map(|path_and_query| path_and_query.as_str());

            Redirect::to(&build_log_in_redirect_url(target)).into_response()
        }
        Err(error) => PageError(error).into_response(),
    }
}

/// Middleware function for the API that checks for a valid session cookie.
///
/// The user ID is placed into the request and the request executed normally if
/// the cookie is valid. Otherwise htmx requests are redirected to the log-in
/// page with `HX-Redirect`, and other requests get a 401 JSON error.
///
/// Route handlers receive the user ID with `Extension(user_id): Extension<UserId>`.
pub async fn auth_guard_api(
    State(state): State<AuthState>,
    HxRequest(is_htmx): HxRequest,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&jar, &state) {
        Ok(user_id) => {
            request.extensions_mut().insert(user_id);
            next.run(request).await
        }
        Err(Error::Unauthorized) if is_htmx => {
            let target = hx_current_path(request.headers());
            let redirect_url = build_log_in_redirect_url(target.as_deref());

            (HxRedirect(redirect_url), StatusCode::OK).into_response()
        }
        Err(error) => error.into_response(),
    }
}
