//! This file defines the routes for displaying the log-in page and handling log-in requests.
//! The auth module handles the lower level token and cookie logic.

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use axum_htmx::{HxRedirect, HxRequest};
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error,
    auth::{
        cookie::set_session_cookie,
        middleware::{AuthState, authenticate},
        redirect::{normalize_redirect_url, redirect_after_log_in},
        token::encode_token,
    },
    db::lock_connection,
    endpoints,
    html::{
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, base, log_in_register, submit_button,
    },
    rpc::Input,
    user::{Email, get_user_by_email, touch_last_signed_in},
};

fn log_in_form(redirect_url: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirectUrl" value=(redirect_url);
            }

            div
            {
                label for="email" class=(FORM_LABEL_STYLE) { "Email" }

                input
                    type="email"
                    name="email"
                    id="email"
                    placeholder="name@example.com"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    autofocus;
            }

            div
            {
                label for="password" class=(FORM_LABEL_STYLE) { "Password" }

                input
                    type="password"
                    name="password"
                    id="password"
                    placeholder="••••••••"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required;
            }

            (submit_button("Log in"))

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "Don't have an account? "
                a href=(endpoints::REGISTER_VIEW) tabindex="0" class=(LINK_STYLE)
                {
                  "Register here"
                }
            }
        }
    }
}

/// The query parameters for the log-in and registration pages.
#[derive(Debug, Default, Deserialize)]
pub struct RedirectQuery {
    /// Where to go after logging in.
    pub redirect_url: Option<String>,
}

pub(super) fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    match raw_url.and_then(normalize_redirect_url) {
        Some(redirect_url) => Some(redirect_url),
        None => {
            if let Some(redirect_url) = raw_url {
                tracing::warn!("Invalid redirect URL from {source}: {redirect_url}");
            }
            None
        }
    }
}

/// Display the log-in page.
///
/// Users that are already logged in are sent to the dashboard.
pub async fn get_log_in_page(
    State(state): State<AuthState>,
    jar: CookieJar,
    Query(query): Query<RedirectQuery>,
) -> Response {
    if authenticate(&jar, &state).is_ok() {
        return Redirect::to(endpoints::DASHBOARD_VIEW).into_response();
    }

    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "log-in query");
    let log_in_form = log_in_form(redirect_url.as_deref());
    let content = log_in_register("Log in to your account", &log_in_form);
    base("Log In", &[], &content).into_response()
}

/// The data sent to log in.
///
/// The password is not validated here since it is only compared against the stored hash.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogInInput {
    /// The email the user registered with.
    pub email: String,
    /// The user's password.
    pub password: String,
    /// Optional URL to redirect to after logging in.
    #[serde(default, alias = "redirect_url")]
    pub redirect_url: Option<String>,
}

/// Handler for log-in requests.
///
/// On success the session cookie is set and the user is returned. htmx
/// requests are also redirected to the dashboard or the requested page.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if the email is unknown, the user has
/// not set a password or the password is wrong.
pub async fn log_in_endpoint(
    State(state): State<AuthState>,
    HxRequest(is_htmx): HxRequest,
    jar: CookieJar,
    Input(input): Input<LogInInput>,
) -> Result<Response, Error> {
    let email = Email::new(&input.email)?;

    if input.password.is_empty() {
        return Err(Error::InvalidInput("Password is required".to_owned()));
    }

    // The lock is released while hashing so other requests are not held up.
    let user = {
        let connection = lock_connection(&state.db_connection)?;

        match get_user_by_email(&email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    let password_hash = user
        .password_hash
        .as_ref()
        .ok_or(Error::InvalidCredentials)?;

    let is_password_valid = password_hash.verify(&input.password).map_err(|error| {
        tracing::error!("Unhandled error while verifying credentials: {error}");
        Error::HashingError(error.to_string())
    })?;

    if !is_password_valid {
        return Err(Error::InvalidCredentials);
    }

    touch_last_signed_in(user.id, &*lock_connection(&state.db_connection)?)?;

    let token = encode_token(&user, &state.session)?;
    let jar = set_session_cookie(jar, token, &state.session);

    let redirect_url = parse_redirect_url(input.redirect_url.as_deref(), "log-in form");
    let hx_redirect = is_htmx.then(|| HxRedirect(redirect_after_log_in(redirect_url.as_deref())));

    tracing::info!("User {} logged in", user.id);

    Ok((jar, hx_redirect, Json(user)).into_response())
}
