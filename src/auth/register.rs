//! The registration page and the endpoint for creating a new user with a password.

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
        log_in::{RedirectQuery, parse_redirect_url},
        middleware::{AuthState, authenticate},
        password::{MIN_PASSWORD_LENGTH, PasswordHash, ValidatedPassword},
        redirect::redirect_after_log_in,
        token::encode_token,
    },
    db::lock_connection,
    endpoints,
    html::{
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, base, log_in_register, submit_button,
    },
    rpc::{Input, validate},
    user::{Email, NewUser, Role, count_users, create_user},
};

fn register_form(redirect_url: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::REGISTER_API)
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
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    type="text"
                    name="name"
                    id="name"
                    minlength="2"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    autofocus;
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
                    required;
            }

            div
            {
                label for="password" class=(FORM_LABEL_STYLE) { "Password" }

                input
                    type="password"
                    name="password"
                    id="password"
                    placeholder="••••••••"
                    minlength=(MIN_PASSWORD_LENGTH)
                    class=(FORM_TEXT_INPUT_STYLE)
                    required;
            }

            (submit_button("Create account"))

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "Already have an account? "
                a href=(endpoints::LOG_IN_VIEW) tabindex="0" class=(LINK_STYLE)
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
///
/// Users that are already logged in are sent to the dashboard.
pub async fn get_register_page(
    State(state): State<AuthState>,
    jar: CookieJar,
    Query(query): Query<RedirectQuery>,
) -> Response {
    if authenticate(&jar, &state).is_ok() {
        return Redirect::to(endpoints::DASHBOARD_VIEW).into_response();
    }

    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "register query");
    let form = register_form(redirect_url.as_deref());
    let content = log_in_register("Create an account", &form);
    base("Register", &[], &content).into_response()
}

/// The data sent to register a new user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    /// The user's display name.
    pub name: String,
    /// The address the user will log in with.
    pub email: String,
    /// The user's chosen password.
    pub password: String,
    /// Optional URL to redirect to after registering.
    #[serde(default, alias = "redirect_url")]
    pub redirect_url: Option<String>,
}

/// Create a new user, log them in and return the user.
///
/// The first user to register gets the admin role.
///
/// # Errors
///
/// Returns an error if the name, email or password is invalid, or
/// [Error::EmailInUse] if the email is already registered.
pub async fn register_endpoint(
    State(state): State<AuthState>,
    HxRequest(is_htmx): HxRequest,
    jar: CookieJar,
    Input(input): Input<RegisterInput>,
) -> Result<Response, Error> {
    let name = validate::text("Name", &input.name, 2, 255)?;
    let email = Email::new(&input.email)?;
    let password = ValidatedPassword::new(&input.password)?;

    let password_hash = PasswordHash::new(password, PasswordHash::DEFAULT_COST)?;

    let user = {
        let connection = lock_connection(&state.db_connection)?;
        let role = match count_users(&connection)? {
            0 => Role::Admin,
            _ => Role::User,
        };

        create_user(
            NewUser {
                name,
                email,
                password_hash: Some(password_hash),
                role,
                whatsapp: None,
            },
            &connection,
        )?
    };

    tracing::info!("Registered user {}", user.id);

    let token = encode_token(&user, &state.session)?;
    let jar = set_session_cookie(jar, token, &state.session);

    let redirect_url = parse_redirect_url(input.redirect_url.as_deref(), "register form");
    let hx_redirect = is_htmx.then(|| HxRedirect(redirect_after_log_in(redirect_url.as_deref())));

    Ok((jar, hx_redirect, Json(user)).into_response())
}
