//! Reading and writing the session cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::auth::token::SessionConfig;

/// The name of the cookie holding the session token.
pub const COOKIE_SESSION: &str = "session";

/// Add the session cookie holding `token` to the jar.
pub fn set_session_cookie(jar: CookieJar, token: String, config: &SessionConfig) -> CookieJar {
    jar.add(
        Cookie::build((COOKIE_SESSION, token))
            .http_only(true)
            .secure(config.secure_cookie)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(config.duration),
    )
}

/// Tell the client to delete the session cookie.
pub fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(COOKIE_SESSION).path("/"))
}

/// The session token in the jar, if any.
pub fn get_session_token(jar: &CookieJar) -> Option<&str> {
    jar.get(COOKIE_SESSION).map(|cookie| cookie.value())
}
