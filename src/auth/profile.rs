//! Endpoints for the logged in user's own profile.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use axum_htmx::{HxRedirect, HxRequest};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    activity_log::record_activity,
    attachment::{AttachmentStore, attachment_paths_for_user},
    auth::{
        cookie::clear_session_cookie,
        middleware::{AuthState, authenticate},
    },
    db::lock_connection,
    endpoints,
    rpc::{Input, success, validate},
    user::{User, UserId, delete_user, get_user_by_id, update_user_name},
};

/// Get the logged in user, or `null` if there is no valid session.
pub async fn me_endpoint(
    State(state): State<AuthState>,
    jar: CookieJar,
) -> Result<Json<Option<User>>, Error> {
    let user_id = match authenticate(&jar, &state) {
        Ok(user_id) => user_id,
        Err(Error::Unauthorized) => return Ok(Json(None)),
        Err(error) => return Err(error),
    };

    let connection = lock_connection(&state.db_connection)?;
    get_user_by_id(user_id, &connection).map(|user| Json(Some(user)))
}

/// The state needed to change or delete the logged in user.
#[derive(Debug, Clone)]
pub struct ProfileState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Where the user's attachments are kept.
    pub attachment_store: AttachmentStore,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            attachment_store: state.attachment_store.clone(),
        }
    }
}

/// The fields of the profile a user can change.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    /// The new display name.
    pub name: String,
}

/// Change the logged in user's name.
pub async fn update_profile_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserId>,
    Input(input): Input<UpdateProfileInput>,
) -> Result<Json<User>, Error> {
    let name = validate::text("Name", &input.name, 2, 255)?;

    let connection = lock_connection(&state.db_connection)?;
    let user = update_user_name(user_id, &name, &connection)?;
    record_activity(user_id, "UPDATE_PROFILE", None, &connection)?;

    Ok(Json(user))
}

/// Delete the logged in user along with all of their accounts and files, then log them out.
pub async fn delete_account_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserId>,
    HxRequest(is_htmx): HxRequest,
    jar: CookieJar,
) -> Result<Response, Error> {
    let attachment_paths = {
        let connection = lock_connection(&state.db_connection)?;
        let attachment_paths = attachment_paths_for_user(user_id, &connection)?;
        delete_user(user_id, &connection)?;
        attachment_paths
    };

    state.attachment_store.remove_files(&attachment_paths).await;
    tracing::info!("User {user_id} deleted their account");

    let hx_redirect = is_htmx.then(|| HxRedirect(endpoints::LOG_IN_VIEW.to_owned()));

    Ok((clear_session_cookie(jar), hx_redirect, success()).into_response())
}

#[cfg(test)]
mod profile_tests {
    use axum::{
        Extension,
        extract::{FromRef, State},
        http::{HeaderMap, HeaderValue, StatusCode, header::COOKIE},
    };
    use axum_extra::extract::{CookieJar, cookie::Cookie};
    use axum_htmx::HxRequest;

    use crate::{
        Error,
        account::list_accounts,
        auth::{COOKIE_SESSION, middleware::AuthState, token::encode_token},
        rpc::Input,
        test_utils::{get_header, insert_test_account, insert_test_user, test_state},
        user::get_user_by_id,
    };

    use super::{
        ProfileState, UpdateProfileInput, delete_account_endpoint, me_endpoint,
        update_profile_endpoint,
    };

    #[tokio::test]
    async fn me_returns_null_without_session() {
        let state = AuthState::from_ref(&test_state());

        let user = me_endpoint(State(state), CookieJar::new()).await.unwrap();

        assert_eq!(user.0, None);
    }

    #[tokio::test]
    async fn me_returns_logged_in_user() {
        let state = AuthState::from_ref(&test_state());
        let user = insert_test_user(&state.db_connection.lock().unwrap(), "foo@bar.baz");
        let token = encode_token(&user, &state.session).unwrap();
        let jar = CookieJar::new().add(Cookie::new(COOKIE_SESSION, token));

        let got = me_endpoint(State(state), jar).await.unwrap();

        assert_eq!(got.0.map(|user| user.id), Some(user.id));
    }

    #[tokio::test]
    async fn update_profile_changes_name() {
        let state = ProfileState::from_ref(&test_state());
        let user = insert_test_user(&state.db_connection.lock().unwrap(), "foo@bar.baz");

        let updated = update_profile_endpoint(
            State(state.clone()),
            Extension(user.id),
            Input(UpdateProfileInput {
                name: " Foo Bar ".to_owned(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(updated.0.name, "Foo Bar");
    }

    #[tokio::test]
    async fn update_profile_rejects_short_name() {
        let state = ProfileState::from_ref(&test_state());
        let user = insert_test_user(&state.db_connection.lock().unwrap(), "foo@bar.baz");

        let result = update_profile_endpoint(
            State(state),
            Extension(user.id),
            Input(UpdateProfileInput {
                name: "F".to_owned(),
            }),
        )
        .await;

        assert_eq!(
            result.err(),
            Some(Error::InvalidInput(
                "Name must be at least 2 characters".to_owned()
            ))
        );
    }

    #[tokio::test]
    async fn delete_account_removes_user_and_accounts() {
        let state = ProfileState::from_ref(&test_state());
        let user = {
            let connection = state.db_connection.lock().unwrap();
            let user = insert_test_user(&connection, "foo@bar.baz");
            insert_test_account(&connection, user.id, "Personal");
            user
        };
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("session=token"));

        let response = delete_account_endpoint(
            State(state.clone()),
            Extension(user.id),
            HxRequest(false),
            CookieJar::from_headers(&headers),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = get_header(&response, "set-cookie");
        assert!(set_cookie.starts_with(&format!("{COOKIE_SESSION}=")));
        assert!(set_cookie.contains("Max-Age=0"), "got {set_cookie}");
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_user_by_id(user.id, &connection), Err(Error::NotFound));
        assert_eq!(list_accounts(user.id, &connection), Ok(vec![]));
    }
}
