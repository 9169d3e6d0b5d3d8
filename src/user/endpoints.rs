//! The API for listing, inviting and removing users.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    attachment::{AttachmentStore, attachment_paths_for_user},
    db::lock_connection,
    rpc::{Input, Success, success, validate},
    user::core::{
        Email, NewUser, Role, User, UserId, create_user, delete_user, get_user_by_id, list_users,
    },
};

/// The shortest WhatsApp number accepted, in characters.
const MIN_WHATSAPP_LENGTH: usize = 10;

/// The state needed to manage users.
#[derive(Debug, Clone)]
pub struct UserState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// Where a removed user's attachments are kept.
    pub attachment_store: AttachmentStore,
}

impl FromRef<AppState> for UserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            attachment_store: state.attachment_store.clone(),
        }
    }
}

/// Check that `user_id` belongs to an administrator.
///
/// # Errors
///
/// Returns [Error::Forbidden] for any other role, or [Error::NotFound] if the user is gone.
pub fn require_admin(user_id: UserId, connection: &Connection) -> Result<(), Error> {
    match get_user_by_id(user_id, connection)?.role {
        Role::Admin => Ok(()),
        Role::User => {
            tracing::warn!("User {user_id} tried to manage users without the admin role");
            Err(Error::Forbidden)
        }
    }
}

/// Every user, ordered by name. Password hashes are never included.
///
/// Only administrators may list users.
pub async fn list_users_endpoint(
    State(state): State<UserState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Vec<User>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    require_admin(user_id, &connection)?;

    list_users(&connection).map(Json)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteUserInput {
    pub name: String,
    pub email: String,
    pub whatsapp: String,
}

/// Create a user without a password.
///
/// The new user cannot log in until a password is set for them.
/// Only administrators may invite users.
pub async fn invite_user_endpoint(
    State(state): State<UserState>,
    Extension(user_id): Extension<UserId>,
    Input(input): Input<InviteUserInput>,
) -> Result<Json<User>, Error> {
    require_admin(user_id, &*lock_connection(&state.db_connection)?)?;

    let new_user = NewUser {
        name: validate::text("Name", &input.name, 2, 255)?,
        email: Email::new(&input.email)?,
        password_hash: None,
        role: Role::User,
        whatsapp: Some(validate::text(
            "WhatsApp number",
            &input.whatsapp,
            MIN_WHATSAPP_LENGTH,
            50,
        )?),
    };

    let connection = lock_connection(&state.db_connection)?;
    let user = create_user(new_user, &connection)?;
    tracing::info!("User {user_id} invited user {}", user.id);

    Ok(Json(user))
}

/// Remove another user along with their accounts and attachment files.
/// Only administrators may remove users.
pub async fn delete_user_endpoint(
    State(state): State<UserState>,
    Extension(user_id): Extension<UserId>,
    Path(target_id): Path<UserId>,
) -> Result<Json<Success>, Error> {
    let attachment_paths = {
        let connection = lock_connection(&state.db_connection)?;
        require_admin(user_id, &connection)?;

        if target_id == user_id {
            return Err(Error::CannotDeleteSelf);
        }

        get_user_by_id(target_id, &connection)?;
        let attachment_paths = attachment_paths_for_user(target_id, &connection)?;
        delete_user(target_id, &connection)?;
        attachment_paths
    };

    state.attachment_store.remove_files(&attachment_paths).await;
    tracing::info!("User {user_id} removed user {target_id}");

    Ok(success())
}
