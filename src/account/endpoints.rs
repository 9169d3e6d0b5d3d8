//! The API for listing, creating, changing and deleting accounts.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    account::core::{
        Account, AccountId, AccountType, AccountUpdate, NewAccount, create_account,
        delete_account, get_account_for_user, list_accounts, update_account,
    },
    attachment::{AttachmentStore, attachment_paths_for_account},
    category::create_default_categories,
    db::lock_connection,
    rpc::{Created, Input, Success, created, success, validate},
    user::UserId,
};

/// The state needed to manage accounts.
#[derive(Debug, Clone)]
pub struct AccountState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// Deleting an account deletes the files attached to its transactions.
    pub attachment_store: AttachmentStore,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            attachment_store: state.attachment_store.clone(),
        }
    }
}

/// List the logged in user's accounts.
pub async fn list_accounts_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Vec<Account>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    list_accounts(user_id, &connection).map(Json)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountInput {
    pub name: String,
    #[serde(rename = "type", default)]
    pub account_type: AccountType,
    /// Seed the account with the default income and expense categories.
    #[serde(default)]
    pub with_default_categories: bool,
}

pub async fn create_account_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserId>,
    Input(input): Input<CreateAccountInput>,
) -> Result<Json<Created>, Error> {
    let name = validate::text("Name", &input.name, 1, 255)?;

    let connection = lock_connection(&state.db_connection)?;
    let account = create_account(
        NewAccount {
            user_id,
            name,
            account_type: input.account_type,
        },
        &connection,
    )?;

    if input.with_default_categories {
        create_default_categories(account.id, &connection)?;
    }

    tracing::info!("User {user_id} created account {}", account.id);

    Ok(created(account.id))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountInput {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub account_type: Option<AccountType>,
}

pub async fn update_account_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserId>,
    Path(account_id): Path<AccountId>,
    Input(input): Input<UpdateAccountInput>,
) -> Result<Json<Account>, Error> {
    let name = input
        .name
        .map(|name| validate::text("Name", &name, 1, 255))
        .transpose()?;

    let connection = lock_connection(&state.db_connection)?;
    get_account_for_user(account_id, user_id, &connection)?;

    update_account(
        account_id,
        AccountUpdate {
            name,
            account_type: input.account_type,
        },
        &connection,
    )
    .map(Json)
}

/// Delete an account with everything in it, including attachment files.
pub async fn delete_account_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserId>,
    Path(account_id): Path<AccountId>,
) -> Result<Json<Success>, Error> {
    let attachment_paths = {
        let connection = lock_connection(&state.db_connection)?;
        get_account_for_user(account_id, user_id, &connection)?;
        let attachment_paths = attachment_paths_for_account(account_id, &connection)?;
        delete_account(account_id, &connection)?;
        attachment_paths
    };

    state.attachment_store.remove_files(&attachment_paths).await;
    tracing::info!("User {user_id} deleted account {account_id}");

    Ok(success())
}
