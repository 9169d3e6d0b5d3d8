//! The API for managing an account's categories.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    account::{AccountId, get_account_for_user},
    category::core::{
        Category, CategoryId, CategoryKind, CategoryUpdate, NewCategory, create_category,
        delete_category, get_category_for_user, list_categories, update_category,
    },
    db::lock_connection,
    rpc::{Created, Input, Success, created, success, validate},
    user::UserId,
};

#[derive(Debug, Clone)]
pub struct CategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub async fn list_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserId>,
    Path(account_id): Path<AccountId>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    get_account_for_user(account_id, user_id, &connection)?;

    list_categories(account_id, &connection).map(Json)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryInput {
    pub account_id: AccountId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    pub icon: Option<String>,
    pub color: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserId>,
    Input(input): Input<CreateCategoryInput>,
) -> Result<Json<Created>, Error> {
    let name = validate::text("Name", &input.name, 1, 255)?;
    let icon = validate::optional_text("Icon", input.icon.as_deref(), 100)?;
    let color = validate::optional_text("Color", input.color.as_deref(), 50)?;

    let connection = lock_connection(&state.db_connection)?;
    get_account_for_user(input.account_id, user_id, &connection)?;

    let category = create_category(
        NewCategory {
            account_id: input.account_id,
            name,
            kind: input.kind,
            icon,
            color,
            is_default: input.is_default,
        },
        &connection,
    )?;

    Ok(created(category.id))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

pub async fn update_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserId>,
    Path(category_id): Path<CategoryId>,
    Input(input): Input<UpdateCategoryInput>,
) -> Result<Json<Category>, Error> {
    let update = CategoryUpdate {
        name: input
            .name
            .map(|name| validate::text("Name", &name, 1, 255))
            .transpose()?,
        icon: validate::optional_text("Icon", input.icon.as_deref(), 100)?,
        color: validate::optional_text("Color", input.color.as_deref(), 50)?,
    };

    let connection = lock_connection(&state.db_connection)?;
    get_category_for_user(category_id, user_id, &connection)?;

    update_category(category_id, update, &connection).map(Json)
}

/// Delete a category, transactions in it become uncategorized.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserId>,
    Path(category_id): Path<CategoryId>,
) -> Result<Json<Success>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    get_category_for_user(category_id, user_id, &connection)?;
    delete_category(category_id, &connection)?;

    Ok(success())
}

#[cfg(test)]
mod category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
    };
    use time::macros::date;

    use crate::{
        Error,
        account::Account,
        category::core::{CategoryKind, get_category},
        rpc::Input,
        test_utils::{
            get_test_connection, insert_test_account, insert_test_category,
            insert_test_transaction, insert_test_user,
        },
        transaction::{TransactionType, get_transaction},
        user::User,
    };

    use super::{
        CategoryState, CreateCategoryInput, UpdateCategoryInput, create_category_endpoint,
        delete_category_endpoint, list_categories_endpoint, update_category_endpoint,
    };

    fn get_state() -> (CategoryState, User, Account) {
        let connection = get_test_connection();
        let user = insert_test_user(&connection, "foo@bar.baz");
        let account = insert_test_account(&connection, user.id, "Personal");

        (
            CategoryState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user,
            account,
        )
    }

    fn create_input(account: &Account, name: &str) -> CreateCategoryInput {
        CreateCategoryInput {
            account_id: account.id,
            name: name.to_owned(),
            kind: CategoryKind::Expense,
            icon: Some("🛒".to_owned()),
            color: Some("#ea580c".to_owned()),
            is_default: false,
        }
    }

    #[tokio::test]
    async fn create_and_list() {
        let (state, user, account) = get_state();

        let created = create_category_endpoint(
            State(state.clone()),
            Extension(user.id),
            Input(create_input(&account, "Groceries")),
        )
        .await
        .unwrap();

        let categories =
            list_categories_endpoint(State(state), Extension(user.id), Path(account.id))
                .await
                .unwrap();
        assert_eq!(categories.0.len(), 1);
        assert_eq!(categories.0[0].id, created.0.id);
        assert_eq!(categories.0[0].name, "Groceries");
    }

    #[tokio::test]
    async fn create_rejects_long_color() {
        let (state, user, account) = get_state();
        let mut input = create_input(&account, "Groceries");
        input.color = Some("x".repeat(51));

        let result = create_category_endpoint(State(state), Extension(user.id), Input(input)).await;

        assert_eq!(
            result.err(),
            Some(Error::InvalidInput(
                "Color must be at most 50 characters".to_owned()
            ))
        );
    }

    #[tokio::test]
    async fn cannot_create_in_other_users_account() {
        let (state, _, account) = get_state();
        let intruder = {
            let connection = state.db_connection.lock().unwrap();
            insert_test_user(&connection, "bar@baz.qux")
        };

        let result = create_category_endpoint(
            State(state),
            Extension(intruder.id),
            Input(create_input(&account, "Groceries")),
        )
        .await;

        assert_eq!(result.err(), Some(Error::Forbidden));
    }

    #[tokio::test]
    async fn cannot_list_other_users_categories() {
        let (state, _, account) = get_state();
        let intruder = {
            let connection = state.db_connection.lock().unwrap();
            insert_test_user(&connection, "bar@baz.qux")
        };

        let result =
            list_categories_endpoint(State(state), Extension(intruder.id), Path(account.id)).await;

        assert_eq!(result.err(), Some(Error::Forbidden));
    }

    #[tokio::test]
    async fn update_missing_category() {
        let (state, user, _) = get_state();

        let result = update_category_endpoint(
            State(state),
            Extension(user.id),
            Path(1234),
            Input(UpdateCategoryInput::default()),
        )
        .await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }

    #[tokio::test]
    async fn update_renames() {
        let (state, user, account) = get_state();
        let category = {
            let connection = state.db_connection.lock().unwrap();
            insert_test_category(&connection, &account, "Food", CategoryKind::Expense)
        };

        let updated = update_category_endpoint(
            State(state),
            Extension(user.id),
            Path(category.id),
            Input(UpdateCategoryInput {
                name: Some("Groceries".to_owned()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(updated.0.name, "Groceries");
        assert_eq!(updated.0.color, category.color);
    }

    #[tokio::test]
    async fn delete_keeps_transactions() {
        let (state, user, account) = get_state();
        let (category, transaction) = {
            let connection = state.db_connection.lock().unwrap();
            let category =
                insert_test_category(&connection, &account, "Food", CategoryKind::Expense);
            let transaction = insert_test_transaction(
                &connection,
                &account,
                TransactionType::Expense,
                1000,
                date!(2025 - 01 - 01),
            );
            connection
                .execute(
                    "UPDATE \"transaction\" SET category_id = ?1 WHERE id = ?2",
                    (category.id, transaction.id),
                )
                .unwrap();
            (category, transaction)
        };

        delete_category_endpoint(State(state.clone()), Extension(user.id), Path(category.id))
            .await
            .unwrap();

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_category(category.id, &connection), Err(Error::NotFound));
        let transaction = get_transaction(transaction.id, &connection).unwrap();
        assert_eq!(transaction.category_id, None);
    }
}
