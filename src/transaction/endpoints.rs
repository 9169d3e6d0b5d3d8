//! The API for recording, editing and deleting transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    account::{AccountId, get_account_for_user},
    activity_log::record_activity,
    attachment::{AttachmentStore, attachment_paths_for_transaction},
    category::CategoryId,
    credit_card::CreditCardId,
    db::lock_connection,
    money::{Cents, deserialize_cents, deserialize_optional_cents},
    rpc::{Created, Input, Params, Success, created, success, validate},
    transaction::core::{
        ExpenseType, NewTransaction, Transaction, TransactionFilter, TransactionId,
        TransactionStatus, TransactionType, TransactionUpdate, TransactionWithRelations,
        check_references, create_transaction, delete_transaction, get_transaction_for_user,
        list_transactions, update_transaction,
    },
    user::UserId,
};

#[derive(Debug, Clone)]
pub struct TransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub attachment_store: AttachmentStore,
    /// Used to pre-fill the date of new transactions with today's date.
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            attachment_store: state.attachment_store.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    Path(account_id): Path<AccountId>,
    Params(filter): Params<TransactionFilter>,
) -> Result<Json<Vec<TransactionWithRelations>>, Error> {
    if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
        validate::date_range(start, end)?;
    }

    let connection = lock_connection(&state.db_connection)?;
    get_account_for_user(account_id, user_id, &connection)?;

    list_transactions(account_id, &filter, &connection).map(Json)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionInput {
    pub account_id: AccountId,
    pub category_id: CategoryId,
    pub credit_card_id: Option<CreditCardId>,
    pub description: String,
    #[serde(deserialize_with = "deserialize_cents")]
    pub amount: Cents,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub transaction_date: Date,
    pub payment_method: Option<String>,
    #[serde(default)]
    pub status: TransactionStatus,
    pub expense_type: Option<ExpenseType>,
    #[serde(default)]
    pub is_recurring: bool,
}

pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    Input(input): Input<CreateTransactionInput>,
) -> Result<Json<Created>, Error> {
    let description = validate::text("Description", &input.description, 1, 500)?;
    let amount = validate::positive_amount("Amount", input.amount)?;
    let payment_method =
        validate::optional_text("Payment method", input.payment_method.as_deref(), 100)?;

    let connection = lock_connection(&state.db_connection)?;
    get_account_for_user(input.account_id, user_id, &connection)?;
    check_references(
        input.account_id,
        Some(input.category_id),
        input.credit_card_id,
        &connection,
    )?;

    let transaction = create_transaction(
        NewTransaction {
            user_id,
            account_id: input.account_id,
            category_id: Some(input.category_id),
            credit_card_id: input.credit_card_id,
            description,
            amount,
            transaction_type: input.transaction_type,
            transaction_date: input.transaction_date,
            payment_method,
            status: input.status,
            expense_type: input.expense_type,
            is_recurring: input.is_recurring,
        },
        &connection,
    )?;

    record_activity(
        user_id,
        "CREATE_TRANSACTION",
        Some(&format!("Created transaction: {}", transaction.description)),
        &connection,
    )?;

    Ok(created(transaction.id))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionInput {
    pub category_id: Option<CategoryId>,
    pub credit_card_id: Option<CreditCardId>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_cents")]
    pub amount: Option<Cents>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub transaction_date: Option<Date>,
    pub payment_method: Option<String>,
    pub status: Option<TransactionStatus>,
    pub expense_type: Option<ExpenseType>,
    pub is_recurring: Option<bool>,
}

pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<TransactionId>,
    Input(input): Input<UpdateTransactionInput>,
) -> Result<Json<Transaction>, Error> {
    let update = TransactionUpdate {
        category_id: input.category_id,
        credit_card_id: input.credit_card_id,
        description: input
            .description
            .map(|description| validate::text("Description", &description, 1, 500))
            .transpose()?,
        amount: input
            .amount
            .map(|amount| validate::positive_amount("Amount", amount))
            .transpose()?,
        transaction_type: input.transaction_type,
        transaction_date: input.transaction_date,
        payment_method: validate::optional_text(
            "Payment method",
            input.payment_method.as_deref(),
            100,
        )?,
        status: input.status,
        expense_type: input.expense_type,
        is_recurring: input.is_recurring,
    };

    let connection = lock_connection(&state.db_connection)?;
    let transaction = get_transaction_for_user(transaction_id, user_id, &connection)?;
    check_references(
        transaction.account_id,
        update.category_id,
        update.credit_card_id,
        &connection,
    )?;

    let transaction = update_transaction(transaction_id, update, &connection)?;

    record_activity(
        user_id,
        "UPDATE_TRANSACTION",
        Some(&format!("Updated transaction ID: {transaction_id}")),
        &connection,
    )?;

    Ok(Json(transaction))
}

/// Delete a transaction along with its attachments.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Success>, Error> {
    let attachment_paths = {
        let connection = lock_connection(&state.db_connection)?;
        get_transaction_for_user(transaction_id, user_id, &connection)?;

        let attachment_paths = attachment_paths_for_transaction(transaction_id, &connection)?;
        delete_transaction(transaction_id, &connection)?;
        record_activity(
            user_id,
            "DELETE_TRANSACTION",
            Some(&format!("Deleted transaction ID: {transaction_id}")),
            &connection,
        )?;

        attachment_paths
    };

    state.attachment_store.remove_files(&attachment_paths).await;

    Ok(success())
}
