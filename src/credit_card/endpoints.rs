//! The API for managing an account's credit cards.

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
    credit_card::core::{
        CreditCard, CreditCardId, CreditCardUpdate, NewCreditCard, create_credit_card,
        delete_credit_card, get_credit_card_for_user, list_credit_cards, update_credit_card,
    },
    db::lock_connection,
    money::{Cents, deserialize_cents, deserialize_optional_cents},
    rpc::{Created, Input, Params, Success, created, success, validate},
    transaction::{Transaction, list_credit_card_transactions},
    user::UserId,
};

#[derive(Debug, Clone)]
pub struct CreditCardState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// Used to show the current month's charges on the credit cards page.
    pub local_timezone: String,
}

impl FromRef<AppState> for CreditCardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

fn validate_last_four_digits(digits: &str) -> Result<String, Error> {
    let digits = digits.trim();

    if digits.len() == 4 && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(digits.to_owned())
    } else {
        Err(Error::InvalidInput(
            "Last four digits must be exactly 4 digits".to_owned(),
        ))
    }
}

pub async fn list_credit_cards_endpoint(
    State(state): State<CreditCardState>,
    Extension(user_id): Extension<UserId>,
    Path(account_id): Path<AccountId>,
) -> Result<Json<Vec<CreditCard>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    get_account_for_user(account_id, user_id, &connection)?;

    list_credit_cards(account_id, &connection).map(Json)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCreditCardInput {
    pub account_id: AccountId,
    pub name: String,
    pub last_four_digits: String,
    pub brand: String,
    pub color: String,
    #[serde(deserialize_with = "deserialize_cents")]
    pub credit_limit: Cents,
    pub closing_day: u8,
    pub due_day: u8,
}

pub async fn create_credit_card_endpoint(
    State(state): State<CreditCardState>,
    Extension(user_id): Extension<UserId>,
    Input(input): Input<CreateCreditCardInput>,
) -> Result<Json<Created>, Error> {
    let new_card = NewCreditCard {
        account_id: input.account_id,
        name: validate::text("Name", &input.name, 1, 255)?,
        last_four_digits: validate_last_four_digits(&input.last_four_digits)?,
        brand: validate::text("Brand", &input.brand, 1, 50)?,
        color: validate::text("Color", &input.color, 1, 50)?,
        credit_limit: validate::positive_amount("Credit limit", input.credit_limit)?,
        closing_day: validate::day_of_month("Closing day", input.closing_day)?,
        due_day: validate::day_of_month("Due day", input.due_day)?,
    };

    let connection = lock_connection(&state.db_connection)?;
    get_account_for_user(input.account_id, user_id, &connection)?;

    let card = create_credit_card(new_card, &connection)?;

    Ok(created(card.id))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCreditCardInput {
    pub name: Option<String>,
    pub last_four_digits: Option<String>,
    pub brand: Option<String>,
    pub color: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_cents")]
    pub credit_limit: Option<Cents>,
    pub closing_day: Option<u8>,
    pub due_day: Option<u8>,
}

pub async fn update_credit_card_endpoint(
    State(state): State<CreditCardState>,
    Extension(user_id): Extension<UserId>,
    Path(credit_card_id): Path<CreditCardId>,
    Input(input): Input<UpdateCreditCardInput>,
) -> Result<Json<CreditCard>, Error> {
    let update = CreditCardUpdate {
        name: input
            .name
            .map(|name| validate::text("Name", &name, 1, 255))
            .transpose()?,
        last_four_digits: input
            .last_four_digits
            .map(|digits| validate_last_four_digits(&digits))
            .transpose()?,
        brand: input
            .brand
            .map(|brand| validate::text("Brand", &brand, 1, 50))
            .transpose()?,
        color: input
            .color
            .map(|color| validate::text("Color", &color, 1, 50))
            .transpose()?,
        credit_limit: input
            .credit_limit
            .map(|limit| validate::positive_amount("Credit limit", limit))
            .transpose()?,
        closing_day: input
            .closing_day
            .map(|day| validate::day_of_month("Closing day", day))
            .transpose()?,
        due_day: input
            .due_day
            .map(|day| validate::day_of_month("Due day", day))
            .transpose()?,
    };

    let connection = lock_connection(&state.db_connection)?;
    get_credit_card_for_user(credit_card_id, user_id, &connection)?;

    update_credit_card(credit_card_id, update, &connection).map(Json)
}

pub async fn delete_credit_card_endpoint(
    State(state): State<CreditCardState>,
    Extension(user_id): Extension<UserId>,
    Path(credit_card_id): Path<CreditCardId>,
) -> Result<Json<Success>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    get_credit_card_for_user(credit_card_id, user_id, &connection)?;
    delete_credit_card(credit_card_id, &connection)?;

    Ok(success())
}

/// The inclusive date range of a credit card's expenses.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpensesQuery {
    pub start_date: Date,
    pub end_date: Date,
}

/// The transactions charged to a card in the date range, newest first.
pub async fn credit_card_expenses_endpoint(
    State(state): State<CreditCardState>,
    Extension(user_id): Extension<UserId>,
    Path(credit_card_id): Path<CreditCardId>,
    Params(query): Params<ExpensesQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    validate::date_range(query.start_date, query.end_date)?;

    let connection = lock_connection(&state.db_connection)?;
    get_credit_card_for_user(credit_card_id, user_id, &connection)?;

    list_credit_card_transactions(credit_card_id, query.start_date, query.end_date, &connection)
        .map(Json)
}
