//! The API for managing an account's scheduled payments.

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
    category::CategoryId,
    credit_card::CreditCardId,
    db::lock_connection,
    money::{Cents, deserialize_cents, deserialize_optional_cents},
    rpc::{Created, Input, Success, created, success, validate},
    scheduled_payment::core::{
        NewScheduledPayment, RecurrenceFrequency, ScheduledPayment, ScheduledPaymentId,
        ScheduledPaymentUpdate, create_scheduled_payment, delete_scheduled_payment,
        get_scheduled_payment_for_user, list_scheduled_payments, mark_as_paid, set_priority,
        update_scheduled_payment,
    },
    transaction::check_references,
    user::UserId,
};

#[derive(Debug, Clone)]
pub struct ScheduledPaymentState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// Used to highlight overdue payments on the schedule page.
    pub local_timezone: String,
}

impl FromRef<AppState> for ScheduledPaymentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

pub async fn list_scheduled_payments_endpoint(
    State(state): State<ScheduledPaymentState>,
    Extension(user_id): Extension<UserId>,
    Path(account_id): Path<AccountId>,
) -> Result<Json<Vec<ScheduledPayment>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    get_account_for_user(account_id, user_id, &connection)?;

    list_scheduled_payments(account_id, &connection).map(Json)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduledPaymentInput {
    pub account_id: AccountId,
    pub category_id: CategoryId,
    pub credit_card_id: Option<CreditCardId>,
    pub description: String,
    #[serde(deserialize_with = "deserialize_cents")]
    pub amount: Cents,
    pub due_date: Date,
    #[serde(default)]
    pub is_recurring: bool,
    pub recurrence_frequency: Option<RecurrenceFrequency>,
    #[serde(default)]
    pub is_priority: bool,
}

pub async fn create_scheduled_payment_endpoint(
    State(state): State<ScheduledPaymentState>,
    Extension(user_id): Extension<UserId>,
    Input(input): Input<CreateScheduledPaymentInput>,
) -> Result<Json<Created>, Error> {
    let description = validate::text("Description", &input.description, 1, 500)?;
    let amount = validate::positive_amount("Amount", input.amount)?;

    let connection = lock_connection(&state.db_connection)?;
    get_account_for_user(input.account_id, user_id, &connection)?;
    check_references(
        input.account_id,
        Some(input.category_id),
        input.credit_card_id,
        &connection,
    )?;

    let payment = create_scheduled_payment(
        NewScheduledPayment {
            account_id: input.account_id,
            category_id: Some(input.category_id),
            credit_card_id: input.credit_card_id,
            description,
            amount,
            due_date: input.due_date,
            is_recurring: input.is_recurring,
            recurrence_frequency: input.recurrence_frequency,
            is_priority: input.is_priority,
        },
        &connection,
    )?;

    Ok(created(payment.id))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScheduledPaymentInput {
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_cents")]
    pub amount: Option<Cents>,
    pub due_date: Option<Date>,
    pub is_priority: Option<bool>,
}

pub async fn update_scheduled_payment_endpoint(
    State(state): State<ScheduledPaymentState>,
    Extension(user_id): Extension<UserId>,
    Path(payment_id): Path<ScheduledPaymentId>,
    Input(input): Input<UpdateScheduledPaymentInput>,
) -> Result<Json<ScheduledPayment>, Error> {
    let update = ScheduledPaymentUpdate {
        description: input
            .description
            .map(|description| validate::text("Description", &description, 1, 500))
            .transpose()?,
        amount: input
            .amount
            .map(|amount| validate::positive_amount("Amount", amount))
            .transpose()?,
        due_date: input.due_date,
        is_priority: input.is_priority,
    };

    let connection = lock_connection(&state.db_connection)?;
    get_scheduled_payment_for_user(payment_id, user_id, &connection)?;

    update_scheduled_payment(payment_id, update, &connection).map(Json)
}

/// Mark a payment as paid, scheduling the next one if it repeats.
pub async fn mark_as_paid_endpoint(
    State(state): State<ScheduledPaymentState>,
    Extension(user_id): Extension<UserId>,
    Path(payment_id): Path<ScheduledPaymentId>,
) -> Result<Json<Success>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    get_scheduled_payment_for_user(payment_id, user_id, &connection)?;

    if let Some(next_payment) = mark_as_paid(payment_id, &connection)? {
        tracing::debug!(
            "Scheduled payment {} for {}",
            next_payment.id,
            next_payment.due_date
        );
    }

    Ok(success())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPriorityInput {
    /// Missing when an HTML checkbox is left unchecked.
    #[serde(default)]
    pub is_priority: bool,
}

pub async fn set_priority_endpoint(
    State(state): State<ScheduledPaymentState>,
    Extension(user_id): Extension<UserId>,
    Path(payment_id): Path<ScheduledPaymentId>,
    Input(input): Input<SetPriorityInput>,
) -> Result<Json<Success>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    get_scheduled_payment_for_user(payment_id, user_id, &connection)?;
    set_priority(payment_id, input.is_priority, &connection)?;

    Ok(success())
}

pub async fn delete_scheduled_payment_endpoint(
    State(state): State<ScheduledPaymentState>,
    Extension(user_id): Extension<UserId>,
    Path(payment_id): Path<ScheduledPaymentId>,
) -> Result<Json<Success>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    get_scheduled_payment_for_user(payment_id, user_id, &connection)?;
    delete_scheduled_payment(payment_id, &connection)?;

    Ok(success())
}

#[cfg(test)]
mod scheduled_payment_endpoint_tests {
    use axum::{
        Extension,
        extract::{FromRef, Path, State},
    };
    use time::macros::date;

    use crate::{
        Error,
        account::Account,
        category::{Category, CategoryKind},
        rpc::Input,
        scheduled_payment::core::{RecurrenceFrequency, get_scheduled_payment},
        test_utils::{insert_test_account, insert_test_category, insert_test_user, test_state},
        user::User,
    };

    use super::{
        CreateScheduledPaymentInput, ScheduledPaymentState, SetPriorityInput,
        UpdateScheduledPaymentInput, create_scheduled_payment_endpoint,
        delete_scheduled_payment_endpoint, list_scheduled_payments_endpoint,
        mark_as_paid_endpoint, set_priority_endpoint, update_scheduled_payment_endpoint,
    };

    fn setup() -> (ScheduledPaymentState, User, Account, Category) {
        let state = ScheduledPaymentState::from_ref(&test_state());
        let (user, account, category) = {
            let connection = state.db_connection.lock().unwrap();
            let user = insert_test_user(&connection, "foo@bar.baz");
            let account = insert_test_account(&connection, user.id, "Personal");
            let category =
                insert_test_category(&connection, &account, "Housing", CategoryKind::Expense);
            (user, account, category)
        };

        (state, user, account, category)
    }

    fn create_input(account: &Account, category: &Category) -> CreateScheduledPaymentInput {
        CreateScheduledPaymentInput {
            account_id: account.id,
            category_id: category.id,
            credit_card_id: None,
            description: "Rent".to_owned(),
            amount: 150_000,
            due_date: date!(2025 - 03 - 31),
            is_recurring: true,
            recurrence_frequency: None,
            is_priority: false,
        }
    }

    #[tokio::test]
    async fn create_mark_paid_and_list() {
        let (state, user, account, category) = setup();

        let created = create_scheduled_payment_endpoint(
            State(state.clone()),
            Extension(user.id),
            Input(create_input(&account, &category)),
        )
        .await
        .unwrap();

        mark_as_paid_endpoint(State(state.clone()), Extension(user.id), Path(created.0.id))
            .await
            .unwrap();

        let payments =
            list_scheduled_payments_endpoint(State(state), Extension(user.id), Path(account.id))
                .await
                .unwrap()
                .0;
        assert_eq!(payments.len(), 2);
        assert!(payments[0].is_paid);
        assert_eq!(
            payments[0].recurrence_frequency,
            Some(RecurrenceFrequency::Monthly)
        );
        assert!(!payments[1].is_paid);
        assert_eq!(payments[1].due_date, date!(2025 - 04 - 30));
    }

    #[tokio::test]
    async fn create_rejects_invalid_input() {
        let (state, user, account, category) = setup();

        for input in [
            CreateScheduledPaymentInput {
                amount: -1,
                ..create_input(&account, &category)
            },
            CreateScheduledPaymentInput {
                description: "x".repeat(501),
                ..create_input(&account, &category)
            },
        ] {
            let result = create_scheduled_payment_endpoint(
                State(state.clone()),
                Extension(user.id),
                Input(input),
            )
            .await;

            assert!(matches!(result, Err(Error::InvalidInput(_))), "got {result:?}");
        }
    }

    #[tokio::test]
    async fn update_priority_and_delete() {
        let (state, user, account, category) = setup();
        let created = create_scheduled_payment_endpoint(
            State(state.clone()),
            Extension(user.id),
            Input(create_input(&account, &category)),
        )
        .await
        .unwrap();

        let updated = update_scheduled_payment_endpoint(
            State(state.clone()),
            Extension(user.id),
            Path(created.0.id),
            Input(UpdateScheduledPaymentInput {
                due_date: Some(date!(2025 - 04 - 01)),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.0.due_date, date!(2025 - 04 - 01));

        set_priority_endpoint(
            State(state.clone()),
            Extension(user.id),
            Path(created.0.id),
            Input(SetPriorityInput { is_priority: true }),
        )
        .await
        .unwrap();
        {
            let connection = state.db_connection.lock().unwrap();
            assert!(get_scheduled_payment(created.0.id, &connection).unwrap().is_priority);
        }

        delete_scheduled_payment_endpoint(
            State(state.clone()),
            Extension(user.id),
            Path(created.0.id),
        )
        .await
        .unwrap();
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_scheduled_payment(created.0.id, &connection),
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn other_users_payment_is_forbidden() {
        let (state, user, account, category) = setup();
        let created = create_scheduled_payment_endpoint(
            State(state.clone()),
            Extension(user.id),
            Input(create_input(&account, &category)),
        )
        .await
        .unwrap();
        let intruder = {
            let connection = state.db_connection.lock().unwrap();
            insert_test_user(&connection, "bar@baz.qux")
        };

        let result =
            mark_as_paid_endpoint(State(state), Extension(intruder.id), Path(created.0.id)).await;

        assert_eq!(result.err(), Some(Error::Forbidden));
    }
}
