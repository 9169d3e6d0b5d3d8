//! Bills and other payments due on a date, optionally repeating.

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime};

use crate::{
    Error,
    account::{AccountId, get_account_for_user},
    calendar::add_months,
    category::CategoryId,
    credit_card::CreditCardId,
    database_id::DatabaseId,
    db::{current_timestamp, text_enum},
    money::Cents,
    user::UserId,
};

pub type ScheduledPaymentId = DatabaseId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceFrequency {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

text_enum!(RecurrenceFrequency {
    Daily => "daily",
    Weekly => "weekly",
    Monthly => "monthly",
    Yearly => "yearly",
});

impl RecurrenceFrequency {
    pub const ALL: [RecurrenceFrequency; 4] = [
        RecurrenceFrequency::Daily,
        RecurrenceFrequency::Weekly,
        RecurrenceFrequency::Monthly,
        RecurrenceFrequency::Yearly,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RecurrenceFrequency::Daily => "Daily",
            RecurrenceFrequency::Weekly => "Weekly",
            RecurrenceFrequency::Monthly => "Monthly",
            RecurrenceFrequency::Yearly => "Yearly",
        }
    }

    /// The due date of the occurrence after one due on `due_date`.
    ///
    /// Returns `None` if the date would be out of range.
    pub fn next_due_date(&self, due_date: Date) -> Option<Date> {
        match self {
            RecurrenceFrequency::Daily => due_date.next_day(),
            RecurrenceFrequency::Weekly => due_date.checked_add(Duration::weeks(1)),
            RecurrenceFrequency::Monthly => add_months(due_date, 1),
            RecurrenceFrequency::Yearly => add_months(due_date, 12),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPayment {
    pub id: ScheduledPaymentId,
    pub account_id: AccountId,
    pub category_id: Option<CategoryId>,
    pub credit_card_id: Option<CreditCardId>,
    pub description: String,
    pub amount: Cents,
    pub due_date: Date,
    pub is_paid: bool,
    pub is_recurring: bool,
    /// Always `None` for one-off payments.
    pub recurrence_frequency: Option<RecurrenceFrequency>,
    pub is_priority: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewScheduledPayment {
    pub account_id: AccountId,
    pub category_id: Option<CategoryId>,
    pub credit_card_id: Option<CreditCardId>,
    pub description: String,
    pub amount: Cents,
    pub due_date: Date,
    pub is_recurring: bool,
    pub recurrence_frequency: Option<RecurrenceFrequency>,
    pub is_priority: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ScheduledPaymentUpdate {
    pub description: Option<String>,
    pub amount: Option<Cents>,
    pub due_date: Option<Date>,
    pub is_priority: Option<bool>,
}

pub fn create_scheduled_payment_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS scheduled_payment (
            id INTEGER PRIMARY KEY,
            account_id INTEGER NOT NULL,
            category_id INTEGER,
            credit_card_id INTEGER,
            description TEXT NOT NULL,
            amount INTEGER NOT NULL,
            due_date TEXT NOT NULL,
            is_paid INTEGER NOT NULL DEFAULT 0,
            is_recurring INTEGER NOT NULL DEFAULT 0,
            recurrence_frequency TEXT,
            is_priority INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL,
            FOREIGN KEY(credit_card_id) REFERENCES credit_card(id)
                ON UPDATE CASCADE ON DELETE SET NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_scheduled_payment_account_due
        ON scheduled_payment(account_id, due_date)",
        (),
    )?;

    Ok(())
}

const COLUMNS: &str = "id, account_id, category_id, credit_card_id, description, amount, \
    due_date, is_paid, is_recurring, recurrence_frequency, is_priority, created_at, updated_at";

fn map_row(row: &Row) -> Result<ScheduledPayment, rusqlite::Error> {
    Ok(ScheduledPayment {
        id: row.get(0)?,
        account_id: row.get(1)?,
        category_id: row.get(2)?,
        credit_card_id: row.get(3)?,
        description: row.get(4)?,
        amount: row.get(5)?,
        due_date: row.get(6)?,
        is_paid: row.get(7)?,
        is_recurring: row.get(8)?,
        recurrence_frequency: row.get(9)?,
        is_priority: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

/// Insert an unpaid scheduled payment.
///
/// Recurring payments without a frequency repeat monthly and one-off
/// payments never store a frequency.
pub fn create_scheduled_payment(
    new_payment: NewScheduledPayment,
    connection: &Connection,
) -> Result<ScheduledPayment, Error> {
    let recurrence_frequency = if new_payment.is_recurring {
        Some(new_payment.recurrence_frequency.unwrap_or_default())
    } else {
        None
    };
    let now = current_timestamp();

    connection.execute(
        "INSERT INTO scheduled_payment (account_id, category_id, credit_card_id, description,
            amount, due_date, is_paid, is_recurring, recurrence_frequency, is_priority,
            created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8, ?9, ?10, ?10)",
        params![
            new_payment.account_id,
            new_payment.category_id,
            new_payment.credit_card_id,
            new_payment.description,
            new_payment.amount,
            new_payment.due_date,
            new_payment.is_recurring,
            recurrence_frequency,
            new_payment.is_priority,
            now,
        ],
    )?;

    Ok(ScheduledPayment {
        id: connection.last_insert_rowid(),
        account_id: new_payment.account_id,
        category_id: new_payment.category_id,
        credit_card_id: new_payment.credit_card_id,
        description: new_payment.description,
        amount: new_payment.amount,
        due_date: new_payment.due_date,
        is_paid: false,
        is_recurring: new_payment.is_recurring,
        recurrence_frequency,
        is_priority: new_payment.is_priority,
        created_at: now,
        updated_at: now,
    })
}

/// The account's scheduled payments, soonest first.
pub fn list_scheduled_payments(
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<ScheduledPayment>, Error> {
    connection
        .prepare(&format!(
            "SELECT {COLUMNS} FROM scheduled_payment WHERE account_id = ?1
            ORDER BY due_date ASC, id ASC"
        ))?
        .query_map([account_id], map_row)?
        .map(|maybe_payment| maybe_payment.map_err(Error::from))
        .collect()
}

/// Up to `limit` unpaid payments due on or after `from`, soonest first.
pub fn list_upcoming_payments(
    account_id: AccountId,
    from: Date,
    limit: usize,
    connection: &Connection,
) -> Result<Vec<ScheduledPayment>, Error> {
    connection
        .prepare(&format!(
            "SELECT {COLUMNS} FROM scheduled_payment
            WHERE account_id = ?1 AND is_paid = 0 AND due_date >= ?2
            ORDER BY due_date ASC, id ASC
            LIMIT ?3"
        ))?
        .query_map(params![account_id, from, limit as i64], map_row)?
        .map(|maybe_payment| maybe_payment.map_err(Error::from))
        .collect()
}

pub fn get_scheduled_payment(
    payment_id: ScheduledPaymentId,
    connection: &Connection,
) -> Result<ScheduledPayment, Error> {
    connection
        .query_row(
            &format!("SELECT {COLUMNS} FROM scheduled_payment WHERE id = ?1"),
            [payment_id],
            map_row,
        )
        .map_err(Error::from)
}

/// Get a scheduled payment and check that its account belongs to `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such payment, or
/// [Error::Forbidden] if it belongs to another user's account.
pub fn get_scheduled_payment_for_user(
    payment_id: ScheduledPaymentId,
    user_id: UserId,
    connection: &Connection,
) -> Result<ScheduledPayment, Error> {
    let payment = get_scheduled_payment(payment_id, connection)?;
    get_account_for_user(payment.account_id, user_id, connection)?;

    Ok(payment)
}

pub fn update_scheduled_payment(
    payment_id: ScheduledPaymentId,
    update: ScheduledPaymentUpdate,
    connection: &Connection,
) -> Result<ScheduledPayment, Error> {
    let rows_affected = connection.execute(
        "UPDATE scheduled_payment SET
            description = COALESCE(?2, description),
            amount = COALESCE(?3, amount),
            due_date = COALESCE(?4, due_date),
            is_priority = COALESCE(?5, is_priority),
            updated_at = ?6
        WHERE id = ?1",
        params![
            payment_id,
            update.description,
            update.amount,
            update.due_date,
            update.is_priority,
            current_timestamp(),
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_scheduled_payment(payment_id, connection)
}

/// Mark a payment as paid.
///
/// For a recurring payment the next occurrence is created, unpaid, and
/// returned. Marking a paid payment again changes nothing and returns `None`.
pub fn mark_as_paid(
    payment_id: ScheduledPaymentId,
    connection: &Connection,
) -> Result<Option<ScheduledPayment>, Error> {
    let payment = get_scheduled_payment(payment_id, connection)?;

    if payment.is_paid {
        return Ok(None);
    }

    let transaction = connection.unchecked_transaction()?;

    transaction.execute(
        "UPDATE scheduled_payment SET is_paid = 1, updated_at = ?2 WHERE id = ?1",
        params![payment_id, current_timestamp()],
    )?;

    let next_payment = match (payment.is_recurring, payment.recurrence_frequency) {
        (true, Some(frequency)) => {
            let due_date = frequency.next_due_date(payment.due_date).ok_or_else(|| {
                Error::InvalidInput("The next due date is out of range".to_owned())
            })?;

            Some(create_scheduled_payment(
                NewScheduledPayment {
                    account_id: payment.account_id,
                    category_id: payment.category_id,
                    credit_card_id: payment.credit_card_id,
                    description: payment.description,
                    amount: payment.amount,
                    due_date,
                    is_recurring: true,
                    recurrence_frequency: Some(frequency),
                    is_priority: payment.is_priority,
                },
                &transaction,
            )?)
        }
        _ => None,
    };

    transaction.commit()?;

    Ok(next_payment)
}

pub fn set_priority(
    payment_id: ScheduledPaymentId,
    is_priority: bool,
    connection: &Connection,
) -> Result<ScheduledPayment, Error> {
    update_scheduled_payment(
        payment_id,
        ScheduledPaymentUpdate {
            is_priority: Some(is_priority),
            ..Default::default()
        },
        connection,
    )
}

pub fn delete_scheduled_payment(
    payment_id: ScheduledPaymentId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM scheduled_payment WHERE id = ?1", [payment_id])?;

    if rows_affected == 0 {
        Err(Error::NotFound)
    } else {
        Ok(())
    }
}
