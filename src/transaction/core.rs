//! Income and expense records and their storage.

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    account::{AccountId, get_account_for_user},
    category::CategoryId,
    credit_card::CreditCardId,
    database_id::DatabaseId,
    db::{current_timestamp, text_enum},
    money::Cents,
    user::UserId,
};

pub type TransactionId = DatabaseId;

/// Whether a transaction adds to or takes from an account's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Money received.
    Income,
    /// Money spent.
    Expense,
}

text_enum!(TransactionType {
    Income => "income",
    Expense => "expense",
});

/// Whether the money has actually moved yet.
///
/// Only paid transactions count towards the dashboard totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// The money has moved.
    #[default]
    Paid,
    /// The money is expected but has not moved yet.
    Pending,
}

text_enum!(TransactionStatus {
    Paid => "paid",
    Pending => "pending",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseType {
    Fixed,
    Variable,
}

text_enum!(ExpenseType {
    Fixed => "fixed",
    Variable => "variable",
});

impl TransactionType {
    /// The name shown on pages.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
        }
    }
}

impl TransactionStatus {
    /// The name shown on pages.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionStatus::Paid => "Paid",
            TransactionStatus::Pending => "Pending",
        }
    }
}

impl ExpenseType {
    pub fn label(&self) -> &'static str {
        match self {
            ExpenseType::Fixed => "Fixed",
            ExpenseType::Variable => "Variable",
        }
    }
}

/// Money coming into or going out of an account on a given date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    /// The user that recorded the transaction.
    pub user_id: UserId,
    pub account_id: AccountId,
    /// `None` if the transaction's category has been deleted.
    pub category_id: Option<CategoryId>,
    pub credit_card_id: Option<CreditCardId>,
    pub description: String,
    /// Always positive, [Transaction::transaction_type] gives the direction.
    pub amount: Cents,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub transaction_date: Date,
    pub payment_method: Option<String>,
    pub status: TransactionStatus,
    pub expense_type: Option<ExpenseType>,
    pub is_recurring: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A transaction with the names needed to display it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionWithRelations {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
    pub credit_card_name: Option<String>,
}

/// The data needed to record a transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// The user who recorded the transaction.
    pub user_id: UserId,
    /// The account the transaction belongs to.
    pub account_id: AccountId,
    /// Must be a category of the same account.
    pub category_id: Option<CategoryId>,
    /// Must be a credit card of the same account.
    pub credit_card_id: Option<CreditCardId>,
    /// What the money was for.
    pub description: String,
    /// The amount in cents, always positive.
    pub amount: Cents,
    /// Income or expense.
    pub transaction_type: TransactionType,
    /// The day the money moved, or is expected to.
    pub transaction_date: Date,
    /// Free text, e.g. "Bank transfer".
    pub payment_method: Option<String>,
    /// Whether the money has moved yet.
    pub status: TransactionStatus,
    /// Only meaningful for expenses.
    pub expense_type: Option<ExpenseType>,
    /// Whether the transaction repeats, e.g. a salary.
    pub is_recurring: bool,
}

/// The fields of a transaction that can be changed, `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    pub category_id: Option<CategoryId>,
    pub credit_card_id: Option<CreditCardId>,
    pub description: Option<String>,
    pub amount: Option<Cents>,
    pub transaction_type: Option<TransactionType>,
    pub transaction_date: Option<Date>,
    pub payment_method: Option<String>,
    pub status: Option<TransactionStatus>,
    pub expense_type: Option<ExpenseType>,
    pub is_recurring: Option<bool>,
}

/// Narrows down the transactions of an account. Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub category_id: Option<CategoryId>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
    pub payment_method: Option<String>,
}

pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            account_id INTEGER NOT NULL,
            category_id INTEGER,
            credit_card_id INTEGER,
            description TEXT NOT NULL,
            amount INTEGER NOT NULL,
            type TEXT NOT NULL,
            transaction_date TEXT NOT NULL,
            payment_method TEXT,
            status TEXT NOT NULL DEFAULT 'paid',
            expense_type TEXT,
            is_recurring INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL,
            FOREIGN KEY(credit_card_id) REFERENCES credit_card(id)
                ON UPDATE CASCADE ON DELETE SET NULL
        )",
        (),
    )?;

    // Speed up the dashboard and transaction list queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_account_date
        ON \"transaction\"(account_id, transaction_date)",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_credit_card
        ON \"transaction\"(credit_card_id)",
        (),
    )?;

    Ok(())
}

const TRANSACTION_COLUMNS: &str = "\"transaction\".id, \"transaction\".user_id, \
    \"transaction\".account_id, \"transaction\".category_id, \"transaction\".credit_card_id, \
    \"transaction\".description, \"transaction\".amount, \"transaction\".type, \
    \"transaction\".transaction_date, \"transaction\".payment_method, \"transaction\".status, \
    \"transaction\".expense_type, \"transaction\".is_recurring, \"transaction\".created_at, \
    \"transaction\".updated_at";

pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        account_id: row.get(2)?,
        category_id: row.get(3)?,
        credit_card_id: row.get(4)?,
        description: row.get(5)?,
        amount: row.get(6)?,
        transaction_type: row.get(7)?,
        transaction_date: row.get(8)?,
        payment_method: row.get(9)?,
        status: row.get(10)?,
        expense_type: row.get(11)?,
        is_recurring: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

/// Record a transaction and return it with its new id.
///
/// Callers check the category and credit card with [check_references] first.
pub fn create_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let now = current_timestamp();

    connection.execute(
        "INSERT INTO \"transaction\" (user_id, account_id, category_id, credit_card_id,
            description, amount, type, transaction_date, payment_method, status, expense_type,
            is_recurring, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
        params![
            new_transaction.user_id,
            new_transaction.account_id,
            new_transaction.category_id,
            new_transaction.credit_card_id,
            new_transaction.description,
            new_transaction.amount,
            new_transaction.transaction_type,
            new_transaction.transaction_date,
            new_transaction.payment_method,
            new_transaction.status,
            new_transaction.expense_type,
            new_transaction.is_recurring,
            now,
        ],
    )?;

    Ok(Transaction {
        id: connection.last_insert_rowid(),
        user_id: new_transaction.user_id,
        account_id: new_transaction.account_id,
        category_id: new_transaction.category_id,
        credit_card_id: new_transaction.credit_card_id,
        description: new_transaction.description,
        amount: new_transaction.amount,
        transaction_type: new_transaction.transaction_type,
        transaction_date: new_transaction.transaction_date,
        payment_method: new_transaction.payment_method,
        status: new_transaction.status,
        expense_type: new_transaction.expense_type,
        is_recurring: new_transaction.is_recurring,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_transaction(
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .query_row(
            &format!("SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = ?1"),
            [transaction_id],
            map_transaction_row,
        )
        .map_err(Error::from)
}

/// Get a transaction and check that its account belongs to `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such transaction, or
/// [Error::Forbidden] if it belongs to another user's account.
pub fn get_transaction_for_user(
    transaction_id: TransactionId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = get_transaction(transaction_id, connection)?;
    get_account_for_user(transaction.account_id, user_id, connection)?;

    Ok(transaction)
}

/// Check that the category and credit card of a transaction belong to `account_id`.
///
/// # Errors
/// Returns [Error::InvalidInput] if either does not exist or belongs to
/// another account.
pub fn check_references(
    account_id: AccountId,
    category_id: Option<CategoryId>,
    credit_card_id: Option<CreditCardId>,
    connection: &Connection,
) -> Result<(), Error> {
    let belongs_to_account = |table: &str, id: DatabaseId| -> Result<bool, Error> {
        connection
            .query_row(
                &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1 AND account_id = ?2)"),
                params![id, account_id],
                |row| row.get(0),
            )
            .map_err(Error::from)
    };

    if let Some(category_id) = category_id
        && !belongs_to_account("category", category_id)?
    {
        return Err(Error::InvalidInput(
            "The category does not belong to this account".to_owned(),
        ));
    }

    if let Some(credit_card_id) = credit_card_id
        && !belongs_to_account("credit_card", credit_card_id)?
    {
        return Err(Error::InvalidInput(
            "The credit card does not belong to this account".to_owned(),
        ));
    }

    Ok(())
}

pub fn update_transaction(
    transaction_id: TransactionId,
    update: TransactionUpdate,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let rows_affected = connection.execute(
        "UPDATE \"transaction\" SET
            category_id = COALESCE(?2, category_id),
            credit_card_id = COALESCE(?3, credit_card_id),
            description = COALESCE(?4, description),
            amount = COALESCE(?5, amount),
            type = COALESCE(?6, type),
            transaction_date = COALESCE(?7, transaction_date),
            payment_method = COALESCE(?8, payment_method),
            status = COALESCE(?9, status),
            expense_type = COALESCE(?10, expense_type),
            is_recurring = COALESCE(?11, is_recurring),
            updated_at = ?12
        WHERE id = ?1",
        params![
            transaction_id,
            update.category_id,
            update.credit_card_id,
            update.description,
            update.amount,
            update.transaction_type,
            update.transaction_date,
            update.payment_method,
            update.status,
            update.expense_type,
            update.is_recurring,
            current_timestamp(),
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_transaction(transaction_id, connection)
}

/// Delete a transaction and its attachment rows.
///
/// Attachment files must be removed by the caller.
pub fn delete_transaction(
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM \"transaction\" WHERE id = ?1", [transaction_id])?;

    if rows_affected == 0 {
        Err(Error::NotFound)
    } else {
        Ok(())
    }
}

/// The account's transactions matching `filter`, newest first.
///
/// Transactions on the same date are ordered by ID, newest first, so that
/// the order stays stable after updates.
pub fn list_transactions(
    account_id: AccountId,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<TransactionWithRelations>, Error> {
    let query = format!(
        "SELECT {TRANSACTION_COLUMNS}, category.name, category.color, credit_card.name
        FROM \"transaction\"
        LEFT JOIN category ON \"transaction\".category_id = category.id
        LEFT JOIN credit_card ON \"transaction\".credit_card_id = credit_card.id
        WHERE \"transaction\".account_id = ?1
            AND (?2 IS NULL OR \"transaction\".transaction_date >= ?2)
            AND (?3 IS NULL OR \"transaction\".transaction_date <= ?3)
            AND (?4 IS NULL OR \"transaction\".category_id = ?4)
            AND (?5 IS NULL OR \"transaction\".type = ?5)
            AND (?6 IS NULL OR \"transaction\".status = ?6)
            AND (?7 IS NULL OR \"transaction\".payment_method = ?7)
        ORDER BY \"transaction\".transaction_date DESC, \"transaction\".id DESC"
    );

    connection
        .prepare(&query)?
        .query_map(
            params![
                account_id,
                filter.start_date,
                filter.end_date,
                filter.category_id,
                filter.transaction_type,
                filter.status,
                filter.payment_method,
            ],
            |row| {
                Ok(TransactionWithRelations {
                    transaction: map_transaction_row(row)?,
                    category_name: row.get(15)?,
                    category_color: row.get(16)?,
                    credit_card_name: row.get(17)?,
                })
            },
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// The transactions charged to a credit card between `start` and `end` inclusive, newest first.
pub fn list_credit_card_transactions(
    credit_card_id: CreditCardId,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
            WHERE credit_card_id = ?1 AND transaction_date BETWEEN ?2 AND ?3
            ORDER BY transaction_date DESC, id DESC"
        ))?
        .query_map(params![credit_card_id, start, end], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod transaction_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        account::Account,
        category::CategoryKind,
        test_utils::{
            get_test_connection, insert_test_account, insert_test_category,
            insert_test_credit_card, insert_test_transaction, insert_test_user,
        },
        user::User,
    };

    use super::{
        TransactionFilter, TransactionStatus, TransactionType, TransactionUpdate,
        check_references, delete_transaction, get_transaction, get_transaction_for_user,
        list_credit_card_transactions, list_transactions, update_transaction,
    };

    fn setup() -> (Connection, User, Account) {
        let connection = get_test_connection();
        let user = insert_test_user(&connection, "foo@bar.baz");
        let account = insert_test_account(&connection, user.id, "Personal");

        (connection, user, account)
    }

    #[test]
    fn lists_newest_first_with_stable_ties() {
        let (connection, _, account) = setup();
        let older = insert_test_transaction(
            &connection,
            &account,
            TransactionType::Expense,
            100,
            date!(2025 - 01 - 01),
        );
        let first_same_day = insert_test_transaction(
            &connection,
            &account,
            TransactionType::Expense,
            200,
            date!(2025 - 01 - 02),
        );
        let second_same_day = insert_test_transaction(
            &connection,
            &account,
            TransactionType::Income,
            300,
            date!(2025 - 01 - 02),
        );

        let got: Vec<_> = list_transactions(account.id, &TransactionFilter::default(), &connection)
            .unwrap()
            .into_iter()
            .map(|transaction| transaction.transaction.id)
            .collect();

        assert_eq!(got, vec![second_same_day.id, first_same_day.id, older.id]);
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let (connection, _, account) = setup();
        for day in [1, 2, 3, 4] {
            insert_test_transaction(
                &connection,
                &account,
                TransactionType::Expense,
                100,
                time::Date::from_calendar_date(2025, time::Month::March, day).unwrap(),
            );
        }

        let got = list_transactions(
            account.id,
            &TransactionFilter {
                start_date: Some(date!(2025 - 03 - 02)),
                end_date: Some(date!(2025 - 03 - 03)),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(got.len(), 2);
    }

    #[test]
    fn filters_by_type_status_and_category() {
        let (connection, _, account) = setup();
        let category = insert_test_category(&connection, &account, "Food", CategoryKind::Expense);
        let income = insert_test_transaction(
            &connection,
            &account,
            TransactionType::Income,
            100,
            date!(2025 - 01 - 01),
        );
        let expense = insert_test_transaction(
            &connection,
            &account,
            TransactionType::Expense,
            100,
            date!(2025 - 01 - 01),
        );
        update_transaction(
            expense.id,
            TransactionUpdate {
                category_id: Some(category.id),
                status: Some(TransactionStatus::Pending),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        let by_type = list_transactions(
            account.id,
            &TransactionFilter {
                transaction_type: Some(TransactionType::Income),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();
        let by_status = list_transactions(
            account.id,
            &TransactionFilter {
                status: Some(TransactionStatus::Pending),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();
        let by_category = list_transactions(
            account.id,
            &TransactionFilter {
                category_id: Some(category.id),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(by_type.len(), 1);
        assert_eq!(by_type[0].transaction.id, income.id);
        assert_eq!(by_status.len(), 1);
        assert_eq!(by_status[0].transaction.id, expense.id);
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].category_name.as_deref(), Some("Food"));
        assert_eq!(by_category[0].category_color, category.color);
    }

    #[test]
    fn references_must_belong_to_account() {
        let (connection, user, account) = setup();
        let other_account = insert_test_account(&connection, user.id, "Business");
        let category = insert_test_category(
            &connection,
            &other_account,
            "Food",
            CategoryKind::Expense,
        );
        let card = insert_test_credit_card(&connection, &other_account);

        assert!(matches!(
            check_references(account.id, Some(category.id), None, &connection),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            check_references(account.id, None, Some(card.id), &connection),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(
            check_references(other_account.id, Some(category.id), Some(card.id), &connection),
            Ok(())
        );
    }

    #[test]
    fn ownership_checks() {
        let (connection, _, account) = setup();
        let intruder = insert_test_user(&connection, "bar@baz.qux");
        let transaction = insert_test_transaction(
            &connection,
            &account,
            TransactionType::Expense,
            100,
            date!(2025 - 01 - 01),
        );

        assert_eq!(
            get_transaction_for_user(transaction.id, intruder.id, &connection),
            Err(Error::Forbidden)
        );
        assert_eq!(
            get_transaction_for_user(transaction.id + 1, intruder.id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn update_and_delete() {
        let (connection, _, account) = setup();
        let transaction = insert_test_transaction(
            &connection,
            &account,
            TransactionType::Expense,
            100,
            date!(2025 - 01 - 01),
        );

        let updated = update_transaction(
            transaction.id,
            TransactionUpdate {
                amount: Some(2500),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();
        assert_eq!(updated.amount, 2500);
        assert_eq!(updated.description, transaction.description);

        delete_transaction(transaction.id, &connection).unwrap();
        assert_eq!(get_transaction(transaction.id, &connection), Err(Error::NotFound));
    }

    #[test]
    fn credit_card_transactions_in_range() {
        let (connection, _, account) = setup();
        let card = insert_test_credit_card(&connection, &account);
        for date in [date!(2025 - 01 - 01), date!(2025 - 02 - 01), date!(2025 - 03 - 01)] {
            let transaction =
                insert_test_transaction(&connection, &account, TransactionType::Expense, 100, date);
            update_transaction(
                transaction.id,
                TransactionUpdate {
                    credit_card_id: Some(card.id),
                    ..Default::default()
                },
                &connection,
            )
            .unwrap();
        }

        let got = list_credit_card_transactions(
            card.id,
            date!(2025 - 01 - 15),
            date!(2025 - 03 - 01),
            &connection,
        )
        .unwrap();

        let dates: Vec<_> = got.iter().map(|transaction| transaction.transaction_date).collect();
        assert_eq!(dates, vec![date!(2025 - 03 - 01), date!(2025 - 02 - 01)]);
    }
}
