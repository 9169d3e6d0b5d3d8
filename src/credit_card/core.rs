//! Credit cards and their storage.

use rusqlite::{Connection, Row, params};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    account::{AccountId, get_account_for_user},
    database_id::DatabaseId,
    db::current_timestamp,
    money::Cents,
    user::UserId,
};

pub type CreditCardId = DatabaseId;

/// A credit card that expenses in an account can be charged to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCard {
    pub id: CreditCardId,
    pub account_id: AccountId,
    pub name: String,
    pub last_four_digits: String,
    /// E.g. "Visa" or "Mastercard".
    pub brand: String,
    pub color: String,
    pub credit_limit: Cents,
    /// The day of the month the statement closes.
    pub closing_day: u8,
    /// The day of the month the statement must be paid.
    pub due_day: u8,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewCreditCard {
    pub account_id: AccountId,
    pub name: String,
    pub last_four_digits: String,
    pub brand: String,
    pub color: String,
    pub credit_limit: Cents,
    pub closing_day: u8,
    pub due_day: u8,
}

#[derive(Debug, Clone, Default)]
pub struct CreditCardUpdate {
    pub name: Option<String>,
    pub last_four_digits: Option<String>,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub credit_limit: Option<Cents>,
    pub closing_day: Option<u8>,
    pub due_day: Option<u8>,
}

pub fn create_credit_card_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS credit_card (
            id INTEGER PRIMARY KEY,
            account_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            last_four_digits TEXT NOT NULL,
            brand TEXT NOT NULL,
            color TEXT NOT NULL,
            credit_limit INTEGER NOT NULL,
            closing_day INTEGER NOT NULL,
            due_day INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_credit_card_account ON credit_card(account_id)",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<CreditCard, rusqlite::Error> {
    Ok(CreditCard {
        id: row.get(0)?,
        account_id: row.get(1)?,
        name: row.get(2)?,
        last_four_digits: row.get(3)?,
        brand: row.get(4)?,
        color: row.get(5)?,
        credit_limit: row.get(6)?,
        closing_day: row.get(7)?,
        due_day: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

pub fn create_credit_card(
    new_card: NewCreditCard,
    connection: &Connection,
) -> Result<CreditCard, Error> {
    let now = current_timestamp();

    connection.execute(
        "INSERT INTO credit_card (account_id, name, last_four_digits, brand, color, credit_limit,
            closing_day, due_day, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        params![
            new_card.account_id,
            new_card.name,
            new_card.last_four_digits,
            new_card.brand,
            new_card.color,
            new_card.credit_limit,
            new_card.closing_day,
            new_card.due_day,
            now,
        ],
    )?;

    Ok(CreditCard {
        id: connection.last_insert_rowid(),
        account_id: new_card.account_id,
        name: new_card.name,
        last_four_digits: new_card.last_four_digits,
        brand: new_card.brand,
        color: new_card.color,
        credit_limit: new_card.credit_limit,
        closing_day: new_card.closing_day,
        due_day: new_card.due_day,
        created_at: now,
        updated_at: now,
    })
}

/// The account's credit cards, newest first.
pub fn list_credit_cards(
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<CreditCard>, Error> {
    connection
        .prepare(
            "SELECT id, account_id, name, last_four_digits, brand, color, credit_limit,
                closing_day, due_day, created_at, updated_at
            FROM credit_card WHERE account_id = ?1
            ORDER BY created_at DESC, id DESC",
        )?
        .query_map([account_id], map_row)?
        .map(|maybe_card| maybe_card.map_err(Error::from))
        .collect()
}

pub fn get_credit_card(
    credit_card_id: CreditCardId,
    connection: &Connection,
) -> Result<CreditCard, Error> {
    connection
        .query_row(
            "SELECT id, account_id, name, last_four_digits, brand, color, credit_limit,
                closing_day, due_day, created_at, updated_at
            FROM credit_card WHERE id = ?1",
            [credit_card_id],
            map_row,
        )
        .map_err(Error::from)
}

/// Get a credit card and check that its account belongs to `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such card, or
/// [Error::Forbidden] if it belongs to another user's account.
pub fn get_credit_card_for_user(
    credit_card_id: CreditCardId,
    user_id: UserId,
    connection: &Connection,
) -> Result<CreditCard, Error> {
    let card = get_credit_card(credit_card_id, connection)?;
    get_account_for_user(card.account_id, user_id, connection)?;

    Ok(card)
}

pub fn update_credit_card(
    credit_card_id: CreditCardId,
    update: CreditCardUpdate,
    connection: &Connection,
) -> Result<CreditCard, Error> {
    let rows_affected = connection.execute(
        "UPDATE credit_card SET
            name = COALESCE(?2, name),
            last_four_digits = COALESCE(?3, last_four_digits),
            brand = COALESCE(?4, brand),
            color = COALESCE(?5, color),
            credit_limit = COALESCE(?6, credit_limit),
            closing_day = COALESCE(?7, closing_day),
            due_day = COALESCE(?8, due_day),
            updated_at = ?9
        WHERE id = ?1",
        params![
            credit_card_id,
            update.name,
            update.last_four_digits,
            update.brand,
            update.color,
            update.credit_limit,
            update.closing_day,
            update.due_day,
            current_timestamp(),
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_credit_card(credit_card_id, connection)
}

/// Delete a credit card. Transactions charged to it are kept without a card.
pub fn delete_credit_card(
    credit_card_id: CreditCardId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM credit_card WHERE id = ?1", [credit_card_id])?;

    if rows_affected == 0 {
        Err(Error::NotFound)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod credit_card_tests {
    use time::macros::date;

    use crate::{
        Error,
        test_utils::{
            get_test_connection, insert_test_account, insert_test_credit_card,
            insert_test_transaction, insert_test_user,
        },
        transaction::{TransactionType, get_transaction},
    };

    use super::{
        CreditCardUpdate, delete_credit_card, get_credit_card, get_credit_card_for_user,
        list_credit_cards, update_credit_card,
    };

    #[test]
    fn lists_newest_first() {
        let connection = get_test_connection();
        let user = insert_test_user(&connection, "foo@bar.baz");
        let account = insert_test_account(&connection, user.id, "Personal");
        let first = insert_test_credit_card(&connection, &account);
        let second = insert_test_credit_card(&connection, &account);

        let got: Vec<_> = list_credit_cards(account.id, &connection)
            .unwrap()
            .into_iter()
            .map(|card| card.id)
            .collect();

        assert_eq!(got, vec![second.id, first.id]);
    }

    #[test]
    fn partial_update() {
        let connection = get_test_connection();
        let user = insert_test_user(&connection, "foo@bar.baz");
        let account = insert_test_account(&connection, user.id, "Personal");
        let card = insert_test_credit_card(&connection, &account);

        let updated = update_credit_card(
            card.id,
            CreditCardUpdate {
                credit_limit: Some(1_000_000),
                due_day: Some(10),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.credit_limit, 1_000_000);
        assert_eq!(updated.due_day, 10);
        assert_eq!(updated.name, card.name);
        assert_eq!(updated.closing_day, card.closing_day);
    }

    #[test]
    fn update_missing_card() {
        let connection = get_test_connection();

        assert_eq!(
            update_credit_card(42, CreditCardUpdate::default(), &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_keeps_transactions() {
        let connection = get_test_connection();
        let user = insert_test_user(&connection, "foo@bar.baz");
        let account = insert_test_account(&connection, user.id, "Personal");
        let card = insert_test_credit_card(&connection, &account);
        let transaction = insert_test_transaction(
            &connection,
            &account,
            TransactionType::Expense,
            100,
            date!(2025 - 01 - 01),
        );
        connection
            .execute(
                "UPDATE \"transaction\" SET credit_card_id = ?1 WHERE id = ?2",
                (card.id, transaction.id),
            )
            .unwrap();

        delete_credit_card(card.id, &connection).unwrap();

        assert_eq!(get_credit_card(card.id, &connection), Err(Error::NotFound));
        assert_eq!(
            get_transaction(transaction.id, &connection)
                .unwrap()
                .credit_card_id,
            None
        );
        assert_eq!(delete_credit_card(card.id, &connection), Err(Error::NotFound));
    }

    #[test]
    fn other_users_card_is_forbidden() {
        let connection = get_test_connection();
        let user = insert_test_user(&connection, "foo@bar.baz");
        let intruder = insert_test_user(&connection, "bar@baz.qux");
        let account = insert_test_account(&connection, user.id, "Personal");
        let card = insert_test_credit_card(&connection, &account);

        assert_eq!(
            get_credit_card_for_user(card.id, intruder.id, &connection),
            Err(Error::Forbidden)
        );
        assert_eq!(
            get_credit_card_for_user(card.id, user.id, &connection),
            Ok(card)
        );
    }
}
