//! Accounts are the ledger scopes that every other record belongs to.

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::DatabaseId,
    db::{current_timestamp, text_enum},
    user::UserId,
};

pub type AccountId = DatabaseId;

/// Whether an account holds personal or business finances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Household and personal spending.
    #[default]
    Personal,
    /// Money belonging to a business.
    Business,
}

text_enum!(AccountType {
    Personal => "personal",
    Business => "business",
});

impl AccountType {
    /// Every account type, in the order they are offered on forms.
    pub const ALL: [AccountType; 2] = [AccountType::Personal, AccountType::Business];

    /// The name shown in the UI.
    pub fn label(&self) -> &'static str {
        match self {
            AccountType::Personal => "Personal",
            AccountType::Business => "Business",
        }
    }
}

/// A ledger owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub user_id: UserId,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The data needed to create an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// The owner of the account.
    pub user_id: UserId,
    /// A display name, e.g. "Personal".
    pub name: String,
    /// Whether the account is personal or business.
    pub account_type: AccountType,
}

/// The fields of an account that can be changed, `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub account_type: Option<AccountType>,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            type TEXT NOT NULL DEFAULT 'personal',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_account_user ON account(user_id)",
        (),
    )?;

    Ok(())
}

const SELECT_ACCOUNT: &str =
    "SELECT id, user_id, name, type, created_at, updated_at FROM account";

pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        account_type: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Create an account and return it with its new id.
///
/// # Errors
/// Returns [Error::InvalidInput] if the owner does not exist.
pub fn create_account(new_account: NewAccount, connection: &Connection) -> Result<Account, Error> {
    let now = current_timestamp();

    connection.execute(
        "INSERT INTO account (user_id, name, type, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?4)",
        params![
            new_account.user_id,
            new_account.name,
            new_account.account_type,
            now
        ],
    )?;

    Ok(Account {
        id: connection.last_insert_rowid(),
        user_id: new_account.user_id,
        name: new_account.name,
        account_type: new_account.account_type,
        created_at: now,
        updated_at: now,
    })
}

/// The user's accounts, oldest first.
pub fn list_accounts(user_id: UserId, connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_ACCOUNT} WHERE user_id = ?1 ORDER BY created_at ASC, id ASC"
        ))?
        .query_map([user_id], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

/// # Errors
/// Returns [Error::NotFound] if there is no account with `account_id`.
pub fn get_account(account_id: AccountId, connection: &Connection) -> Result<Account, Error> {
    connection
        .query_row(
            &format!("{SELECT_ACCOUNT} WHERE id = ?1"),
            [account_id],
            map_row_to_account,
        )
        .map_err(Error::from)
}

/// Get an account and check that it belongs to `user_id`.
///
/// Every operation on data inside an account goes through this check first.
///
/// # Errors
/// Returns [Error::Forbidden] if the account does not exist or belongs to
/// another user, so that clients cannot find out which account ids exist.
pub fn get_account_for_user(
    account_id: AccountId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Account, Error> {
    match get_account(account_id, connection) {
        Ok(account) if account.user_id == user_id => Ok(account),
        Ok(_) | Err(Error::NotFound) => Err(Error::Forbidden),
        Err(error) => Err(error),
    }
}

pub fn update_account(
    account_id: AccountId,
    update: AccountUpdate,
    connection: &Connection,
) -> Result<Account, Error> {
    let rows_affected = connection.execute(
        "UPDATE account SET
            name = COALESCE(?2, name),
            type = COALESCE(?3, type),
            updated_at = ?4
        WHERE id = ?1",
        params![account_id, update.name, update.account_type, current_timestamp()],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_account(account_id, connection)
}

/// Delete an account along with its categories, transactions, cards,
/// scheduled payments and goals.
///
/// Attachment files must be removed by the caller.
pub fn delete_account(account_id: AccountId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM account WHERE id = ?1", [account_id])?;

    if rows_affected == 0 {
        Err(Error::NotFound)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod create_table_tests {
    use rusqlite::Connection;

    use crate::user::create_user_table;

    use super::create_account_table;

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");
        create_user_table(&connection).unwrap();

        assert_eq!(Ok(()), create_account_table(&connection));
    }
}

#[cfg(test)]
mod account_tests {
    use crate::{
        Error,
        test_utils::{get_test_connection, insert_test_account, insert_test_user},
        user::delete_user,
    };

    use super::{
        AccountType, AccountUpdate, delete_account, get_account, get_account_for_user,
        list_accounts, update_account,
    };

    #[test]
    fn lists_own_accounts_in_creation_order() {
        let connection = get_test_connection();
        let user = insert_test_user(&connection, "foo@bar.baz");
        let other_user = insert_test_user(&connection, "bar@baz.qux");
        let first = insert_test_account(&connection, user.id, "Personal");
        let second = insert_test_account(&connection, user.id, "Business");
        insert_test_account(&connection, other_user.id, "Theirs");

        let accounts = list_accounts(user.id, &connection).unwrap();

        assert_eq!(accounts, vec![first, second]);
    }

    #[test]
    fn other_users_account_is_forbidden() {
        let connection = get_test_connection();
        let user = insert_test_user(&connection, "foo@bar.baz");
        let other_user = insert_test_user(&connection, "bar@baz.qux");
        let account = insert_test_account(&connection, other_user.id, "Theirs");

        assert_eq!(
            get_account_for_user(account.id, user.id, &connection),
            Err(Error::Forbidden)
        );
        assert_eq!(
            get_account_for_user(account.id + 100, user.id, &connection),
            Err(Error::Forbidden)
        );
        assert_eq!(
            get_account_for_user(account.id, other_user.id, &connection),
            Ok(account)
        );
    }

    #[test]
    fn partial_update_keeps_other_fields() {
        let connection = get_test_connection();
        let user = insert_test_user(&connection, "foo@bar.baz");
        let account = insert_test_account(&connection, user.id, "Personal");

        let updated = update_account(
            account.id,
            AccountUpdate {
                name: None,
                account_type: Some(AccountType::Business),
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.name, "Personal");
        assert_eq!(updated.account_type, AccountType::Business);
    }

    #[test]
    fn delete_missing_account() {
        let connection = get_test_connection();

        assert_eq!(delete_account(42, &connection), Err(Error::NotFound));
    }

    #[test]
    fn deleting_user_deletes_accounts() {
        let connection = get_test_connection();
        let user = insert_test_user(&connection, "foo@bar.baz");
        let account = insert_test_account(&connection, user.id, "Personal");

        delete_user(user.id, &connection).unwrap();

        assert_eq!(get_account(account.id, &connection), Err(Error::NotFound));
    }
}
