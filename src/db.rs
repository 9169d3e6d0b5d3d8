//! Creates the application's tables and hands out the shared connection.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use time::OffsetDateTime;

use crate::{
    Error, account::create_account_table, activity_log::create_activity_log_table,
    attachment::create_attachment_table, category::create_category_table,
    credit_card::create_credit_card_table, goal::create_goal_table,
    scheduled_payment::create_scheduled_payment_table, transaction::create_transaction_table,
    user::create_user_table,
};

/// Enable foreign keys and create every table and index that does not exist yet.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    // Must be set outside of a transaction, SQLite ignores it otherwise.
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_account_table(&transaction)?;
    create_category_table(&transaction)?;
    create_credit_card_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_attachment_table(&transaction)?;
    create_scheduled_payment_table(&transaction)?;
    create_goal_table(&transaction)?;
    create_activity_log_table(&transaction)?;

    transaction.commit()
}

/// Acquire the shared database connection.
///
/// # Errors
/// Returns [Error::DatabaseLockError] if the lock is poisoned.
pub(crate) fn lock_connection(
    db_connection: &Arc<Mutex<Connection>>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)
}

/// The current time in UTC, truncated to whole seconds so that it survives a
/// round trip through the database unchanged.
pub(crate) fn current_timestamp() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();

    now.replace_nanosecond(0).unwrap_or(now)
}

/// Implement string conversions and SQLite storage as text for a fieldless enum.
///
/// The text for each variant must match its serde name so that the database,
/// JSON and HTML forms all agree.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// The text used to store and display this value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(crate::Error::InvalidInput(format!(
                        "\"{other}\" is not a valid {}",
                        stringify!($name)
                    ))),
                }
            }
        }

        impl rusqlite::types::ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl rusqlite::types::FromSql for $name {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|error: crate::Error| {
                        rusqlite::types::FromSqlError::Other(Box::new(error))
                    })
            }
        }
    };
}

pub(crate) use text_enum;

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        assert_eq!(Ok(()), initialize(&connection));
    }

    #[test]
    fn can_initialize_twice() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        assert_eq!(Ok(()), initialize(&connection));
    }

    #[test]
    fn enables_foreign_keys() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let foreign_keys: i64 = connection
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();

        assert_eq!(foreign_keys, 1);
    }
}
