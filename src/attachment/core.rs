//! Attachment records linking uploaded files to transactions.

use rusqlite::{Connection, Row, params};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    account::{AccountId, get_account_for_user},
    database_id::DatabaseId,
    db::current_timestamp,
    transaction::{TransactionId, get_transaction},
    user::UserId,
};

pub type AttachmentId = DatabaseId;

/// The largest file that can be attached to a transaction.
pub const MAX_ATTACHMENT_SIZE: usize = 10 * 1024 * 1024;

/// A file, such as a receipt, attached to a transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: AttachmentId,
    pub transaction_id: TransactionId,
    /// The name of the file as uploaded.
    pub file_name: String,
    /// Where the file is kept, relative to the upload directory.
    pub file_path: String,
    /// The size of the file in bytes.
    pub file_size: i64,
    pub mime_type: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub transaction_id: TransactionId,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: Option<String>,
}

pub fn create_attachment_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS attachment (
            id INTEGER PRIMARY KEY,
            transaction_id INTEGER NOT NULL,
            file_name TEXT NOT NULL,
            file_path TEXT NOT NULL,
            file_size INTEGER NOT NULL,
            mime_type TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(transaction_id) REFERENCES \"transaction\"(id)
                ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_attachment_transaction ON attachment(transaction_id)",
        (),
    )?;

    Ok(())
}

const SELECT_ATTACHMENT: &str = "SELECT id, transaction_id, file_name, file_path, file_size, \
    mime_type, created_at FROM attachment";

fn map_row(row: &Row) -> Result<Attachment, rusqlite::Error> {
    Ok(Attachment {
        id: row.get(0)?,
        transaction_id: row.get(1)?,
        file_name: row.get(2)?,
        file_path: row.get(3)?,
        file_size: row.get(4)?,
        mime_type: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub fn create_attachment(
    new_attachment: NewAttachment,
    connection: &Connection,
) -> Result<Attachment, Error> {
    let now = current_timestamp();

    connection.execute(
        "INSERT INTO attachment
            (transaction_id, file_name, file_path, file_size, mime_type, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            new_attachment.transaction_id,
            new_attachment.file_name,
            new_attachment.file_path,
            new_attachment.file_size,
            new_attachment.mime_type,
            now,
        ],
    )?;

    Ok(Attachment {
        id: connection.last_insert_rowid(),
        transaction_id: new_attachment.transaction_id,
        file_name: new_attachment.file_name,
        file_path: new_attachment.file_path,
        file_size: new_attachment.file_size,
        mime_type: new_attachment.mime_type,
        created_at: now,
    })
}

/// The transaction's attachments, oldest first.
pub fn list_attachments(
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<Vec<Attachment>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_ATTACHMENT} WHERE transaction_id = ?1 ORDER BY id ASC"
        ))?
        .query_map([transaction_id], map_row)?
        .map(|maybe_attachment| maybe_attachment.map_err(Error::from))
        .collect()
}

pub fn get_attachment(
    attachment_id: AttachmentId,
    connection: &Connection,
) -> Result<Attachment, Error> {
    connection
        .query_row(
            &format!("{SELECT_ATTACHMENT} WHERE id = ?1"),
            [attachment_id],
            map_row,
        )
        .map_err(Error::from)
}

/// Get an attachment and check that its transaction belongs to one of the user's accounts.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such attachment, or
/// [Error::Forbidden] if it belongs to another user.
pub fn get_attachment_for_user(
    attachment_id: AttachmentId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Attachment, Error> {
    let attachment = get_attachment(attachment_id, connection)?;
    let transaction = get_transaction(attachment.transaction_id, connection)?;
    get_account_for_user(transaction.account_id, user_id, connection)?;

    Ok(attachment)
}

pub fn delete_attachment(
    attachment_id: AttachmentId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM attachment WHERE id = ?1", [attachment_id])?;

    if rows_affected == 0 {
        Err(Error::NotFound)
    } else {
        Ok(())
    }
}

fn query_paths(
    query: &str,
    id: DatabaseId,
    connection: &Connection,
) -> Result<Vec<String>, Error> {
    connection
        .prepare(query)?
        .query_map([id], |row| row.get(0))?
        .map(|maybe_path| maybe_path.map_err(Error::from))
        .collect()
}

/// The files attached to a transaction, to remove once the transaction is deleted.
pub fn attachment_paths_for_transaction(
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<Vec<String>, Error> {
    query_paths(
        "SELECT file_path FROM attachment WHERE transaction_id = ?1",
        transaction_id,
        connection,
    )
}

/// The files attached to any transaction in an account.
pub fn attachment_paths_for_account(
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<String>, Error> {
    query_paths(
        "SELECT attachment.file_path FROM attachment
        INNER JOIN \"transaction\" ON attachment.transaction_id = \"transaction\".id
        WHERE \"transaction\".account_id = ?1",
        account_id,
        connection,
    )
}

/// The files attached to any transaction in any of the user's accounts.
pub fn attachment_paths_for_user(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<String>, Error> {
    query_paths(
        "SELECT attachment.file_path FROM attachment
        INNER JOIN \"transaction\" ON attachment.transaction_id = \"transaction\".id
        INNER JOIN account ON \"transaction\".account_id = account.id
        WHERE account.user_id = ?1",
        user_id.as_i64(),
        connection,
    )
}

#[cfg(test)]
mod attachment_tests {
    use time::macros::date;

    use crate::{
        Error,
        test_utils::{
            get_test_connection, insert_test_account, insert_test_transaction, insert_test_user,
        },
        transaction::TransactionType,
    };

    use super::{
        NewAttachment, attachment_paths_for_account, attachment_paths_for_transaction,
        attachment_paths_for_user, create_attachment, get_attachment, get_attachment_for_user,
        list_attachments,
    };

    fn new_attachment(transaction_id: i64, file_path: &str) -> NewAttachment {
        NewAttachment {
            transaction_id,
            file_name: "receipt.pdf".to_owned(),
            file_path: file_path.to_owned(),
            file_size: 42,
            mime_type: Some("application/pdf".to_owned()),
        }
    }

    #[test]
    fn paths_by_scope() {
        let connection = get_test_connection();
        let user = insert_test_user(&connection, "foo@bar.baz");
        let personal = insert_test_account(&connection, user.id, "Personal");
        let business = insert_test_account(&connection, user.id, "Business");
        let first = insert_test_transaction(
            &connection,
            &personal,
            TransactionType::Expense,
            100,
            date!(2025 - 01 - 01),
        );
        let second = insert_test_transaction(
            &connection,
            &business,
            TransactionType::Expense,
            100,
            date!(2025 - 01 - 01),
        );
        create_attachment(new_attachment(first.id, "transactions/1/a.pdf"), &connection).unwrap();
        create_attachment(new_attachment(second.id, "transactions/2/b.pdf"), &connection).unwrap();

        assert_eq!(
            attachment_paths_for_transaction(first.id, &connection),
            Ok(vec!["transactions/1/a.pdf".to_owned()])
        );
        assert_eq!(
            attachment_paths_for_account(business.id, &connection),
            Ok(vec!["transactions/2/b.pdf".to_owned()])
        );
        assert_eq!(attachment_paths_for_user(user.id, &connection).map(|paths| paths.len()), Ok(2));
    }

    #[test]
    fn deleting_transaction_deletes_attachments() {
        let connection = get_test_connection();
        let user = insert_test_user(&connection, "foo@bar.baz");
        let account = insert_test_account(&connection, user.id, "Personal");
        let transaction = insert_test_transaction(
            &connection,
            &account,
            TransactionType::Expense,
            100,
            date!(2025 - 01 - 01),
        );
        let attachment =
            create_attachment(new_attachment(transaction.id, "transactions/1/a.pdf"), &connection)
                .unwrap();

        connection
            .execute("DELETE FROM \"transaction\" WHERE id = ?1", [transaction.id])
            .unwrap();

        assert_eq!(get_attachment(attachment.id, &connection), Err(Error::NotFound));
        assert_eq!(list_attachments(transaction.id, &connection), Ok(vec![]));
    }

    #[test]
    fn other_users_attachment_is_forbidden() {
        let connection = get_test_connection();
        let user = insert_test_user(&connection, "foo@bar.baz");
        let intruder = insert_test_user(&connection, "bar@baz.qux");
        let account = insert_test_account(&connection, user.id, "Personal");
        let transaction = insert_test_transaction(
            &connection,
            &account,
            TransactionType::Expense,
            100,
            date!(2025 - 01 - 01),
        );
        let attachment =
            create_attachment(new_attachment(transaction.id, "transactions/1/a.pdf"), &connection)
                .unwrap();

        assert_eq!(
            get_attachment_for_user(attachment.id, intruder.id, &connection),
            Err(Error::Forbidden)
        );
        assert_eq!(
            get_attachment_for_user(attachment.id, user.id, &connection),
            Ok(attachment)
        );
    }
}
