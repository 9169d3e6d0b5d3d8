//! Database fixtures shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use rusqlite::Connection;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, AttachmentStore, PasswordHash,
    account::{Account, AccountType, NewAccount, create_account},
    attachment::{Attachment, NewAttachment, create_attachment},
    category::{Category, CategoryKind, NewCategory, create_category},
    credit_card::{CreditCard, NewCreditCard, create_credit_card},
    db::initialize,
    money::Cents,
    transaction::{
        NewTransaction, Transaction, TransactionId, TransactionStatus, TransactionType,
        create_transaction,
    },
    user::{Email, NewUser, Role, User, UserId, create_user},
};

pub(crate) const TEST_PASSWORD: &str = "test1234";

static TEST_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("Could not open in-memory database");
    initialize(&connection).expect("Could not initialize database");
    connection
}

/// An app state backed by an in-memory database and a fresh upload directory.
pub(crate) fn test_state() -> AppState {
    let upload_dir = std::env::temp_dir().join(format!(
        "fintrack-test-{}-{}",
        std::process::id(),
        TEST_DIR_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    AppState::new(
        Connection::open_in_memory().expect("Could not open in-memory database"),
        "foobar",
        "Etc/UTC",
        AttachmentStore::new(upload_dir),
    )
    .expect("Could not create app state")
    .with_insecure_cookies()
}

/// A user that only exists in memory.
pub(crate) fn test_user(id: UserId) -> User {
    let now = OffsetDateTime::now_utc();

    User {
        id,
        name: "Test User".to_owned(),
        email: Email::new_unchecked("test@example.com"),
        password_hash: None,
        role: Role::User,
        whatsapp: None,
        created_at: now,
        updated_at: now,
        last_signed_in: now,
    }
}

/// Insert a user that can log in with [TEST_PASSWORD].
pub(crate) fn insert_test_user(connection: &Connection, email: &str) -> User {
    insert_test_user_with_role(connection, email, Role::User)
}

/// Insert an administrator that can log in with [TEST_PASSWORD].
pub(crate) fn insert_test_admin(connection: &Connection, email: &str) -> User {
    insert_test_user_with_role(connection, email, Role::Admin)
}

fn insert_test_user_with_role(connection: &Connection, email: &str, role: Role) -> User {
    let password_hash = PasswordHash::from_raw_password(TEST_PASSWORD, PasswordHash::DEFAULT_COST)
        .expect("Could not hash password");

    create_user(
        NewUser {
            name: "Test User".to_owned(),
            email: Email::new(email).expect("Invalid test email"),
            password_hash: Some(password_hash),
            role,
            whatsapp: None,
        },
        connection,
    )
    .expect("Could not create test user")
}

pub(crate) fn insert_test_account(connection: &Connection, user_id: UserId, name: &str) -> Account {
    create_account(
        NewAccount {
            user_id,
            name: name.to_owned(),
            account_type: AccountType::Personal,
        },
        connection,
    )
    .expect("Could not create test account")
}

pub(crate) fn insert_test_category(
    connection: &Connection,
    account: &Account,
    name: &str,
    kind: CategoryKind,
) -> Category {
    create_category(
        NewCategory {
            account_id: account.id,
            name: name.to_owned(),
            kind,
            icon: None,
            color: Some("#ff0000".to_owned()),
            is_default: false,
        },
        connection,
    )
    .expect("Could not create test category")
}

pub(crate) fn insert_test_credit_card(connection: &Connection, account: &Account) -> CreditCard {
    create_credit_card(
        NewCreditCard {
            account_id: account.id,
            name: "Everyday".to_owned(),
            last_four_digits: "1234".to_owned(),
            brand: "Visa".to_owned(),
            color: "#1e40af".to_owned(),
            credit_limit: 500_000,
            closing_day: 20,
            due_day: 5,
        },
        connection,
    )
    .expect("Could not create test credit card")
}

/// Insert a paid transaction with no category or card.
pub(crate) fn insert_test_transaction(
    connection: &Connection,
    account: &Account,
    transaction_type: TransactionType,
    amount: Cents,
    date: Date,
) -> Transaction {
    create_transaction(
        NewTransaction {
            user_id: account.user_id,
            account_id: account.id,
            category_id: None,
            credit_card_id: None,
            description: format!("{transaction_type} on {date}"),
            amount,
            transaction_type,
            transaction_date: date,
            payment_method: None,
            status: TransactionStatus::Paid,
            expense_type: None,
            is_recurring: false,
        },
        connection,
    )
    .expect("Could not create test transaction")
}

/// Insert an attachment row for a file already in the attachment store.
pub(crate) fn insert_test_attachment(
    connection: &Connection,
    transaction_id: TransactionId,
    file_path: &str,
) -> Attachment {
    create_attachment(
        NewAttachment {
            transaction_id,
            file_name: "receipt.png".to_owned(),
            file_path: file_path.to_owned(),
            file_size: 3,
            mime_type: Some("image/png".to_owned()),
        },
        connection,
    )
    .expect("Could not create test attachment")
}
