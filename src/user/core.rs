//! The user type and the database functions for users.

use std::fmt::Display;

use email_address::EmailAddress;
use rusqlite::{
    Connection, Row, params,
    types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::PasswordHash,
    db::{current_timestamp, text_enum},
};

/// A newtype wrapper for integer user IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the user ID as an integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for UserId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for UserId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(UserId)
    }
}

/// A validated email address, normalised to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Create and validate an email address.
    ///
    /// Surrounding whitespace is removed and the address is lowercased so that
    /// the same address always maps to the same user.
    ///
    /// # Errors
    ///
    /// This function will return an error if `raw_email` is not a valid email address.
    pub fn new(raw_email: &str) -> Result<Self, Error> {
        let email = raw_email.trim().to_lowercase();

        if EmailAddress::is_valid(&email) {
            Ok(Self(email))
        } else {
            Err(Error::InvalidEmail(raw_email.trim().to_owned()))
        }
    }

    /// Create a new `Email` without any validation.
    ///
    /// The caller should ensure that `raw_email` is a correctly formatted email address.
    pub fn new_unchecked(raw_email: &str) -> Self {
        Self(raw_email.to_owned())
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a user is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A regular user.
    User,
    /// An administrator.
    Admin,
}

text_enum!(Role {
    User => "user",
    Admin => "admin",
});

/// A user of the application.
///
/// The password hash is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The user's ID in the database.
    pub id: UserId,
    /// The display name.
    pub name: String,
    /// The address the user logs in with.
    pub email: Email,
    /// The hashed password, `None` for invited users that have not set a password yet.
    #[serde(skip)]
    pub password_hash: Option<PasswordHash>,
    /// What the user is allowed to do.
    pub role: Role,
    /// The WhatsApp number given when the user was invited.
    pub whatsapp: Option<String>,
    /// When the user was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the user's details were last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// When the user last logged in or made an authenticated request.
    #[serde(with = "time::serde::rfc3339")]
    pub last_signed_in: OffsetDateTime,
}

/// The data needed to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// The display name.
    pub name: String,
    /// The address the user logs in with.
    pub email: Email,
    /// The hashed password, `None` for invited users.
    pub password_hash: Option<PasswordHash>,
    /// What the user is allowed to do.
    pub role: Role,
    /// An optional WhatsApp number.
    pub whatsapp: Option<String>,
}

/// Create the user table in the database.
///
/// # Errors
/// Returns an error if the table already exists or if there is an SQL error.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password TEXT,
            role TEXT NOT NULL DEFAULT 'user',
            whatsapp TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            last_signed_in TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

const SELECT_USER: &str = "SELECT id, name, email, password, role, whatsapp, created_at, \
    updated_at, last_signed_in FROM user";

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    let password_hash: Option<String> = row.get(3)?;

    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: Email::new_unchecked(&row.get::<_, String>(2)?),
        password_hash: password_hash.as_deref().map(PasswordHash::new_unchecked),
        role: row.get(4)?,
        whatsapp: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        last_signed_in: row.get(8)?,
    })
}

/// Create a new user in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::EmailInUse] if a user with the same email already exists,
/// - [Error::SqlError] if there is some other SQL error.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    let now = current_timestamp();

    connection.execute(
        "INSERT INTO user
            (name, email, password, role, whatsapp, created_at, updated_at, last_signed_in)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?6)",
        params![
            new_user.name,
            new_user.email.as_ref(),
            new_user.password_hash.as_ref().map(|hash| hash.to_string()),
            new_user.role,
            new_user.whatsapp,
            now,
        ],
    )?;

    let id = UserId::new(connection.last_insert_rowid());

    Ok(User {
        id,
        name: new_user.name,
        email: new_user.email,
        password_hash: new_user.password_hash,
        role: new_user.role,
        whatsapp: new_user.whatsapp,
        created_at: now,
        updated_at: now,
        last_signed_in: now,
    })
}

/// Get the user with the ID `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such user.
pub fn get_user_by_id(user_id: UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .query_row(&format!("{SELECT_USER} WHERE id = ?1"), [user_id], map_row)
        .map_err(Error::from)
}

/// Get the user registered with `email`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such user.
pub fn get_user_by_email(email: &Email, connection: &Connection) -> Result<User, Error> {
    connection
        .query_row(
            &format!("{SELECT_USER} WHERE email = ?1"),
            [email.as_ref()],
            map_row,
        )
        .map_err(Error::from)
}

/// Get all users ordered by name.
pub fn list_users(connection: &Connection) -> Result<Vec<User>, Error> {
    connection
        .prepare(&format!("{SELECT_USER} ORDER BY name ASC, id ASC"))?
        .query_map([], map_row)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Change the display name of a user and return the updated user.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such user.
pub fn update_user_name(
    user_id: UserId,
    name: &str,
    connection: &Connection,
) -> Result<User, Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET name = ?1, updated_at = ?2 WHERE id = ?3",
        params![name, current_timestamp(), user_id],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_user_by_id(user_id, connection)
}

/// Replace the password hash of a user.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such user.
pub fn set_password_hash(
    user_id: UserId,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1, updated_at = ?2 WHERE id = ?3",
        params![password_hash.to_string(), current_timestamp(), user_id],
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Record that the user has just been seen.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such user.
pub fn touch_last_signed_in(user_id: UserId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET last_signed_in = ?1 WHERE id = ?2",
        params![current_timestamp(), user_id],
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// The number of registered and invited users.
pub fn count_users(connection: &Connection) -> Result<i64, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user", [], |row| row.get(0))
        .map_err(Error::from)
}

/// Delete a user along with everything they own.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such user.
pub fn delete_user(user_id: UserId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM user WHERE id = ?1", [user_id])?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}


#[cfg(test)]
mod user_db_tests {
    use rusqlite::Connection;

    use crate::{Error, auth::PasswordHash, db::initialize};

    use super::{
        Email, NewUser, Role, UserId, create_user, delete_user, get_user_by_email,
        get_user_by_id, list_users, set_password_hash, update_user_name,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.to_owned(),
            email: Email::new_unchecked(email),
            password_hash: Some(PasswordHash::new_unchecked("hunter2")),
            role: Role::User,
            whatsapp: None,
        }
    }

    #[test]
    fn create_and_get_user() {
        let connection = get_test_connection();

        let user = create_user(new_user("Alice", "alice@example.com"), &connection).unwrap();

        assert_eq!(user.id, UserId::new(1));
        assert_eq!(get_user_by_id(user.id, &connection), Ok(user.clone()));
        assert_eq!(
            get_user_by_email(&Email::new_unchecked("alice@example.com"), &connection),
            Ok(user)
        );
    }

    #[test]
    fn duplicate_email_is_conflict() {
        let connection = get_test_connection();
        create_user(new_user("Alice", "alice@example.com"), &connection).unwrap();

        let result = create_user(new_user("Alicia", "alice@example.com"), &connection);

        assert_eq!(result, Err(Error::EmailInUse));
    }

    #[test]
    fn missing_user_is_not_found() {
        let connection = get_test_connection();

        assert_eq!(
            get_user_by_id(UserId::new(42), &connection),
            Err(Error::NotFound)
        );
        assert_eq!(delete_user(UserId::new(42), &connection), Err(Error::NotFound));
    }

    #[test]
    fn invited_user_has_no_password() {
        let connection = get_test_connection();
        let mut invited = new_user("Bob", "bob@example.com");
        invited.password_hash = None;

        let user = create_user(invited, &connection).unwrap();

        assert_eq!(get_user_by_id(user.id, &connection).unwrap().password_hash, None);
    }

    #[test]
    fn list_users_is_sorted_by_name() {
        let connection = get_test_connection();
        create_user(new_user("Zed", "zed@example.com"), &connection).unwrap();
        create_user(new_user("Amy", "amy@example.com"), &connection).unwrap();

        let names: Vec<_> = list_users(&connection)
            .unwrap()
            .into_iter()
            .map(|user| user.name)
            .collect();

        assert_eq!(names, ["Amy", "Zed"]);
    }

    #[test]
    fn update_name_and_password() {
        let connection = get_test_connection();
        let user = create_user(new_user("Alice", "alice@example.com"), &connection).unwrap();

        let updated = update_user_name(user.id, "Alice Smith", &connection).unwrap();
        set_password_hash(user.id, &PasswordHash::new_unchecked("newhash"), &connection).unwrap();

        assert_eq!(updated.name, "Alice Smith");
        assert_eq!(
            get_user_by_id(user.id, &connection).unwrap().password_hash,
            Some(PasswordHash::new_unchecked("newhash"))
        );
    }

    #[test]
    fn serialized_user_has_no_password() {
        let connection = get_test_connection();
        let user = create_user(new_user("Alice", "alice@example.com"), &connection).unwrap();

        let json = serde_json::to_value(&user).unwrap();

        assert_eq!(json["email"], "alice@example.com");
        assert_eq!(json["role"], "user");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password").is_none());
    }
}
