//! Income and expense categories and their storage.

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    account::{AccountId, get_account_for_user},
    database_id::DatabaseId,
    db::{current_timestamp, text_enum},
    user::UserId,
};

pub type CategoryId = DatabaseId;

/// Whether a category is for money coming in or going out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    /// Money coming in, e.g. salary.
    Income,
    /// Money going out, e.g. rent.
    Expense,
}

text_enum!(CategoryKind {
    Income => "income",
    Expense => "expense",
});

impl CategoryKind {
    /// The name shown on pages.
    pub fn label(&self) -> &'static str {
        match self {
            CategoryKind::Income => "Income",
            CategoryKind::Expense => "Expense",
        }
    }
}

/// A named bucket for income or expenses within an account.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub account_id: AccountId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    /// An emoji or icon name shown next to the category.
    pub icon: Option<String>,
    /// A CSS colour, e.g. "#22c55e".
    pub color: Option<String>,
    /// Whether the category was created as one of the defaults for a new account.
    pub is_default: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub account_id: AccountId,
    pub name: String,
    pub kind: CategoryKind,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub is_default: bool,
}

/// The fields of a category that can be changed, `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

/// The categories every new account can start with: (name, kind, icon, color).
const DEFAULT_CATEGORIES: [(&str, CategoryKind, &str, &str); 12] = [
    ("Salary", CategoryKind::Income, "💼", "#16a34a"),
    ("Freelance", CategoryKind::Income, "🧑‍💻", "#22c55e"),
    ("Investments", CategoryKind::Income, "📈", "#0d9488"),
    ("Other income", CategoryKind::Income, "💰", "#65a30d"),
    ("Housing", CategoryKind::Expense, "🏠", "#dc2626"),
    ("Food", CategoryKind::Expense, "🛒", "#ea580c"),
    ("Transport", CategoryKind::Expense, "🚗", "#d97706"),
    ("Health", CategoryKind::Expense, "🩺", "#db2777"),
    ("Education", CategoryKind::Expense, "📚", "#7c3aed"),
    ("Leisure", CategoryKind::Expense, "🎉", "#2563eb"),
    ("Utilities", CategoryKind::Expense, "💡", "#0891b2"),
    ("Other expenses", CategoryKind::Expense, "📦", "#6b7280"),
];

pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            account_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            icon TEXT,
            color TEXT,
            is_default INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_category_account ON category(account_id)",
        (),
    )?;

    Ok(())
}

const SELECT_CATEGORY: &str = "SELECT id, account_id, name, type, icon, color, is_default, \
    created_at, updated_at FROM category";

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        account_id: row.get(1)?,
        name: row.get(2)?,
        kind: row.get(3)?,
        icon: row.get(4)?,
        color: row.get(5)?,
        is_default: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

pub fn create_category(
    new_category: NewCategory,
    connection: &Connection,
) -> Result<Category, Error> {
    let now = current_timestamp();

    connection.execute(
        "INSERT INTO category
            (account_id, name, type, icon, color, is_default, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            new_category.account_id,
            new_category.name,
            new_category.kind,
            new_category.icon,
            new_category.color,
            new_category.is_default,
            now,
        ],
    )?;

    Ok(Category {
        id: connection.last_insert_rowid(),
        account_id: new_category.account_id,
        name: new_category.name,
        kind: new_category.kind,
        icon: new_category.icon,
        color: new_category.color,
        is_default: new_category.is_default,
        created_at: now,
        updated_at: now,
    })
}

/// Add the default income and expense categories to an account.
///
/// # Errors
/// Returns an error if any of the categories could not be inserted, in which
/// case none of them are.
pub fn create_default_categories(
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    let transaction = connection.unchecked_transaction()?;

    let categories = DEFAULT_CATEGORIES
        .iter()
        .map(|(name, kind, icon, color)| {
            create_category(
                NewCategory {
                    account_id,
                    name: (*name).to_owned(),
                    kind: *kind,
                    icon: Some((*icon).to_owned()),
                    color: Some((*color).to_owned()),
                    is_default: true,
                },
                &transaction,
            )
        })
        .collect::<Result<Vec<_>, Error>>()?;

    transaction.commit()?;

    Ok(categories)
}

/// The account's categories ordered by name.
pub fn list_categories(
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_CATEGORY} WHERE account_id = ?1 ORDER BY name COLLATE NOCASE ASC, id ASC"
        ))?
        .query_map([account_id], map_row)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .query_row(
            &format!("{SELECT_CATEGORY} WHERE id = ?1"),
            [category_id],
            map_row,
        )
        .map_err(Error::from)
}

/// Get a category and check that its account belongs to `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such category, or
/// [Error::Forbidden] if it belongs to another user's account.
pub fn get_category_for_user(
    category_id: CategoryId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Category, Error> {
    let category = get_category(category_id, connection)?;
    get_account_for_user(category.account_id, user_id, connection)?;

    Ok(category)
}

pub fn update_category(
    category_id: CategoryId,
    update: CategoryUpdate,
    connection: &Connection,
) -> Result<Category, Error> {
    let rows_affected = connection.execute(
        "UPDATE category SET
            name = COALESCE(?2, name),
            icon = COALESCE(?3, icon),
            color = COALESCE(?4, color),
            updated_at = ?5
        WHERE id = ?1",
        params![
            category_id,
            update.name,
            update.icon,
            update.color,
            current_timestamp()
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_category(category_id, connection)
}

/// Delete a category. Records that used it are kept without a category.
pub fn delete_category(category_id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM category WHERE id = ?1", [category_id])?;

    if rows_affected == 0 {
        Err(Error::NotFound)
    } else {
        Ok(())
    }
}
