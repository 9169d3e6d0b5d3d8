//! Savings and spending goals and their storage.

use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    account::{AccountId, get_account_for_user},
    category::CategoryId,
    database_id::DatabaseId,
    db::{current_timestamp, text_enum},
    money::Cents,
    user::UserId,
};

pub type GoalId = DatabaseId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    Savings,
    SpendingLimit,
    Income,
    EmergencyFund,
}

text_enum!(GoalType {
    Savings => "savings",
    SpendingLimit => "spending_limit",
    Income => "income",
    EmergencyFund => "emergency_fund",
});

impl GoalType {
    pub const ALL: [GoalType; 4] = [
        GoalType::Savings,
        GoalType::SpendingLimit,
        GoalType::Income,
        GoalType::EmergencyFund,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            GoalType::Savings => "Savings",
            GoalType::SpendingLimit => "Spending limit",
            GoalType::Income => "Income",
            GoalType::EmergencyFund => "Emergency fund",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

text_enum!(GoalStatus {
    Active => "active",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl GoalStatus {
    pub const ALL: [GoalStatus; 3] = [
        GoalStatus::Active,
        GoalStatus::Completed,
        GoalStatus::Cancelled,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            GoalStatus::Active => "Active",
            GoalStatus::Completed => "Completed",
            GoalStatus::Cancelled => "Cancelled",
        }
    }
}

/// A target amount to save, earn or stay under.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: GoalId,
    pub account_id: AccountId,
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub target_amount: Cents,
    pub current_amount: Cents,
    pub deadline: Option<Date>,
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    pub status: GoalStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Goal {
    /// How far the current amount is towards the target, capped at 100.
    pub fn progress_percent(&self) -> f64 {
        if self.target_amount <= 0 {
            return 0.0;
        }

        (self.current_amount as f64 / self.target_amount as f64 * 100.0).clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone)]
pub struct NewGoal {
    pub account_id: AccountId,
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub target_amount: Cents,
    pub deadline: Option<Date>,
    pub goal_type: GoalType,
}

#[derive(Debug, Clone, Default)]
pub struct GoalUpdate {
    pub name: Option<String>,
    pub target_amount: Option<Cents>,
    pub current_amount: Option<Cents>,
    pub deadline: Option<Date>,
    pub status: Option<GoalStatus>,
}

pub fn create_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS goal (
            id INTEGER PRIMARY KEY,
            account_id INTEGER NOT NULL,
            category_id INTEGER,
            name TEXT NOT NULL,
            target_amount INTEGER NOT NULL,
            current_amount INTEGER NOT NULL DEFAULT 0,
            deadline TEXT,
            type TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_goal_account ON goal(account_id)",
        (),
    )?;

    Ok(())
}

const COLUMNS: &str = "id, account_id, category_id, name, target_amount, current_amount, \
    deadline, type, status, created_at, updated_at";

fn map_row(row: &Row) -> Result<Goal, rusqlite::Error> {
    Ok(Goal {
        id: row.get(0)?,
        account_id: row.get(1)?,
        category_id: row.get(2)?,
        name: row.get(3)?,
        target_amount: row.get(4)?,
        current_amount: row.get(5)?,
        deadline: row.get(6)?,
        goal_type: row.get(7)?,
        status: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Insert an active goal with nothing saved towards it yet.
pub fn create_goal(new_goal: NewGoal, connection: &Connection) -> Result<Goal, Error> {
    let now = current_timestamp();

    connection.execute(
        "INSERT INTO goal (account_id, category_id, name, target_amount, current_amount,
            deadline, type, status, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?7, ?8, ?8)",
        params![
            new_goal.account_id,
            new_goal.category_id,
            new_goal.name,
            new_goal.target_amount,
            new_goal.deadline,
            new_goal.goal_type,
            GoalStatus::Active,
            now,
        ],
    )?;

    Ok(Goal {
        id: connection.last_insert_rowid(),
        account_id: new_goal.account_id,
        category_id: new_goal.category_id,
        name: new_goal.name,
        target_amount: new_goal.target_amount,
        current_amount: 0,
        deadline: new_goal.deadline,
        goal_type: new_goal.goal_type,
        status: GoalStatus::Active,
        created_at: now,
        updated_at: now,
    })
}

/// The account's goals, newest first.
pub fn list_goals(account_id: AccountId, connection: &Connection) -> Result<Vec<Goal>, Error> {
    connection
        .prepare(&format!(
            "SELECT {COLUMNS} FROM goal WHERE account_id = ?1 ORDER BY created_at DESC, id DESC"
        ))?
        .query_map([account_id], map_row)?
        .map(|maybe_goal| maybe_goal.map_err(Error::from))
        .collect()
}

pub fn get_goal(goal_id: GoalId, connection: &Connection) -> Result<Goal, Error> {
    connection
        .query_row(
            &format!("SELECT {COLUMNS} FROM goal WHERE id = ?1"),
            [goal_id],
            map_row,
        )
        .map_err(Error::from)
}

/// Get a goal and check that its account belongs to `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such goal, or
/// [Error::Forbidden] if it belongs to another user's account.
pub fn get_goal_for_user(
    goal_id: GoalId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Goal, Error> {
    let goal = get_goal(goal_id, connection)?;
    get_account_for_user(goal.account_id, user_id, connection)?;

    Ok(goal)
}

pub fn update_goal(
    goal_id: GoalId,
    update: GoalUpdate,
    connection: &Connection,
) -> Result<Goal, Error> {
    let rows_affected = connection.execute(
        "UPDATE goal SET
            name = COALESCE(?2, name),
            target_amount = COALESCE(?3, target_amount),
            current_amount = COALESCE(?4, current_amount),
            deadline = COALESCE(?5, deadline),
            status = COALESCE(?6, status),
            updated_at = ?7
        WHERE id = ?1",
        params![
            goal_id,
            update.name,
            update.target_amount,
            update.current_amount,
            update.deadline,
            update.status,
            current_timestamp(),
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_goal(goal_id, connection)
}

pub fn delete_goal(goal_id: GoalId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM goal WHERE id = ?1", [goal_id])?;

    if rows_affected == 0 {
        Err(Error::NotFound)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod goal_tests {
    use rusqlite::Connection;
    use time::{OffsetDateTime, macros::date};

    use crate::{
        Error,
        account::Account,
        test_utils::{get_test_connection, insert_test_account, insert_test_user},
    };

    use super::{
        Goal, GoalStatus, GoalType, GoalUpdate, NewGoal, create_goal, delete_goal, get_goal,
        list_goals, update_goal,
    };

    fn setup() -> (Connection, Account) {
        let connection = get_test_connection();
        let user = insert_test_user(&connection, "foo@bar.baz");
        let account = insert_test_account(&connection, user.id, "Personal");

        (connection, account)
    }

    fn new_goal(account: &Account, name: &str) -> NewGoal {
        NewGoal {
            account_id: account.id,
            category_id: None,
            name: name.to_owned(),
            target_amount: 100_000,
            deadline: Some(date!(2025 - 12 - 31)),
            goal_type: GoalType::Savings,
        }
    }

    fn goal_with_amounts(current_amount: i64, target_amount: i64) -> Goal {
        let now = OffsetDateTime::now_utc();

        Goal {
            id: 1,
            account_id: 1,
            category_id: None,
            name: "Holiday".to_owned(),
            target_amount,
            current_amount,
            deadline: None,
            goal_type: GoalType::Savings,
            status: GoalStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn new_goals_start_empty_and_active() {
        let (connection, account) = setup();

        let goal = create_goal(new_goal(&account, "Holiday"), &connection).unwrap();

        assert_eq!(goal.current_amount, 0);
        assert_eq!(goal.status, GoalStatus::Active);
        assert_eq!(get_goal(goal.id, &connection), Ok(goal));
    }

    #[test]
    fn lists_newest_first() {
        let (connection, account) = setup();
        let first = create_goal(new_goal(&account, "Car"), &connection).unwrap();
        let second = create_goal(new_goal(&account, "House"), &connection).unwrap();

        let got: Vec<_> = list_goals(account.id, &connection)
            .unwrap()
            .into_iter()
            .map(|goal| goal.id)
            .collect();

        assert_eq!(got, vec![second.id, first.id]);
    }

    #[test]
    fn progress_is_capped() {
        assert_eq!(goal_with_amounts(25_000, 100_000).progress_percent(), 25.0);
        assert_eq!(goal_with_amounts(150_000, 100_000).progress_percent(), 100.0);
        assert_eq!(goal_with_amounts(0, 100_000).progress_percent(), 0.0);
    }

    #[test]
    fn update_and_delete() {
        let (connection, account) = setup();
        let goal = create_goal(new_goal(&account, "Car"), &connection).unwrap();

        let updated = update_goal(
            goal.id,
            GoalUpdate {
                current_amount: Some(40_000),
                status: Some(GoalStatus::Completed),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.current_amount, 40_000);
        assert_eq!(updated.status, GoalStatus::Completed);
        assert_eq!(updated.name, "Car");

        delete_goal(goal.id, &connection).unwrap();
        assert_eq!(get_goal(goal.id, &connection), Err(Error::NotFound));
        assert_eq!(delete_goal(goal.id, &connection), Err(Error::NotFound));
    }
}
