//! An audit trail of the changes users make to their data.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::{Connection, Row, params};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    database_id::DatabaseId,
    db::{current_timestamp, lock_connection},
    user::UserId,
};

/// How many entries the activity endpoint returns.
pub const RECENT_ACTIVITY_LIMIT: usize = 50;

/// Something a user did, e.g. "CREATE_TRANSACTION".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: DatabaseId,
    pub user_id: UserId,
    pub action: String,
    pub details: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub fn create_activity_log_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS activity_log (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            action TEXT NOT NULL,
            details TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_activity_log_user_created
        ON activity_log(user_id, created_at)",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<ActivityLog, rusqlite::Error> {
    Ok(ActivityLog {
        id: row.get(0)?,
        user_id: row.get(1)?,
        action: row.get(2)?,
        details: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Add an entry to the user's activity log.
///
/// # Errors
/// Returns an [Error::SqlError] if the entry could not be inserted.
pub fn record_activity(
    user_id: UserId,
    action: &str,
    details: Option<&str>,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO activity_log (user_id, action, details, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, action, details, current_timestamp()],
    )?;

    Ok(())
}

/// The user's most recent activity, newest first.
pub fn list_recent_activity(
    user_id: UserId,
    limit: usize,
    connection: &Connection,
) -> Result<Vec<ActivityLog>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, action, details, created_at FROM activity_log
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2",
        )?
        .query_map(params![user_id, limit as i64], map_row)?
        .map(|maybe_entry| maybe_entry.map_err(Error::from))
        .collect()
}

/// The state needed to read the activity log.
#[derive(Debug, Clone)]
pub struct ActivityState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ActivityState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The logged in user's most recent activity.
pub async fn list_activity_endpoint(
    State(state): State<ActivityState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Vec<ActivityLog>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    list_recent_activity(user_id, RECENT_ACTIVITY_LIMIT, &connection).map(Json)
}
