//! The API for an account's totals.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    account::{AccountId, get_account_for_user},
    dashboard::core::{
        CategoryExpense, MonthlyTotal, Summary, expenses_by_category, monthly_totals, summary,
    },
    db::lock_connection,
    rpc::{Params, validate},
    user::UserId,
};

#[derive(Debug, Clone)]
pub struct DashboardState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// Used to work out the date ranges of the period presets.
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// An inclusive date range.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub start_date: Date,
    pub end_date: Date,
}

/// Check the range and that the account belongs to the user, then run `query`.
fn query_account<T>(
    state: &DashboardState,
    user_id: UserId,
    account_id: AccountId,
    range: &RangeQuery,
    query: impl FnOnce(AccountId, Date, Date, &Connection) -> Result<T, Error>,
) -> Result<Json<T>, Error> {
    validate::date_range(range.start_date, range.end_date)?;

    let connection = lock_connection(&state.db_connection)?;
    get_account_for_user(account_id, user_id, &connection)?;

    query(account_id, range.start_date, range.end_date, &connection).map(Json)
}

pub async fn summary_endpoint(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserId>,
    Path(account_id): Path<AccountId>,
    Params(range): Params<RangeQuery>,
) -> Result<Json<Summary>, Error> {
    query_account(&state, user_id, account_id, &range, summary)
}

pub async fn expenses_by_category_endpoint(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserId>,
    Path(account_id): Path<AccountId>,
    Params(range): Params<RangeQuery>,
) -> Result<Json<Vec<CategoryExpense>>, Error> {
    query_account(&state, user_id, account_id, &range, expenses_by_category)
}

pub async fn monthly_totals_endpoint(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserId>,
    Path(account_id): Path<AccountId>,
    Params(range): Params<RangeQuery>,
) -> Result<Json<Vec<MonthlyTotal>>, Error> {
    query_account(&state, user_id, account_id, &range, monthly_totals)
}
