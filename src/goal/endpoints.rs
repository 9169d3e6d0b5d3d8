//! The API for managing an account's goals.

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
    category::CategoryId,
    db::lock_connection,
    goal::core::{
        Goal, GoalId, GoalStatus, GoalType, GoalUpdate, NewGoal, create_goal, delete_goal,
        get_goal_for_user, list_goals, update_goal,
    },
    money::{Cents, deserialize_cents, deserialize_optional_cents},
    rpc::{Created, Input, Success, created, success, validate},
    transaction::check_references,
    user::UserId,
};

#[derive(Debug, Clone)]
pub struct GoalState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub async fn list_goals_endpoint(
    State(state): State<GoalState>,
    Extension(user_id): Extension<UserId>,
    Path(account_id): Path<AccountId>,
) -> Result<Json<Vec<Goal>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    get_account_for_user(account_id, user_id, &connection)?;

    list_goals(account_id, &connection).map(Json)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalInput {
    pub account_id: AccountId,
    pub category_id: Option<CategoryId>,
    pub name: String,
    #[serde(deserialize_with = "deserialize_cents")]
    pub target_amount: Cents,
    pub deadline: Option<Date>,
    #[serde(rename = "type")]
    pub goal_type: GoalType,
}

pub async fn create_goal_endpoint(
    State(state): State<GoalState>,
    Extension(user_id): Extension<UserId>,
    Input(input): Input<CreateGoalInput>,
) -> Result<Json<Created>, Error> {
    let new_goal = NewGoal {
        account_id: input.account_id,
        category_id: input.category_id,
        name: validate::text("Name", &input.name, 1, 255)?,
        target_amount: validate::positive_amount("Target amount", input.target_amount)?,
        deadline: input.deadline,
        goal_type: input.goal_type,
    };

    let connection = lock_connection(&state.db_connection)?;
    get_account_for_user(input.account_id, user_id, &connection)?;
    check_references(input.account_id, input.category_id, None, &connection)?;

    let goal = create_goal(new_goal, &connection)?;

    Ok(created(goal.id))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGoalInput {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_cents")]
    pub target_amount: Option<Cents>,
    #[serde(default, deserialize_with = "deserialize_optional_cents")]
    pub current_amount: Option<Cents>,
    pub deadline: Option<Date>,
    pub status: Option<GoalStatus>,
}

pub async fn update_goal_endpoint(
    State(state): State<GoalState>,
    Extension(user_id): Extension<UserId>,
    Path(goal_id): Path<GoalId>,
    Input(input): Input<UpdateGoalInput>,
) -> Result<Json<Goal>, Error> {
    let update = GoalUpdate {
        name: input
            .name
            .map(|name| validate::text("Name", &name, 1, 255))
            .transpose()?,
        target_amount: input
            .target_amount
            .map(|amount| validate::positive_amount("Target amount", amount))
            .transpose()?,
        current_amount: input
            .current_amount
            .map(|amount| validate::non_negative_amount("Current amount", amount))
            .transpose()?,
        deadline: input.deadline,
        status: input.status,
    };

    let connection = lock_connection(&state.db_connection)?;
    get_goal_for_user(goal_id, user_id, &connection)?;

    update_goal(goal_id, update, &connection).map(Json)
}

pub async fn delete_goal_endpoint(
    State(state): State<GoalState>,
    Extension(user_id): Extension<UserId>,
    Path(goal_id): Path<GoalId>,
) -> Result<Json<Success>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    get_goal_for_user(goal_id, user_id, &connection)?;
    delete_goal(goal_id, &connection)?;

    Ok(success())
}
