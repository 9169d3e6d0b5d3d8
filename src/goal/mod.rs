//! Savings, spending, income and emergency fund goals.

mod core;
mod endpoints;
mod goals_page;

pub use core::create_goal_table;
pub use endpoints::{
    create_goal_endpoint, delete_goal_endpoint, list_goals_endpoint, update_goal_endpoint,
};
pub use goals_page::get_goals_page;

#[cfg(test)]
pub use endpoints::GoalState;
