//! Summaries of an account's paid transactions: totals, expenses by category
//! and monthly income against expenses.

mod charts;
mod core;
mod dashboard_page;
mod endpoints;
mod period;
mod reports_page;

pub use dashboard_page::get_dashboard_page;
pub use endpoints::{expenses_by_category_endpoint, monthly_totals_endpoint, summary_endpoint};
pub use reports_page::get_reports_page;

#[cfg(test)]
pub use endpoints::DashboardState;
