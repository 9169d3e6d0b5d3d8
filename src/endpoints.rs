//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/accounts/{account_id}', use [format_endpoint].

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page with monthly income and expense totals.
pub const REPORTS_VIEW: &str = "/reports";
/// The page for displaying an account's transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The page for managing an account's categories.
pub const CATEGORIES_VIEW: &str = "/categories";
/// The page for managing an account's credit cards.
pub const CREDIT_CARDS_VIEW: &str = "/credit_cards";
/// The page for managing an account's scheduled payments.
pub const SCHEDULE_VIEW: &str = "/schedule";
/// The page for managing an account's goals.
pub const GOALS_VIEW: &str = "/goals";
/// The page for managing the user's accounts.
pub const ACCOUNTS_VIEW: &str = "/accounts";
/// The page for the user's profile, the user list and recent activity.
pub const PROFILE_VIEW: &str = "/profile";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The route to log out the current user.
pub const LOG_OUT: &str = "/log_out";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in with an email and password.
pub const LOG_IN_API: &str = "/api/auth/login";
/// The route for registering a new user.
pub const REGISTER_API: &str = "/api/auth/register";
/// The route for clearing the session cookie.
pub const LOG_OUT_API: &str = "/api/auth/logout";
/// The route for getting the logged in user.
pub const ME_API: &str = "/api/auth/me";
/// The route for updating the logged in user's profile.
pub const PROFILE_API: &str = "/api/auth/profile";
/// The route for deleting the logged in user and all of their data.
pub const DELETE_ACCOUNT_API: &str = "/api/auth/account";

/// The route for listing and inviting users.
pub const USERS_API: &str = "/api/users";
/// The route for removing a user.
pub const USER_API: &str = "/api/users/{user_id}";

/// The route for listing and creating accounts.
pub const ACCOUNTS_API: &str = "/api/accounts";
/// The route for updating and deleting an account.
pub const ACCOUNT_API: &str = "/api/accounts/{account_id}";

/// The route for listing an account's categories.
pub const ACCOUNT_CATEGORIES_API: &str = "/api/accounts/{account_id}/categories";
/// The route for creating categories.
pub const CATEGORIES_API: &str = "/api/categories";
/// The route for updating and deleting a category.
pub const CATEGORY_API: &str = "/api/categories/{category_id}";

/// The route for listing an account's transactions.
pub const ACCOUNT_TRANSACTIONS_API: &str = "/api/accounts/{account_id}/transactions";
/// The route for creating transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route for updating and deleting a transaction.
pub const TRANSACTION_API: &str = "/api/transactions/{transaction_id}";
/// The route for listing and uploading a transaction's attachments.
pub const TRANSACTION_ATTACHMENTS_API: &str = "/api/transactions/{transaction_id}/attachments";
/// The route for downloading and deleting an attachment.
pub const ATTACHMENT_API: &str = "/api/attachments/{attachment_id}";

/// The route for an account's income, expense and balance.
pub const SUMMARY_API: &str = "/api/accounts/{account_id}/summary";
/// The route for an account's expenses grouped by category.
pub const EXPENSES_BY_CATEGORY_API: &str = "/api/accounts/{account_id}/expenses_by_category";
/// The route for an account's income and expenses per month.
pub const MONTHLY_TOTALS_API: &str = "/api/accounts/{account_id}/monthly_totals";

/// The route for listing an account's credit cards.
pub const ACCOUNT_CREDIT_CARDS_API: &str = "/api/accounts/{account_id}/credit_cards";
/// The route for creating credit cards.
pub const CREDIT_CARDS_API: &str = "/api/credit_cards";
/// The route for updating and deleting a credit card.
pub const CREDIT_CARD_API: &str = "/api/credit_cards/{card_id}";
/// The route for listing the transactions charged to a credit card.
pub const CREDIT_CARD_EXPENSES_API: &str = "/api/credit_cards/{card_id}/expenses";

/// The route for listing an account's scheduled payments.
pub const ACCOUNT_SCHEDULED_PAYMENTS_API: &str = "/api/accounts/{account_id}/scheduled_payments";
/// The route for creating scheduled payments.
pub const SCHEDULED_PAYMENTS_API: &str = "/api/scheduled_payments";
/// The route for updating and deleting a scheduled payment.
pub const SCHEDULED_PAYMENT_API: &str = "/api/scheduled_payments/{payment_id}";
/// The route for marking a scheduled payment as paid.
pub const SCHEDULED_PAYMENT_PAID_API: &str = "/api/scheduled_payments/{payment_id}/paid";
/// The route for setting whether a scheduled payment is a priority.
pub const SCHEDULED_PAYMENT_PRIORITY_API: &str = "/api/scheduled_payments/{payment_id}/priority";

/// The route for listing an account's goals.
pub const ACCOUNT_GOALS_API: &str = "/api/accounts/{account_id}/goals";
/// The route for creating goals.
pub const GOALS_API: &str = "/api/goals";
/// The route for updating and deleting a goal.
pub const GOAL_API: &str = "/api/goals/{goal_id}";

/// The route for the logged in user's recent activity.
pub const ACTIVITY_API: &str = "/api/activity";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// Only the first parameter is replaced. If `endpoint_path` has no
/// parameter, it is returned unchanged.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let param_start = match endpoint_path.find('{') {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

/// Add an `account_id` query parameter to a page URL.
pub fn with_account(endpoint_path: &str, account_id: i64) -> String {
    format!("{endpoint_path}?account_id={account_id}")
}
