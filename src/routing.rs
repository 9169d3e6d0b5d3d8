//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    response::Redirect,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    account::{
        create_account_endpoint, delete_account_endpoint as delete_ledger_account_endpoint,
        get_accounts_page, list_accounts_endpoint, update_account_endpoint,
    },
    activity_log::list_activity_endpoint,
    attachment::{
        MAX_ATTACHMENT_SIZE, delete_attachment_endpoint, download_attachment_endpoint,
        list_attachments_endpoint, upload_attachment_endpoint,
    },
    auth::{
        auth_guard, auth_guard_api, delete_account_endpoint, get_log_in_page, get_log_out,
        get_register_page, log_in_endpoint, log_out_endpoint, me_endpoint, register_endpoint,
        update_profile_endpoint,
    },
    category::{
        create_category_endpoint, delete_category_endpoint, get_categories_page,
        list_categories_endpoint, update_category_endpoint,
    },
    credit_card::{
        create_credit_card_endpoint, credit_card_expenses_endpoint, delete_credit_card_endpoint,
        get_credit_cards_page, list_credit_cards_endpoint, update_credit_card_endpoint,
    },
    dashboard::{
        expenses_by_category_endpoint, get_dashboard_page, get_reports_page,
        monthly_totals_endpoint, summary_endpoint,
    },
    endpoints,
    goal::{
        create_goal_endpoint, delete_goal_endpoint, get_goals_page, list_goals_endpoint,
        update_goal_endpoint,
    },
    internal_server_error::get_internal_server_error_page,
    logging::logging_middleware,
    not_found::get_404_not_found,
    rpc::htmx_bridge,
    scheduled_payment::{
        create_scheduled_payment_endpoint, delete_scheduled_payment_endpoint, get_schedule_page,
        list_scheduled_payments_endpoint, mark_as_paid_endpoint, set_priority_endpoint,
        update_scheduled_payment_endpoint,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transactions_page,
        list_transactions_endpoint, update_transaction_endpoint,
    },
    user::{delete_user_endpoint, get_profile_page, invite_user_endpoint, list_users_endpoint},
};

/// Multipart framing on top of the largest attachment.
const UPLOAD_BODY_OVERHEAD: usize = 1024 * 1024;

/// Return a router with all the app's routes.
///
/// `static_dir` is the directory served under [endpoints::STATIC].
pub fn build_router(state: AppState, static_dir: &str) -> Router {
    let unprotected_pages = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let unprotected_api = Router::new()
        .route(endpoints::LOG_IN_API, post(log_in_endpoint))
        .route(endpoints::REGISTER_API, post(register_endpoint))
        .route(endpoints::LOG_OUT_API, post(log_out_endpoint))
        .route(endpoints::ME_API, get(me_endpoint))
        .layer(middleware::from_fn(htmx_bridge));

    let protected_pages = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::REPORTS_VIEW, get(get_reports_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(endpoints::CATEGORIES_VIEW, get(get_categories_page))
        .route(endpoints::CREDIT_CARDS_VIEW, get(get_credit_cards_page))
        .route(endpoints::SCHEDULE_VIEW, get(get_schedule_page))
        .route(endpoints::GOALS_VIEW, get(get_goals_page))
        .route(endpoints::ACCOUNTS_VIEW, get(get_accounts_page))
        .route(endpoints::PROFILE_VIEW, get(get_profile_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let protected_api = Router::new()
        .route(endpoints::PROFILE_API, put(update_profile_endpoint))
        .route(
            endpoints::DELETE_ACCOUNT_API,
            axum::routing::delete(delete_account_endpoint),
        )
        .route(
            endpoints::USERS_API,
            get(list_users_endpoint).post(invite_user_endpoint),
        )
        .route(
            endpoints::USER_API,
            axum::routing::delete(delete_user_endpoint),
        )
        .route(
            endpoints::ACCOUNTS_API,
            get(list_accounts_endpoint).post(create_account_endpoint),
        )
        .route(
            endpoints::ACCOUNT_API,
            put(update_account_endpoint).delete(delete_ledger_account_endpoint),
        )
        .route(
            endpoints::ACCOUNT_CATEGORIES_API,
            get(list_categories_endpoint),
        )
        .route(endpoints::CATEGORIES_API, post(create_category_endpoint))
        .route(
            endpoints::CATEGORY_API,
            put(update_category_endpoint).delete(delete_category_endpoint),
        )
        .route(
            endpoints::ACCOUNT_TRANSACTIONS_API,
            get(list_transactions_endpoint),
        )
        .route(endpoints::TRANSACTIONS_API, post(create_transaction_endpoint))
        .route(
            endpoints::TRANSACTION_API,
            put(update_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION_ATTACHMENTS_API,
            get(list_attachments_endpoint)
                .post(upload_attachment_endpoint)
                .layer(DefaultBodyLimit::max(
                    MAX_ATTACHMENT_SIZE + UPLOAD_BODY_OVERHEAD,
                )),
        )
        .route(
            endpoints::ATTACHMENT_API,
            get(download_attachment_endpoint).delete(delete_attachment_endpoint),
        )
        .route(endpoints::SUMMARY_API, get(summary_endpoint))
        .route(
            endpoints::EXPENSES_BY_CATEGORY_API,
            get(expenses_by_category_endpoint),
        )
        .route(endpoints::MONTHLY_TOTALS_API, get(monthly_totals_endpoint))
        .route(
            endpoints::ACCOUNT_CREDIT_CARDS_API,
            get(list_credit_cards_endpoint),
        )
        .route(endpoints::CREDIT_CARDS_API, post(create_credit_card_endpoint))
        .route(
            endpoints::CREDIT_CARD_API,
            put(update_credit_card_endpoint).delete(delete_credit_card_endpoint),
        )
        .route(
            endpoints::CREDIT_CARD_EXPENSES_API,
            get(credit_card_expenses_endpoint),
        )
        .route(
            endpoints::ACCOUNT_SCHEDULED_PAYMENTS_API,
            get(list_scheduled_payments_endpoint),
        )
        .route(
            endpoints::SCHEDULED_PAYMENTS_API,
            post(create_scheduled_payment_endpoint),
        )
        .route(
            endpoints::SCHEDULED_PAYMENT_API,
            put(update_scheduled_payment_endpoint).delete(delete_scheduled_payment_endpoint),
        )
        .route(
            endpoints::SCHEDULED_PAYMENT_PAID_API,
            post(mark_as_paid_endpoint),
        )
        .route(
            endpoints::SCHEDULED_PAYMENT_PRIORITY_API,
            put(set_priority_endpoint),
        )
        .route(endpoints::ACCOUNT_GOALS_API, get(list_goals_endpoint))
        .route(endpoints::GOALS_API, post(create_goal_endpoint))
        .route(
            endpoints::GOAL_API,
            put(update_goal_endpoint).delete(delete_goal_endpoint),
        )
        .route(endpoints::ACTIVITY_API, get(list_activity_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard_api))
        .layer(middleware::from_fn(htmx_bridge));

    protected_pages
        .merge(protected_api)
        .merge(unprotected_pages)
        .merge(unprotected_api)
        .nest_service(endpoints::STATIC, ServeDir::new(static_dir))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{
        auth::COOKIE_SESSION,
        endpoints::{self, format_endpoint},
        rpc::{Created, ErrorBody},
        test_utils::{TEST_PASSWORD, insert_test_user, test_state},
    };

    use super::{build_router, get_index_page};

    fn test_server() -> (TestServer, crate::AppState) {
        let state = test_state();
        let server = TestServer::new(build_router(state.clone(), "static/"))
            .expect("Could not create test server.");

        (server, state)
    }

    async fn log_in(server: &TestServer, email: &str) -> Cookie<'static> {
        let response = server
            .post(endpoints::LOG_IN_API)
            .json(&json!({ "email": email, "password": TEST_PASSWORD }))
            .await;
        response.assert_status_ok();

        response.cookie(COOKIE_SESSION)
    }

    #[tokio::test]
    async fn root_redirects_to_dashboard() {
        let response = axum::response::IntoResponse::into_response(get_index_page().await);

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers().get("location").unwrap();
        assert_eq!(location, endpoints::DASHBOARD_VIEW);
    }

    #[tokio::test]
    async fn pages_redirect_to_log_in_without_session() {
        let (server, _) = test_server();

        let response = server.get(endpoints::DASHBOARD_VIEW).await;

        response.assert_status(StatusCode::SEE_OTHER);
        let location = response.header("location");
        assert!(
            location.to_str().unwrap().starts_with(endpoints::LOG_IN_VIEW),
            "got {location:?}"
        );
    }

    #[tokio::test]
    async fn api_returns_unauthorized_without_session() {
        let (server, _) = test_server();

        let response = server.get(endpoints::ACCOUNTS_API).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: ErrorBody = response.json();
        assert_eq!(body.code, "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn logged_in_user_can_create_and_list_accounts() {
        let (server, state) = test_server();
        insert_test_user(&state.db_connection.lock().unwrap(), "foo@bar.baz");
        let cookie = log_in(&server, "foo@bar.baz").await;

        let created: Created = server
            .post(endpoints::ACCOUNTS_API)
            .add_cookie(cookie.clone())
            .json(&json!({ "name": "Personal", "type": "personal" }))
            .await
            .json();
        assert!(created.success);

        let accounts = server
            .get(endpoints::ACCOUNTS_API)
            .add_cookie(cookie.clone())
            .await
            .json::<serde_json::Value>();
        assert_eq!(accounts[0]["id"], created.id);
        assert_eq!(accounts[0]["name"], "Personal");

        let summary = server
            .get(&format_endpoint(endpoints::SUMMARY_API, created.id))
            .add_query_param("startDate", "2025-01-01")
            .add_query_param("endDate", "2025-01-31")
            .add_cookie(cookie)
            .await
            .json::<serde_json::Value>();
        assert_eq!(summary, json!({ "income": 0, "expense": 0, "balance": 0 }));
    }

    #[tokio::test]
    async fn htmx_requests_get_refresh_header() {
        let (server, state) = test_server();
        insert_test_user(&state.db_connection.lock().unwrap(), "foo@bar.baz");
        let cookie = log_in(&server, "foo@bar.baz").await;

        let response = server
            .post(endpoints::ACCOUNTS_API)
            .add_cookie(cookie)
            .add_header("HX-Request", "true")
            .form(&[("name", "Business"), ("type", "business")])
            .await;

        response.assert_status_ok();
        assert_eq!(response.header("hx-refresh"), "true");
    }

    async fn register(server: &TestServer, email: &str) -> (i64, Cookie<'static>) {
        let response = server
            .post(endpoints::REGISTER_API)
            .json(&json!({ "name": "Test User", "email": email, "password": TEST_PASSWORD }))
            .await;
        response.assert_status_ok();
        let user_id = response.json::<serde_json::Value>()["id"]
            .as_i64()
            .expect("No user id in response");

        (user_id, response.cookie(COOKIE_SESSION))
    }

    #[tokio::test]
    async fn only_first_registered_user_can_manage_users() {
        let (server, _) = test_server();
        let (admin_id, admin_cookie) = register(&server, "admin@example.com").await;
        let (user_id, user_cookie) = register(&server, "user@example.com").await;

        let users = server
            .get(endpoints::USERS_API)
            .add_cookie(admin_cookie.clone())
            .await
            .json::<serde_json::Value>();
        assert_eq!(users.as_array().map(Vec::len), Some(2));

        let list = server
            .get(endpoints::USERS_API)
            .add_cookie(user_cookie.clone())
            .await;
        list.assert_status(StatusCode::FORBIDDEN);
        assert_eq!(list.json::<ErrorBody>().code, "FORBIDDEN");

        server
            .delete(&format_endpoint(endpoints::USER_API, admin_id))
            .add_cookie(user_cookie)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        server
            .delete(&format_endpoint(endpoints::USER_API, user_id))
            .add_cookie(admin_cookie)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (server, _) = test_server();

        let response = server.get("/does/not/exist").await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}
