//! The page shown when a request fails for reasons the user cannot fix.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

/// An internal server error page with a description of what went wrong and
/// a suggestion for how to fix it.
pub struct InternalServerError<'a> {
    pub description: &'a str,
    pub fix: &'a str,
}

impl Default for InternalServerError<'_> {
    fn default() -> Self {
        Self {
            description: "Sorry, something went wrong.",
            fix: "Try again later or check the server logs",
        }
    }
}

impl IntoResponse for InternalServerError<'_> {
    fn into_response(self) -> Response {
        let page = error_view("Internal Server Error", "500", self.description, self.fix);

        (StatusCode::INTERNAL_SERVER_ERROR, Html(page.into_string())).into_response()
    }
}

pub async fn get_internal_server_error_page() -> Response {
    InternalServerError::default().into_response()
}

#[cfg(test)]
mod internal_server_error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::test_utils::{assert_valid_html, parse_html_document};

    use super::InternalServerError;

    #[tokio::test]
    async fn shows_fix() {
        let response = InternalServerError {
            description: "Invalid Timezone Settings",
            fix: "Set the timezone to a canonical name",
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let text = document.root_element().text().collect::<String>();
        assert!(text.contains("Set the timezone to a canonical name"));
    }
}
