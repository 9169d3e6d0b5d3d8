//! Alerts for reporting the outcome of htmx requests to the user.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::{Markup, html};

/// An error message shown in the page's alert container.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    /// The heading of the alert.
    pub message: String,
    /// Details about what happened and what the user can do about it.
    pub details: String,
}

impl Alert {
    pub fn error(message: &str, details: &str) -> Self {
        Self {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    pub fn into_html(self) -> Markup {
        html! {
            div
                role="alert"
                class="flex items-start gap-3 p-4 mb-4 text-sm text-red-800 rounded-lg
                    bg-red-50 border border-red-300 shadow dark:bg-gray-800
                    dark:text-red-400 dark:border-red-800"
            {
                div class="flex-1"
                {
                    p class="font-semibold" { (self.message) }

                    @if !self.details.is_empty() {
                        p { (self.details) }
                    }
                }

                button
                    type="button"
                    aria-label="Dismiss"
                    class="font-bold"
                    onclick="this.closest('[role=alert]').remove()"
                {
                    "×"
                }
            }
        }
    }

    /// Render the alert with the status code of the error it reports.
    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        (status, Html(self.into_html().into_string())).into_response()
    }
}

#[cfg(test)]
mod alert_tests {
    use scraper::{Html, Selector};

    use super::Alert;

    #[test]
    fn renders_message_and_details() {
        let html = Alert::error("Could not save", "Amount must be greater than zero")
            .into_html()
            .into_string();
        let fragment = Html::parse_fragment(&html);

        let alert = fragment
            .select(&Selector::parse("[role=alert]").unwrap())
            .next()
            .expect("No alert found");
        let text = alert.text().collect::<String>();
        assert!(text.contains("Could not save"));
        assert!(text.contains("Amount must be greater than zero"));
    }
}
