//! Assertions on rendered pages and the forms in them.

use axum::{body::Body, http::StatusCode, response::Response};
use scraper::{ElementRef, Html, Selector};

#[track_caller]
pub(crate) fn assert_status_ok(response: &Response<Body>) {
    assert_eq!(response.status(), StatusCode::OK, "want 200 OK");
}

/// The value of `header_name`, which must be present and valid text.
#[track_caller]
pub(crate) fn get_header(response: &Response<Body>, header_name: &str) -> String {
    response
        .headers()
        .get(header_name)
        .unwrap_or_else(|| panic!("{header_name} header missing"))
        .to_str()
        .expect("Header is not valid text")
        .to_owned()
}

/// Read the whole response body as an HTML document.
pub(crate) async fn parse_html_document(response: Response<Body>) -> Html {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not read response body");

    Html::parse_document(&String::from_utf8_lossy(&body))
}

#[track_caller]
pub(crate) fn assert_valid_html(html: &Html) {
    assert!(
        html.errors.is_empty(),
        "Got HTML parsing errors: {:?}",
        html.errors
    );
}

/// The first form on the page.
#[track_caller]
pub(crate) fn must_get_form(html: &Html) -> ElementRef<'_> {
    html.select(&Selector::parse("form").unwrap())
        .next()
        .expect("No form found")
}

/// Assert that `form` sends its request to `endpoint` with the htmx `attribute`, e.g. "hx-post".
#[track_caller]
pub(crate) fn assert_hx_endpoint(form: &ElementRef<'_>, endpoint: &str, attribute: &str) {
    let got = form
        .value()
        .attr(attribute)
        .unwrap_or_else(|| panic!("{attribute} attribute missing"));

    assert_eq!(
        got, endpoint,
        "want form with {attribute}=\"{endpoint}\", got {got:?}"
    );
}

/// Assert that `form` has a required input called `name` of type `type_`.
#[track_caller]
pub(crate) fn assert_form_input(form: &ElementRef<'_>, name: &str, type_: &str) {
    let selector = Selector::parse(&format!("input[name=\"{name}\"]")).unwrap();
    let input = form
        .select(&selector)
        .next()
        .unwrap_or_else(|| panic!("No input found with name \"{name}\""));

    let got_type = input.value().attr("type").unwrap_or_default();
    assert_eq!(
        got_type, type_,
        "want input {name} with type \"{type_}\", got {got_type:?}"
    );
    assert!(
        input.value().attr("required").is_some(),
        "want input {name} to have the required attribute"
    );
}
