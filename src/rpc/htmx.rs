//! Adapts JSON API responses for requests made by htmx from the HTML pages.

use axum::{
    body::to_bytes,
    extract::Request,
    http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::Response,
};
use axum_htmx::{HX_REDIRECT, HX_REFRESH, HX_REQUEST, HX_RESWAP};

use crate::{alert::Alert, rpc::ErrorBody};

/// Error bodies are small, anything bigger is not one of ours.
const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

/// Middleware that lets the HTML pages call the JSON API with htmx.
///
/// For htmx requests:
/// - successful responses tell htmx to reload the page so that it shows the
///   new data, unless the handler already asked for a redirect,
/// - JSON error responses are replaced with an HTML alert carrying the error
///   message and the original status code.
///
/// Other requests pass through unchanged.
pub async fn htmx_bridge(request: Request, next: Next) -> Response {
    let is_htmx = request
        .headers()
        .get(HX_REQUEST)
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"));

    let response = next.run(request).await;

    if !is_htmx {
        return response;
    }

    if response.status().is_success() {
        if response.headers().contains_key(HX_REDIRECT) {
            return response;
        }

        let (mut parts, body) = response.into_parts();
        parts
            .headers
            .insert(HX_REFRESH, HeaderValue::from_static("true"));
        parts
            .headers
            .insert(HX_RESWAP, HeaderValue::from_static("none"));

        return Response::from_parts(parts, body);
    }

    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|header| header.to_str().ok())
        .is_some_and(|content_type| content_type.starts_with("application/json"));

    if !is_json {
        return response;
    }

    let status = response.status();
    let (_, body) = response.into_parts();
    let details = match to_bytes(body, MAX_ERROR_BODY_BYTES).await {
        Ok(bytes) => match serde_json::from_slice::<ErrorBody>(&bytes) {
            Ok(error_body) => error_body.error,
            Err(error) => {
                tracing::warn!("could not parse error response body: {error}");
                String::new()
            }
        },
        Err(error) => {
            tracing::warn!("could not read error response body: {error}");
            String::new()
        }
    };

    Alert::error(alert_title(status), &details).into_response_with_status(status)
}

fn alert_title(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "Please check your input",
        StatusCode::UNAUTHORIZED => "Could not log you in",
        StatusCode::FORBIDDEN => "Not allowed",
        StatusCode::NOT_FOUND => "Not found",
        StatusCode::CONFLICT => "Already exists",
        _ => "Something went wrong",
    }
}
