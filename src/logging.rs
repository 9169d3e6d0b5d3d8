//! Middleware for logging requests and responses.

use axum::{
    extract::Request,
    http::{
        HeaderMap, HeaderValue,
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, Entry, SET_COOKIE},
    },
    middleware::Next,
    response::Response,
};
use serde_json::Value;

/// The maximum number of bytes of a body to log at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If the body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
/// Password fields and cookies are redacted, and non-text bodies, such as
/// file uploads, are not logged.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();

    let request = if is_text_body(&parts.headers) {
        let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::error!("Could not read request body: {error}");
                Default::default()
            }
        };
        let body_text = String::from_utf8_lossy(&body_bytes);
        log_request(&parts, &redact_passwords(&parts.headers, &body_text));

        Request::from_parts(parts, body_bytes.into())
    } else {
        log_request(&parts, "<binary>");
        Request::from_parts(parts, body)
    };

    let response = next.run(request).await;

    let (parts, body) = response.into_parts();

    if !is_text_body(&parts.headers) {
        log_response(&parts, "<binary>");
        return Response::from_parts(parts, body);
    }

    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            Default::default()
        }
    };
    log_response(&parts, &String::from_utf8_lossy(&body_bytes));

    Response::from_parts(parts, body_bytes.into())
}

fn content_type(headers: &HeaderMap) -> &str {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

fn is_text_body(headers: &HeaderMap) -> bool {
    let content_type = content_type(headers);

    content_type.is_empty()
        || content_type.starts_with("text/")
        || content_type.starts_with("application/json")
        || content_type.starts_with("application/x-www-form-urlencoded")
}

fn is_password_field(name: &str) -> bool {
    name.to_ascii_lowercase().contains("password")
}

/// Replace the values of password fields in form and JSON bodies.
fn redact_passwords(headers: &HeaderMap, body: &str) -> String {
    let content_type = content_type(headers);

    if content_type.starts_with("application/x-www-form-urlencoded") {
        redact_form_passwords(body)
    } else if content_type.starts_with("application/json") {
        redact_json_passwords(body)
    } else {
        body.to_owned()
    }
}

fn redact_form_passwords(form_text: &str) -> String {
    let Ok(fields) = serde_urlencoded::from_str::<Vec<(String, String)>>(form_text) else {
        return "<unparseable form>".to_owned();
    };

    let fields: Vec<(String, String)> = fields
        .into_iter()
        .map(|(name, value)| {
            if is_password_field(&name) {
                (name, "********".to_owned())
            } else {
                (name, value)
            }
        })
        .collect();

    serde_urlencoded::to_string(fields).unwrap_or_default()
}

fn redact_json_passwords(json_text: &str) -> String {
    fn redact(value: &mut Value) {
        match value {
            Value::Object(map) => {
                for (key, value) in map.iter_mut() {
                    if is_password_field(key) {
                        *value = Value::String("********".to_owned());
                    } else {
                        redact(value);
                    }
                }
            }
            Value::Array(values) => values.iter_mut().for_each(redact),
            _ => {}
        }
    }

    match serde_json::from_str::<Value>(json_text) {
        Ok(mut value) => {
            redact(&mut value);
            value.to_string()
        }
        Err(_) => json_text.to_owned(),
    }
}

/// The longest prefix of `body` that fits in [LOG_BODY_LENGTH_LIMIT] bytes
/// without splitting a character.
fn truncate(body: &str) -> &str {
    let mut end = LOG_BODY_LENGTH_LIMIT.min(body.len());
    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

/// Copy `headers` with the values of credential headers, such as the session
/// cookie, replaced.
fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();

    for name in [COOKIE, SET_COOKIE, AUTHORIZATION] {
        if let Entry::Occupied(mut entry) = headers.entry(name) {
            for value in entry.iter_mut() {
                *value = HeaderValue::from_static("********");
            }
        }
    }

    headers
}

fn log_request(parts: &axum::http::request::Parts, body: &str) {
    let method = &parts.method;
    let uri = &parts.uri;
    let headers = redact_headers(&parts.headers);

    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {method} {uri}\nheaders: {headers:#?}\nbody: {:}...",
            truncate(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!(
            "Received request: {method} {uri}\nheaders: {headers:#?}\nbody: {body:?}"
        );
    }
}

fn log_response(parts: &axum::http::response::Parts, body: &str) {
    let status = parts.status;
    let headers = redact_headers(&parts.headers);

    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {status}\nheaders: {headers:#?}\nbody: {:}...",
            truncate(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!(
            "Sending response: {status}\nheaders: {headers:#?}\nbody: {body:?}"
        );
    }
}
