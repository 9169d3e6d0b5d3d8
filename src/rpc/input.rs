//! Extractors that deserialize procedure inputs from JSON or URL-encoded forms.

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::CONTENT_TYPE, request::Parts},
};
use serde::de::DeserializeOwned;

use crate::Error;

/// The input of a procedure taken from the request body.
///
/// Bodies with the content type `application/json` are parsed as JSON, anything
/// else is parsed as a URL-encoded form. Empty form values are treated as
/// missing so that optional fields left blank in a form become `None`.
#[derive(Debug)]
pub struct Input<T>(pub T);

impl<T, S> FromRequest<S> for Input<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|header| header.to_str().ok())
            .is_some_and(|content_type| content_type.starts_with("application/json"));

        let body = Bytes::from_request(request, state)
            .await
            .map_err(|rejection| Error::InvalidInput(rejection.body_text()))?;

        if is_json {
            serde_json::from_slice(&body)
                .map(Input)
                .map_err(|error| Error::InvalidInput(format!("Invalid input: {error}")))
        } else {
            parse_form(&body).map(Input)
        }
    }
}

/// The input of a procedure taken from the query string.
///
/// The same rules as [Input] forms apply.
#[derive(Debug)]
pub struct Params<T>(pub T);

impl<T, S> FromRequestParts<S> for Params<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let query = parts.uri.query().unwrap_or_default();

        parse_form(query.as_bytes()).map(Params)
    }
}

pub(crate) fn parse_form<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
        .map_err(|error| Error::InvalidInput(format!("Invalid input: {error}")))?;

    let pairs: Vec<(String, String)> = pairs
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .collect();

    let encoded = serde_urlencoded::to_string(&pairs)
        .map_err(|error| Error::InvalidInput(format!("Invalid input: {error}")))?;

    serde_urlencoded::from_str(&encoded)
        .map_err(|error| Error::InvalidInput(format!("Invalid input: {error}")))
}
