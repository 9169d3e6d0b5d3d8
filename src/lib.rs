//! Fintrack is a web app for tracking personal and business finances.
//!
//! Users group their finances into accounts, record income and expenses
//! against categories, track credit cards, scheduled payments and savings
//! goals, and get a dashboard summarising where their money goes.
//!
//! This library provides a JSON API under `/api` and the HTML pages that use it.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod account;
mod activity_log;
mod alert;
mod app_state;
mod attachment;
mod auth;
mod calendar;
mod category;
mod config;
mod credit_card;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod goal;
mod html;
mod internal_server_error;
mod logging;
mod money;
mod navigation;
mod not_found;
mod routing;
mod rpc;
mod scheduled_payment;
mod timezone;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use account::{AccountType, NewAccount, create_account};
pub use app_state::AppState;
pub use attachment::AttachmentStore;
pub use auth::{PasswordHash, ValidatedPassword};
pub use category::{CategoryKind, create_default_categories};
pub use config::Config;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use transaction::{NewTransaction, TransactionStatus, TransactionType, create_transaction};
pub use user::{
    Email, NewUser, Role, User, UserId, create_user, get_user_by_email, set_password_hash,
};

use crate::{
    internal_server_error::InternalServerError, not_found::get_404_not_found_response,
    rpc::ErrorBody,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email and password did not match a user that can log in.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The request did not carry a valid session.
    #[error("You must be logged in to do that")]
    Unauthorized,

    /// The resource exists but belongs to another user, or the account it
    /// is scoped to does not exist.
    #[error("You do not have access to this resource")]
    Forbidden,

    /// A user tried to remove their own user through the user management API.
    #[error("You cannot remove yourself")]
    CannotDeleteSelf,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("The requested resource could not be found")]
    NotFound,

    /// Another user has already registered with this email address.
    #[error("Email already in use")]
    EmailInUse,

    /// The client sent input that failed validation.
    ///
    /// The message is shown to the client as is.
    #[error("{0}")]
    InvalidInput(String),

    /// The string is not a valid email address.
    #[error("{0} is not a valid email address")]
    InvalidEmail(String),

    /// The password is shorter than the minimum length.
    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),

    /// The uploaded file exceeds the attachment size limit.
    #[error("File too large. Maximum: 10MB")]
    AttachmentTooLarge,

    /// The multipart form did not contain a file.
    #[error("No file was uploaded")]
    MissingFile,

    /// The multipart form could not be parsed.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The session token could not be created.
    #[error("could not create session token: {0}")]
    TokenError(String),

    /// Reading or writing an attachment file failed.
    #[error("attachment storage failed: {0}")]
    StorageError(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::EmailInUse
            }
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_))
                if sql_error.extended_code == 787 =>
            {
                Error::InvalidInput("A referenced record does not exist".to_owned())
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    /// The HTTP status code the error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidCredentials | Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::Forbidden | Error::CannotDeleteSelf => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::EmailInUse => StatusCode::CONFLICT,
            Error::InvalidInput(_)
            | Error::InvalidEmail(_)
            | Error::PasswordTooShort(_)
            | Error::AttachmentTooLarge
            | Error::MissingFile
            | Error::MultipartError(_) => StatusCode::BAD_REQUEST,
            Error::HashingError(_)
            | Error::TokenError(_)
            | Error::StorageError(_)
            | Error::InvalidTimezoneError(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// A stable, machine readable name for the kind of error.
    pub fn code(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "BAD_REQUEST",
            StatusCode::UNAUTHORIZED => "UNAUTHORIZED",
            StatusCode::FORBIDDEN => "FORBIDDEN",
            StatusCode::NOT_FOUND => "NOT_FOUND",
            StatusCode::CONFLICT => "CONFLICT",
            _ => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal errors are not intended to be shown to the client.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
            "Something went wrong, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            error: message,
            code: self.code().to_owned(),
        };

        (status, Json(body)).into_response()
    }
}

/// An [Error] raised while rendering a full HTML page.
///
/// Unlike [Error], which responds with JSON, this renders an error page.
#[derive(Debug, PartialEq)]
pub struct PageError(pub Error);

impl From<Error> for PageError {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl From<rusqlite::Error> for PageError {
    fn from(error: rusqlite::Error) -> Self {
        Self(Error::from(error))
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self.0 {
            Error::NotFound | Error::Forbidden => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}
