//! Implements a struct that holds the state of the server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error, attachment::AttachmentStore, auth::SessionConfig, db::initialize,
    timezone::get_local_offset,
};

/// The state of the server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The keys and settings for issuing session cookies.
    pub session: SessionConfig,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// Where uploaded attachments are kept.
    pub attachment_store: AttachmentStore,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `secret` is used to sign session tokens.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezoneError] if `local_timezone` is not a known timezone, or
    /// another error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        secret: &str,
        local_timezone: &str,
        attachment_store: AttachmentStore,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        initialize(&db_connection)?;

        Ok(Self {
            session: SessionConfig::new(secret),
            local_timezone: local_timezone.to_owned(),
            attachment_store,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }

    /// Send the session cookie over plain HTTP as well as HTTPS.
    pub fn with_insecure_cookies(mut self) -> Self {
        self.session.secure_cookie = false;
        self
    }
}

#[cfg(test)]
mod app_state_tests {
    use rusqlite::Connection;

    use crate::{Error, attachment::AttachmentStore};

    use super::AppState;

    #[test]
    fn rejects_unknown_timezone() {
        let result = AppState::new(
            Connection::open_in_memory().unwrap(),
            "foobar",
            "Mars/Olympus_Mons",
            AttachmentStore::new(std::env::temp_dir()),
        );

        assert_eq!(
            result.err(),
            Some(Error::InvalidTimezoneError("Mars/Olympus_Mons".to_owned()))
        );
    }

    #[test]
    fn cookies_are_secure_by_default() {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "foobar",
            "Pacific/Auckland",
            AttachmentStore::new(std::env::temp_dir()),
        )
        .unwrap();

        assert!(state.session.secure_cookie);
        assert!(!state.with_insecure_cookies().session.secure_cookie);
    }
}
