//! Session tokens are JSON Web Tokens signed with the server secret.

use std::fmt::Debug;

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    Error,
    user::{User, UserId},
};

/// How long a session lasts after logging in.
pub const SESSION_DURATION: Duration = Duration::days(365);

/// The keys for signing and verifying session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionKeys {
    /// Derive the HS256 keys from `secret`.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKeys { .. }")
    }
}

/// Everything needed to issue and check sessions.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// The keys for signing and verifying session tokens.
    pub keys: SessionKeys,
    /// How long a new session lasts.
    pub duration: Duration,
    /// Whether the session cookie is only sent over HTTPS.
    pub secure_cookie: bool,
}

impl SessionConfig {
    /// A session config with the default duration and secure cookies.
    pub fn new(secret: &str) -> Self {
        Self {
            keys: SessionKeys::new(secret),
            duration: SESSION_DURATION,
            secure_cookie: true,
        }
    }
}

/// The contents of a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub sub: String,
    /// The user's name when the token was issued.
    pub name: String,
    /// The time the token was issued as a UNIX timestamp.
    pub iat: u64,
    /// The expiry time of the token as a UNIX timestamp.
    pub exp: u64,
}

impl Claims {
    /// The ID of the user the token was issued to.
    ///
    /// # Errors
    /// Returns [Error::Unauthorized] if the subject is not a user ID.
    pub fn user_id(&self) -> Result<UserId, Error> {
        self.sub
            .parse()
            .map(UserId::new)
            .map_err(|_| Error::Unauthorized)
    }
}

/// Create a signed session token for `user`.
///
/// # Errors
/// Returns [Error::TokenError] if the token could not be signed.
pub fn encode_token(user: &User, config: &SessionConfig) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user.id.to_string(),
        name: user.name.clone(),
        iat: now.unix_timestamp().max(0) as u64,
        exp: (now + config.duration).unix_timestamp().max(0) as u64,
    };

    encode(&Header::default(), &claims, &config.keys.encoding)
        .map_err(|error| Error::TokenError(error.to_string()))
}

/// Verify the signature and expiry of a session token.
///
/// # Errors
/// Returns [Error::Unauthorized] if the token is malformed, tampered with or expired.
pub fn decode_token(token: &str, keys: &SessionKeys) -> Result<Claims, Error> {
    decode::<Claims>(token, &keys.decoding, &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::debug!("rejected session token: {error}");
            Error::Unauthorized
        })
}

#[cfg(test)]
mod token_tests {
    use time::Duration;

    use crate::{
        Error,
        test_utils::test_user,
        user::UserId,
    };

    use super::{SessionConfig, decode_token, encode_token};

    #[test]
    fn decode_gives_user_id() {
        let config = SessionConfig::new("foobar");
        let user = test_user(UserId::new(7));

        let token = encode_token(&user, &config).unwrap();
        let claims = decode_token(&token, &config.keys).unwrap();

        assert_eq!(claims.user_id(), Ok(UserId::new(7)));
        assert_eq!(claims.name, user.name);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let user = test_user(UserId::new(7));
        let token = encode_token(&user, &SessionConfig::new("foobar")).unwrap();

        let result = decode_token(&token, &SessionConfig::new("barfoo").keys);

        assert_eq!(result, Err(Error::Unauthorized));
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut config = SessionConfig::new("foobar");
        // Past the default validation leeway of one minute.
        config.duration = Duration::minutes(-5);
        let token = encode_token(&test_user(UserId::new(7)), &config).unwrap();

        let result = decode_token(&token, &config.keys);

        assert_eq!(result, Err(Error::Unauthorized));
    }

    #[test]
    fn garbage_is_rejected() {
        let config = SessionConfig::new("foobar");

        assert_eq!(
            decode_token("FOOBAR", &config.keys),
            Err(Error::Unauthorized)
        );
    }
}
