//! Dashboard sessions issued after a successful admin login.

mod store;

use chrono::{DateTime, Months, Utc};
use secrecy::SecretString;

use crate::error::{session_error, Error, SessionErrorKind};
use crate::oauth::Identity;
use crate::random::random_string;

pub use store::{MemorySessionStore, SessionStore};

/// Length of the opaque session token.
pub const SESSION_TOKEN_LEN: usize = 32;

/// Sessions last this many calendar months from issuance. Not sliding.
pub const SESSION_LIFETIME_MONTHS: u32 = 2;

/// An issued session. The token is opaque and unrelated to any OAuth token.
#[derive(Debug, Clone)]
pub struct Session {
    pub login: String,
    pub token: SecretString,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Mint a fresh session for `identity`, expiring two months from now.
    pub fn issue(identity: &Identity) -> Result<Self, Error> {
        Self::issue_at(identity, Utc::now())
    }

    pub fn issue_at(identity: &Identity, now: DateTime<Utc>) -> Result<Self, Error> {
        let token = random_string(SESSION_TOKEN_LEN)?;
        let expires_at = now
            .checked_add_months(Months::new(SESSION_LIFETIME_MONTHS))
            .ok_or_else(|| {
                session_error(SessionErrorKind::TokenGeneration, "session expiry out of range")
            })?;

        Ok(Self {
            login: identity.login.clone(),
            token: SecretString::new(token),
            expires_at,
        })
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}
