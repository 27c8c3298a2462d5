//! Error types for the `domain` layer.
use forge_auth::error::{
    Error as ForgeAuthError, ErrorKind as ForgeAuthErrorKind, SessionErrorKind,
};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums. The `source` field holds the lower-layer error that caused it. `web`
/// only looks at `error_kind` to decide what the user gets to see.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Login(LoginErrorKind),
    Internal(InternalErrorKind),
}

/// Why an OAuth login attempt was rejected. Every kind is terminal for the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginErrorKind {
    /// Anti-forgery state cookie missing, unknown, expired or mismatched.
    StateInvalid,
    /// The provider refused the authorization code or could not be reached.
    ExchangeFailed,
    /// The provider's user API failed or returned an empty login.
    IdentityFetchFailed,
    /// The identity is valid but not on the admin allow-list.
    NotAdministrator,
    /// No randomness available to mint a token.
    TokenGenerationFailed,
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Config,
    Storage,
    Other(String),
}

impl Error {
    /// A rejected login with `source` as the underlying cause.
    pub fn login<E>(kind: LoginErrorKind, source: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Error {
            source: Some(source.into()),
            error_kind: DomainErrorKind::Login(kind),
        }
    }

    pub fn config(message: &str) -> Self {
        Error {
            source: Some(message.into()),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        }
    }

    /// The login error kind, if this is a rejected login.
    pub fn login_kind(&self) -> Option<LoginErrorKind> {
        match self.error_kind {
            DomainErrorKind::Login(kind) => Some(kind),
            DomainErrorKind::Internal(_) => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// Stage-independent translation. The login flow maps stage failures itself; this
// covers the remaining calls into `forge-auth`.
impl From<ForgeAuthError> for Error {
    fn from(err: ForgeAuthError) -> Self {
        let error_kind = match &err.error_kind {
            ForgeAuthErrorKind::Session(SessionErrorKind::TokenGeneration) => {
                DomainErrorKind::Login(LoginErrorKind::TokenGenerationFailed)
            }
            ForgeAuthErrorKind::Session(SessionErrorKind::Storage) => {
                DomainErrorKind::Internal(InternalErrorKind::Storage)
            }
            ForgeAuthErrorKind::Config => DomainErrorKind::Internal(InternalErrorKind::Config),
            ForgeAuthErrorKind::OAuth(_) | ForgeAuthErrorKind::Http(_) => {
                DomainErrorKind::Internal(InternalErrorKind::Other(err.to_string()))
            }
        };
        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_auth::error::{config_error, session_error};

    #[test]
    fn test_token_generation_maps_to_login_kind() {
        let err: Error = session_error(SessionErrorKind::TokenGeneration, "no entropy").into();
        assert_eq!(err.login_kind(), Some(LoginErrorKind::TokenGenerationFailed));
    }

    #[test]
    fn test_config_maps_to_internal() {
        let err: Error = config_error("bad url").into();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Config)
        );
        assert_eq!(err.login_kind(), None);
    }

    #[test]
    fn test_login_keeps_source() {
        let err = Error::login(LoginErrorKind::StateInvalid, "state mismatch");
        assert_eq!(
            StdError::source(&err).map(|s| s.to_string()).as_deref(),
            Some("state mismatch")
        );
    }
}
