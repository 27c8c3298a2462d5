use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use domain::error::{DomainErrorKind, Error as DomainError, LoginErrorKind};

use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

const LOGIN_FAILED: &str = "Login failed";
const SOMETHING_WENT_WRONG: &str = "Something went wrong";

impl Error {
    /// Title and message shown to the user.
    fn page(&self) -> (&'static str, &'static str) {
        match &self.0.error_kind {
            DomainErrorKind::Login(kind) => match kind {
                LoginErrorKind::StateInvalid => (
                    LOGIN_FAILED,
                    "The login request is invalid or has expired. Please start the login again.",
                ),
                LoginErrorKind::ExchangeFailed => (
                    LOGIN_FAILED,
                    "The identity provider did not accept the authorization code.",
                ),
                LoginErrorKind::IdentityFetchFailed => (
                    LOGIN_FAILED,
                    "Your account details could not be read from the identity provider.",
                ),
                LoginErrorKind::NotAdministrator => (
                    LOGIN_FAILED,
                    "This account is not an administrator of the dashboard.",
                ),
                LoginErrorKind::TokenGenerationFailed => (
                    SOMETHING_WENT_WRONG,
                    "A session could not be created. Please try again later.",
                ),
            },
            DomainErrorKind::Internal(_) => (
                SOMETHING_WENT_WRONG,
                "The server could not complete the login. Please try again later.",
            ),
        }
    }

    /// The underlying cause, HTML-escaped. Library errors display only their kind.
    fn cause(&self) -> Option<String> {
        self.0
            .source
            .as_ref()
            .map(|source| escape_html(&source.to_string()))
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// Every failure on the login path renders the same 400 page; only title, message and cause differ.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self.0.error_kind {
            DomainErrorKind::Login(kind) => warn!("Login failed ({:?}): {:?}", kind, self.0.source),
            DomainErrorKind::Internal(kind) => {
                error!("Login aborted ({:?}): {:?}", kind, self.0.source)
            }
        }

        let (title, message) = self.page();
        let cause = self
            .cause()
            .map(|cause| format!("<p>Error: {cause}</p>\n"))
            .unwrap_or_default();
        let body = format!(
            "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
             <body>\n<h1>{title}</h1>\n<p>{message}</p>\n{cause}<p><a href=\"/oauth2/login\">Try again</a></p>\n</body>\n</html>\n"
        );

        (StatusCode::BAD_REQUEST, Html(body)).into_response()
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::error::InternalErrorKind;

    fn title_of(error_kind: DomainErrorKind) -> &'static str {
        Error(DomainError {
            source: None,
            error_kind,
        })
        .page()
        .0
    }

    #[test]
    fn test_login_kinds_use_login_failed_title() {
        for kind in [
            LoginErrorKind::StateInvalid,
            LoginErrorKind::ExchangeFailed,
            LoginErrorKind::IdentityFetchFailed,
            LoginErrorKind::NotAdministrator,
        ] {
            assert_eq!(title_of(DomainErrorKind::Login(kind)), LOGIN_FAILED);
        }
    }

    #[test]
    fn test_token_generation_and_internal_use_generic_title() {
        assert_eq!(
            title_of(DomainErrorKind::Login(LoginErrorKind::TokenGenerationFailed)),
            SOMETHING_WENT_WRONG
        );
        assert_eq!(
            title_of(DomainErrorKind::Internal(InternalErrorKind::Storage)),
            SOMETHING_WENT_WRONG
        );
    }

    async fn body_of(error: Error) -> String {
        let bytes = axum::body::to_bytes(error.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_page_shows_underlying_cause() {
        let body = body_of(Error(DomainError::login(
            LoginErrorKind::NotAdministrator,
            "mallory is not an administrator",
        )))
        .await;

        assert!(body.contains("<h1>Login failed</h1>"));
        assert!(body.contains("Error: mallory is not an administrator"));
    }

    #[tokio::test]
    async fn test_cause_is_escaped() {
        let body = body_of(Error(DomainError::login(
            LoginErrorKind::NotAdministrator,
            "<script>alert('x')</script> is not an administrator",
        )))
        .await;

        assert!(!body.contains("<script>"));
        assert!(body.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
    }

    #[test]
    fn test_every_error_is_bad_request() {
        let response = Error(DomainError::config("missing client id")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/html")));
    }
}
