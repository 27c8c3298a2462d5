//! Authorization code exchange.

use async_trait::async_trait;
use oauth2::reqwest::async_http_client;
use oauth2::{AuthorizationCode, TokenResponse};
use secrecy::SecretString;
use tracing::{debug, warn};

use super::ProviderConfig;
use crate::error::{Error, ErrorKind, OAuthErrorKind};

/// Trades an authorization code for a provider access token.
#[async_trait]
pub trait CodeExchanger: Send + Sync {
    /// Exchange `code` at `config.token_url`.
    ///
    /// Any transport or provider-reported failure is returned as
    /// [`OAuthErrorKind::TokenExchangeFailed`]. Nothing is retried.
    async fn exchange(&self, config: &ProviderConfig, code: &str) -> Result<SecretString, Error>;
}

/// [`CodeExchanger`] backed by the `oauth2` crate's basic client.
#[derive(Debug, Clone, Copy, Default)]
pub struct OAuth2Exchanger;

#[async_trait]
impl CodeExchanger for OAuth2Exchanger {
    async fn exchange(&self, config: &ProviderConfig, code: &str) -> Result<SecretString, Error> {
        let client = config.oauth2_client()?;

        debug!("Exchanging {} authorization code", config.kind);

        let token = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| {
                warn!("Failed to exchange {} authorization code: {}", config.kind, e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: ErrorKind::OAuth(OAuthErrorKind::TokenExchangeFailed),
                }
            })?;

        Ok(SecretString::new(token.access_token().secret().clone()))
    }
}
