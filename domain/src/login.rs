//! OAuth2 administrator login.
//!
//! `begin` starts a login: it issues a CSRF state and returns the provider URL to
//! send the browser to. `complete` handles the provider's callback and walks the
//! login through
//!
//! ```text
//! Start -> StateVerified -> TokenExchanged -> IdentityResolved -> Authorized -> SessionIssued
//! ```
//!
//! stopping at the first failing step. Nothing is persisted before the last step,
//! so a failure needs no cleanup.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use forge_auth::admin::AdminAllowList;
use forge_auth::http::HttpClientBuilder;
use forge_auth::oauth::{
    CodeExchanger, ForgeIdentityResolver, IdentityResolver, OAuth2Exchanger, ProviderConfig,
    ProviderKind, ProviderSettings, RequestOrigin, StateCache, StateGuard,
};
use forge_auth::session::{Session, SessionStore};
use log::*;
use secrecy::SecretString;
use service::config::Config;

use crate::error::{DomainErrorKind, Error, InternalErrorKind, LoginErrorKind};

/// Everything about the login that comes from configuration.
#[derive(Debug, Clone)]
pub struct LoginSettings {
    pub provider: ProviderSettings,
    pub admins: AdminAllowList,
    pub state_ttl: Duration,
}

impl LoginSettings {
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let kind = ProviderKind::from_config(&config.oauth2_type);
        let client_id = config
            .oauth2_client_id()
            .ok_or_else(|| Error::config("OAUTH2_CLIENT_ID is not configured"))?;
        let client_secret = config
            .oauth2_client_secret()
            .ok_or_else(|| Error::config("OAUTH2_CLIENT_SECRET is not configured"))?;

        let endpoint = config.oauth2_endpoint();
        if kind == ProviderKind::Gitea && endpoint.is_none() {
            return Err(Error::config(
                "OAUTH2_ENDPOINT is required for the gitea provider",
            ));
        }

        let admins = AdminAllowList::parse(&config.oauth2_admin);
        if admins.is_empty() {
            warn!("OAUTH2_ADMIN is empty, nobody will be able to log in");
        }

        Ok(Self {
            provider: ProviderSettings {
                kind,
                client_id,
                client_secret: SecretString::new(client_secret),
                endpoint,
            },
            admins,
            state_ttl: Duration::seconds(config.oauth2_state_ttl_seconds),
        })
    }
}

/// Where to send the browser to start a login, and the cookie value to set.
#[derive(Debug, Clone)]
pub struct LoginRedirect {
    pub authorize_url: String,
    pub state_key: String,
}

/// What the provider's redirect brought back.
#[derive(Debug, Clone, Copy)]
pub struct Callback<'a> {
    /// Value of the state cookie set by [`LoginFlow::begin`], if the browser sent it.
    pub state_key: Option<&'a str>,
    pub state: &'a str,
    pub code: &'a str,
}

/// Orchestrates the two legs of the OAuth2 admin login.
#[derive(Clone)]
pub struct LoginFlow {
    settings: LoginSettings,
    state_guard: StateGuard,
    exchanger: Arc<dyn CodeExchanger>,
    resolver: Arc<dyn IdentityResolver>,
    sessions: Arc<dyn SessionStore>,
}

impl LoginFlow {
    pub fn new(
        settings: LoginSettings,
        cache: Arc<dyn StateCache>,
        exchanger: Arc<dyn CodeExchanger>,
        resolver: Arc<dyn IdentityResolver>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let state_guard = StateGuard::with_ttl(cache, settings.state_ttl);
        Self {
            settings,
            state_guard,
            exchanger,
            resolver,
            sessions,
        }
    }

    /// Build a flow talking to the configured provider over the network.
    pub fn from_config(
        config: &Config,
        cache: Arc<dyn StateCache>,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self, Error> {
        let settings = LoginSettings::from_config(config)?;
        let http = HttpClientBuilder::new()
            .with_timeout(StdDuration::from_secs(config.oauth2_http_timeout_seconds))
            .build()
            .map_err(forge_auth::Error::from)?;

        info!(
            "OAuth2 login configured for provider {} with {} admin(s)",
            settings.provider.kind,
            settings.admins.len()
        );

        Ok(Self::new(
            settings,
            cache,
            Arc::new(OAuth2Exchanger),
            Arc::new(ForgeIdentityResolver::new(http)),
            sessions,
        ))
    }

    pub fn provider_config(&self, origin: &RequestOrigin) -> ProviderConfig {
        ProviderConfig::build(&self.settings.provider, origin)
    }

    /// Issue a CSRF state and build the provider authorization URL.
    pub async fn begin(&self, origin: &RequestOrigin) -> Result<LoginRedirect, Error> {
        let config = self.provider_config(origin);
        let issued = self.state_guard.issue().await?;
        let authorize_url = config.authorization_url(&issued.state)?;

        debug!("Redirecting to {} for OAuth2 login", config.kind);

        Ok(LoginRedirect {
            authorize_url,
            state_key: issued.state_key,
        })
    }

    /// Finish a login from the provider callback, returning the persisted session.
    pub async fn complete(
        &self,
        origin: &RequestOrigin,
        callback: Callback<'_>,
    ) -> Result<Session, Error> {
        let config = self.provider_config(origin);

        self.state_guard
            .verify(callback.state_key, callback.state)
            .await
            .map_err(|e| {
                warn!("Rejected OAuth2 callback: {}", e);
                Error::login(LoginErrorKind::StateInvalid, e)
            })?;

        let access_token = self
            .exchanger
            .exchange(&config, callback.code)
            .await
            .map_err(|e| Error::login(LoginErrorKind::ExchangeFailed, e))?;

        let identity = self
            .resolver
            .resolve(&config, &access_token)
            .await
            .map_err(|e| Error::login(LoginErrorKind::IdentityFetchFailed, e))?;

        if identity.login.is_empty() {
            warn!("{} returned a user without a login", config.kind);
            return Err(Error::login(
                LoginErrorKind::IdentityFetchFailed,
                "provider returned an empty login",
            ));
        }

        if !self.settings.admins.authorize(&identity) {
            warn!("Login by non-administrator {} refused", identity.login);
            return Err(Error::login(
                LoginErrorKind::NotAdministrator,
                format!("{} is not an administrator", identity.login),
            ));
        }

        let session = Session::issue(&identity)
            .map_err(|e| Error::login(LoginErrorKind::TokenGenerationFailed, e))?;

        self.sessions.save(&session).await.map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Storage),
        })?;

        info!(
            "Administrator {} logged in via {}, session valid until {}",
            session.login, config.kind, session.expires_at
        );

        Ok(session)
    }
}
