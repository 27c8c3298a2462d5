//! Identity resolution: "who does this access token belong to?"
//!
//! One strategy per forge family, selected by [`ProviderKind`] in
//! [`ForgeIdentityResolver::resolve`].

mod gitea;
mod github;
mod gitlab;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::RequestBuilder;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{ProviderConfig, ProviderKind};
use crate::error::Error;

pub use github::GitHubApiClient;

/// Normalized user profile returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique login handle. Empty means the provider gave us nothing usable.
    pub login: String,
    /// Provider-side user id.
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub provider: ProviderKind,
}

impl Identity {
    /// Identity carrying only a login handle.
    pub fn with_login(provider: ProviderKind, login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            id: None,
            name: None,
            email: None,
            avatar_url: None,
            provider,
        }
    }
}

/// Fetches the authenticated user's profile for an access token.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(
        &self,
        config: &ProviderConfig,
        access_token: &SecretString,
    ) -> Result<Identity, Error>;
}

/// [`IdentityResolver`] talking to the real forge APIs.
#[derive(Debug, Clone)]
pub struct ForgeIdentityResolver {
    http: reqwest::Client,
}

impl ForgeIdentityResolver {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl IdentityResolver for ForgeIdentityResolver {
    async fn resolve(
        &self,
        config: &ProviderConfig,
        access_token: &SecretString,
    ) -> Result<Identity, Error> {
        let result = match config.kind {
            ProviderKind::GitLab | ProviderKind::Jihulab => {
                gitlab::current_user(&self.http, config, access_token).await
            }
            ProviderKind::Gitea => gitea::my_user_info(&self.http, config, access_token).await,
            ProviderKind::GitHub | ProviderKind::Gitee => {
                match GitHubApiClient::for_provider(config, self.http.clone(), access_token.clone())
                {
                    Ok(client) => client.authenticated_user().await,
                    Err(e) => Err(e),
                }
            }
        };

        result.inspect_err(|e| warn!("Failed to get {} user info: {}", config.kind, e))
    }
}

/// Send `request` and decode a successful JSON body.
async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, Error> {
    let user = request
        .header(ACCEPT, "application/json")
        .send()
        .await?
        .error_for_status()?
        .json::<T>()
        .await?;
    Ok(user)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
