//! GitHub-compatible user API (GitHub and Gitee).

use reqwest::header::USER_AGENT;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use super::{fetch_json, non_empty, Identity};
use crate::error::Error;
use crate::oauth::{ProviderConfig, ProviderKind};

const GITHUB_UPLOAD_URL: &str = "https://uploads.github.com/";

/// Minimal GitHub REST client authenticated with an OAuth access token.
///
/// Gitee speaks the same API under a different host, so the client is pointed
/// at Gitee by swapping its base and upload URLs.
#[derive(Debug, Clone)]
pub struct GitHubApiClient {
    http: reqwest::Client,
    provider: ProviderKind,
    access_token: SecretString,
    pub base_url: Url,
    pub upload_url: Url,
}

impl GitHubApiClient {
    /// Build a client for `config`, applying the Gitee host override when needed.
    pub fn for_provider(
        config: &ProviderConfig,
        http: reqwest::Client,
        access_token: SecretString,
    ) -> Result<Self, Error> {
        let base_url = Url::parse(&config.api_url)?;
        let upload_url = match config.kind {
            ProviderKind::Gitee => base_url.join("uploads/")?,
            _ => Url::parse(GITHUB_UPLOAD_URL)?,
        };

        Ok(Self {
            http,
            provider: config.kind,
            access_token,
            base_url,
            upload_url,
        })
    }

    /// `GET /user` for the token's owner.
    pub async fn authenticated_user(&self) -> Result<Identity, Error> {
        let url = self.base_url.join("user")?;
        let request = self
            .http
            .get(url)
            .bearer_auth(self.access_token.expose_secret())
            .header(
                USER_AGENT,
                concat!("forge-auth/", env!("CARGO_PKG_VERSION")),
            );

        let user: GitHubUser = fetch_json(request).await?;

        Ok(Identity {
            login: user.login.unwrap_or_default(),
            id: user.id.map(|id| id.to_string()),
            name: non_empty(user.name),
            email: non_empty(user.email),
            avatar_url: non_empty(user.avatar_url),
            provider: self.provider,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    #[serde(default)]
    login: Option<String>,
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
}
