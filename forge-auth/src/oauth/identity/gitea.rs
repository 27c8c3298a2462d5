//! Gitea user API for self-hosted forges.

use reqwest::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use super::{fetch_json, non_empty, Identity};
use crate::error::Error;
use crate::oauth::ProviderConfig;

#[derive(Debug, Deserialize)]
struct GiteaUser {
    #[serde(default)]
    login: Option<String>,
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
}

/// `GET {endpoint}/api/v1/user`.
///
/// Gitea expects the `token` authorization scheme rather than `Bearer`.
pub(super) async fn my_user_info(
    http: &reqwest::Client,
    config: &ProviderConfig,
    access_token: &SecretString,
) -> Result<Identity, Error> {
    let url = Url::parse(&config.api_url)?.join("api/v1/user")?;
    let request = http.get(url).header(
        AUTHORIZATION,
        format!("token {}", access_token.expose_secret()),
    );

    let user: GiteaUser = fetch_json(request).await?;

    Ok(Identity {
        login: user.login.unwrap_or_default(),
        id: user.id.map(|id| id.to_string()),
        name: non_empty(user.full_name),
        email: non_empty(user.email),
        avatar_url: non_empty(user.avatar_url),
        provider: config.kind,
    })
}
