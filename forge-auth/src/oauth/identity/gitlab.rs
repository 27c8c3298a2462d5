//! GitLab user API (gitlab.com and Jihulab).

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use super::{fetch_json, non_empty, Identity};
use crate::error::Error;
use crate::oauth::ProviderConfig;

#[derive(Debug, Deserialize)]
struct GitLabUser {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
}

/// `GET {api}/user`, mapping `username` to the login handle.
pub(super) async fn current_user(
    http: &reqwest::Client,
    config: &ProviderConfig,
    access_token: &SecretString,
) -> Result<Identity, Error> {
    let url = Url::parse(&config.api_url)?.join("user")?;
    let request = http.get(url).bearer_auth(access_token.expose_secret());

    let user: GitLabUser = fetch_json(request).await?;

    Ok(Identity {
        login: user.username.unwrap_or_default(),
        id: user.id.map(|id| id.to_string()),
        name: non_empty(user.name),
        email: non_empty(user.email),
        avatar_url: non_empty(user.avatar_url),
        provider: config.kind,
    })
}
