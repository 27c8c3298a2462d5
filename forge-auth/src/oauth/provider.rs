//! Provider registry: endpoint metadata per supported forge.

use std::fmt;
use std::str::FromStr;

use oauth2::basic::BasicClient;
use oauth2::{AuthType, AuthUrl, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope, TokenUrl};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Path the provider redirects back to after user consent.
pub const CALLBACK_PATH: &str = "/oauth2/callback";

/// Supported identity providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    GitHub,
    Gitee,
    GitLab,
    Jihulab,
    Gitea,
}

impl ProviderKind {
    /// Get the provider identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::GitHub => "github",
            ProviderKind::Gitee => "gitee",
            ProviderKind::GitLab => "gitlab",
            ProviderKind::Jihulab => "jihulab",
            ProviderKind::Gitea => "gitea",
        }
    }

    /// Parse a configured identifier. Anything unrecognised selects GitHub.
    pub fn from_config(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "github" => Ok(ProviderKind::GitHub),
            "gitee" => Ok(ProviderKind::Gitee),
            "gitlab" => Ok(ProviderKind::GitLab),
            "jihulab" => Ok(ProviderKind::Jihulab),
            "gitea" => Ok(ProviderKind::Gitea),
            other => Err(crate::error::config_error(&format!(
                "unknown oauth2 provider type: {other}"
            ))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static provider settings taken from the application configuration.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub client_id: String,
    pub client_secret: SecretString,
    /// Base URL of a self-hosted forge. Only consulted for [`ProviderKind::Gitea`].
    pub endpoint: Option<String>,
}

/// The parts of the inbound request the redirect URL is derived from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOrigin {
    pub host: String,
    pub referer: Option<String>,
}

impl RequestOrigin {
    pub fn new(host: impl Into<String>, referer: Option<String>) -> Self {
        Self {
            host: host.into(),
            referer,
        }
    }

    /// `https` when the Referer was an https URL, otherwise `http`.
    ///
    /// The scheme is taken from client-supplied data since TLS is usually
    /// terminated by a reverse proxy in front of the dashboard.
    pub fn scheme(&self) -> &'static str {
        match self.referer.as_deref() {
            Some(referer) if referer.starts_with("https://") => "https",
            _ => "http",
        }
    }

    /// `{scheme}://{host}/oauth2/callback`
    pub fn redirect_url(&self) -> String {
        format!("{}://{}{}", self.scheme(), self.host, CALLBACK_PATH)
    }
}

/// Fully resolved OAuth configuration for a single login request.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub client_id: String,
    pub client_secret: SecretString,
    pub auth_url: String,
    pub token_url: String,
    pub scopes: Vec<String>,
    pub redirect_url: String,
    /// Base URL of the forge's REST API, always ending in `/`.
    pub api_url: String,
}

impl ProviderConfig {
    /// Build the configuration for `settings`, deriving the redirect URL from `origin`.
    pub fn build(settings: &ProviderSettings, origin: &RequestOrigin) -> Self {
        let endpoint = settings
            .endpoint
            .as_deref()
            .unwrap_or_default()
            .trim_end_matches('/');

        let (auth_url, token_url, scopes, api_url) = match settings.kind {
            ProviderKind::Gitee => (
                "https://gitee.com/oauth/authorize".to_string(),
                "https://gitee.com/oauth/token".to_string(),
                vec![],
                "https://gitee.com/api/v5/".to_string(),
            ),
            ProviderKind::GitLab => (
                "https://gitlab.com/oauth/authorize".to_string(),
                "https://gitlab.com/oauth/token".to_string(),
                gitlab_scopes(),
                "https://gitlab.com/api/v4/".to_string(),
            ),
            ProviderKind::Jihulab => (
                "https://jihulab.com/oauth/authorize".to_string(),
                "https://jihulab.com/oauth/token".to_string(),
                gitlab_scopes(),
                "https://jihulab.com/api/v4/".to_string(),
            ),
            ProviderKind::Gitea => (
                format!("{endpoint}/login/oauth/authorize"),
                format!("{endpoint}/login/oauth/access_token"),
                vec![],
                format!("{endpoint}/"),
            ),
            ProviderKind::GitHub => (
                "https://github.com/login/oauth/authorize".to_string(),
                "https://github.com/login/oauth/access_token".to_string(),
                vec![],
                "https://api.github.com/".to_string(),
            ),
        };

        Self {
            kind: settings.kind,
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            auth_url,
            token_url,
            scopes,
            redirect_url: origin.redirect_url(),
            api_url,
        }
    }

    /// Authorization URL the user agent is sent to, carrying `state`.
    pub fn authorization_url(&self, state: &str) -> Result<String, Error> {
        let client = self.oauth2_client()?;
        let (url, _) = client
            .authorize_url(|| CsrfToken::new(state.to_string()))
            .add_scopes(self.scopes.iter().cloned().map(Scope::new))
            .add_extra_param("access_type", "online")
            .url();

        Ok(url.to_string())
    }

    pub(crate) fn oauth2_client(&self) -> Result<BasicClient, Error> {
        let client = BasicClient::new(
            ClientId::new(self.client_id.clone()),
            Some(ClientSecret::new(self.client_secret.expose_secret().clone())),
            AuthUrl::new(self.auth_url.clone())?,
            Some(TokenUrl::new(self.token_url.clone())?),
        )
        .set_auth_type(AuthType::RequestBody)
        .set_redirect_uri(RedirectUrl::new(self.redirect_url.clone())?);

        Ok(client)
    }
}

fn gitlab_scopes() -> Vec<String> {
    vec!["read_user".to_string(), "read_api".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    const ALL_KINDS: [ProviderKind; 5] = [
        ProviderKind::GitHub,
        ProviderKind::Gitee,
        ProviderKind::GitLab,
        ProviderKind::Jihulab,
        ProviderKind::Gitea,
    ];

    fn settings(kind: ProviderKind) -> ProviderSettings {
        ProviderSettings {
            kind,
            client_id: "client-id".to_string(),
            client_secret: SecretString::new("client-secret".to_string()),
            endpoint: Some("https://git.example.com/".to_string()),
        }
    }

    #[test]
    fn test_redirect_url_https_referer() {
        let origin = RequestOrigin::new("dash.example.com", Some("https://x".to_string()));
        for kind in ALL_KINDS {
            let config = ProviderConfig::build(&settings(kind), &origin);
            assert_eq!(
                config.redirect_url,
                "https://dash.example.com/oauth2/callback",
                "{kind}"
            );
        }
    }

    #[test]
    fn test_redirect_url_without_referer() {
        let origin = RequestOrigin::new("dash.example.com:8008", None);
        for kind in ALL_KINDS {
            let config = ProviderConfig::build(&settings(kind), &origin);
            assert_eq!(
                config.redirect_url,
                "http://dash.example.com:8008/oauth2/callback",
                "{kind}"
            );
        }
    }

    #[test]
    fn test_redirect_url_http_referer() {
        let origin = RequestOrigin::new("h", Some("http://h/dashboard".to_string()));
        assert_eq!(origin.redirect_url(), "http://h/oauth2/callback");
    }

    #[test]
    fn test_gitlab_family_scopes() {
        let origin = RequestOrigin::default();
        for kind in [ProviderKind::GitLab, ProviderKind::Jihulab] {
            let config = ProviderConfig::build(&settings(kind), &origin);
            assert_eq!(config.scopes, vec!["read_user", "read_api"]);
        }
        for kind in [ProviderKind::GitHub, ProviderKind::Gitee, ProviderKind::Gitea] {
            let config = ProviderConfig::build(&settings(kind), &origin);
            assert!(config.scopes.is_empty());
        }
    }

    #[test]
    fn test_gitea_urls_use_endpoint() {
        let config = ProviderConfig::build(&settings(ProviderKind::Gitea), &RequestOrigin::default());
        assert_eq!(config.auth_url, "https://git.example.com/login/oauth/authorize");
        assert_eq!(
            config.token_url,
            "https://git.example.com/login/oauth/access_token"
        );
        assert_eq!(config.api_url, "https://git.example.com/");
    }

    #[test]
    fn test_hardcoded_endpoints() {
        let origin = RequestOrigin::default();
        let github = ProviderConfig::build(&settings(ProviderKind::GitHub), &origin);
        assert_eq!(github.auth_url, "https://github.com/login/oauth/authorize");
        assert_eq!(github.token_url, "https://github.com/login/oauth/access_token");

        let gitee = ProviderConfig::build(&settings(ProviderKind::Gitee), &origin);
        assert_eq!(gitee.auth_url, "https://gitee.com/oauth/authorize");
        assert_eq!(gitee.token_url, "https://gitee.com/oauth/token");

        let jihulab = ProviderConfig::build(&settings(ProviderKind::Jihulab), &origin);
        assert_eq!(jihulab.token_url, "https://jihulab.com/oauth/token");
        assert_eq!(jihulab.api_url, "https://jihulab.com/api/v4/");
    }

    #[test]
    fn test_unknown_kind_falls_back_to_github() {
        assert_eq!(ProviderKind::from_config("bitbucket"), ProviderKind::GitHub);
        assert_eq!(ProviderKind::from_config(""), ProviderKind::GitHub);
        assert_eq!(ProviderKind::from_config("GitLab"), ProviderKind::GitLab);
        assert_eq!(ProviderKind::from_config(" gitee "), ProviderKind::Gitee);
    }

    #[test]
    fn test_authorization_url_parameters() {
        let origin = RequestOrigin::new("dash.example.com", Some("https://dash.example.com/".into()));
        let config = ProviderConfig::build(&settings(ProviderKind::GitLab), &origin);
        let url = Url::parse(&config.authorization_url("abc123").unwrap()).unwrap();

        assert_eq!(url.host_str(), Some("gitlab.com"));
        assert_eq!(url.path(), "/oauth/authorize");

        let query = |name: &str| {
            url.query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
        };
        assert_eq!(query("response_type").as_deref(), Some("code"));
        assert_eq!(query("client_id").as_deref(), Some("client-id"));
        assert_eq!(query("state").as_deref(), Some("abc123"));
        assert_eq!(query("access_type").as_deref(), Some("online"));
        assert_eq!(query("scope").as_deref(), Some("read_user read_api"));
        assert_eq!(
            query("redirect_uri").as_deref(),
            Some("https://dash.example.com/oauth2/callback")
        );
    }

    #[test]
    fn test_authorization_url_rejects_bad_endpoint() {
        let mut gitea = settings(ProviderKind::Gitea);
        gitea.endpoint = None;
        let config = ProviderConfig::build(&gitea, &RequestOrigin::default());
        assert!(config.authorization_url("state").is_err());
    }
}
