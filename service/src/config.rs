use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::str::FromStr;

/// Default cookie name; the CSRF state cookie appends `-sk`.
pub const DEFAULT_COOKIE_NAME: &str = "forge-dashboard";

const MAX_STATE_TTL_SECONDS: i64 = 24 * 60 * 60;
// Browsers cap cookie lifetimes at 400 days.
const MAX_COOKIE_MAX_AGE_SECONDS: i64 = 400 * 24 * 60 * 60;

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// The identity provider to log in with: github, gitee, gitlab, jihulab or gitea.
    /// Unrecognised values fall back to github.
    #[arg(long, env, default_value = "github")]
    pub oauth2_type: String,

    /// OAuth application client ID registered with the provider.
    #[arg(long, env)]
    oauth2_client_id: Option<String>,

    /// OAuth application client secret registered with the provider.
    #[arg(long, env, hide_env_values = true)]
    oauth2_client_secret: Option<String>,

    /// Base URL of a self-hosted Gitea instance, e.g. https://git.example.com
    #[arg(long, env)]
    oauth2_endpoint: Option<String>,

    /// Comma separated list of provider logins allowed to administer the dashboard.
    #[arg(long, env, default_value = "")]
    pub oauth2_admin: String,

    /// Seconds a pending login (CSRF state) stays valid, at most one day.
    #[arg(
        long,
        env,
        default_value_t = 300,
        value_parser = clap::value_parser!(i64).range(1..=MAX_STATE_TTL_SECONDS),
    )]
    pub oauth2_state_ttl_seconds: i64,

    /// Timeout in seconds for calls to the provider's user API.
    #[arg(long, env, default_value_t = 30)]
    pub oauth2_http_timeout_seconds: u64,

    /// Name of the session cookie.
    #[arg(long, env, default_value = DEFAULT_COOKIE_NAME)]
    pub cookie_name: String,

    /// Max-Age in seconds of the session cookie (default: 24 hours = 86400 seconds, at most 400 days)
    #[arg(
        long,
        env,
        default_value_t = 86400,
        value_parser = clap::value_parser!(i64).range(1..=MAX_COOKIE_MAX_AGE_SECONDS),
    )]
    pub session_cookie_max_age_seconds: i64,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 8008)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn oauth2_client_id(&self) -> Option<String> {
        self.oauth2_client_id.clone()
    }

    pub fn oauth2_client_secret(&self) -> Option<String> {
        self.oauth2_client_secret.clone()
    }

    /// Returns the self-hosted forge endpoint, if configured.
    pub fn oauth2_endpoint(&self) -> Option<String> {
        self.oauth2_endpoint.clone()
    }

    /// Name of the short-lived cookie carrying the CSRF state key.
    pub fn state_cookie_name(&self) -> String {
        format!("{}-sk", self.cookie_name)
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn is_production(&self) -> bool {
        self.runtime_env() == RustEnv::Production
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_from(["forge_login"]);

        assert_eq!(config.oauth2_state_ttl_seconds, 300);
        assert_eq!(config.session_cookie_max_age_seconds, 86400);
        assert_eq!(config.port, 8008);
    }

    #[test]
    fn test_state_cookie_name_appends_suffix() {
        let config = Config::parse_from(["forge_login", "--cookie-name", "nz"]);
        assert_eq!(config.state_cookie_name(), "nz-sk");
    }

    #[test]
    fn test_oauth2_flags() {
        let config = Config::parse_from([
            "forge_login",
            "--oauth2-type",
            "gitea",
            "--oauth2-client-id",
            "id",
            "--oauth2-client-secret",
            "secret",
            "--oauth2-endpoint",
            "https://git.example.com",
            "--oauth2-admin",
            "alice,bob",
        ]);

        assert_eq!(config.oauth2_type, "gitea");
        assert_eq!(config.oauth2_client_id().as_deref(), Some("id"));
        assert_eq!(config.oauth2_client_secret().as_deref(), Some("secret"));
        assert_eq!(
            config.oauth2_endpoint().as_deref(),
            Some("https://git.example.com")
        );
        assert_eq!(config.oauth2_admin, "alice,bob");
    }

    #[test]
    fn test_lifetimes_are_bounded() {
        for args in [
            ["forge_login", "--oauth2-state-ttl-seconds", "0"],
            ["forge_login", "--oauth2-state-ttl-seconds", "9223372036854775808"],
            ["forge_login", "--oauth2-state-ttl-seconds", "86401"],
            ["forge_login", "--session-cookie-max-age-seconds", "-1"],
            ["forge_login", "--session-cookie-max-age-seconds", "18446744073709551615"],
        ] {
            assert!(Config::try_parse_from(args).is_err(), "{args:?}");
        }

        let config = Config::try_parse_from([
            "forge_login",
            "--oauth2-state-ttl-seconds",
            "86400",
            "--session-cookie-max-age-seconds",
            "34560000",
        ])
        .unwrap();
        assert_eq!(config.oauth2_state_ttl_seconds, 86400);
        assert_eq!(config.session_cookie_max_age_seconds, 34_560_000);
    }

    #[test]
    fn test_production_runtime_env() {
        let config = Config::parse_from(["forge_login", "--runtime-env", "PRODUCTION"]);
        assert!(config.is_production());
    }

    #[test]
    fn test_rust_env_parse() {
        assert_eq!("Staging".parse::<RustEnv>(), Ok(RustEnv::Staging));
        assert_eq!("qa".parse::<RustEnv>(), Err(RustEnvParseError));
    }
}
