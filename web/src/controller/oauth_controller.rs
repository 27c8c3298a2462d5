//! Controller for the OAuth2 administrator login.
//!
//! Both endpoints are reached through browser redirects, so failures render an
//! HTML page instead of a JSON body.

use crate::extractors::request_origin::Origin;
use crate::{AppState, Error};

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use domain::Callback;
use log::*;
use secrecy::ExposeSecret;
use serde::Deserialize;
use service::config::Config;

/// Query parameters of the provider's redirect back to us. Absent values are empty.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub state: String,
}

fn http_only_cookie(
    config: &Config,
    name: String,
    value: String,
    max_age_seconds: i64,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(config.is_production())
        .max_age(time::Duration::seconds(max_age_seconds))
        .build()
}

/// GET /oauth2/login
///
/// Starts an administrator login by redirecting to the configured provider.
#[utoipa::path(
    get,
    path = "/oauth2/login",
    responses(
        (status = 307, description = "Redirect to the provider's authorization page; sets the state cookie"),
        (status = 400, description = "Login could not be started"),
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Origin(origin): Origin,
    jar: CookieJar,
) -> Result<impl IntoResponse, Error> {
    let redirect = app_state.login.begin(&origin).await?;

    let config = &app_state.config;
    let state_cookie = http_only_cookie(
        config,
        config.state_cookie_name(),
        redirect.state_key,
        config.oauth2_state_ttl_seconds,
    );

    Ok((
        jar.add(state_cookie),
        Redirect::temporary(&redirect.authorize_url),
    ))
}

/// GET /oauth2/callback
///
/// Completes the login and sets the session cookie.
#[utoipa::path(
    get,
    path = "/oauth2/callback",
    params(
        ("code" = Option<String>, Query, description = "Authorization code from the provider"),
        ("state" = Option<String>, Query, description = "Anti-forgery state issued by /oauth2/login"),
    ),
    responses(
        (status = 307, description = "Login succeeded; sets the session cookie and redirects to /"),
        (status = 400, description = "Login failed"),
    )
)]
pub async fn callback(
    State(app_state): State<AppState>,
    Origin(origin): Origin,
    Query(params): Query<CallbackParams>,
    jar: CookieJar,
) -> Result<impl IntoResponse, Error> {
    let config = &app_state.config;
    let state_key = jar
        .get(&config.state_cookie_name())
        .map(|cookie| cookie.value().to_string());

    let session = app_state
        .login
        .complete(
            &origin,
            Callback {
                state_key: state_key.as_deref(),
                state: &params.state,
                code: &params.code,
            },
        )
        .await?;

    debug!("Setting session cookie for {}", session.login);

    let session_cookie = http_only_cookie(
        config,
        config.cookie_name.clone(),
        session.token.expose_secret().to_string(),
        config.session_cookie_max_age_seconds,
    );

    Ok((jar.add(session_cookie), Redirect::temporary("/")))
}
