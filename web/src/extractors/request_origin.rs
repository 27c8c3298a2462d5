use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{
        header::{HOST, REFERER},
        request::Parts,
    },
};
use domain::auth::RequestOrigin;

/// Host and Referer of the inbound request, used to build the OAuth2 redirect URL.
pub(crate) struct Origin(pub RequestOrigin);

#[async_trait]
impl<S> FromRequestParts<S> for Origin
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        // HTTP/2 requests carry the host in the URI authority instead of a Host header.
        let host = header(HOST)
            .or_else(|| parts.uri.authority().map(|a| a.to_string()))
            .unwrap_or_default();

        Ok(Origin(RequestOrigin::new(host, header(REFERER))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> RequestOrigin {
        let (mut parts, _) = request.into_parts();
        let Origin(origin) = Origin::from_request_parts(&mut parts, &()).await.unwrap();
        origin
    }

    #[tokio::test]
    async fn test_reads_host_and_referer() {
        let origin = extract(
            Request::builder()
                .uri("/oauth2/login")
                .header(HOST, "dash.example.com:8008")
                .header(REFERER, "https://dash.example.com:8008/admin")
                .body(())
                .unwrap(),
        )
        .await;

        assert_eq!(
            origin.redirect_url(),
            "https://dash.example.com:8008/oauth2/callback"
        );
    }

    #[tokio::test]
    async fn test_without_referer_uses_http() {
        let origin = extract(
            Request::builder()
                .uri("/oauth2/login")
                .header(HOST, "dash.example.com")
                .body(())
                .unwrap(),
        )
        .await;

        assert_eq!(origin.redirect_url(), "http://dash.example.com/oauth2/callback");
    }

    #[tokio::test]
    async fn test_falls_back_to_uri_authority() {
        let origin = extract(
            Request::builder()
                .uri("http://dash.example.com/oauth2/login")
                .body(())
                .unwrap(),
        )
        .await;

        assert_eq!(origin.redirect_url(), "http://dash.example.com/oauth2/callback");
    }
}
