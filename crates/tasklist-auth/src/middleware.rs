//! Identity-binding middleware for Axum

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::jwt::TokenService;

/// Identity bound to a request by [`identity_middleware`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
}

/// Extract the bearer token from an authorization header value
pub fn extract_bearer_token(header: &str) -> Result<&str, AuthError> {
    header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)
}

fn authenticate(tokens: &TokenService, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = extract_bearer_token(header)?;
    let id = tokens.verify(token)?;
    Ok(AuthUser { id })
}

/// Authentication middleware
///
/// Verifies the bearer token and adds the [`AuthUser`] to request
/// extensions. Requests without a valid token are answered with 401 here
/// and never reach the handler.
pub async fn identity_middleware(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = authenticate(&tokens, request.headers()).inspect_err(|e| {
        warn!(
            reason = e.reason(),
            "Rejected request to {}: {}",
            request.uri().path(),
            e
        );
        metrics::counter!("tasklist_token_rejections_total", "reason" => e.reason()).increment(1);
    })?;

    debug!("Authenticated user: {}", user.id);

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(AuthError::MissingAuthHeader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::StatusCode, middleware, routing::get};
    use chrono::Duration;
    use tower::ServiceExt;

    fn app(tokens: Arc<TokenService>) -> Router {
        Router::new()
            .route("/whoami", get(|user: AuthUser| async move { user.id.to_string() }))
            .layer(middleware::from_fn_with_state(tokens, identity_middleware))
    }

    fn request(auth: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/whoami");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert!(matches!(
            extract_bearer_token("Basic dXNlcjpwYXNz"),
            Err(AuthError::InvalidAuthHeader)
        ));
        assert!(matches!(
            extract_bearer_token("abc.def.ghi"),
            Err(AuthError::InvalidAuthHeader)
        ));
    }

    #[test]
    fn test_authenticate_reasons() {
        let tokens = TokenService::new("secret", Duration::hours(1));
        let mut headers = HeaderMap::new();

        assert!(matches!(
            authenticate(&tokens, &headers),
            Err(AuthError::MissingAuthHeader)
        ));

        headers.insert(AUTHORIZATION, "Token abc".parse().unwrap());
        assert!(matches!(
            authenticate(&tokens, &headers),
            Err(AuthError::InvalidAuthHeader)
        ));

        headers.insert(AUTHORIZATION, "Bearer invalid-token".parse().unwrap());
        assert!(matches!(
            authenticate(&tokens, &headers),
            Err(AuthError::MalformedToken)
        ));

        let token = tokens.issue(9).unwrap();
        headers.insert(AUTHORIZATION, format!("Bearer {}", token).parse().unwrap());
        assert_eq!(authenticate(&tokens, &headers).unwrap(), AuthUser { id: 9 });
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let tokens = Arc::new(TokenService::new("secret", Duration::hours(1)));
        let token = tokens.issue(42).unwrap();

        let response = app(tokens)
            .oneshot(request(Some(&format!("Bearer {}", token))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"42");
    }

    #[tokio::test]
    async fn test_rejections_short_circuit() {
        let tokens = Arc::new(TokenService::new("secret", Duration::hours(1)));
        let foreign = TokenService::new("other", Duration::hours(1)).issue(42).unwrap();
        let foreign = format!("Bearer {}", foreign);

        let cases = [
            None,
            Some("Bearer invalid-token"),
            Some("Basic abc"),
            Some(foreign.as_str()),
        ];

        for auth in cases {
            let response = app(tokens.clone()).oneshot(request(auth)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

            let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json["error"], "Unauthorized");
        }
    }

    #[tokio::test]
    async fn test_extractor_without_middleware_rejects() {
        let app = Router::new().route(
            "/whoami",
            get(|user: AuthUser| async move { user.id.to_string() }),
        );

        let response = app.oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
