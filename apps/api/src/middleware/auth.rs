//! # 認証ミドルウェア
//!
//! `Authorization: Bearer <token>` ヘッダーのトークンを ID プロバイダで検証し、
//! 検証済みの [`VerifiedIdentity`] をリクエストの extensions に格納する。
//!
//! ## ステータスの対応
//!
//! | 状況 | レスポンス |
//! |------|-----------|
//! | ヘッダーなし / `Bearer ` 以外のスキーム / 空トークン | 403 |
//! | ID プロバイダがトークンを拒否 | 401 |
//! | ID プロバイダに到達できない | 500 |
//!
//! ## 使い方
//!
//! ```rust,ignore
//! use axum::middleware::from_fn_with_state;
//!
//! Router::new()
//!     .route("/protected", get(protected))
//!     .route_layer(from_fn_with_state(auth_state, require_auth))
//! ```

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use roomiez_domain::identity::VerifiedIdentity;
use roomiez_infra::{IdentityError, TokenVerifier};

use crate::error::ApiError;

/// 認証ミドルウェアの状態
#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn TokenVerifier>,
}

/// 認証ミドルウェア
pub async fn require_auth(
    State(state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        return ApiError::Forbidden("Unauthorized".to_string()).into_response();
    };

    match state.verifier.verify(&token).await {
        Ok(identity) => {
            tracing::debug!(uid = %identity.uid, "トークンを検証しました");
            request.extensions_mut().insert::<VerifiedIdentity>(identity);
            next.run(request).await
        }
        Err(IdentityError::InvalidToken) => {
            ApiError::Unauthorized("Invalid token".to_string()).into_response()
        }
        Err(e) => ApiError::Identity(e).into_response(),
    }
}

/// `Authorization` ヘッダーからベアラートークンを取り出す
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension,
        Router,
        http::{Request, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
    };
    use roomiez_domain::user::{Email, Uid};
    use roomiez_infra::mock::StubTokenVerifier;
    use rstest::rstest;
    use tower::ServiceExt;

    use super::*;

    async fn whoami(Extension(identity): Extension<VerifiedIdentity>) -> String {
        identity.email.to_string()
    }

    fn app() -> Router {
        let verifier = StubTokenVerifier::new().with_identity(
            "good-token",
            VerifiedIdentity {
                uid:   Uid::new("uid-1").unwrap(),
                email: Email::new("alex@example.com").unwrap(),
                name:  None,
            },
        );
        let auth_state = AuthState {
            verifier: Arc::new(verifier),
        };

        Router::new()
            .route("/whoami", get(whoami))
            .route_layer(from_fn_with_state(auth_state, require_auth))
    }

    fn request(authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_有効なトークンでハンドラにアイデンティティが渡る() {
        let response = app()
            .oneshot(request(Some("Bearer good-token")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"alex@example.com");
    }

    #[rstest]
    #[case::ヘッダーなし(None)]
    #[case::bearer以外のスキーム(Some("Basic dXNlcjpwYXNz"))]
    #[case::空トークン(Some("Bearer "))]
    #[case::小文字のスキーム(Some("bearer good-token"))]
    #[tokio::test]
    async fn test_認証ヘッダーが不正なら403(#[case] authorization: Option<&str>) {
        let response = app().oneshot(request(authorization)).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_無効なトークンは401() {
        let response = app()
            .oneshot(request(Some("Bearer expired-token")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_idプロバイダ障害は500() {
        let response = app()
            .oneshot(request(Some(&format!(
                "Bearer {}",
                StubTokenVerifier::UNAVAILABLE_TOKEN
            ))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
