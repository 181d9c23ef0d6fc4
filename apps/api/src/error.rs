//! # API エラーハンドリング
//!
//! HTTP API のエラー定義と、axum レスポンスへの変換を行う。
//!
//! ## エラーの階層
//!
//! ```text
//! DomainError / InfraError / NotificationError
//!        ↓ From
//! API エラー (ApiError)
//!        ↓ IntoResponse
//! HTTP レスポンス (StatusCode + RFC 9457 JSON)
//! ```
//!
//! 内部エラー（DynamoDB・ID プロバイダ・SMTP）の詳細はログにのみ出力し、
//! クライアントには固定文言を返す。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use roomiez_domain::{DomainError, notification::NotificationError};
use roomiez_infra::{IdentityError, InfraError};
use roomiez_shared::ErrorResponse;
use thiserror::Error;

/// API 層で発生するエラー
///
/// ハンドラ・ユースケース・ミドルウェアから返されるエラー型。
/// 文字列を持つバリアントの値は、そのまま `detail` としてクライアントに返る。
#[derive(Debug, Error)]
pub enum ApiError {
    /// 入力値の検証失敗（400）
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// 不正な状態遷移（400）
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// トークンが無効（401）
    #[error("認証エラー: {0}")]
    Unauthorized(String),

    /// 認証ヘッダーの欠落、または他のハウスのリソースへの操作（403）
    #[error("権限エラー: {0}")]
    Forbidden(String),

    /// リソースが見つからない（404）
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 既存のリソースと競合（409）
    #[error("競合: {0}")]
    Conflict(String),

    /// 永続化層のエラー（500）
    #[error("インフラエラー: {0}")]
    Infra(#[from] InfraError),

    /// ID プロバイダのエラー（500）
    #[error("ID プロバイダエラー: {0}")]
    Identity(#[from] IdentityError),

    /// メール送信のエラー（500）
    #[error("メール送信エラー: {0}")]
    Notification(#[from] NotificationError),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => ApiError::Validation(msg),
            DomainError::NotFound { entity_type, .. } => {
                ApiError::NotFound(format!("{entity_type} not found"))
            }
            DomainError::Forbidden(msg) => ApiError::Forbidden(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self {
            ApiError::Validation(msg) => ErrorResponse::validation_error(msg),
            ApiError::BadRequest(msg) => ErrorResponse::bad_request(msg),
            ApiError::Unauthorized(msg) => ErrorResponse::unauthorized(msg),
            ApiError::Forbidden(msg) => ErrorResponse::forbidden(msg),
            ApiError::NotFound(msg) => ErrorResponse::not_found(msg),
            ApiError::Conflict(msg) => ErrorResponse::conflict(msg),
            ApiError::Infra(e) => {
                tracing::error!(
                    error.category = "infrastructure",
                    error.kind = "database",
                    "インフラエラー: {}\n{}",
                    e,
                    e.span_trace()
                );
                ErrorResponse::internal_error()
            }
            ApiError::Identity(e) => {
                tracing::error!(
                    error.category = "external_service",
                    error.kind = "identity_provider",
                    "ID プロバイダエラー: {}",
                    e
                );
                ErrorResponse::internal_error()
            }
            ApiError::Notification(e) => {
                tracing::error!(
                    error.category = "external_service",
                    error.kind = "smtp",
                    "メール送信エラー: {}",
                    e
                );
                ErrorResponse::internal_error()
            }
        };

        let status =
            StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    async fn render(error: ApiError) -> (StatusCode, ErrorResponse) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[rstest]
    #[case(ApiError::Validation("House name is required".into()), StatusCode::BAD_REQUEST, "validation-error")]
    #[case(ApiError::BadRequest("User already in the house".into()), StatusCode::BAD_REQUEST, "bad-request")]
    #[case(ApiError::Unauthorized("Invalid token".into()), StatusCode::UNAUTHORIZED, "unauthorized")]
    #[case(ApiError::Forbidden("Unauthorized".into()), StatusCode::FORBIDDEN, "forbidden")]
    #[case(ApiError::NotFound("Invalid join code".into()), StatusCode::NOT_FOUND, "not-found")]
    #[case(ApiError::Conflict("The Shower is already reserved during this time slot".into()), StatusCode::CONFLICT, "conflict")]
    #[tokio::test]
    async fn test_クライアントエラーはdetailをそのまま返す(
        #[case] error: ApiError,
        #[case] expected_status: StatusCode,
        #[case] type_suffix: &str,
    ) {
        let expected_detail = match &error {
            ApiError::Validation(m)
            | ApiError::BadRequest(m)
            | ApiError::Unauthorized(m)
            | ApiError::Forbidden(m)
            | ApiError::NotFound(m)
            | ApiError::Conflict(m) => m.clone(),
            _ => unreachable!(),
        };

        let (status, body) = render(error).await;

        assert_eq!(status, expected_status);
        assert_eq!(body.status, expected_status.as_u16());
        assert_eq!(
            body.error_type,
            format!("https://roomiez.example.com/errors/{type_suffix}")
        );
        assert_eq!(body.detail, expected_detail);
    }

    #[tokio::test]
    async fn test_インフラエラーは詳細を隠して500を返す() {
        let error = ApiError::from(InfraError::dynamo_db("table roomiez_users not found"));

        let (status, body) = render(error).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.detail, "An internal error occurred");
    }

    #[tokio::test]
    async fn test_メール送信エラーは500を返す() {
        let error = ApiError::from(NotificationError::SendFailed("535 auth failed".into()));

        let (status, body) = render(error).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.detail.contains("535"));
    }

    #[test]
    fn test_ドメインのnot_foundはエンティティ種別のみを返す() {
        let error = ApiError::from(DomainError::NotFound {
            entity_type: "Chore",
            id:          "c-1".to_string(),
        });

        assert!(matches!(error, ApiError::NotFound(ref m) if m == "Chore not found"));
    }
}
