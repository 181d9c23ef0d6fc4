//! # ルート・疎通確認ハンドラ
//!
//! - `GET /` - サービス稼働メッセージ（認証不要）
//! - `GET /protected` - 認証の疎通確認

use axum::{Extension, Json};
use roomiez_domain::identity::VerifiedIdentity;
use roomiez_shared::ApiResponse;
use serde::Serialize;

/// サービス情報 DTO
#[derive(Debug, Serialize)]
pub struct ServiceInfoDto {
    pub service: &'static str,
    pub version: &'static str,
}

/// 呼び出し元 DTO
#[derive(Debug, Serialize)]
pub struct CallerDto {
    pub uid:   String,
    pub email: String,
    pub name:  Option<String>,
}

/// GET /
pub async fn root() -> Json<ApiResponse<ServiceInfoDto>> {
    Json(ApiResponse::new(
        "Roomiez Backend Running",
        ServiceInfoDto {
            service: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        },
    ))
}

/// GET /protected
///
/// 検証済みの呼び出し元をそのまま返す。
pub async fn protected(
    Extension(identity): Extension<VerifiedIdentity>,
) -> Json<ApiResponse<CallerDto>> {
    Json(ApiResponse::new(
        format!("Hello, {}! This is a protected route.", identity.email),
        CallerDto {
            uid:   identity.uid.as_str().to_string(),
            email: identity.email.into_string(),
            name:  identity.name,
        },
    ))
}
