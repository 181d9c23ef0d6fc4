//! # ヘルスチェックハンドラ
//!
//! ロードバランサーやコンテナオーケストレーターからの死活監視用。
//! DynamoDB などの外部サービスへの接続は確認せず、プロセス自体の稼働のみを返す。
//!
//! ```text
//! $ curl http://localhost:8000/health
//! {"status":"healthy","version":"0.1.0"}
//! ```

use axum::Json;
use roomiez_shared::HealthResponse;

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status:  "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
