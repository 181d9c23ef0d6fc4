//! # ナッジハンドラ
//!
//! `POST /nudge/send` - ルームメイトに匿名の家事リマインダーを送る。

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use roomiez_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, usecase::NudgeUseCaseImpl};

/// ナッジ API の共有状態
pub struct NudgeState {
    pub usecase: NudgeUseCaseImpl,
}

/// ナッジ送信リクエスト
#[derive(Debug, Deserialize)]
pub struct SendNudgeRequest {
    pub recipient_email: String,
}

/// ナッジ送信結果 DTO
#[derive(Debug, Serialize)]
pub struct NudgeSentDto {
    pub recipient_email: String,
}

/// POST /nudge/send
///
/// 送信元アドレスは匿名の候補からランダムに選ばれ、呼び出し元は宛先に伝わらない。
#[tracing::instrument(skip_all)]
pub async fn send_nudge(
    State(state): State<Arc<NudgeState>>,
    Json(req): Json<SendNudgeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let recipient_email = req.recipient_email.trim().to_string();
    state.usecase.send_nudge(recipient_email.clone()).await?;

    let response = ApiResponse::new("Nudge sent successfully", NudgeSentDto { recipient_email });
    Ok((StatusCode::OK, Json(response)))
}
