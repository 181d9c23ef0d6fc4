//! # 家事ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /chores/my-house` - ハウスの家事一覧（新しい順）
//! - `POST /chores/add` - 家事の追加
//! - `PUT /chores/{chore_id}/status` - ステータス更新
//! - `DELETE /chores/delete/{chore_id}` - 家事の削除

use std::sync::Arc;

use axum::{
    Extension,
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use roomiez_domain::{chore::Chore, identity::VerifiedIdentity};
use roomiez_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    usecase::{AddChoreInput, ChoreUseCaseImpl},
};

/// 家事 API の共有状態
pub struct ChoreState {
    pub usecase: ChoreUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// 家事追加リクエスト
#[derive(Debug, Deserialize)]
pub struct AddChoreRequest {
    pub chore_name: String,
    /// 担当者のメールアドレス
    pub user_email: String,
    /// 担当者の表示名
    #[serde(default)]
    pub username:   Option<String>,
}

/// ステータス更新リクエスト
#[derive(Debug, Deserialize)]
pub struct UpdateChoreStatusRequest {
    /// `"Pending"` または `"Completed"`
    pub status: String,
}

/// 家事 DTO
#[derive(Debug, Serialize)]
pub struct ChoreDto {
    pub chore_id:     String,
    pub house_id:     String,
    pub user_email:   String,
    pub chore_name:   String,
    pub username:     Option<String>,
    pub status:       String,
    pub assigned_at:  String,
    pub completed_at: Option<String>,
}

impl From<&Chore> for ChoreDto {
    fn from(chore: &Chore) -> Self {
        Self {
            chore_id:     chore.id().to_string(),
            house_id:     chore.house_id().to_string(),
            user_email:   chore.user_email().as_str().to_string(),
            chore_name:   chore.name().as_str().to_string(),
            username:     chore.username().map(|u| u.as_str().to_string()),
            status:       chore.status().to_string(),
            assigned_at:  chore.assigned_at().to_rfc3339(),
            completed_at: chore.completed_at().map(|t| t.to_rfc3339()),
        }
    }
}

/// 家事削除結果 DTO
#[derive(Debug, Serialize)]
pub struct DeletedChoreDto {
    pub chore_id: String,
}

// --- ハンドラ ---

/// GET /chores/my-house
#[tracing::instrument(skip_all, fields(uid = %identity.uid))]
pub async fn list_house_chores(
    State(state): State<Arc<ChoreState>>,
    Extension(identity): Extension<VerifiedIdentity>,
) -> Result<impl IntoResponse, ApiError> {
    let chores = state.usecase.list_house_chores(&identity).await?;

    let response = ApiResponse::new(
        "House chores retrieved successfully",
        chores.iter().map(ChoreDto::from).collect::<Vec<_>>(),
    );
    Ok((StatusCode::OK, Json(response)))
}

/// POST /chores/add
///
/// ## レスポンス
///
/// - `201 Created`: 追加された家事
/// - `400 Bad Request`: 入力不正、担当者が同じハウスにいない
/// - `404 Not Found`: 呼び出し元がハウス未所属
#[tracing::instrument(skip_all, fields(uid = %identity.uid))]
pub async fn add_chore(
    State(state): State<Arc<ChoreState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Json(req): Json<AddChoreRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = AddChoreInput {
        chore_name: req.chore_name,
        user_email: req.user_email,
        username:   req.username,
    };

    let chore = state.usecase.add_chore(&identity, input).await?;

    let response = ApiResponse::new("Chore added successfully!", ChoreDto::from(&chore));
    Ok((StatusCode::CREATED, Json(response)))
}

/// PUT /chores/{chore_id}/status
#[tracing::instrument(skip_all, fields(uid = %identity.uid, %chore_id))]
pub async fn update_chore_status(
    State(state): State<Arc<ChoreState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Path(chore_id): Path<String>,
    Json(req): Json<UpdateChoreStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let chore = state
        .usecase
        .update_status(&identity, &chore_id, &req.status)
        .await?;

    let response = ApiResponse::new("Chore status updated successfully", ChoreDto::from(&chore));
    Ok((StatusCode::OK, Json(response)))
}

/// DELETE /chores/delete/{chore_id}
#[tracing::instrument(skip_all, fields(uid = %identity.uid, %chore_id))]
pub async fn delete_chore(
    State(state): State<Arc<ChoreState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Path(chore_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.usecase.delete_chore(&identity, &chore_id).await?;

    let response = ApiResponse::new(
        "Chore deleted successfully!",
        DeletedChoreDto {
            chore_id: deleted.to_string(),
        },
    );
    Ok((StatusCode::OK, Json(response)))
}
