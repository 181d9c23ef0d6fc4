//! # 買い物リストハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /grocery/add` - アイテム追加
//! - `GET /grocery/my-house` - ハウスのアイテム一覧（新しい順）
//! - `DELETE /grocery/{grocery_id}` - アイテム削除
//! - `DELETE /grocery/all-groceries` - ハウスのアイテム全削除

use std::sync::Arc;

use axum::{
    Extension,
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use roomiez_domain::{grocery::GroceryItem, identity::VerifiedIdentity};
use roomiez_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, usecase::GroceryUseCaseImpl};

/// 買い物リスト API の共有状態
pub struct GroceryState {
    pub usecase: GroceryUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// アイテム追加リクエスト
#[derive(Debug, Deserialize)]
pub struct AddGroceryRequest {
    pub item: String,
}

/// 買い物アイテム DTO
#[derive(Debug, Serialize)]
pub struct GroceryItemDto {
    pub grocery_id: String,
    pub item_name:  String,
    pub house_id:   String,
    pub added_by:   String,
    pub completed:  bool,
    pub added_at:   String,
}

impl From<&GroceryItem> for GroceryItemDto {
    fn from(item: &GroceryItem) -> Self {
        Self {
            grocery_id: item.id().to_string(),
            item_name:  item.name().as_str().to_string(),
            house_id:   item.house_id().to_string(),
            added_by:   item.added_by().as_str().to_string(),
            completed:  item.is_completed(),
            added_at:   item.added_at().to_rfc3339(),
        }
    }
}

/// アイテム削除結果 DTO
#[derive(Debug, Serialize)]
pub struct DeletedGroceryDto {
    pub grocery_id: String,
}

/// 全削除結果 DTO
#[derive(Debug, Serialize)]
pub struct ClearedGroceriesDto {
    pub deleted_count: usize,
}

// --- ハンドラ ---

/// POST /grocery/add
#[tracing::instrument(skip_all, fields(uid = %identity.uid))]
pub async fn add_grocery(
    State(state): State<Arc<GroceryState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Json(req): Json<AddGroceryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.usecase.add_item(&identity, req.item).await?;

    let response = ApiResponse::new("Grocery added successfully", GroceryItemDto::from(&item));
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /grocery/my-house
#[tracing::instrument(skip_all, fields(uid = %identity.uid))]
pub async fn list_house_groceries(
    State(state): State<Arc<GroceryState>>,
    Extension(identity): Extension<VerifiedIdentity>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state.usecase.list_items(&identity).await?;

    let response = ApiResponse::new(
        "House groceries retrieved successfully",
        items.iter().map(GroceryItemDto::from).collect::<Vec<_>>(),
    );
    Ok((StatusCode::OK, Json(response)))
}

/// DELETE /grocery/{grocery_id}
#[tracing::instrument(skip_all, fields(uid = %identity.uid, %grocery_id))]
pub async fn delete_grocery(
    State(state): State<Arc<GroceryState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Path(grocery_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.usecase.delete_item(&identity, &grocery_id).await?;

    let response = ApiResponse::new(
        "Grocery item deleted successfully",
        DeletedGroceryDto {
            grocery_id: deleted.to_string(),
        },
    );
    Ok((StatusCode::OK, Json(response)))
}

/// DELETE /grocery/all-groceries
#[tracing::instrument(skip_all, fields(uid = %identity.uid))]
pub async fn delete_all_groceries(
    State(state): State<Arc<GroceryState>>,
    Extension(identity): Extension<VerifiedIdentity>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted_count = state.usecase.delete_all(&identity).await?;

    let response = ApiResponse::new(
        "All groceries deleted successfully",
        ClearedGroceriesDto { deleted_count },
    );
    Ok((StatusCode::OK, Json(response)))
}
