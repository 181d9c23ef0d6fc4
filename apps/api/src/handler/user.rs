//! # ユーザーハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /user/balance` - 残高取得
//! - `POST /user/update-balance` - 残高への加算
//! - `GET /user/info/{email}` - メールアドレスでユーザー取得
//! - `GET /user/profile` - プロフィール取得
//! - `PUT /user/profile` - 氏名の更新

use std::sync::Arc;

use axum::{
    Extension,
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use roomiez_domain::{identity::VerifiedIdentity, user::User};
use roomiez_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use super::chore::ChoreDto;
use crate::{error::ApiError, usecase::UserUseCaseImpl};

/// ユーザー API の共有状態
pub struct UserState {
    pub usecase: UserUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// 残高更新リクエスト
#[derive(Debug, Deserialize)]
pub struct UpdateBalanceRequest {
    /// 加算する金額（負の値で減算）
    pub amount: f64,
}

/// プロフィール更新リクエスト
///
/// 旧クライアントの camelCase フィールド名も受け付ける。
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName")]
    pub last_name:  Option<String>,
}

/// 残高 DTO
#[derive(Debug, Serialize)]
pub struct BalanceDto {
    pub balance: f64,
}

/// 残高更新結果 DTO
#[derive(Debug, Serialize)]
pub struct BalanceChangeDto {
    pub previous_balance: f64,
    pub amount_changed:   f64,
    pub new_balance:      f64,
}

/// ユーザー DTO
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub uid:        String,
    pub email:      String,
    pub house_id:   Option<String>,
    pub balance:    f64,
    pub first_name: Option<String>,
    pub last_name:  Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            uid:        user.uid().as_str().to_string(),
            email:      user.email().as_str().to_string(),
            house_id:   user.house_id().map(|h| h.to_string()),
            balance:    user.balance(),
            first_name: user.first_name().map(|n| n.as_str().to_string()),
            last_name:  user.last_name().map(|n| n.as_str().to_string()),
            created_at: user.created_at().map(|t| t.to_rfc3339()),
            updated_at: user.updated_at().map(|t| t.to_rfc3339()),
        }
    }
}

/// 担当家事付きのユーザー DTO（ハウス詳細のメンバー）
#[derive(Debug, Serialize)]
pub struct UserWithChoresDto {
    #[serde(flatten)]
    pub user:   UserDto,
    pub chores: Vec<ChoreDto>,
}

// --- ハンドラ ---

/// GET /user/balance
#[tracing::instrument(skip_all, fields(uid = %identity.uid))]
pub async fn get_balance(
    State(state): State<Arc<UserState>>,
    Extension(identity): Extension<VerifiedIdentity>,
) -> Result<impl IntoResponse, ApiError> {
    let balance = state.usecase.get_balance(&identity).await?;

    let response = ApiResponse::new("User balance retrieved successfully", BalanceDto { balance });
    Ok((StatusCode::OK, Json(response)))
}

/// POST /user/update-balance
#[tracing::instrument(skip_all, fields(uid = %identity.uid))]
pub async fn update_balance(
    State(state): State<Arc<UserState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Json(req): Json<UpdateBalanceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let change = state.usecase.update_balance(&identity, req.amount).await?;

    let response = ApiResponse::new(
        "Balance updated successfully",
        BalanceChangeDto {
            previous_balance: change.previous,
            amount_changed:   req.amount,
            new_balance:      change.current,
        },
    );
    Ok((StatusCode::OK, Json(response)))
}

/// GET /user/info/{email}
#[tracing::instrument(skip_all)]
pub async fn get_user_by_email(
    State(state): State<Arc<UserState>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.usecase.get_user_by_email(&email).await?;

    let response = ApiResponse::new("User retrieved successfully", UserDto::from(&user));
    Ok((StatusCode::OK, Json(response)))
}

/// GET /user/profile
#[tracing::instrument(skip_all, fields(uid = %identity.uid))]
pub async fn get_profile(
    State(state): State<Arc<UserState>>,
    Extension(identity): Extension<VerifiedIdentity>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.usecase.get_profile(&identity).await?;

    let response = ApiResponse::new("User profile retrieved successfully", UserDto::from(&user));
    Ok((StatusCode::OK, Json(response)))
}

/// PUT /user/profile
///
/// 省略したフィールドは変更しない。
#[tracing::instrument(skip_all, fields(uid = %identity.uid))]
pub async fn update_profile(
    State(state): State<Arc<UserState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .usecase
        .update_profile(&identity, req.first_name, req.last_name)
        .await?;

    let response = ApiResponse::new("Profile updated successfully", UserDto::from(&user));
    Ok((StatusCode::OK, Json(response)))
}
