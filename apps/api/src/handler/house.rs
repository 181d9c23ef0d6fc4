//! # ハウスハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /house/create` - ハウス作成（作成者がオーナー兼唯一のメンバー）
//! - `POST /house/join` - 参加コードでハウスに参加
//! - `GET /house/my-house` - 所属ハウスの詳細（メンバーと担当家事）

use std::sync::Arc;

use axum::{
    Extension,
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use roomiez_domain::{house::House, identity::VerifiedIdentity};
use roomiez_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use super::{
    chore::ChoreDto,
    user::{UserDto, UserWithChoresDto},
};
use crate::{
    error::ApiError,
    usecase::{HouseDetails, HouseUseCaseImpl},
};

/// ハウス API の共有状態
pub struct HouseState {
    pub usecase: HouseUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// ハウス作成リクエスト
#[derive(Debug, Deserialize)]
pub struct CreateHouseRequest {
    pub house_name: String,
}

/// ハウス参加リクエスト
#[derive(Debug, Deserialize)]
pub struct JoinHouseRequest {
    pub join_code: String,
}

/// ハウス作成結果 DTO
#[derive(Debug, Serialize)]
pub struct CreatedHouseDto {
    pub house_id:   String,
    pub house_name: String,
    pub join_code:  String,
}

/// ハウス参加結果 DTO
#[derive(Debug, Serialize)]
pub struct JoinedHouseDto {
    pub house_id:   String,
    pub house_name: String,
    pub join_code:  String,
    pub members:    Vec<String>,
}

/// ハウス詳細 DTO
#[derive(Debug, Serialize)]
pub struct HouseDetailDto {
    pub house_id:       String,
    pub house_name:     String,
    pub join_code:      String,
    pub owner_uid:      String,
    pub owner_email:    String,
    pub members:        Vec<String>,
    pub created_at:     Option<String>,
    pub member_details: Vec<UserWithChoresDto>,
}

fn member_emails(house: &House) -> Vec<String> {
    house
        .members()
        .iter()
        .map(|m| m.as_str().to_string())
        .collect()
}

impl From<HouseDetails> for HouseDetailDto {
    fn from(details: HouseDetails) -> Self {
        let house = details.house;
        Self {
            house_id:       house.id().to_string(),
            house_name:     house.name().as_str().to_string(),
            join_code:      house.join_code().as_str().to_string(),
            owner_uid:      house.owner_uid().as_str().to_string(),
            owner_email:    house.owner_email().as_str().to_string(),
            members:        member_emails(&house),
            created_at:     house.created_at().map(|t| t.to_rfc3339()),
            member_details: details
                .members
                .iter()
                .map(|m| UserWithChoresDto {
                    user:   UserDto::from(&m.user),
                    chores: m.chores.iter().map(ChoreDto::from).collect(),
                })
                .collect(),
        }
    }
}

// --- ハンドラ ---

/// POST /house/create
///
/// ## レスポンス
///
/// - `201 Created`: ハウス ID・名前・参加コード
/// - `400 Bad Request`: ハウス名が不正、既にハウスに所属している
#[tracing::instrument(skip_all, fields(uid = %identity.uid))]
pub async fn create_house(
    State(state): State<Arc<HouseState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Json(req): Json<CreateHouseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let house = state.usecase.create_house(&identity, req.house_name).await?;

    let response = ApiResponse::new(
        "House created successfully!",
        CreatedHouseDto {
            house_id:   house.id().to_string(),
            house_name: house.name().as_str().to_string(),
            join_code:  house.join_code().as_str().to_string(),
        },
    );
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /house/join
///
/// ## レスポンス
///
/// - `200 OK`: 参加後のハウス
/// - `400 Bad Request`: 既にメンバー
/// - `404 Not Found`: 参加コードが存在しない
#[tracing::instrument(skip_all, fields(uid = %identity.uid))]
pub async fn join_house(
    State(state): State<Arc<HouseState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Json(req): Json<JoinHouseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let house = state.usecase.join_house(&identity, req.join_code).await?;

    let response = ApiResponse::new(
        "Joined house successfully!",
        JoinedHouseDto {
            house_id:   house.id().to_string(),
            house_name: house.name().as_str().to_string(),
            join_code:  house.join_code().as_str().to_string(),
            members:    member_emails(&house),
        },
    );
    Ok((StatusCode::OK, Json(response)))
}

/// GET /house/my-house
#[tracing::instrument(skip_all, fields(uid = %identity.uid))]
pub async fn get_my_house(
    State(state): State<Arc<HouseState>>,
    Extension(identity): Extension<VerifiedIdentity>,
) -> Result<impl IntoResponse, ApiError> {
    let details = state.usecase.get_my_house(&identity).await?;

    let response = ApiResponse::new("House retrieved successfully", HouseDetailDto::from(details));
    Ok((StatusCode::OK, Json(response)))
}
