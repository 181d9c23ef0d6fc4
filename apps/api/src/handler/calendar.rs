//! # 共用スペース予約ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /calendar/my-house` - ハウスの予約一覧（日付・開始時刻順）
//! - `POST /calendar/create` - 予約の作成（重なりは 409）
//! - `DELETE /calendar/{reservation_id}` - 自分の予約の削除

use std::sync::Arc;

use axum::{
    Extension,
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use roomiez_domain::{identity::VerifiedIdentity, reservation::Reservation};
use roomiez_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    usecase::{CreateReservationInput, ReservationUseCaseImpl},
};

/// 予約 API の共有状態
pub struct CalendarState {
    pub usecase: ReservationUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// 予約作成リクエスト
///
/// 欠落したフィールドは空文字として扱い、ユースケースで 400 にする。
#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time:   String,
    #[serde(default)]
    pub date:       String,
    #[serde(default)]
    pub location:   String,
}

/// 予約 DTO
#[derive(Debug, Serialize)]
pub struct ReservationDto {
    pub reservation_id:   String,
    pub house_id:         String,
    pub date:             String,
    pub start_time:       String,
    pub end_time:         String,
    pub location:         String,
    pub person_email:     String,
    pub person_id:        String,
    pub person_firstname: String,
    pub created_at:       String,
}

impl From<&Reservation> for ReservationDto {
    fn from(reservation: &Reservation) -> Self {
        let slot = reservation.slot();
        Self {
            reservation_id:   reservation.id().to_string(),
            house_id:         reservation.house_id().to_string(),
            date:             slot.date_string(),
            start_time:       slot.start_string(),
            end_time:         slot.end_string(),
            location:         reservation.location().as_str().to_string(),
            person_email:     reservation.person_email().as_str().to_string(),
            person_id:        reservation.person_uid().as_str().to_string(),
            person_firstname: reservation.person_firstname().to_string(),
            created_at:       reservation.created_at().to_rfc3339(),
        }
    }
}

/// 予約削除結果 DTO
#[derive(Debug, Serialize)]
pub struct DeletedReservationDto {
    pub reservation_id: String,
    pub deleted_at:     String,
    pub location:       String,
    pub date:           String,
    /// `HH:MM - HH:MM`
    pub time:           String,
}

// --- ハンドラ ---

/// GET /calendar/my-house
#[tracing::instrument(skip_all, fields(uid = %identity.uid))]
pub async fn list_house_reservations(
    State(state): State<Arc<CalendarState>>,
    Extension(identity): Extension<VerifiedIdentity>,
) -> Result<impl IntoResponse, ApiError> {
    let reservations = state.usecase.list_reservations(&identity).await?;

    let response = ApiResponse::new(
        "House reservations retrieved successfully",
        reservations.iter().map(ReservationDto::from).collect::<Vec<_>>(),
    );
    Ok((StatusCode::OK, Json(response)))
}

/// POST /calendar/create
#[tracing::instrument(skip_all, fields(uid = %identity.uid))]
pub async fn create_reservation(
    State(state): State<Arc<CalendarState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Json(req): Json<CreateReservationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateReservationInput {
        date:       req.date,
        start_time: req.start_time,
        end_time:   req.end_time,
        location:   req.location,
    };
    let reservation = state.usecase.create_reservation(&identity, input).await?;

    let response = ApiResponse::new(
        "Reservation created successfully",
        ReservationDto::from(&reservation),
    );
    Ok((StatusCode::CREATED, Json(response)))
}

/// DELETE /calendar/{reservation_id}
#[tracing::instrument(skip_all, fields(uid = %identity.uid, %reservation_id))]
pub async fn delete_reservation(
    State(state): State<Arc<CalendarState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Path(reservation_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .usecase
        .delete_reservation(&identity, &reservation_id)
        .await?;

    let reservation = &deleted.reservation;
    let slot = reservation.slot();
    let response = ApiResponse::new(
        "Reservation deleted successfully",
        DeletedReservationDto {
            reservation_id: reservation.id().to_string(),
            deleted_at:     deleted.deleted_at.to_rfc3339(),
            location:       reservation.location().as_str().to_string(),
            date:           slot.date_string(),
            time:           format!("{} - {}", slot.start_string(), slot.end_string()),
        },
    );
    Ok((StatusCode::OK, Json(response)))
}
