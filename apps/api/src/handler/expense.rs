//! # 立替・精算ハンドラ
//!
//! ## エンドポイント
//!
//! - `POST /expense/create` - 立替の記録（割り勘で残高を更新）
//! - `GET /expense/list` - ハウスの立替一覧（新しい順）
//! - `GET /expense/balances` - ハウスメンバーの残高一覧
//! - `POST /expense/settle` - ルームメイトへの精算

use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use roomiez_domain::{
    expense::{Expense, Settlement},
    identity::VerifiedIdentity,
    user::User,
};
use roomiez_shared::ApiResponse;
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    usecase::{CreateExpenseInput, ExpenseUseCaseImpl},
};

/// 立替 API の共有状態
pub struct ExpenseState {
    pub usecase: ExpenseUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// 立替作成リクエスト
#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub amount:        f64,
    pub description:   String,
    /// 割り勘の参加者のメールアドレス
    pub split_between: Vec<String>,
}

/// 精算リクエスト
#[derive(Debug, Deserialize)]
pub struct SettleExpenseRequest {
    pub amount:      f64,
    pub to_email:    String,
    #[serde(default)]
    pub description: Option<String>,
}

/// 立替 DTO
#[derive(Debug, Serialize)]
pub struct ExpenseDto {
    pub expense_id:        String,
    pub house_id:          String,
    pub description:       String,
    pub amount:            f64,
    pub paid_by:           String,
    pub split_between:     Vec<String>,
    pub amount_per_person: f64,
    pub settled:           bool,
    pub created_at:        String,
}

impl From<&Expense> for ExpenseDto {
    fn from(expense: &Expense) -> Self {
        Self {
            expense_id:        expense.id().to_string(),
            house_id:          expense.house_id().to_string(),
            description:       expense.description().as_str().to_string(),
            amount:            expense.amount().value(),
            paid_by:           expense.paid_by().as_str().to_string(),
            split_between:     expense
                .split_between()
                .iter()
                .map(|e| e.as_str().to_string())
                .collect(),
            amount_per_person: expense.amount_per_person(),
            settled:           expense.is_settled(),
            created_at:        expense.created_at().to_rfc3339(),
        }
    }
}

/// 立替作成結果 DTO
#[derive(Debug, Serialize)]
pub struct CreatedExpenseDto {
    pub expense:            ExpenseDto,
    pub amount_per_person:  f64,
    pub total_participants: usize,
}

/// 立替一覧 DTO
#[derive(Debug, Serialize)]
pub struct ExpenseListDto {
    pub expenses: Vec<ExpenseDto>,
    pub count:    usize,
}

/// メンバー残高 DTO
#[derive(Debug, Serialize)]
pub struct MemberBalanceDto {
    pub uid:        String,
    pub email:      String,
    pub first_name: Option<String>,
    pub last_name:  Option<String>,
    pub balance:    f64,
}

impl From<&User> for MemberBalanceDto {
    fn from(user: &User) -> Self {
        Self {
            uid:        user.uid().as_str().to_string(),
            email:      user.email().as_str().to_string(),
            first_name: user.first_name().map(|n| n.as_str().to_string()),
            last_name:  user.last_name().map(|n| n.as_str().to_string()),
            balance:    user.balance(),
        }
    }
}

/// ハウス残高一覧 DTO
#[derive(Debug, Serialize)]
pub struct HouseBalancesDto {
    pub house_id: String,
    pub members:  Vec<MemberBalanceDto>,
}

/// 精算結果 DTO
#[derive(Debug, Serialize)]
pub struct SettlementDto {
    pub amount:      f64,
    pub from:        String,
    pub to:          String,
    pub description: String,
    pub timestamp:   String,
}

impl From<&Settlement> for SettlementDto {
    fn from(settlement: &Settlement) -> Self {
        Self {
            amount:      settlement.amount.value(),
            from:        settlement.from.as_str().to_string(),
            to:          settlement.to.as_str().to_string(),
            description: settlement.description.as_str().to_string(),
            timestamp:   settlement.settled_at.to_rfc3339(),
        }
    }
}

// --- ハンドラ ---

/// POST /expense/create
#[tracing::instrument(skip_all, fields(uid = %identity.uid))]
pub async fn create_expense(
    State(state): State<Arc<ExpenseState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Json(req): Json<CreateExpenseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateExpenseInput {
        amount:        req.amount,
        description:   req.description,
        split_between: req.split_between,
    };
    let expense = state.usecase.create_expense(&identity, input).await?;

    let response = ApiResponse::new(
        "Expense created successfully",
        CreatedExpenseDto {
            amount_per_person:  expense.amount_per_person(),
            total_participants: expense.split_between().len(),
            expense:            ExpenseDto::from(&expense),
        },
    );
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /expense/list
#[tracing::instrument(skip_all, fields(uid = %identity.uid))]
pub async fn list_expenses(
    State(state): State<Arc<ExpenseState>>,
    Extension(identity): Extension<VerifiedIdentity>,
) -> Result<impl IntoResponse, ApiError> {
    let expenses = state.usecase.list_expenses(&identity).await?;

    let response = ApiResponse::new(
        "Expenses retrieved successfully",
        ExpenseListDto {
            count:    expenses.len(),
            expenses: expenses.iter().map(ExpenseDto::from).collect(),
        },
    );
    Ok((StatusCode::OK, Json(response)))
}

/// GET /expense/balances
#[tracing::instrument(skip_all, fields(uid = %identity.uid))]
pub async fn get_house_balances(
    State(state): State<Arc<ExpenseState>>,
    Extension(identity): Extension<VerifiedIdentity>,
) -> Result<impl IntoResponse, ApiError> {
    let balances = state.usecase.house_balances(&identity).await?;

    let response = ApiResponse::new(
        "House balances retrieved successfully",
        HouseBalancesDto {
            house_id: balances.house_id.to_string(),
            members:  balances.members.iter().map(MemberBalanceDto::from).collect(),
        },
    );
    Ok((StatusCode::OK, Json(response)))
}

/// POST /expense/settle
#[tracing::instrument(skip_all, fields(uid = %identity.uid))]
pub async fn settle_expense(
    State(state): State<Arc<ExpenseState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Json(req): Json<SettleExpenseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let settlement = state
        .usecase
        .settle(&identity, req.amount, req.to_email, req.description)
        .await?;

    let response = ApiResponse::new(
        "Payment settled successfully",
        SettlementDto::from(&settlement),
    );
    Ok((StatusCode::OK, Json(response)))
}
