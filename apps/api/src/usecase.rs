//! # ユースケース層
//!
//! API のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリ・送信器・時計を `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約
//! - **1 リクエスト = 単発の読み書きの列**: トランザクションは使わない
//!
//! ## モジュール構成
//!
//! - `house`: ハウスの作成・参加・詳細取得
//! - `chore`: 家事の一覧・追加・ステータス更新・削除
//! - `user`: 残高・プロフィール・ユーザー検索
//! - `nudge`: 匿名リマインダーの送信
//! - `grocery`: 共有買い物リスト
//! - `expense`: 立替の記録・残高一覧・精算
//! - `reservation`: 共用スペースの予約

pub mod chore;
pub mod expense;
pub mod grocery;
pub mod house;
pub mod nudge;
pub mod reservation;
pub mod user;

pub use chore::{AddChoreInput, ChoreUseCaseImpl};
pub use expense::{CreateExpenseInput, ExpenseUseCaseImpl, HouseBalances};
pub use grocery::GroceryUseCaseImpl;
pub use house::{HouseDetails, HouseUseCaseImpl, MemberDetail};
pub use nudge::NudgeUseCaseImpl;
pub use reservation::{CreateReservationInput, DeletedReservation, ReservationUseCaseImpl};
use roomiez_domain::{house::HouseId, user::Uid};
use roomiez_infra::repository::UserRepository;
pub use user::UserUseCaseImpl;

use crate::error::ApiError;

/// 呼び出し元が所属するハウスの ID を取得する
///
/// ユーザーが未登録の場合もハウス未所属として `None` を返す。
pub(crate) async fn caller_house_id(
    user_repo: &dyn UserRepository,
    uid: &Uid,
) -> Result<Option<HouseId>, ApiError> {
    let user = user_repo.find_by_uid(uid).await?;
    Ok(user.and_then(|u| u.house_id().cloned()))
}

/// 呼び出し元が所属するハウスの ID を取得する（未所属なら 404）
pub(crate) async fn require_house_id(
    user_repo: &dyn UserRepository,
    uid: &Uid,
) -> Result<HouseId, ApiError> {
    caller_house_id(user_repo, uid)
        .await?
        .ok_or_else(|| ApiError::NotFound("User is not in a house".to_string()))
}
