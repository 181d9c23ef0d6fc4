//! # Roomiez ドメイン層
//!
//! ルームシェアの家事管理に関するドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **エンティティ**: 一意の識別子を持つオブジェクト（House, Chore, User, GroceryItem, Expense, Reservation）
//! - **値オブジェクト**: 生成時に検証される不変オブジェクト（Email, JoinCode, Money など）
//! - **ドメインエラー**: ビジネスルール違反を表現するエラー型
//!
//! ## 依存関係の方向
//!
//! ```text
//! api → infra → domain
//!   ↘           ↗
//!     ─────────
//! ```
//!
//! ドメイン層はインフラ層（DynamoDB、SMTP、ID プロバイダ）には一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`house`] - ハウス（共同生活グループ）と参加コード
//! - [`chore`] - 家事タスク
//! - [`user`] - ユーザー、メールアドレス
//! - [`grocery`] - 共有買い物リスト
//! - [`expense`] - 立替の割り勘と精算
//! - [`reservation`] - 共用スペースの予約
//! - [`money`] - 金額
//! - [`identity`] - ID プロバイダで検証済みの呼び出し元
//! - [`notification`] - メール通知（ナッジ）
//! - [`clock`] - 時刻プロバイダ
//! - [`error`] - ドメインエラー
//!
//! ## 使用例
//!
//! ```rust
//! use roomiez_domain::{DomainError, house::JoinCode};
//!
//! let code = JoinCode::generate();
//! assert_eq!(code.as_str().len(), 6);
//!
//! let error = DomainError::NotFound {
//!     entity_type: "House",
//!     id:          code.as_str().to_string(),
//! };
//! assert!(error.to_string().contains("House"));
//! ```

#[macro_use]
mod macros;

pub mod chore;
pub mod clock;
pub mod error;
pub mod grocery;
pub mod house;
pub mod expense;
pub mod identity;
pub mod money;
pub mod notification;
pub mod reservation;
pub mod user;

pub use error::DomainError;
