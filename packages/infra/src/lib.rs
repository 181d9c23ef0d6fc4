//! # Roomiez インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **データベース接続**: Amazon DynamoDB への接続とテーブルの自動作成
//! - **リポジトリ実装**: ユーザー・ハウス・家事・買い物リスト・立替・予約の永続化
//! - **ID プロバイダ**: ベアラートークンの検証（Google Identity Toolkit）
//! - **メール送信**: SMTP によるナッジ送信
//!
//! ## 依存関係
//!
//! ```text
//! api → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`dynamodb`] - DynamoDB クライアント作成とテーブル作成
//! - [`error`] - インフラ層エラー定義
//! - [`identity`] - トークン検証クライアント
//! - [`notification`] - メール送信
//! - [`repository`] - リポジトリ実装
//! - `mock` - テスト用インメモリ実装（`test-utils` feature）

pub mod dynamodb;
pub mod error;
pub mod identity;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod notification;
pub mod repository;

pub use error::{InfraError, InfraErrorKind};
pub use identity::{FirebaseTokenVerifier, IdentityError, TokenVerifier};
pub use notification::{NoopNotificationSender, NotificationSender, SmtpNotificationSender};
