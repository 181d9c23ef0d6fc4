//! # リポジトリ実装
//!
//! ユーザー・ハウス・家事・買い物リスト・立替・予約の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **1 操作 = 1 リクエスト**: 各メソッドは DynamoDB への単発の読み書き。
//!   キャッシュ・バッチ・トランザクション・リトライは行わない
//! - **単一アイテムのアトミック操作は使う**: 残高の `ADD`、メンバー追加の条件付き
//!   `list_append` など、DynamoDB が 1 アイテム内で保証する操作は積極的に使う
//! - **テスタビリティ**: トレイト経由でモック可能な設計（`mock` モジュール参照）

mod item;

pub mod chore_repository;
pub mod expense_repository;
pub mod grocery_repository;
pub mod house_repository;
pub mod reservation_repository;
pub mod user_repository;

pub use chore_repository::{ChoreRepository, DynamoDbChoreRepository};
pub use expense_repository::{DynamoDbExpenseRepository, ExpenseRepository};
pub use grocery_repository::{DynamoDbGroceryRepository, GroceryRepository};
pub use house_repository::{DynamoDbHouseRepository, HouseRepository};
pub use reservation_repository::{DynamoDbReservationRepository, ReservationRepository};
pub use user_repository::{DynamoDbUserRepository, UserRepository};
