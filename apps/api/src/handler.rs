//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置し、ここで re-export する
//! - ハンドラは薄く保ち、ビジネスロジックはユースケースに委譲
//! - 認証が必要なハンドラは `Extension<VerifiedIdentity>` で呼び出し元を受け取る
//! - 成功レスポンスは `ApiResponse`（`{ message, data }`）で包む

pub mod calendar;
pub mod chore;
pub mod expense;
pub mod grocery;
pub mod health;
pub mod house;
pub mod nudge;
pub mod root;
pub mod user;

pub use calendar::{
    CalendarState,
    create_reservation,
    delete_reservation,
    list_house_reservations,
};
pub use chore::{ChoreState, add_chore, delete_chore, list_house_chores, update_chore_status};
pub use expense::{
    ExpenseState,
    create_expense,
    get_house_balances,
    list_expenses,
    settle_expense,
};
pub use grocery::{
    GroceryState,
    add_grocery,
    delete_all_groceries,
    delete_grocery,
    list_house_groceries,
};
pub use health::health_check;
pub use house::{HouseState, create_house, get_my_house, join_house};
pub use nudge::{NudgeState, send_nudge};
pub use root::{protected, root};
pub use user::{
    UserState,
    get_balance,
    get_profile,
    get_user_by_email,
    update_balance,
    update_profile,
};
