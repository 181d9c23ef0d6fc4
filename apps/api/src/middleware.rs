//! # ミドルウェア
//!
//! API サーバー用のミドルウェアを提供する。

mod auth;

pub use auth::{AuthState, require_auth};
