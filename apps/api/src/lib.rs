//! # Roomiez API サーバー
//!
//! ルームメイト向け家事管理アプリ「Roomiez」のバックエンド。
//!
//! ## アーキテクチャ
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────────────────┐     ┌──────────────┐
//! │   Frontend  │────▶│          roomiez-api          │────▶│   DynamoDB   │
//! │ (port 3000) │     │  auth → handler → usecase     │     └──────────────┘
//! └─────────────┘     │          (port 8000)          │────▶ ID プロバイダ
//!                     └──────────────────────────────┘────▶ SMTP リレー
//! ```
//!
//! 各リクエストは独立して処理され、プロセス内に共有の可変状態は持たない。
//! 整合性は DynamoDB の単一アイテム操作に委ねる。
//!
//! ## モジュール構成
//!
//! - [`app_builder`] - DI とルーター構築
//! - [`config`] - アプリケーション設定（環境変数からの読み込み）
//! - [`error`] - API エラー定義と HTTP レスポンスへの変換
//! - [`handler`] - HTTP リクエストハンドラ
//! - [`middleware`] - 認証ミドルウェア
//! - [`usecase`] - ビジネスロジック

pub mod app_builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod usecase;
