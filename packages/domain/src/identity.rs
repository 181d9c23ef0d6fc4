//! # 検証済みアイデンティティ
//!
//! ID プロバイダがベアラートークンを検証した結果として得られる呼び出し元の情報。
//! 認証ミドルウェアがリクエストの extensions に格納し、各ハンドラが参照する。

use crate::user::{Email, Uid};

/// ID プロバイダで検証済みの呼び出し元
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// ID プロバイダ上のユーザー ID
    pub uid:   Uid,
    /// ID プロバイダに登録されたメールアドレス
    pub email: Email,
    /// 表示名（未設定の場合は `None`）
    pub name:  Option<String>,
}
