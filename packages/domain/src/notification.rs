//! # 通知
//!
//! メール通知に関するドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`Nudge`] | ナッジ | ルームメイトに家事を促す匿名メール |
//! | [`EmailMessage`] | メールメッセージ | `NotificationSender` に渡される送信内容 |
//!
//! ## 設計方針
//!
//! - **匿名性**: ナッジの送信元は固定の匿名アドレスから選ぶ。送信者の情報は含めない
//! - **文面はドメインで決める**: 件名・本文はここで組み立て、送信手段（SMTP / Noop）とは分離する

use thiserror::Error;

use crate::user::Email;

/// 通知送信エラー
#[derive(Debug, Error)]
pub enum NotificationError {
    /// メール送信に失敗
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),
}

/// メールメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// 送信元メールアドレス（`None` の場合は送信器の既定アドレス）
    pub from:      Option<String>,
    /// 送信先メールアドレス
    pub to:        String,
    /// 件名
    pub subject:   String,
    /// プレーンテキスト本文
    pub text_body: String,
}

/// ナッジ（匿名の家事リマインダー）
pub struct Nudge;

impl Nudge {
    /// 件名
    pub const SUBJECT: &'static str = "You've been nudged by a roommate!";

    /// 本文
    pub const BODY: &'static str = "Hey! You've been anonymously nudged to do your chores by one \
                                    of your roommates. Quit slacking! 😉";

    /// 送信元の候補（毎回この中から 1 つを選ぶ）
    pub const ANONYMOUS_SENDERS: [&'static str; 3] = [
        "anon1@nudgebot.com",
        "anon2@nudgebot.com",
        "anon3@nudgebot.com",
    ];

    /// ナッジのメールメッセージを組み立てる
    pub fn compose(recipient: &Email, sender: &str) -> EmailMessage {
        EmailMessage {
            from:      Some(sender.to_string()),
            to:        recipient.as_str().to_string(),
            subject:   Self::SUBJECT.to_string(),
            text_body: Self::BODY.to_string(),
        }
    }
}
