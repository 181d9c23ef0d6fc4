//! ナッジ（匿名リマインダー）ユースケース

use std::sync::Arc;

use rand::seq::IndexedRandom;
use roomiez_domain::{notification::Nudge, user::Email};
use roomiez_infra::NotificationSender;

use crate::error::ApiError;

/// ナッジユースケース
pub struct NudgeUseCaseImpl {
    notification_sender: Arc<dyn NotificationSender>,
}

impl NudgeUseCaseImpl {
    pub fn new(notification_sender: Arc<dyn NotificationSender>) -> Self {
        Self {
            notification_sender,
        }
    }

    /// 宛先にナッジメールを送る
    ///
    /// 送信元は匿名アドレスの候補からランダムに選ぶ。
    pub async fn send_nudge(&self, recipient: String) -> Result<(), ApiError> {
        let recipient = Email::new(recipient)?;
        let sender = Nudge::ANONYMOUS_SENDERS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(Nudge::ANONYMOUS_SENDERS[0]);

        let message = Nudge::compose(&recipient, sender);
        self.notification_sender.send_email(&message).await?;

        tracing::info!(
            event.kind = "business_event",
            event.entity_type = "nudge",
            event.action = "nudge.sent",
            sender,
            "ナッジを送信しました"
        );

        Ok(())
    }
}
