//! SMTP 通知送信実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//!
//! - `tls: true`: STARTTLS + 認証（例: `smtp.gmail.com:587`）
//! - `tls: false`: 平文・認証なし（Mailpit 等のローカル SMTP 向け）
//!
//! トランスポートは接続プールを持ち、送信ごとに必要に応じて接続を張る。

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    message::{Message, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use roomiez_domain::notification::{EmailMessage, NotificationError};

use super::NotificationSender;

/// SMTP 接続設定
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    /// SMTP サーバーのホスト名
    pub host:         String,
    /// SMTP サーバーのポート番号
    pub port:         u16,
    /// STARTTLS を使用するか
    pub tls:          bool,
    /// 認証ユーザー名（`None` の場合は認証しない）
    pub username:     Option<String>,
    /// 認証パスワード
    pub password:     Option<String>,
    /// メッセージに送信元が指定されていない場合の既定アドレス
    pub from_address: String,
}

/// SMTP 通知送信
pub struct SmtpNotificationSender {
    transport:    AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpNotificationSender {
    /// 新しい SMTP 送信インスタンスを作成する
    ///
    /// # エラー
    ///
    /// STARTTLS のリレー設定に失敗した場合（ホスト名が不正など）。
    pub fn new(settings: SmtpSettings) -> Result<Self, NotificationError> {
        let builder = if settings.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host).map_err(|e| {
                NotificationError::SendFailed(format!("SMTP リレーの設定に失敗: {e}"))
            })?
        } else {
            // builder_dangerous: TLS なしで接続
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
        };

        let builder = builder.port(settings.port);
        let builder = match (settings.username, settings.password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username, password))
            }
            _ => builder,
        };

        Ok(Self {
            transport:    builder.build(),
            from_address: settings.from_address,
        })
    }
}

/// EmailMessage を lettre のメッセージに変換する
fn build_message(email: &EmailMessage, default_from: &str) -> Result<Message, NotificationError> {
    let from = email.from.as_deref().unwrap_or(default_from);

    let builder = Message::builder()
        .from(
            from.parse()
                .map_err(|e| NotificationError::SendFailed(format!("送信元アドレス不正: {e}")))?,
        )
        .to(email
            .to
            .parse()
            .map_err(|e| NotificationError::SendFailed(format!("宛先アドレス不正: {e}")))?)
        .subject(&email.subject);

    let message = builder
        .header(ContentType::TEXT_PLAIN)
        .body(email.text_body.clone());

    message.map_err(|e| NotificationError::SendFailed(format!("メッセージ構築失敗: {e}")))
}

#[async_trait]
impl NotificationSender for SmtpNotificationSender {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        let message = build_message(email, &self.from_address)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotificationError::SendFailed(format!("SMTP 送信失敗: {e}")))?;

        Ok(())
    }
}
