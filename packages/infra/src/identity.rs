//! # ID プロバイダクライアント
//!
//! ベアラートークン（Firebase Authentication の ID トークン）を検証し、
//! 呼び出し元の [`VerifiedIdentity`] を得る。
//!
//! ## エンドポイント
//!
//! - `POST {base_url}/v1/accounts:lookup?key={api_key}` - ID トークンからアカウント情報を取得
//!
//! ## ステータスの扱い
//!
//! | ID プロバイダの応答 | 結果 |
//! |-------------------|------|
//! | 200 + users あり | 検証成功 |
//! | 200 + users なし / 400 | [`IdentityError::InvalidToken`] |
//! | 503 / 接続失敗 / タイムアウト | [`IdentityError::Unavailable`] |
//! | その他 | [`IdentityError::Unexpected`] |

use async_trait::async_trait;
use roomiez_domain::{
    identity::VerifiedIdentity,
    user::{Email, Uid},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// ID プロバイダクライアントエラー
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    /// トークンが無効（期限切れ・改ざん・存在しないユーザー）
    #[error("トークンが無効です")]
    InvalidToken,

    /// ID プロバイダが利用不可
    #[error("ID プロバイダが一時的に利用できません")]
    Unavailable,

    /// ネットワークエラー
    #[error("ネットワークエラー: {0}")]
    Network(String),

    /// 予期しないエラー
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

impl From<reqwest::Error> for IdentityError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            IdentityError::Unavailable
        } else {
            IdentityError::Network(err.to_string())
        }
    }
}

/// トークン検証トレイト
///
/// テスト時にスタブを使用できるようトレイトで定義。
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// ID トークンを検証し、呼び出し元の情報を返す
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError>;
}

// --- リクエスト/レスポンス型 ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id:     String,
    email:        Option<String>,
    display_name: Option<String>,
}

/// Google Identity Toolkit を使ったトークン検証の実装
pub struct FirebaseTokenVerifier {
    base_url: String,
    api_key:  String,
    client:   reqwest::Client,
}

impl FirebaseTokenVerifier {
    /// 新しい FirebaseTokenVerifier を作成する
    ///
    /// # 引数
    ///
    /// - `base_url`: Identity Toolkit のベース URL（例: `https://identitytoolkit.googleapis.com`）
    /// - `api_key`: Firebase プロジェクトの Web API キー
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key:  api_key.into(),
            client:   reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TokenVerifier for FirebaseTokenVerifier {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let url = format!("{}/v1/accounts:lookup", self.base_url);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&LookupRequest { id_token: token })
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let body = response.json::<LookupResponse>().await?;
                let user = body
                    .users
                    .into_iter()
                    .next()
                    .ok_or(IdentityError::InvalidToken)?;
                into_identity(user)
            }
            reqwest::StatusCode::BAD_REQUEST => Err(IdentityError::InvalidToken),
            reqwest::StatusCode::SERVICE_UNAVAILABLE => Err(IdentityError::Unavailable),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(IdentityError::Unexpected(format!(
                    "予期しないステータス {status}: {body}"
                )))
            }
        }
    }
}

/// メールアドレスを持たないアカウントはこのアプリでは扱えないため無効とする
fn into_identity(user: LookupUser) -> Result<VerifiedIdentity, IdentityError> {
    let uid = Uid::new(user.local_id).map_err(|_| IdentityError::InvalidToken)?;
    let email = user
        .email
        .ok_or(IdentityError::InvalidToken)
        .and_then(|e| Email::new(e).map_err(|_| IdentityError::InvalidToken))?;

    Ok(VerifiedIdentity {
        uid,
        email,
        name: user.display_name,
    })
}
