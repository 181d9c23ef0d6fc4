//! # アプリケーション設定
//!
//! 環境変数からアプリケーション設定を読み込む。
//!
//! ## 設計方針
//!
//! [12-Factor App](https://12factor.net/ja/config) の原則に従い、
//! すべての設定を環境変数から読み込む。開発環境では `.env` を `dotenvy` で読み込む。
//!
//! ## 環境変数一覧
//!
//! | 変数名 | 必須 | デフォルト | 説明 |
//! |--------|------|------------|------|
//! | `API_HOST` | No | `0.0.0.0` | バインドアドレス |
//! | `API_PORT` | No | `8000` | ポート番号 |
//! | `CORS_ALLOWED_ORIGINS` | No | `http://localhost:3000` | 許可オリジン（カンマ区切り） |
//! | `DYNAMODB_ENDPOINT` | No | - | DynamoDB Local 等のエンドポイント |
//! | `AWS_REGION` | No | `us-east-1` | リージョン |
//! | `TABLE_PREFIX` | No | `roomiez_` | テーブル名の接頭辞 |
//! | `FIREBASE_API_KEY` | **Yes** | - | Identity Toolkit の API キー |
//! | `IDENTITY_TOOLKIT_URL` | No | `https://identitytoolkit.googleapis.com` | Identity Toolkit のベース URL |
//! | `NOTIFICATION_BACKEND` | No | `smtp` | `smtp` または `noop` |
//! | `SMTP_HOST` | No | `smtp.gmail.com` | SMTP ホスト |
//! | `SMTP_PORT` | No | `587` | SMTP ポート |
//! | `SMTP_TLS` | No | `true` | STARTTLS を使用するか |
//! | `ROOMIEZ_SMTP_EMAIL` | smtp + TLS 時 | - | SMTP 認証ユーザー |
//! | `ROOMIEZ_SMTP_PASSWORD` | smtp + TLS 時 | - | SMTP 認証パスワード |

use std::env;

use thiserror::Error;

const DEFAULT_FROM_ADDRESS: &str = "noreply@roomiez.example.com";

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 必須の環境変数が未設定
    #[error("環境変数 {0} が設定されていません")]
    Missing(&'static str),

    /// 環境変数の値が不正
    #[error("環境変数 {name} の値が不正です: {value}")]
    Invalid { name: &'static str, value: String },
}

/// メール送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationBackend {
    /// SMTP リレー経由で送信
    Smtp,
    /// 送信しない（ログ出力のみ）
    Noop,
}

/// DynamoDB 接続設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamoDbConfig {
    /// エンドポイント（未設定なら AWS のデフォルト解決）
    pub endpoint:     Option<String>,
    pub region:       String,
    pub table_prefix: String,
}

/// ID プロバイダ設定
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    pub base_url: String,
    pub api_key:  String,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// メール送信設定
#[derive(Clone, PartialEq, Eq)]
pub struct NotificationConfig {
    pub backend:      NotificationBackend,
    pub smtp_host:    String,
    pub smtp_port:    u16,
    pub smtp_tls:     bool,
    pub username:     Option<String>,
    pub password:     Option<String>,
    /// 送信元が指定されていないメッセージの既定アドレス
    pub from_address: String,
}

impl std::fmt::Debug for NotificationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationConfig")
            .field("backend", &self.backend)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_tls", &self.smtp_tls)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("from_address", &self.from_address)
            .finish()
    }
}

/// アプリケーション全体の設定
///
/// 起動時に一度だけ構築し、各コンポーネントに渡す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub host:                 String,
    pub port:                 u16,
    pub cors_allowed_origins: Vec<String>,
    pub dynamodb:             DynamoDbConfig,
    pub identity:             IdentityConfig,
    pub notification:         NotificationConfig,
}

impl ApiConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意のルックアップ関数から設定を読み込む
    ///
    /// 空文字列の値は未設定として扱う。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let or_default = |name: &str, default: &str| get(name).unwrap_or_else(|| default.into());

        let notification = NotificationConfig {
            backend:      parse_backend(&or_default("NOTIFICATION_BACKEND", "smtp"))?,
            smtp_host:    or_default("SMTP_HOST", "smtp.gmail.com"),
            smtp_port:    parse_port("SMTP_PORT", &or_default("SMTP_PORT", "587"))?,
            smtp_tls:     parse_bool("SMTP_TLS", &or_default("SMTP_TLS", "true"))?,
            from_address: get("ROOMIEZ_SMTP_EMAIL")
                .unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
            username:     get("ROOMIEZ_SMTP_EMAIL"),
            password:     get("ROOMIEZ_SMTP_PASSWORD"),
        };

        // Gmail 等の STARTTLS リレーは認証必須
        if notification.backend == NotificationBackend::Smtp && notification.smtp_tls {
            if notification.username.is_none() {
                return Err(ConfigError::Missing("ROOMIEZ_SMTP_EMAIL"));
            }
            if notification.password.is_none() {
                return Err(ConfigError::Missing("ROOMIEZ_SMTP_PASSWORD"));
            }
        }

        Ok(Self {
            host: or_default("API_HOST", "0.0.0.0"),
            port: parse_port("API_PORT", &or_default("API_PORT", "8000"))?,
            cors_allowed_origins: parse_list(&or_default(
                "CORS_ALLOWED_ORIGINS",
                "http://localhost:3000",
            )),
            dynamodb: DynamoDbConfig {
                endpoint:     get("DYNAMODB_ENDPOINT"),
                region:       or_default("AWS_REGION", "us-east-1"),
                table_prefix: or_default("TABLE_PREFIX", "roomiez_"),
            },
            identity: IdentityConfig {
                base_url: or_default(
                    "IDENTITY_TOOLKIT_URL",
                    "https://identitytoolkit.googleapis.com",
                ),
                api_key:  get("FIREBASE_API_KEY").ok_or(ConfigError::Missing("FIREBASE_API_KEY"))?,
            },
            notification,
        })
    }
}

fn parse_port(name: &'static str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        }),
    }
}

fn parse_backend(value: &str) -> Result<NotificationBackend, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "smtp" => Ok(NotificationBackend::Smtp),
        "noop" => Ok(NotificationBackend::Noop),
        _ => Err(ConfigError::Invalid {
            name:  "NOTIFICATION_BACKEND",
            value: value.to_string(),
        }),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_必須項目のみでデフォルト値が適用される() {
        let config = load(&[
            ("FIREBASE_API_KEY", "key"),
            ("NOTIFICATION_BACKEND", "noop"),
        ])
        .unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.cors_allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(
            config.dynamodb,
            DynamoDbConfig {
                endpoint:     None,
                region:       "us-east-1".to_string(),
                table_prefix: "roomiez_".to_string(),
            }
        );
        assert_eq!(
            config.identity.base_url,
            "https://identitytoolkit.googleapis.com"
        );
        assert_eq!(config.notification.backend, NotificationBackend::Noop);
        assert_eq!(config.notification.smtp_host, "smtp.gmail.com");
        assert_eq!(config.notification.smtp_port, 587);
        assert_eq!(config.notification.from_address, DEFAULT_FROM_ADDRESS);
    }

    #[test]
    fn test_api_keyが未設定ならエラー() {
        let result = load(&[("NOTIFICATION_BACKEND", "noop")]);

        assert_eq!(result, Err(ConfigError::Missing("FIREBASE_API_KEY")));
    }

    #[test]
    fn test_tls有効のsmtpは認証情報が必須() {
        let result = load(&[("FIREBASE_API_KEY", "key")]);

        assert_eq!(result, Err(ConfigError::Missing("ROOMIEZ_SMTP_EMAIL")));
    }

    #[test]
    fn test_smtp認証情報が送信元アドレスになる() {
        let config = load(&[
            ("FIREBASE_API_KEY", "key"),
            ("ROOMIEZ_SMTP_EMAIL", "roomiez@gmail.com"),
            ("ROOMIEZ_SMTP_PASSWORD", "app-password"),
        ])
        .unwrap();

        assert_eq!(config.notification.backend, NotificationBackend::Smtp);
        assert!(config.notification.smtp_tls);
        assert_eq!(config.notification.from_address, "roomiez@gmail.com");
        assert_eq!(
            config.notification.username.as_deref(),
            Some("roomiez@gmail.com")
        );
    }

    #[test]
    fn test_tls無効のsmtpは認証情報なしで読み込める() {
        let config = load(&[
            ("FIREBASE_API_KEY", "key"),
            ("SMTP_HOST", "localhost"),
            ("SMTP_PORT", "1025"),
            ("SMTP_TLS", "false"),
        ])
        .unwrap();

        assert_eq!(config.notification.smtp_host, "localhost");
        assert_eq!(config.notification.smtp_port, 1025);
        assert!(!config.notification.smtp_tls);
        assert!(config.notification.username.is_none());
    }

    #[test]
    fn test_corsオリジンはカンマ区切りで複数指定できる() {
        let config = load(&[
            ("FIREBASE_API_KEY", "key"),
            ("NOTIFICATION_BACKEND", "noop"),
            (
                "CORS_ALLOWED_ORIGINS",
                "http://localhost:3000, https://roomiez.example.com,",
            ),
        ])
        .unwrap();

        assert_eq!(
            config.cors_allowed_origins,
            vec!["http://localhost:3000", "https://roomiez.example.com"]
        );
    }

    #[rstest]
    #[case("API_PORT", "eighty")]
    #[case("SMTP_PORT", "70000")]
    #[case("SMTP_TLS", "maybe")]
    #[case("NOTIFICATION_BACKEND", "ses")]
    fn test_不正な値はinvalidエラー(#[case] name: &'static str, #[case] value: &str) {
        let result = load(&[
            ("FIREBASE_API_KEY", "key"),
            ("ROOMIEZ_SMTP_EMAIL", "roomiez@gmail.com"),
            ("ROOMIEZ_SMTP_PASSWORD", "app-password"),
            (name, value),
        ]);

        assert_eq!(
            result,
            Err(ConfigError::Invalid {
                name,
                value: value.to_string(),
            })
        );
    }

    #[test]
    fn test_debug出力にシークレットを含めない() {
        let config = load(&[
            ("FIREBASE_API_KEY", "super-secret-key"),
            ("ROOMIEZ_SMTP_EMAIL", "roomiez@gmail.com"),
            ("ROOMIEZ_SMTP_PASSWORD", "app-password"),
        ])
        .unwrap();

        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret-key"));
        assert!(!debug.contains("app-password"));
    }
}
