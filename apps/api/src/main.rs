//! # Roomiez API サーバー
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（DynamoDB Local + ローカル SMTP キャッチャー）
//! DYNAMODB_ENDPOINT=http://localhost:8001 NOTIFICATION_BACKEND=noop \
//!     FIREBASE_API_KEY=... cargo run -p roomiez-api
//! ```
//!
//! 環境変数の一覧は [`roomiez_api::config`] を参照。

use std::sync::Arc;

use anyhow::Context;
use roomiez_api::{
    app_builder::{AppDependencies, build_app},
    config::{ApiConfig, NotificationBackend, NotificationConfig},
};
use roomiez_domain::clock::SystemClock;
use roomiez_infra::{
    FirebaseTokenVerifier,
    NoopNotificationSender,
    NotificationSender,
    SmtpNotificationSender,
    dynamodb::{self, TableNames},
    notification::SmtpSettings,
    repository::{
        DynamoDbChoreRepository,
        DynamoDbExpenseRepository,
        DynamoDbGroceryRepository,
        DynamoDbHouseRepository,
        DynamoDbReservationRepository,
        DynamoDbUserRepository,
    },
};
use roomiez_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

/// API サーバーのエントリーポイント
///
/// 以下の順序で初期化を行う:
///
/// 1. 環境変数の読み込み（.env ファイル）
/// 2. トレーシングの初期化
/// 3. アプリケーション設定の読み込み
/// 4. DynamoDB クライアントの作成とテーブルの確認
/// 5. ID プロバイダ・メール送信の初期化
/// 6. ルーターの構築と HTTP サーバーの起動
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    init_tracing(TracingConfig::from_env("roomiez-api"));
    let _tracing_guard = tracing::info_span!("app", service = "roomiez-api").entered();

    let config = ApiConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!("API サーバーを起動します: {}:{}", config.host, config.port);

    // DynamoDB
    let client =
        dynamodb::create_client(config.dynamodb.endpoint.as_deref(), &config.dynamodb.region)
            .await;
    let tables = TableNames::with_prefix(&config.dynamodb.table_prefix);
    dynamodb::ensure_tables(&client, &tables)
        .await
        .context("DynamoDB テーブルのセットアップに失敗しました")?;

    let notification_sender = build_notification_sender(&config.notification)?;

    let deps = AppDependencies {
        user_repository: Arc::new(DynamoDbUserRepository::new(
            client.clone(),
            tables.users.clone(),
        )),
        house_repository: Arc::new(DynamoDbHouseRepository::new(
            client.clone(),
            tables.houses.clone(),
        )),
        chore_repository: Arc::new(DynamoDbChoreRepository::new(
            client.clone(),
            tables.chores.clone(),
        )),
        grocery_repository: Arc::new(DynamoDbGroceryRepository::new(
            client.clone(),
            tables.groceries.clone(),
        )),
        expense_repository: Arc::new(DynamoDbExpenseRepository::new(
            client.clone(),
            tables.expenses.clone(),
        )),
        reservation_repository: Arc::new(DynamoDbReservationRepository::new(
            client,
            tables.reservations.clone(),
        )),
        token_verifier: Arc::new(FirebaseTokenVerifier::new(
            &config.identity.base_url,
            config.identity.api_key.clone(),
        )),
        notification_sender,
        clock: Arc::new(SystemClock),
    };

    let app = build_app(&config.cors_allowed_origins, deps);

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("{}:{} へのバインドに失敗しました", config.host, config.port))?;
    tracing::info!(
        "API サーバーが起動しました: {}",
        listener.local_addr().context("リッスンアドレスの取得に失敗しました")?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("サーバーが異常終了しました")?;

    tracing::info!("API サーバーを停止しました");
    Ok(())
}

/// 設定に応じたメール送信器を作成する
fn build_notification_sender(
    config: &NotificationConfig,
) -> anyhow::Result<Arc<dyn NotificationSender>> {
    match config.backend {
        NotificationBackend::Smtp => {
            let sender = SmtpNotificationSender::new(SmtpSettings {
                host:         config.smtp_host.clone(),
                port:         config.smtp_port,
                tls:          config.smtp_tls,
                username:     config.username.clone(),
                password:     config.password.clone(),
                from_address: config.from_address.clone(),
            })
            .context("SMTP 送信の初期化に失敗しました")?;
            tracing::info!(
                host = %config.smtp_host,
                port = config.smtp_port,
                tls = config.smtp_tls,
                "SMTP でメールを送信します"
            );
            Ok(Arc::new(sender))
        }
        NotificationBackend::Noop => {
            tracing::warn!("メール送信は無効です（NOTIFICATION_BACKEND=noop）");
            Ok(Arc::new(NoopNotificationSender))
        }
    }
}

/// Ctrl-C（Unix では SIGTERM も）を受けるまで待機する
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Ctrl-C ハンドラの登録に失敗しました: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Ctrl-C を受信しました。シャットダウンします");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("SIGTERM を受信しました。シャットダウンします");
            }
            Err(e) => {
                tracing::error!("SIGTERM ハンドラの登録に失敗しました: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
