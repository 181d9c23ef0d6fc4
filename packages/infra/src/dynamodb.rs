//! # DynamoDB 接続管理
//!
//! Amazon DynamoDB への接続管理とテーブルの自動作成を行う。
//!
//! ## 設計方針
//!
//! - **ローカル開発**: DynamoDB Local を使用（`DYNAMODB_ENDPOINT` を指定）
//! - **本番環境**: AWS の標準クレデンシャルチェーン（IAM ロール等）で接続
//! - **テーブル自動作成**: 起動時にテーブルが存在しなければ作成（冪等）
//!
//! ## テーブル構成
//!
//! | テーブル | PK | GSI |
//! |---------|----|-----|
//! | `{prefix}users` | `uid` | `email-index` |
//! | `{prefix}houses` | `house_id` | `join_code-index` |
//! | `{prefix}chores` | `chore_id` | `house_id-index`, `user_email-index` |
//! | `{prefix}groceries` | `grocery_id` | `house_id-index` |
//! | `{prefix}expenses` | `expense_id` | `house_id-index` |
//! | `{prefix}reservations` | `reservation_id` | `house_id-index` |
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use roomiez_infra::dynamodb::{self, TableNames};
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = dynamodb::create_client(Some("http://localhost:8001"), "us-east-1").await;
//!     dynamodb::ensure_tables(&client, &TableNames::with_prefix("roomiez_")).await?;
//!     Ok(())
//! }
//! ```

use aws_sdk_dynamodb::{
    Client,
    types::{
        AttributeDefinition,
        BillingMode,
        GlobalSecondaryIndex,
        KeySchemaElement,
        KeyType,
        Projection,
        ProjectionType,
        ScalarAttributeType,
    },
};

use crate::InfraError;

/// `users.email` の GSI 名
pub const EMAIL_INDEX: &str = "email-index";
/// `houses.join_code` の GSI 名
pub const JOIN_CODE_INDEX: &str = "join_code-index";
/// `chores` / `groceries` / `expenses` / `reservations` の `house_id` GSI 名
pub const HOUSE_ID_INDEX: &str = "house_id-index";
/// `chores.user_email` の GSI 名
pub const USER_EMAIL_INDEX: &str = "user_email-index";

/// DynamoDB クライアントを作成する
///
/// # 引数
///
/// * `endpoint` - DynamoDB Local 等のエンドポイント URL。`None` の場合は AWS
///   の標準エンドポイントとクレデンシャルチェーンを使用する
/// * `region` - リージョン名
pub async fn create_client(endpoint: Option<&str>, region: &str) -> Client {
    let loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(region.to_string()));

    let loader = match endpoint {
        Some(endpoint) => loader
            .endpoint_url(endpoint)
            // DynamoDB Local はクレデンシャルを検証しないが、SDK はプロバイダが必要
            .credentials_provider(aws_sdk_dynamodb::config::Credentials::new(
                "local", "local", None, None, "local",
            )),
        None => loader,
    };

    Client::new(&loader.load().await)
}

/// テーブル名の一覧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub users:        String,
    pub houses:       String,
    pub chores:       String,
    pub groceries:    String,
    pub expenses:     String,
    pub reservations: String,
}

impl TableNames {
    /// 接頭辞付きのテーブル名を作成する
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            users:        format!("{prefix}users"),
            houses:       format!("{prefix}houses"),
            chores:       format!("{prefix}chores"),
            groceries:    format!("{prefix}groceries"),
            expenses:     format!("{prefix}expenses"),
            reservations: format!("{prefix}reservations"),
        }
    }

    /// 各テーブルのスキーマ定義
    pub fn specs(&self) -> Vec<TableSpec> {
        vec![
            TableSpec {
                table_name:    self.users.clone(),
                partition_key: "uid",
                indexes:       vec![(EMAIL_INDEX, "email")],
            },
            TableSpec {
                table_name:    self.houses.clone(),
                partition_key: "house_id",
                indexes:       vec![(JOIN_CODE_INDEX, "join_code")],
            },
            TableSpec {
                table_name:    self.chores.clone(),
                partition_key: "chore_id",
                indexes:       vec![
                    (HOUSE_ID_INDEX, "house_id"),
                    (USER_EMAIL_INDEX, "user_email"),
                ],
            },
            TableSpec {
                table_name:    self.groceries.clone(),
                partition_key: "grocery_id",
                indexes:       vec![(HOUSE_ID_INDEX, "house_id")],
            },
            TableSpec {
                table_name:    self.expenses.clone(),
                partition_key: "expense_id",
                indexes:       vec![(HOUSE_ID_INDEX, "house_id")],
            },
            TableSpec {
                table_name:    self.reservations.clone(),
                partition_key: "reservation_id",
                indexes:       vec![(HOUSE_ID_INDEX, "house_id")],
            },
        ]
    }
}

/// テーブルのスキーマ定義
///
/// すべてのキー属性は String 型。GSI は `(インデックス名, 属性名)` の組で、
/// 射影は ALL とする。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub table_name:    String,
    pub partition_key: &'static str,
    pub indexes:       Vec<(&'static str, &'static str)>,
}

/// すべてのテーブルが存在しなければ作成する（冪等）
pub async fn ensure_tables(client: &Client, names: &TableNames) -> Result<(), InfraError> {
    for spec in names.specs() {
        ensure_table(client, &spec).await?;
    }
    Ok(())
}

/// テーブルが存在しなければ作成する（冪等）
pub async fn ensure_table(client: &Client, spec: &TableSpec) -> Result<(), InfraError> {
    let table_name = spec.table_name.as_str();

    // テーブルの存在確認
    match client.describe_table().table_name(table_name).send().await {
        Ok(_) => {
            tracing::debug!("テーブル '{}' は既に存在します", table_name);
            return Ok(());
        }
        Err(err) => {
            // ResourceNotFoundException の場合のみテーブル作成に進む
            let is_not_found = err
                .as_service_error()
                .map(|e| e.is_resource_not_found_exception())
                .unwrap_or(false);
            if !is_not_found {
                return Err(InfraError::dynamo_db(format!(
                    "テーブル '{table_name}' の確認に失敗: {err}"
                )));
            }
        }
    }

    tracing::info!("テーブル '{}' を作成します", table_name);

    let mut request = client
        .create_table()
        .table_name(table_name)
        .key_schema(key_schema(spec.partition_key)?)
        .attribute_definitions(string_attribute(spec.partition_key)?)
        .billing_mode(BillingMode::PayPerRequest);

    for (index_name, attribute) in &spec.indexes {
        request = request
            .attribute_definitions(string_attribute(attribute)?)
            .global_secondary_indexes(
                GlobalSecondaryIndex::builder()
                    .index_name(*index_name)
                    .key_schema(key_schema(attribute)?)
                    .projection(
                        Projection::builder()
                            .projection_type(ProjectionType::All)
                            .build(),
                    )
                    .build()
                    .map_err(|e| InfraError::dynamo_db(format!("GSI 構築エラー: {e}")))?,
            );
    }

    match request.send().await {
        Ok(_) => {
            tracing::info!("テーブル '{}' を作成しました", table_name);
            Ok(())
        }
        Err(err) => {
            // ResourceInUseException は並行起動時に発生しうる（テーブルが作成中）
            let is_resource_in_use = err
                .as_service_error()
                .map(|e| e.is_resource_in_use_exception())
                .unwrap_or(false);
            if !is_resource_in_use {
                return Err(InfraError::dynamo_db(format!(
                    "テーブル '{table_name}' の作成に失敗: {err}"
                )));
            }
            tracing::debug!(
                "テーブル '{}' は既に作成中または存在します（ResourceInUseException）",
                table_name
            );
            Ok(())
        }
    }
}

fn key_schema(attribute: &str) -> Result<KeySchemaElement, InfraError> {
    KeySchemaElement::builder()
        .attribute_name(attribute)
        .key_type(KeyType::Hash)
        .build()
        .map_err(|e| InfraError::dynamo_db(format!("KeySchema 構築エラー: {e}")))
}

fn string_attribute(attribute: &str) -> Result<AttributeDefinition, InfraError> {
    AttributeDefinition::builder()
        .attribute_name(attribute)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(|e| InfraError::dynamo_db(format!("AttributeDefinition 構築エラー: {e}")))
}
