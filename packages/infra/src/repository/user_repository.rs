//! # UserRepository
//!
//! ユーザードキュメントの永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **PK = uid**: ID プロバイダのユーザー ID をそのままキーにする
//! - **メールで逆引き**: `email-index` GSI でメンバー一覧・担当者から引けるようにする
//! - **upsert で実体化**: 認証済みユーザーが書き込み系の操作をするたびに
//!   `uid` と `email` を `UpdateItem` で upsert する（初回は残高 0 で作成）
//! - **残高はアトミック加算**: `ADD balance :amount` で読み取りと書き込みの競合を避ける

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    Client,
    error::DisplayErrorContext,
    types::{AttributeValue, ReturnValue},
};
use chrono::{DateTime, Utc};
use roomiez_domain::{
    house::HouseId,
    user::{BalanceChange, Email, PersonName, Uid, User},
};

use super::item::{
    Item,
    get_opt_f64,
    get_opt_s,
    get_opt_timestamp,
    get_s,
    invalid_stored,
};
use crate::{InfraError, dynamodb::EMAIL_INDEX};

/// ユーザーリポジトリトレイト
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// uid でユーザーを検索する
    async fn find_by_uid(&self, uid: &Uid) -> Result<Option<User>, InfraError>;

    /// メールアドレスでユーザーを検索する
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, InfraError>;

    /// ID プロバイダの情報でユーザーを upsert する
    ///
    /// 存在しなければ残高 0・ハウス未所属で作成し、存在すればメールアドレスを更新する。
    async fn upsert_identity(
        &self,
        uid: &Uid,
        email: &Email,
        now: DateTime<Utc>,
    ) -> Result<User, InfraError>;

    /// 所属ハウスを設定する
    async fn set_house(
        &self,
        uid: &Uid,
        house_id: &HouseId,
        now: DateTime<Utc>,
    ) -> Result<(), InfraError>;

    /// 残高に加算する（負の値で減算）
    async fn add_balance(
        &self,
        uid: &Uid,
        amount: f64,
        now: DateTime<Utc>,
    ) -> Result<BalanceChange, InfraError>;

    /// 氏名を更新する（`None` のフィールドは変更しない）
    async fn update_profile(
        &self,
        uid: &Uid,
        first_name: Option<&PersonName>,
        last_name: Option<&PersonName>,
        now: DateTime<Utc>,
    ) -> Result<User, InfraError>;
}

/// DynamoDB 実装の UserRepository
pub struct DynamoDbUserRepository {
    client:     Client,
    table_name: String,
}

impl DynamoDbUserRepository {
    pub fn new(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }
}

#[async_trait]
impl UserRepository for DynamoDbUserRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%uid))]
    async fn find_by_uid(&self, uid: &Uid) -> Result<Option<User>, InfraError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("uid", AttributeValue::S(uid.as_str().to_string()))
            .send()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!("ユーザーの取得に失敗: {}", DisplayErrorContext(e)))
            })?;

        output.item().map(convert_item_to_user).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, InfraError> {
        let output = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(EMAIL_INDEX)
            .key_condition_expression("email = :email")
            .expression_attribute_values(":email", AttributeValue::S(email.as_str().to_string()))
            .limit(1)
            .send()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!(
                    "メールアドレスでのユーザー検索に失敗: {}",
                    DisplayErrorContext(e)
                ))
            })?;

        output.items().first().map(convert_item_to_user).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%uid))]
    async fn upsert_identity(
        &self,
        uid: &Uid,
        email: &Email,
        now: DateTime<Utc>,
    ) -> Result<User, InfraError> {
        let output = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("uid", AttributeValue::S(uid.as_str().to_string()))
            .update_expression(
                "SET email = :email, updated_at = :now, \
                 created_at = if_not_exists(created_at, :now), \
                 balance = if_not_exists(balance, :zero)",
            )
            .expression_attribute_values(":email", AttributeValue::S(email.as_str().to_string()))
            .expression_attribute_values(":now", AttributeValue::S(now.to_rfc3339()))
            .expression_attribute_values(":zero", AttributeValue::N("0".to_string()))
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!("ユーザーの upsert に失敗: {}", DisplayErrorContext(e)))
            })?;

        let attributes = output
            .attributes()
            .ok_or_else(|| InfraError::unexpected("upsert の結果に属性が含まれていません"))?;
        convert_item_to_user(attributes)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%uid, %house_id))]
    async fn set_house(
        &self,
        uid: &Uid,
        house_id: &HouseId,
        now: DateTime<Utc>,
    ) -> Result<(), InfraError> {
        self.client
            .update_item()
            .table_name(&self.table_name)
            .key("uid", AttributeValue::S(uid.as_str().to_string()))
            .update_expression("SET house_id = :house_id, updated_at = :now")
            .expression_attribute_values(":house_id", AttributeValue::S(house_id.to_string()))
            .expression_attribute_values(":now", AttributeValue::S(now.to_rfc3339()))
            .send()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!(
                    "所属ハウスの更新に失敗: {}",
                    DisplayErrorContext(e)
                ))
            })?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%uid))]
    async fn add_balance(
        &self,
        uid: &Uid,
        amount: f64,
        now: DateTime<Utc>,
    ) -> Result<BalanceChange, InfraError> {
        // 加算後の値は DynamoDB が 10 進で計算したものを UPDATED_NEW で受け取る
        let output = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("uid", AttributeValue::S(uid.as_str().to_string()))
            .update_expression("ADD balance :amount SET updated_at = :now")
            .expression_attribute_values(":amount", AttributeValue::N(amount.to_string()))
            .expression_attribute_values(":now", AttributeValue::S(now.to_rfc3339()))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!("残高の更新に失敗: {}", DisplayErrorContext(e)))
            })?;

        let attributes = output
            .attributes()
            .ok_or_else(|| InfraError::unexpected("残高更新の結果に属性が含まれていません"))?;
        balance_change_from_updated(attributes, amount)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%uid))]
    async fn update_profile(
        &self,
        uid: &Uid,
        first_name: Option<&PersonName>,
        last_name: Option<&PersonName>,
        now: DateTime<Utc>,
    ) -> Result<User, InfraError> {
        let mut set_parts = vec!["updated_at = :now"];
        let mut request = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("uid", AttributeValue::S(uid.as_str().to_string()))
            .expression_attribute_values(":now", AttributeValue::S(now.to_rfc3339()))
            .return_values(ReturnValue::AllNew);

        if let Some(first_name) = first_name {
            set_parts.push("first_name = :first_name");
            request = request.expression_attribute_values(
                ":first_name",
                AttributeValue::S(first_name.as_str().to_string()),
            );
        }
        if let Some(last_name) = last_name {
            set_parts.push("last_name = :last_name");
            request = request.expression_attribute_values(
                ":last_name",
                AttributeValue::S(last_name.as_str().to_string()),
            );
        }

        let output = request
            .update_expression(format!("SET {}", set_parts.join(", ")))
            .send()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!(
                    "プロフィールの更新に失敗: {}",
                    DisplayErrorContext(e)
                ))
            })?;

        let attributes = output
            .attributes()
            .ok_or_else(|| InfraError::unexpected("更新結果に属性が含まれていません"))?;
        convert_item_to_user(attributes)
    }
}

/// `ADD` の UPDATED_NEW 結果から残高の変更内容を求める
///
/// 加算後の値は保存値そのもの。加算前の値はそこから差し引いて求める。
fn balance_change_from_updated(
    attributes: &Item,
    amount: f64,
) -> Result<BalanceChange, InfraError> {
    let current = get_opt_f64(attributes, "balance")?
        .ok_or_else(|| InfraError::unexpected("残高更新の結果に balance が含まれていません"))?;

    Ok(BalanceChange {
        previous: current - amount,
        current,
    })
}

/// DynamoDB アイテムを User に変換する
fn convert_item_to_user(item: &Item) -> Result<User, InfraError> {
    let uid = Uid::new(get_s(item, "uid")?).map_err(invalid_stored("uid"))?;
    let email = Email::new(get_s(item, "email")?).map_err(invalid_stored("email"))?;

    let house_id = get_opt_s(item, "house_id")
        .map(|s| {
            HouseId::parse(&s)
                .ok_or_else(|| InfraError::dynamo_db(format!("house_id のパースに失敗: {s}")))
        })
        .transpose()?;

    let first_name = get_opt_s(item, "first_name")
        .map(PersonName::new)
        .transpose()
        .map_err(invalid_stored("first_name"))?;
    let last_name = get_opt_s(item, "last_name")
        .map(PersonName::new)
        .transpose()
        .map_err(invalid_stored("last_name"))?;

    Ok(User::from_stored(
        uid,
        email,
        house_id,
        get_opt_f64(item, "balance")?.unwrap_or(0.0),
        first_name,
        last_name,
        get_opt_timestamp(item, "created_at")?,
        get_opt_timestamp(item, "updated_at")?,
    ))
}
