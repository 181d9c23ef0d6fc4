//! # HouseRepository
//!
//! ハウスドキュメントの永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **PK = house_id**
//! - **参加コードで逆引き**: `join_code-index` GSI
//! - **メンバー追加は条件付き更新**: `NOT contains(members, :email)` を条件に
//!   `list_append` することで、同じメールアドレスの二重追加を DynamoDB 側で防ぐ

use async_trait::async_trait;
use aws_sdk_dynamodb::{Client, error::DisplayErrorContext, types::AttributeValue};
use roomiez_domain::{
    house::{House, HouseId, HouseName, JoinCode},
    user::{Email, Uid},
};

use super::item::{Item, get_opt_timestamp, get_s, get_string_list, invalid_stored};
use crate::{InfraError, dynamodb::JOIN_CODE_INDEX};

/// ハウスリポジトリトレイト
#[async_trait]
pub trait HouseRepository: Send + Sync {
    /// ハウスを新規作成する
    async fn insert(&self, house: &House) -> Result<(), InfraError>;

    /// ID でハウスを検索する
    async fn find_by_id(&self, id: &HouseId) -> Result<Option<House>, InfraError>;

    /// 参加コードでハウスを検索する
    async fn find_by_join_code(&self, code: &JoinCode) -> Result<Option<House>, InfraError>;

    /// メンバーを追加する
    ///
    /// # エラー
    ///
    /// 既にメンバーである場合（またはハウスが存在しない場合）は
    /// `InfraErrorKind::Conflict` を返す。
    async fn add_member(&self, id: &HouseId, email: &Email) -> Result<(), InfraError>;
}

/// DynamoDB 実装の HouseRepository
pub struct DynamoDbHouseRepository {
    client:     Client,
    table_name: String,
}

impl DynamoDbHouseRepository {
    pub fn new(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }
}

#[async_trait]
impl HouseRepository for DynamoDbHouseRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(house_id = %house.id()))]
    async fn insert(&self, house: &House) -> Result<(), InfraError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(convert_house_to_item(house)))
            .condition_expression("attribute_not_exists(house_id)")
            .send()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!("ハウスの作成に失敗: {}", DisplayErrorContext(e)))
            })?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: &HouseId) -> Result<Option<House>, InfraError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("house_id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!("ハウスの取得に失敗: {}", DisplayErrorContext(e)))
            })?;

        output.item().map(convert_item_to_house).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%code))]
    async fn find_by_join_code(&self, code: &JoinCode) -> Result<Option<House>, InfraError> {
        let output = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(JOIN_CODE_INDEX)
            .key_condition_expression("join_code = :code")
            .expression_attribute_values(":code", AttributeValue::S(code.as_str().to_string()))
            .limit(1)
            .send()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!(
                    "参加コードでのハウス検索に失敗: {}",
                    DisplayErrorContext(e)
                ))
            })?;

        output.items().first().map(convert_item_to_house).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn add_member(&self, id: &HouseId, email: &Email) -> Result<(), InfraError> {
        let email_value = AttributeValue::S(email.as_str().to_string());

        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("house_id", AttributeValue::S(id.to_string()))
            .update_expression("SET members = list_append(members, :new_members)")
            .condition_expression("attribute_exists(house_id) AND NOT contains(members, :email)")
            .expression_attribute_values(":new_members", AttributeValue::L(vec![email_value.clone()]))
            .expression_attribute_values(":email", email_value)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                let is_condition_failed = err
                    .as_service_error()
                    .map(|e| e.is_conditional_check_failed_exception())
                    .unwrap_or(false);
                if is_condition_failed {
                    return Err(InfraError::conflict("House", id.to_string()));
                }
                Err(InfraError::dynamo_db(format!(
                    "メンバーの追加に失敗: {}",
                    DisplayErrorContext(err)
                )))
            }
        }
    }
}

fn convert_house_to_item(house: &House) -> Item {
    let mut item = Item::new();
    item.insert(
        "house_id".to_string(),
        AttributeValue::S(house.id().to_string()),
    );
    item.insert(
        "house_name".to_string(),
        AttributeValue::S(house.name().as_str().to_string()),
    );
    item.insert(
        "join_code".to_string(),
        AttributeValue::S(house.join_code().as_str().to_string()),
    );
    item.insert(
        "owner_uid".to_string(),
        AttributeValue::S(house.owner_uid().as_str().to_string()),
    );
    item.insert(
        "owner_email".to_string(),
        AttributeValue::S(house.owner_email().as_str().to_string()),
    );
    item.insert(
        "members".to_string(),
        AttributeValue::L(
            house
                .members()
                .iter()
                .map(|m| AttributeValue::S(m.as_str().to_string()))
                .collect(),
        ),
    );
    if let Some(created_at) = house.created_at() {
        item.insert(
            "created_at".to_string(),
            AttributeValue::S(created_at.to_rfc3339()),
        );
    }
    item
}

/// DynamoDB アイテムを House に変換する
fn convert_item_to_house(item: &Item) -> Result<House, InfraError> {
    let house_id_str = get_s(item, "house_id")?;
    let id = HouseId::parse(&house_id_str)
        .ok_or_else(|| InfraError::dynamo_db(format!("house_id のパースに失敗: {house_id_str}")))?;

    let members = get_string_list(item, "members")?
        .into_iter()
        .map(Email::new)
        .collect::<Result<Vec<_>, _>>()
        .map_err(invalid_stored("members"))?;

    Ok(House::from_stored(
        id,
        HouseName::new(get_s(item, "house_name")?).map_err(invalid_stored("house_name"))?,
        JoinCode::new(get_s(item, "join_code")?).map_err(invalid_stored("join_code"))?,
        Uid::new(get_s(item, "owner_uid")?).map_err(invalid_stored("owner_uid"))?,
        Email::new(get_s(item, "owner_email")?).map_err(invalid_stored("owner_email"))?,
        members,
        get_opt_timestamp(item, "created_at")?,
    ))
}
