//! # GroceryRepository
//!
//! 共有買い物リストの永続化を担当するリポジトリ。

use async_trait::async_trait;
use aws_sdk_dynamodb::{Client, error::DisplayErrorContext, types::AttributeValue};
use roomiez_domain::{
    grocery::{GroceryItem, GroceryItemId, GroceryItemName},
    house::HouseId,
    user::Email,
};

use super::item::{Item, get_opt_bool, get_s, get_timestamp, invalid_stored};
use crate::{InfraError, dynamodb::HOUSE_ID_INDEX};

/// 買い物リストリポジトリトレイト
#[async_trait]
pub trait GroceryRepository: Send + Sync {
    /// アイテムを追加する
    async fn insert(&self, item: &GroceryItem) -> Result<(), InfraError>;

    /// ID でアイテムを検索する
    async fn find_by_id(&self, id: &GroceryItemId) -> Result<Option<GroceryItem>, InfraError>;

    /// ハウスのアイテムを一覧する（順序不定）
    async fn find_by_house(&self, house_id: &HouseId) -> Result<Vec<GroceryItem>, InfraError>;

    /// アイテムを削除する
    async fn delete(&self, id: &GroceryItemId) -> Result<(), InfraError>;
}

/// DynamoDB 実装の GroceryRepository
pub struct DynamoDbGroceryRepository {
    client:     Client,
    table_name: String,
}

impl DynamoDbGroceryRepository {
    pub fn new(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }
}

#[async_trait]
impl GroceryRepository for DynamoDbGroceryRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(grocery_id = %item.id()))]
    async fn insert(&self, item: &GroceryItem) -> Result<(), InfraError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(convert_grocery_to_item(item)))
            .condition_expression("attribute_not_exists(grocery_id)")
            .send()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!(
                    "買い物アイテムの追加に失敗: {}",
                    DisplayErrorContext(e)
                ))
            })?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: &GroceryItemId) -> Result<Option<GroceryItem>, InfraError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("grocery_id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!(
                    "買い物アイテムの取得に失敗: {}",
                    DisplayErrorContext(e)
                ))
            })?;

        output.item().map(convert_item_to_grocery).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%house_id))]
    async fn find_by_house(&self, house_id: &HouseId) -> Result<Vec<GroceryItem>, InfraError> {
        let items = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(HOUSE_ID_INDEX)
            .key_condition_expression("house_id = :house_id")
            .expression_attribute_values(":house_id", AttributeValue::S(house_id.to_string()))
            .into_paginator()
            .items()
            .send()
            .try_collect()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!(
                    "買い物リストの検索に失敗: {}",
                    DisplayErrorContext(e)
                ))
            })?;

        items.iter().map(convert_item_to_grocery).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn delete(&self, id: &GroceryItemId) -> Result<(), InfraError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("grocery_id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!(
                    "買い物アイテムの削除に失敗: {}",
                    DisplayErrorContext(e)
                ))
            })?;

        Ok(())
    }
}

fn convert_grocery_to_item(grocery: &GroceryItem) -> Item {
    let mut item = Item::new();
    item.insert(
        "grocery_id".to_string(),
        AttributeValue::S(grocery.id().to_string()),
    );
    item.insert(
        "item_name".to_string(),
        AttributeValue::S(grocery.name().as_str().to_string()),
    );
    item.insert(
        "house_id".to_string(),
        AttributeValue::S(grocery.house_id().to_string()),
    );
    item.insert(
        "added_by".to_string(),
        AttributeValue::S(grocery.added_by().as_str().to_string()),
    );
    item.insert(
        "completed".to_string(),
        AttributeValue::Bool(grocery.is_completed()),
    );
    item.insert(
        "added_at".to_string(),
        AttributeValue::S(grocery.added_at().to_rfc3339()),
    );
    item
}

fn convert_item_to_grocery(item: &Item) -> Result<GroceryItem, InfraError> {
    let id_str = get_s(item, "grocery_id")?;
    let id = GroceryItemId::parse(&id_str)
        .ok_or_else(|| InfraError::dynamo_db(format!("grocery_id のパースに失敗: {id_str}")))?;
    let house_id_str = get_s(item, "house_id")?;
    let house_id = HouseId::parse(&house_id_str)
        .ok_or_else(|| InfraError::dynamo_db(format!("house_id のパースに失敗: {house_id_str}")))?;

    Ok(GroceryItem::from_stored(
        id,
        GroceryItemName::new(get_s(item, "item_name")?).map_err(invalid_stored("item_name"))?,
        house_id,
        Email::new(get_s(item, "added_by")?).map_err(invalid_stored("added_by"))?,
        get_opt_bool(item, "completed").unwrap_or(false),
        get_timestamp(item, "added_at")?,
    ))
}
