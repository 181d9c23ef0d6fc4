//! # ChoreRepository
//!
//! 家事ドキュメントの永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **PK = chore_id**
//! - **ハウス単位・担当者単位の一覧**: `house_id-index` / `user_email-index` GSI を
//!   ページネータで最後まで読み切る
//! - **並び順は呼び出し側の責務**: GSI はソートキーを持たないため順序は不定

use async_trait::async_trait;
use aws_sdk_dynamodb::{Client, error::DisplayErrorContext, types::AttributeValue};
use roomiez_domain::{
    chore::{Chore, ChoreId, ChoreName, ChoreStatus, Username},
    house::HouseId,
    user::Email,
};

use super::item::{Item, get_opt_s, get_opt_timestamp, get_s, get_timestamp, invalid_stored};
use crate::{
    InfraError,
    dynamodb::{HOUSE_ID_INDEX, USER_EMAIL_INDEX},
};

/// 家事リポジトリトレイト
#[async_trait]
pub trait ChoreRepository: Send + Sync {
    /// 家事を新規作成する
    async fn insert(&self, chore: &Chore) -> Result<(), InfraError>;

    /// ID で家事を検索する
    async fn find_by_id(&self, id: &ChoreId) -> Result<Option<Chore>, InfraError>;

    /// ハウスの家事を一覧する（順序不定）
    async fn find_by_house(&self, house_id: &HouseId) -> Result<Vec<Chore>, InfraError>;

    /// 担当者の家事を一覧する（順序不定）
    async fn find_by_assignee(&self, email: &Email) -> Result<Vec<Chore>, InfraError>;

    /// ステータスと完了日時を保存する
    ///
    /// # エラー
    ///
    /// 家事が既に削除されている場合は `InfraErrorKind::Conflict` を返す。
    async fn update_status(&self, chore: &Chore) -> Result<(), InfraError>;

    /// 家事を削除する
    async fn delete(&self, id: &ChoreId) -> Result<(), InfraError>;
}

/// DynamoDB 実装の ChoreRepository
pub struct DynamoDbChoreRepository {
    client:     Client,
    table_name: String,
}

impl DynamoDbChoreRepository {
    pub fn new(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }

    async fn query_index(
        &self,
        index_name: &str,
        attribute: &str,
        value: &str,
    ) -> Result<Vec<Chore>, InfraError> {
        let items = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(index_name)
            .key_condition_expression(format!("{attribute} = :value"))
            .expression_attribute_values(":value", AttributeValue::S(value.to_string()))
            .into_paginator()
            .items()
            .send()
            .try_collect()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!(
                    "家事の検索に失敗（{index_name}）: {}",
                    DisplayErrorContext(e)
                ))
            })?;

        items.iter().map(convert_item_to_chore).collect()
    }
}

#[async_trait]
impl ChoreRepository for DynamoDbChoreRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(chore_id = %chore.id()))]
    async fn insert(&self, chore: &Chore) -> Result<(), InfraError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(convert_chore_to_item(chore)))
            .condition_expression("attribute_not_exists(chore_id)")
            .send()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!("家事の作成に失敗: {}", DisplayErrorContext(e)))
            })?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: &ChoreId) -> Result<Option<Chore>, InfraError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("chore_id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!("家事の取得に失敗: {}", DisplayErrorContext(e)))
            })?;

        output.item().map(convert_item_to_chore).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%house_id))]
    async fn find_by_house(&self, house_id: &HouseId) -> Result<Vec<Chore>, InfraError> {
        self.query_index(HOUSE_ID_INDEX, "house_id", &house_id.to_string())
            .await
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_by_assignee(&self, email: &Email) -> Result<Vec<Chore>, InfraError> {
        self.query_index(USER_EMAIL_INDEX, "user_email", email.as_str())
            .await
    }

    #[tracing::instrument(skip_all, level = "debug", fields(chore_id = %chore.id()))]
    async fn update_status(&self, chore: &Chore) -> Result<(), InfraError> {
        let request = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("chore_id", AttributeValue::S(chore.id().to_string()))
            .condition_expression("attribute_exists(chore_id)")
            // "status" は DynamoDB の予約語のため、ExpressionAttributeNames で回避
            .expression_attribute_names("#status", "status")
            .expression_attribute_values(":status", AttributeValue::S(chore.status().to_string()));

        let request = match chore.completed_at() {
            Some(completed_at) => request
                .update_expression("SET #status = :status, completed_at = :completed_at")
                .expression_attribute_values(
                    ":completed_at",
                    AttributeValue::S(completed_at.to_rfc3339()),
                ),
            None => request.update_expression("SET #status = :status REMOVE completed_at"),
        };

        match request.send().await {
            Ok(_) => Ok(()),
            Err(err) => {
                let is_condition_failed = err
                    .as_service_error()
                    .map(|e| e.is_conditional_check_failed_exception())
                    .unwrap_or(false);
                if is_condition_failed {
                    return Err(InfraError::conflict("Chore", chore.id().to_string()));
                }
                Err(InfraError::dynamo_db(format!(
                    "家事のステータス更新に失敗: {}",
                    DisplayErrorContext(err)
                )))
            }
        }
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn delete(&self, id: &ChoreId) -> Result<(), InfraError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("chore_id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!("家事の削除に失敗: {}", DisplayErrorContext(e)))
            })?;

        Ok(())
    }
}

fn convert_chore_to_item(chore: &Chore) -> Item {
    let mut item = Item::new();
    item.insert(
        "chore_id".to_string(),
        AttributeValue::S(chore.id().to_string()),
    );
    item.insert(
        "house_id".to_string(),
        AttributeValue::S(chore.house_id().to_string()),
    );
    item.insert(
        "user_email".to_string(),
        AttributeValue::S(chore.user_email().as_str().to_string()),
    );
    item.insert(
        "chore_name".to_string(),
        AttributeValue::S(chore.name().as_str().to_string()),
    );
    if let Some(username) = chore.username() {
        item.insert(
            "username".to_string(),
            AttributeValue::S(username.as_str().to_string()),
        );
    }
    item.insert(
        "status".to_string(),
        AttributeValue::S(chore.status().to_string()),
    );
    item.insert(
        "assigned_at".to_string(),
        AttributeValue::S(chore.assigned_at().to_rfc3339()),
    );
    if let Some(completed_at) = chore.completed_at() {
        item.insert(
            "completed_at".to_string(),
            AttributeValue::S(completed_at.to_rfc3339()),
        );
    }
    item
}

/// DynamoDB アイテムを Chore に変換する
fn convert_item_to_chore(item: &Item) -> Result<Chore, InfraError> {
    let chore_id_str = get_s(item, "chore_id")?;
    let id = ChoreId::parse(&chore_id_str)
        .ok_or_else(|| InfraError::dynamo_db(format!("chore_id のパースに失敗: {chore_id_str}")))?;
    let house_id_str = get_s(item, "house_id")?;
    let house_id = HouseId::parse(&house_id_str)
        .ok_or_else(|| InfraError::dynamo_db(format!("house_id のパースに失敗: {house_id_str}")))?;

    // status 未設定は Pending とみなす
    let status = match get_opt_s(item, "status") {
        Some(s) => ChoreStatus::parse(&s).map_err(invalid_stored("status"))?,
        None => ChoreStatus::default(),
    };

    let username = get_opt_s(item, "username")
        .map(Username::new)
        .transpose()
        .map_err(invalid_stored("username"))?;

    Ok(Chore::from_stored(
        id,
        house_id,
        Email::new(get_s(item, "user_email")?).map_err(invalid_stored("user_email"))?,
        ChoreName::new(get_s(item, "chore_name")?).map_err(invalid_stored("chore_name"))?,
        username,
        status,
        get_timestamp(item, "assigned_at")?,
        get_opt_timestamp(item, "completed_at")?,
    ))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::*;

    fn chore() -> Chore {
        Chore::new(
            ChoreId::new(),
            HouseId::new(),
            Email::new("alex@example.com").unwrap(),
            ChoreName::new("Dishes").unwrap(),
            None,
            Utc::now(),
        )
    }

    #[test]
    fn test_pendingの家事はcompleted_atとusernameを書き込まない() {
        let item = convert_chore_to_item(&chore());

        assert_eq!(item.get("status").unwrap().as_s().unwrap(), "Pending");
        assert!(!item.contains_key("completed_at"));
        assert!(!item.contains_key("username"));
    }

    #[test]
    fn test_status未設定のアイテムはpendingとして読み込む() {
        let mut item = convert_chore_to_item(&chore());
        item.remove("status");

        let restored = convert_item_to_chore(&item).unwrap();
        assert_eq!(restored.status(), ChoreStatus::Pending);
    }

    #[test]
    fn test_完了済みの家事は完了日時を保持する() {
        let now = Utc::now();
        let completed = chore().with_status(ChoreStatus::Completed, now);

        let restored = convert_item_to_chore(&convert_chore_to_item(&completed)).unwrap();

        assert_eq!(restored.status(), ChoreStatus::Completed);
        assert!(restored.completed_at().is_some());
    }

    #[test]
    fn test_不正なstatusはエラーになる() {
        let mut item = convert_chore_to_item(&chore());
        item.insert("status".to_string(), AttributeValue::S("Done".to_string()));

        assert!(convert_item_to_chore(&item).is_err());
    }
}
