//! # ExpenseRepository
//!
//! 立替の永続化を担当するリポジトリ。
//!
//! 参加者の残高は立替とは別に `UserRepository::add_balance` で 1 人ずつ更新する。
//! ここでは立替そのものの記録だけを扱う。

use async_trait::async_trait;
use aws_sdk_dynamodb::{Client, error::DisplayErrorContext, types::AttributeValue};
use roomiez_domain::{
    expense::{Expense, ExpenseDescription, ExpenseId},
    house::HouseId,
    money::Money,
    user::Email,
};

use super::item::{
    Item,
    get_opt_bool,
    get_opt_f64,
    get_s,
    get_string_list,
    get_timestamp,
    invalid_stored,
};
use crate::{InfraError, dynamodb::HOUSE_ID_INDEX};

/// 立替リポジトリトレイト
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    /// 立替を記録する
    async fn insert(&self, expense: &Expense) -> Result<(), InfraError>;

    /// ハウスの立替を一覧する（順序不定）
    async fn find_by_house(&self, house_id: &HouseId) -> Result<Vec<Expense>, InfraError>;
}

/// DynamoDB 実装の ExpenseRepository
pub struct DynamoDbExpenseRepository {
    client:     Client,
    table_name: String,
}

impl DynamoDbExpenseRepository {
    pub fn new(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }
}

#[async_trait]
impl ExpenseRepository for DynamoDbExpenseRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(expense_id = %expense.id()))]
    async fn insert(&self, expense: &Expense) -> Result<(), InfraError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(convert_expense_to_item(expense)))
            .condition_expression("attribute_not_exists(expense_id)")
            .send()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!("立替の記録に失敗: {}", DisplayErrorContext(e)))
            })?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%house_id))]
    async fn find_by_house(&self, house_id: &HouseId) -> Result<Vec<Expense>, InfraError> {
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
                InfraError::dynamo_db(format!("立替の検索に失敗: {}", DisplayErrorContext(e)))
            })?;

        items.iter().map(convert_item_to_expense).collect()
    }
}

fn convert_expense_to_item(expense: &Expense) -> Item {
    let mut item = Item::new();
    item.insert(
        "expense_id".to_string(),
        AttributeValue::S(expense.id().to_string()),
    );
    item.insert(
        "house_id".to_string(),
        AttributeValue::S(expense.house_id().to_string()),
    );
    item.insert(
        "description".to_string(),
        AttributeValue::S(expense.description().as_str().to_string()),
    );
    item.insert(
        "amount".to_string(),
        AttributeValue::N(expense.amount().value().to_string()),
    );
    item.insert(
        "paid_by".to_string(),
        AttributeValue::S(expense.paid_by().as_str().to_string()),
    );
    item.insert(
        "split_between".to_string(),
        AttributeValue::L(
            expense
                .split_between()
                .iter()
                .map(|e| AttributeValue::S(e.as_str().to_string()))
                .collect(),
        ),
    );
    item.insert(
        "amount_per_person".to_string(),
        AttributeValue::N(expense.amount_per_person().to_string()),
    );
    item.insert("settled".to_string(), AttributeValue::Bool(expense.is_settled()));
    item.insert(
        "created_at".to_string(),
        AttributeValue::S(expense.created_at().to_rfc3339()),
    );
    item
}

fn convert_item_to_expense(item: &Item) -> Result<Expense, InfraError> {
    let id_str = get_s(item, "expense_id")?;
    let id = ExpenseId::parse(&id_str)
        .ok_or_else(|| InfraError::dynamo_db(format!("expense_id のパースに失敗: {id_str}")))?;
    let house_id_str = get_s(item, "house_id")?;
    let house_id = HouseId::parse(&house_id_str)
        .ok_or_else(|| InfraError::dynamo_db(format!("house_id のパースに失敗: {house_id_str}")))?;

    let amount = get_opt_f64(item, "amount")?
        .ok_or_else(|| InfraError::dynamo_db("属性 'amount' が見つかりません"))?;
    let amount_per_person = get_opt_f64(item, "amount_per_person")?
        .ok_or_else(|| InfraError::dynamo_db("属性 'amount_per_person' が見つかりません"))?;
    let split_between = get_string_list(item, "split_between")?
        .into_iter()
        .map(Email::new)
        .collect::<Result<Vec<_>, _>>()
        .map_err(invalid_stored("split_between"))?;

    Ok(Expense::from_stored(
        id,
        house_id,
        ExpenseDescription::new(get_s(item, "description")?)
            .map_err(invalid_stored("description"))?,
        Money::new(amount).map_err(invalid_stored("amount"))?,
        Email::new(get_s(item, "paid_by")?).map_err(invalid_stored("paid_by"))?,
        split_between,
        amount_per_person,
        get_opt_bool(item, "settled").unwrap_or(false),
        get_timestamp(item, "created_at")?,
    ))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::*;

    fn expense() -> Expense {
        let alex = Email::new("alex@example.com").unwrap();
        Expense::new(
            ExpenseId::new(),
            HouseId::new(),
            ExpenseDescription::new("Utilities").unwrap(),
            Money::positive(90.0).unwrap(),
            alex.clone(),
            vec![
                alex,
                Email::new("sam@example.com").unwrap(),
                Email::new("jo@example.com").unwrap(),
            ],
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_参加者はメールアドレスのリストとして保存する() {
        let item = convert_expense_to_item(&expense());

        assert_eq!(
            get_string_list(&item, "split_between").unwrap(),
            vec![
                "alex@example.com".to_string(),
                "sam@example.com".to_string(),
                "jo@example.com".to_string(),
            ]
        );
        assert_eq!(get_opt_f64(&item, "amount_per_person").unwrap(), Some(30.0));
    }

    #[test]
    fn test_保存したアイテムから参加者と金額を復元できる() {
        let original = expense();
        let item = convert_expense_to_item(&original);

        let restored = convert_item_to_expense(&item).unwrap();

        assert_eq!(restored.split_between(), original.split_between());
        assert_eq!(restored.amount(), original.amount());
        assert!(!restored.is_settled());
    }

    #[test]
    fn test_amountのないアイテムはエラーになる() {
        let mut item = convert_expense_to_item(&expense());
        item.remove("amount");

        assert!(convert_item_to_expense(&item).is_err());
    }
}
