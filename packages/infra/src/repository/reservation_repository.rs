//! # ReservationRepository
//!
//! 共用スペースの予約の永続化を担当するリポジトリ。
//!
//! 日付は `YYYY-MM-DD`、時刻は `HH:MM` の文字列で保存する。

use async_trait::async_trait;
use aws_sdk_dynamodb::{Client, error::DisplayErrorContext, types::AttributeValue};
use roomiez_domain::{
    house::HouseId,
    reservation::{Location, Reservation, ReservationId, TimeSlot},
    user::{Email, Uid},
};

use super::item::{Item, get_s, get_timestamp, invalid_stored};
use crate::{InfraError, dynamodb::HOUSE_ID_INDEX};

/// 予約リポジトリトレイト
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// 予約を追加する
    async fn insert(&self, reservation: &Reservation) -> Result<(), InfraError>;

    /// ID で予約を検索する
    async fn find_by_id(&self, id: &ReservationId) -> Result<Option<Reservation>, InfraError>;

    /// ハウスの予約を一覧する（順序不定）
    async fn find_by_house(&self, house_id: &HouseId) -> Result<Vec<Reservation>, InfraError>;

    /// 予約を削除する
    async fn delete(&self, id: &ReservationId) -> Result<(), InfraError>;
}

/// DynamoDB 実装の ReservationRepository
pub struct DynamoDbReservationRepository {
    client:     Client,
    table_name: String,
}

impl DynamoDbReservationRepository {
    pub fn new(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }
}

#[async_trait]
impl ReservationRepository for DynamoDbReservationRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(reservation_id = %reservation.id()))]
    async fn insert(&self, reservation: &Reservation) -> Result<(), InfraError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(convert_reservation_to_item(reservation)))
            .condition_expression("attribute_not_exists(reservation_id)")
            .send()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!("予約の追加に失敗: {}", DisplayErrorContext(e)))
            })?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: &ReservationId) -> Result<Option<Reservation>, InfraError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("reservation_id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!("予約の取得に失敗: {}", DisplayErrorContext(e)))
            })?;

        output.item().map(convert_item_to_reservation).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%house_id))]
    async fn find_by_house(&self, house_id: &HouseId) -> Result<Vec<Reservation>, InfraError> {
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
                InfraError::dynamo_db(format!("予約の検索に失敗: {}", DisplayErrorContext(e)))
            })?;

        items.iter().map(convert_item_to_reservation).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn delete(&self, id: &ReservationId) -> Result<(), InfraError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("reservation_id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!("予約の削除に失敗: {}", DisplayErrorContext(e)))
            })?;

        Ok(())
    }
}

fn convert_reservation_to_item(reservation: &Reservation) -> Item {
    let slot = reservation.slot();
    let mut item = Item::new();
    item.insert(
        "reservation_id".to_string(),
        AttributeValue::S(reservation.id().to_string()),
    );
    item.insert(
        "house_id".to_string(),
        AttributeValue::S(reservation.house_id().to_string()),
    );
    item.insert("date".to_string(), AttributeValue::S(slot.date_string()));
    item.insert("start_time".to_string(), AttributeValue::S(slot.start_string()));
    item.insert("end_time".to_string(), AttributeValue::S(slot.end_string()));
    item.insert(
        "location".to_string(),
        AttributeValue::S(reservation.location().as_str().to_string()),
    );
    item.insert(
        "person_id".to_string(),
        AttributeValue::S(reservation.person_uid().as_str().to_string()),
    );
    item.insert(
        "person_email".to_string(),
        AttributeValue::S(reservation.person_email().as_str().to_string()),
    );
    item.insert(
        "person_firstname".to_string(),
        AttributeValue::S(reservation.person_firstname().to_string()),
    );
    item.insert(
        "created_at".to_string(),
        AttributeValue::S(reservation.created_at().to_rfc3339()),
    );
    item
}

fn convert_item_to_reservation(item: &Item) -> Result<Reservation, InfraError> {
    let id_str = get_s(item, "reservation_id")?;
    let id = ReservationId::parse(&id_str)
        .ok_or_else(|| InfraError::dynamo_db(format!("reservation_id のパースに失敗: {id_str}")))?;
    let house_id_str = get_s(item, "house_id")?;
    let house_id = HouseId::parse(&house_id_str)
        .ok_or_else(|| InfraError::dynamo_db(format!("house_id のパースに失敗: {house_id_str}")))?;

    let slot = TimeSlot::parse(
        &get_s(item, "date")?,
        &get_s(item, "start_time")?,
        &get_s(item, "end_time")?,
    )
    .map_err(invalid_stored("date/start_time/end_time"))?;

    Ok(Reservation::new(
        id,
        house_id,
        slot,
        Location::parse(&get_s(item, "location")?).map_err(invalid_stored("location"))?,
        Uid::new(get_s(item, "person_id")?).map_err(invalid_stored("person_id"))?,
        Email::new(get_s(item, "person_email")?).map_err(invalid_stored("person_email"))?,
        get_s(item, "person_firstname")?,
        get_timestamp(item, "created_at")?,
    ))
}
