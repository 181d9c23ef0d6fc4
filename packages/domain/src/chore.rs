//! # 家事
//!
//! ハウスのメンバーに割り当てられる家事タスク。
//!
//! ## 状態遷移
//!
//! ```text
//! Pending ⇄ Completed
//! ```
//!
//! `Completed` に遷移したときに `completed_at` を記録し、
//! `Pending` に戻したときはクリアする。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{DomainError, house::HouseId, user::Email};

define_uuid_id! {
    /// 家事 ID
    pub struct ChoreId;
}

define_validated_string! {
    /// 家事名
    pub struct ChoreName {
        label: "Chore name",
        max_length: 200,
    }
}

define_validated_string! {
    /// 担当者の表示名
    pub struct Username {
        label: "Username",
        max_length: 100,
    }
}

/// 家事のステータス
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
pub enum ChoreStatus {
    /// 未完了
    #[default]
    Pending,
    /// 完了
    Completed,
}

impl ChoreStatus {
    /// クライアント入力からステータスをパースする
    ///
    /// # エラー
    ///
    /// `"Pending"` / `"Completed"` 以外は `DomainError::Validation` を返す。
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        value
            .trim()
            .parse()
            .map_err(|_| DomainError::Validation(format!("Invalid chore status: {value}")))
    }
}

/// 家事エンティティ
#[derive(Debug, Clone, PartialEq)]
pub struct Chore {
    id:           ChoreId,
    house_id:     HouseId,
    user_email:   Email,
    name:         ChoreName,
    username:     Option<Username>,
    status:       ChoreStatus,
    assigned_at:  DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Chore {
    /// 新しい家事を作成する（ステータスは `Pending`）
    pub fn new(
        id: ChoreId,
        house_id: HouseId,
        user_email: Email,
        name: ChoreName,
        username: Option<Username>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            house_id,
            user_email,
            name,
            username,
            status: ChoreStatus::Pending,
            assigned_at: now,
            completed_at: None,
        }
    }

    /// 永続化済みのデータから復元する
    #[allow(clippy::too_many_arguments)]
    pub fn from_stored(
        id: ChoreId,
        house_id: HouseId,
        user_email: Email,
        name: ChoreName,
        username: Option<Username>,
        status: ChoreStatus,
        assigned_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            house_id,
            user_email,
            name,
            username,
            status,
            assigned_at,
            completed_at,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> &ChoreId {
        &self.id
    }

    pub fn house_id(&self) -> &HouseId {
        &self.house_id
    }

    pub fn user_email(&self) -> &Email {
        &self.user_email
    }

    pub fn name(&self) -> &ChoreName {
        &self.name
    }

    pub fn username(&self) -> Option<&Username> {
        self.username.as_ref()
    }

    pub fn status(&self) -> ChoreStatus {
        self.status
    }

    pub fn assigned_at(&self) -> DateTime<Utc> {
        self.assigned_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// 指定したハウスの家事か
    pub fn belongs_to(&self, house_id: &HouseId) -> bool {
        &self.house_id == house_id
    }

    /// ステータスを変更する
    pub fn with_status(self, status: ChoreStatus, now: DateTime<Utc>) -> Self {
        let completed_at = match status {
            ChoreStatus::Completed => Some(now),
            ChoreStatus::Pending => None,
        };
        Self {
            status,
            completed_at,
            ..self
        }
    }
}
