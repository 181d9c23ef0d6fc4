//! # 買い物リスト
//!
//! ハウスで共有する買い物アイテム。

use chrono::{DateTime, Utc};

use crate::{house::HouseId, user::Email};

define_uuid_id! {
    /// 買い物アイテム ID
    pub struct GroceryItemId;
}

define_validated_string! {
    /// アイテム名
    pub struct GroceryItemName {
        label: "Item name",
        max_length: 100,
    }
}

/// 買い物アイテムエンティティ
#[derive(Debug, Clone, PartialEq)]
pub struct GroceryItem {
    id:        GroceryItemId,
    name:      GroceryItemName,
    house_id:  HouseId,
    added_by:  Email,
    completed: bool,
    added_at:  DateTime<Utc>,
}

impl GroceryItem {
    pub fn new(
        id: GroceryItemId,
        name: GroceryItemName,
        house_id: HouseId,
        added_by: Email,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            house_id,
            added_by,
            completed: false,
            added_at: now,
        }
    }

    pub fn from_stored(
        id: GroceryItemId,
        name: GroceryItemName,
        house_id: HouseId,
        added_by: Email,
        completed: bool,
        added_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            house_id,
            added_by,
            completed,
            added_at,
        }
    }

    pub fn id(&self) -> &GroceryItemId {
        &self.id
    }

    pub fn name(&self) -> &GroceryItemName {
        &self.name
    }

    pub fn house_id(&self) -> &HouseId {
        &self.house_id
    }

    pub fn added_by(&self) -> &Email {
        &self.added_by
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    pub fn belongs_to(&self, house_id: &HouseId) -> bool {
        &self.house_id == house_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_新規アイテムは未完了() {
        let item = GroceryItem::new(
            GroceryItemId::new(),
            GroceryItemName::new("Milk").unwrap(),
            HouseId::new(),
            Email::new("alex@example.com").unwrap(),
            Utc::now(),
        );

        assert!(!item.is_completed());
        assert_eq!(item.name().as_str(), "Milk");
    }

    #[test]
    fn test_アイテム名は空白のみを拒否する() {
        assert!(GroceryItemName::new("   ").is_err());
    }
}
