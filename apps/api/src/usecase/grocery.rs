//! 共有買い物リストユースケース

use std::sync::Arc;

use roomiez_domain::{
    clock::Clock,
    grocery::{GroceryItem, GroceryItemId, GroceryItemName},
    identity::VerifiedIdentity,
};
use roomiez_infra::repository::{GroceryRepository, UserRepository};

use super::{caller_house_id, require_house_id};
use crate::error::ApiError;

/// 買い物リストユースケース
pub struct GroceryUseCaseImpl {
    user_repository:    Arc<dyn UserRepository>,
    grocery_repository: Arc<dyn GroceryRepository>,
    clock:              Arc<dyn Clock>,
}

impl GroceryUseCaseImpl {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        grocery_repository: Arc<dyn GroceryRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repository,
            grocery_repository,
            clock,
        }
    }

    /// 呼び出し元のハウスにアイテムを追加する
    pub async fn add_item(
        &self,
        caller: &VerifiedIdentity,
        item: String,
    ) -> Result<GroceryItem, ApiError> {
        let name = GroceryItemName::new(item)?;
        let house_id = require_house_id(self.user_repository.as_ref(), &caller.uid).await?;

        let item = GroceryItem::new(
            GroceryItemId::new(),
            name,
            house_id,
            caller.email.clone(),
            self.clock.now(),
        );
        self.grocery_repository.insert(&item).await?;

        tracing::info!(
            event.kind = "business_event",
            event.entity_type = "grocery",
            event.entity_id = %item.id(),
            event.action = "grocery.added",
            "買い物アイテムを追加しました"
        );

        Ok(item)
    }

    /// 呼び出し元のハウスのアイテムを新しい順に一覧する
    pub async fn list_items(&self, caller: &VerifiedIdentity) -> Result<Vec<GroceryItem>, ApiError> {
        let house_id = require_house_id(self.user_repository.as_ref(), &caller.uid).await?;

        let mut items = self.grocery_repository.find_by_house(&house_id).await?;
        items.sort_by(|a, b| b.added_at().cmp(&a.added_at()));
        Ok(items)
    }

    /// アイテムを 1 件削除する
    pub async fn delete_item(
        &self,
        caller: &VerifiedIdentity,
        item_id: &str,
    ) -> Result<GroceryItemId, ApiError> {
        let not_found = || ApiError::NotFound("Grocery not found".to_string());

        let id = GroceryItemId::parse(item_id).ok_or_else(not_found)?;
        let item = self
            .grocery_repository
            .find_by_id(&id)
            .await?
            .ok_or_else(not_found)?;

        let house_id = caller_house_id(self.user_repository.as_ref(), &caller.uid).await?;
        if !house_id.is_some_and(|h| item.belongs_to(&h)) {
            return Err(ApiError::Forbidden(
                "You can only delete groceries in your house".to_string(),
            ));
        }

        self.grocery_repository.delete(&id).await?;

        tracing::info!(
            event.kind = "business_event",
            event.entity_type = "grocery",
            event.entity_id = %id,
            event.action = "grocery.deleted",
            "買い物アイテムを削除しました"
        );

        Ok(id)
    }

    /// 呼び出し元のハウスのアイテムをすべて削除し、削除件数を返す
    pub async fn delete_all(&self, caller: &VerifiedIdentity) -> Result<usize, ApiError> {
        let house_id = require_house_id(self.user_repository.as_ref(), &caller.uid).await?;

        let items = self.grocery_repository.find_by_house(&house_id).await?;
        if items.is_empty() {
            return Err(ApiError::NotFound(
                "No groceries found in your house".to_string(),
            ));
        }

        for item in &items {
            self.grocery_repository.delete(item.id()).await?;
        }

        tracing::info!(
            event.kind = "business_event",
            event.entity_type = "house",
            event.entity_id = %house_id,
            event.action = "grocery.cleared",
            count = items.len(),
            "買い物リストを空にしました"
        );

        Ok(items.len())
    }
}
