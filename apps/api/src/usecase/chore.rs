//! 家事管理ユースケース

use std::sync::Arc;

use roomiez_domain::{
    chore::{Chore, ChoreId, ChoreName, ChoreStatus, Username},
    clock::Clock,
    identity::VerifiedIdentity,
    user::Email,
};
use roomiez_infra::{
    InfraErrorKind,
    repository::{ChoreRepository, UserRepository},
};

use super::{caller_house_id, require_house_id};
use crate::error::ApiError;

/// 家事追加の入力
pub struct AddChoreInput {
    pub chore_name: String,
    pub user_email: String,
    pub username:   Option<String>,
}

/// 家事管理ユースケース
pub struct ChoreUseCaseImpl {
    user_repository:  Arc<dyn UserRepository>,
    chore_repository: Arc<dyn ChoreRepository>,
    clock:            Arc<dyn Clock>,
}

impl ChoreUseCaseImpl {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        chore_repository: Arc<dyn ChoreRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repository,
            chore_repository,
            clock,
        }
    }

    /// 呼び出し元のハウスの家事を新しい順に一覧する
    pub async fn list_house_chores(
        &self,
        caller: &VerifiedIdentity,
    ) -> Result<Vec<Chore>, ApiError> {
        let house_id = require_house_id(self.user_repository.as_ref(), &caller.uid).await?;

        let mut chores = self.chore_repository.find_by_house(&house_id).await?;
        chores.sort_by(|a, b| b.assigned_at().cmp(&a.assigned_at()));
        Ok(chores)
    }

    /// 家事を追加する
    ///
    /// 担当者は呼び出し元と同じハウスに所属している必要がある。
    pub async fn add_chore(
        &self,
        caller: &VerifiedIdentity,
        input: AddChoreInput,
    ) -> Result<Chore, ApiError> {
        let name = ChoreName::new(input.chore_name)?;
        let assignee = Email::new(input.user_email)?;
        let username = input
            .username
            .filter(|u| !u.trim().is_empty())
            .map(Username::new)
            .transpose()?;

        let house_id = require_house_id(self.user_repository.as_ref(), &caller.uid).await?;

        let assignee_in_house = self
            .user_repository
            .find_by_email(&assignee)
            .await?
            .is_some_and(|u| u.house_id() == Some(&house_id));
        if !assignee_in_house {
            return Err(ApiError::BadRequest(
                "Assigned user is not in your house".to_string(),
            ));
        }

        let chore = Chore::new(
            ChoreId::new(),
            house_id,
            assignee,
            name,
            username,
            self.clock.now(),
        );
        self.chore_repository.insert(&chore).await?;

        tracing::info!(
            event.kind = "business_event",
            event.entity_type = "chore",
            event.entity_id = %chore.id(),
            event.action = "chore.added",
            "家事を追加しました"
        );

        Ok(chore)
    }

    /// 家事のステータスを更新する
    ///
    /// `Completed` にすると完了日時を記録し、`Pending` に戻すと消去する。
    pub async fn update_status(
        &self,
        caller: &VerifiedIdentity,
        chore_id: &str,
        status: &str,
    ) -> Result<Chore, ApiError> {
        let status = ChoreStatus::parse(status)?;
        let chore = self.find_chore(chore_id).await?;

        let house_id = caller_house_id(self.user_repository.as_ref(), &caller.uid).await?;
        if !house_id.is_some_and(|h| chore.belongs_to(&h)) {
            return Err(ApiError::Forbidden(
                "You can only update chores in your house".to_string(),
            ));
        }

        let updated = chore.with_status(status, self.clock.now());
        self.chore_repository
            .update_status(&updated)
            .await
            .map_err(|e| match e.kind() {
                // 取得後に削除された
                InfraErrorKind::Conflict { .. } => chore_not_found(),
                _ => ApiError::Infra(e),
            })?;

        tracing::info!(
            event.kind = "business_event",
            event.entity_type = "chore",
            event.entity_id = %updated.id(),
            event.action = "chore.status_updated",
            status = %updated.status(),
            "家事のステータスを更新しました"
        );

        Ok(updated)
    }

    /// 家事を削除する
    pub async fn delete_chore(
        &self,
        caller: &VerifiedIdentity,
        chore_id: &str,
    ) -> Result<ChoreId, ApiError> {
        let chore = self.find_chore(chore_id).await?;

        let house_id = caller_house_id(self.user_repository.as_ref(), &caller.uid).await?;
        if !house_id.is_some_and(|h| chore.belongs_to(&h)) {
            return Err(ApiError::Forbidden(
                "Unauthorized to delete this chore".to_string(),
            ));
        }

        self.chore_repository.delete(chore.id()).await?;

        tracing::info!(
            event.kind = "business_event",
            event.entity_type = "chore",
            event.entity_id = %chore.id(),
            event.action = "chore.deleted",
            "家事を削除しました"
        );

        Ok(chore.id().clone())
    }

    /// パスパラメータの ID で家事を取得する（不正な形式も 404）
    async fn find_chore(&self, chore_id: &str) -> Result<Chore, ApiError> {
        let Some(id) = ChoreId::parse(chore_id) else {
            return Err(chore_not_found());
        };
        self.chore_repository
            .find_by_id(&id)
            .await?
            .ok_or_else(chore_not_found)
    }
}

fn chore_not_found() -> ApiError {
    ApiError::NotFound("Chore not found".to_string())
}
