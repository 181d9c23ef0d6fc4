//! ハウス管理ユースケース

use std::sync::Arc;

use roomiez_domain::{
    chore::Chore,
    clock::Clock,
    house::{House, HouseId, HouseName, JoinCode},
    identity::VerifiedIdentity,
    user::User,
};
use roomiez_infra::{
    InfraErrorKind,
    repository::{ChoreRepository, HouseRepository, UserRepository},
};

use crate::error::ApiError;

/// ハウス詳細（メンバーとその担当家事を含む）
#[derive(Debug, Clone)]
pub struct HouseDetails {
    pub house:   House,
    pub members: Vec<MemberDetail>,
}

/// メンバーの詳細
#[derive(Debug, Clone)]
pub struct MemberDetail {
    pub user:   User,
    pub chores: Vec<Chore>,
}

/// ハウス管理ユースケース
pub struct HouseUseCaseImpl {
    user_repository:  Arc<dyn UserRepository>,
    house_repository: Arc<dyn HouseRepository>,
    chore_repository: Arc<dyn ChoreRepository>,
    clock:            Arc<dyn Clock>,
}

impl HouseUseCaseImpl {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        house_repository: Arc<dyn HouseRepository>,
        chore_repository: Arc<dyn ChoreRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repository,
            house_repository,
            chore_repository,
            clock,
        }
    }

    /// ハウスを作成する
    ///
    /// 1. ハウス名のバリデーション
    /// 2. 呼び出し元のユーザーを upsert し、既に所属していれば 400
    /// 3. 参加コードを生成してハウスを保存（作成者がオーナー兼唯一のメンバー）
    /// 4. 呼び出し元の `house_id` を設定
    pub async fn create_house(
        &self,
        caller: &VerifiedIdentity,
        house_name: String,
    ) -> Result<House, ApiError> {
        let name = HouseName::new(house_name)?;
        let now = self.clock.now();

        let user = self
            .user_repository
            .upsert_identity(&caller.uid, &caller.email, now)
            .await?;
        if user.is_in_house() {
            return Err(ApiError::BadRequest(
                "User is already in a house".to_string(),
            ));
        }

        let house = House::new(
            HouseId::new(),
            name,
            JoinCode::generate(),
            caller.uid.clone(),
            caller.email.clone(),
            now,
        );
        self.house_repository.insert(&house).await?;
        self.user_repository
            .set_house(&caller.uid, house.id(), now)
            .await?;

        tracing::info!(
            event.kind = "business_event",
            event.entity_type = "house",
            event.entity_id = %house.id(),
            event.action = "house.created",
            "ハウスを作成しました"
        );

        Ok(house)
    }

    /// 参加コードでハウスに参加する
    ///
    /// メンバー追加は条件付き更新で行い、同時に同じメールアドレスで参加した場合も
    /// 重複は 400 として扱う。
    pub async fn join_house(
        &self,
        caller: &VerifiedIdentity,
        join_code: String,
    ) -> Result<House, ApiError> {
        let code = JoinCode::new(join_code)?;
        let now = self.clock.now();

        let house = self
            .house_repository
            .find_by_join_code(&code)
            .await?
            .ok_or_else(|| ApiError::NotFound("Invalid join code".to_string()))?;

        if house.is_member(&caller.email) {
            return Err(already_in_house());
        }

        self.user_repository
            .upsert_identity(&caller.uid, &caller.email, now)
            .await?;
        self.house_repository
            .add_member(house.id(), &caller.email)
            .await
            .map_err(|e| match e.kind() {
                InfraErrorKind::Conflict { .. } => already_in_house(),
                _ => ApiError::Infra(e),
            })?;
        self.user_repository
            .set_house(&caller.uid, house.id(), now)
            .await?;

        tracing::info!(
            event.kind = "business_event",
            event.entity_type = "house",
            event.entity_id = %house.id(),
            event.action = "house.joined",
            "ハウスに参加しました"
        );

        Ok(house.with_member(caller.email.clone())?)
    }

    /// 呼び出し元のハウス詳細を取得する
    ///
    /// メンバーごとにユーザー情報と、このハウスで担当している家事を付与する。
    /// ユーザー情報が見つからないメンバーは詳細から除外する。
    pub async fn get_my_house(&self, caller: &VerifiedIdentity) -> Result<HouseDetails, ApiError> {
        let user = self
            .user_repository
            .find_by_uid(&caller.uid)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
        let house_id = user
            .house_id()
            .ok_or_else(|| ApiError::NotFound("User is not in a house".to_string()))?;
        let house = self
            .house_repository
            .find_by_id(house_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("House not found".to_string()))?;

        let mut members = Vec::with_capacity(house.members().len());
        for email in house.members() {
            let Some(member) = self.user_repository.find_by_email(email).await? else {
                continue;
            };
            let chores = self
                .chore_repository
                .find_by_assignee(email)
                .await?
                .into_iter()
                .filter(|c| c.belongs_to(house.id()))
                .collect();
            members.push(MemberDetail {
                user: member,
                chores,
            });
        }

        Ok(HouseDetails { house, members })
    }
}

fn already_in_house() -> ApiError {
    ApiError::BadRequest("User already in the house".to_string())
}
