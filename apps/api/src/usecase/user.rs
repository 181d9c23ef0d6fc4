//! ユーザー情報ユースケース
//!
//! 残高・プロフィールの取得と更新、メールアドレスによるユーザー検索を扱う。
//! 呼び出し元のユーザードキュメントは読み取り時にも upsert するため、
//! 初回アクセスでも残高 0 のユーザーとして扱われる。

use std::sync::Arc;

use roomiez_domain::{
    clock::Clock,
    identity::VerifiedIdentity,
    money::Money,
    user::{BalanceChange, Email, PersonName, User},
};
use roomiez_infra::repository::UserRepository;

use crate::error::ApiError;

/// ユーザー情報ユースケース
pub struct UserUseCaseImpl {
    user_repository: Arc<dyn UserRepository>,
    clock:           Arc<dyn Clock>,
}

impl UserUseCaseImpl {
    pub fn new(user_repository: Arc<dyn UserRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            user_repository,
            clock,
        }
    }

    /// 呼び出し元のユーザーを upsert して返す
    async fn ensure_user(&self, caller: &VerifiedIdentity) -> Result<User, ApiError> {
        Ok(self
            .user_repository
            .upsert_identity(&caller.uid, &caller.email, self.clock.now())
            .await?)
    }

    /// 残高を取得する
    pub async fn get_balance(&self, caller: &VerifiedIdentity) -> Result<f64, ApiError> {
        Ok(self.ensure_user(caller).await?.balance())
    }

    /// 残高に金額を加算する（負の値で減算）
    pub async fn update_balance(
        &self,
        caller: &VerifiedIdentity,
        amount: f64,
    ) -> Result<BalanceChange, ApiError> {
        let amount = Money::new(amount)?;

        self.ensure_user(caller).await?;
        let change = self
            .user_repository
            .add_balance(&caller.uid, amount.value(), self.clock.now())
            .await?;

        tracing::info!(
            event.kind = "business_event",
            event.entity_type = "user",
            event.entity_id = %caller.uid,
            event.action = "balance.updated",
            previous = change.previous,
            current = change.current,
            "残高を更新しました"
        );

        Ok(change)
    }

    /// メールアドレスでユーザーを検索する
    ///
    /// メールアドレスとして不正な値も「見つからない」として扱う。
    pub async fn get_user_by_email(&self, email: &str) -> Result<User, ApiError> {
        let not_found = || ApiError::NotFound("User not found".to_string());

        let email = Email::new(email).map_err(|_| not_found())?;
        self.user_repository
            .find_by_email(&email)
            .await?
            .ok_or_else(not_found)
    }

    /// 呼び出し元のプロフィールを取得する
    pub async fn get_profile(&self, caller: &VerifiedIdentity) -> Result<User, ApiError> {
        self.ensure_user(caller).await
    }

    /// 呼び出し元の氏名を更新する
    ///
    /// 指定されなかったフィールド（`None`）は変更しない。
    pub async fn update_profile(
        &self,
        caller: &VerifiedIdentity,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Result<User, ApiError> {
        let first_name = first_name.map(PersonName::new).transpose()?;
        let last_name = last_name.map(PersonName::new).transpose()?;

        self.ensure_user(caller).await?;
        let user = self
            .user_repository
            .update_profile(
                &caller.uid,
                first_name.as_ref(),
                last_name.as_ref(),
                self.clock.now(),
            )
            .await?;

        tracing::info!(
            event.kind = "business_event",
            event.entity_type = "user",
            event.entity_id = %caller.uid,
            event.action = "profile.updated",
            "プロフィールを更新しました"
        );

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use roomiez_domain::{clock::FixedClock, user::Uid};
    use roomiez_infra::mock::MockUserRepository;
    use rstest::rstest;

    use super::*;
    use crate::usecase::test_support::{fixed_now, identity};

    fn usecase(users: &MockUserRepository) -> UserUseCaseImpl {
        UserUseCaseImpl::new(
            Arc::new(users.clone()),
            Arc::new(FixedClock::new(fixed_now())),
        )
    }

    #[tokio::test]
    async fn test_初回アクセスの残高は0() {
        let users = MockUserRepository::new();
        let caller = identity("uid-1", "alex@example.com");

        let balance = usecase(&users).get_balance(&caller).await.unwrap();

        assert_eq!(balance, 0.0);
        assert!(users.get(&caller.uid).is_some());
    }

    #[tokio::test]
    async fn test_残高は加算され続ける() {
        let users = MockUserRepository::new();
        let sut = usecase(&users);
        let caller = identity("uid-1", "alex@example.com");

        let first = sut.update_balance(&caller, 12.5).await.unwrap();
        let second = sut.update_balance(&caller, -2.5).await.unwrap();

        assert_eq!(first, BalanceChange { previous: 0.0, current: 12.5 });
        assert_eq!(second, BalanceChange { previous: 12.5, current: 10.0 });
        assert_eq!(sut.get_balance(&caller).await.unwrap(), 10.0);
    }

    #[rstest]
    #[case::nan(f64::NAN)]
    #[case::無限大(f64::INFINITY)]
    #[case::ストアの上限超過(1e130)]
    #[case::小数第3位(0.001)]
    #[tokio::test]
    async fn test_受け付けられない金額はバリデーションエラーで残高を変えない(
        #[case] amount: f64,
    ) {
        let users = MockUserRepository::new();
        let caller = identity("uid-1", "alex@example.com");

        let result = usecase(&users).update_balance(&caller, amount).await;

        assert!(matches!(result, Err(ApiError::Validation(_))));
        assert!(users.get(&caller.uid).is_none());
    }

    #[rstest]
    #[case::未登録("ghost@example.com")]
    #[case::形式不正("not-an-email")]
    #[tokio::test]
    async fn test_見つからないユーザーは404(#[case] email: &str) {
        let users = MockUserRepository::new();

        let result = usecase(&users).get_user_by_email(email).await;

        assert!(matches!(result, Err(ApiError::NotFound(ref m)) if m == "User not found"));
    }

    #[tokio::test]
    async fn test_メールアドレスでユーザーを取得できる() {
        let users = MockUserRepository::new();
        users.add_user(User::new(
            Uid::new("uid-2").unwrap(),
            Email::new("sam@example.com").unwrap(),
            fixed_now(),
        ));

        let user = usecase(&users)
            .get_user_by_email("sam@example.com")
            .await
            .unwrap();

        assert_eq!(user.uid().as_str(), "uid-2");
    }

    #[tokio::test]
    async fn test_プロフィール更新は指定したフィールドだけ変更する() {
        let users = MockUserRepository::new();
        let sut = usecase(&users);
        let caller = identity("uid-1", "alex@example.com");
        sut.update_profile(&caller, Some("Alex".into()), Some("Kim".into()))
            .await
            .unwrap();

        let user = sut
            .update_profile(&caller, None, Some("Park".into()))
            .await
            .unwrap();

        assert_eq!(user.first_name().map(|n| n.as_str()), Some("Alex"));
        assert_eq!(user.last_name().map(|n| n.as_str()), Some("Park"));
    }

    #[tokio::test]
    async fn test_空の氏名はバリデーションエラー() {
        let users = MockUserRepository::new();

        let result = usecase(&users)
            .update_profile(&identity("uid-1", "alex@example.com"), Some(" ".into()), None)
            .await;

        assert!(matches!(result, Err(ApiError::Validation(_))));
    }
}
