//! 立替・精算ユースケース
//!
//! 立替の記録と割り勘、ハウスメンバーの残高一覧、ルームメイトへの精算を扱う。
//! 残高の更新は参加者ごとに `UserRepository::add_balance`（DynamoDB の `ADD`）で
//! 1 件ずつ行う。

use std::{collections::HashMap, sync::Arc};

use roomiez_domain::{
    clock::Clock,
    expense::{Expense, ExpenseDescription, ExpenseId, Settlement},
    house::HouseId,
    identity::VerifiedIdentity,
    money::Money,
    user::{Email, Uid, User},
};
use roomiez_infra::repository::{ExpenseRepository, HouseRepository, UserRepository};

use crate::error::ApiError;

/// 立替の作成入力
#[derive(Debug, Clone)]
pub struct CreateExpenseInput {
    pub amount:        f64,
    pub description:   String,
    pub split_between: Vec<String>,
}

/// ハウスメンバーの残高一覧
#[derive(Debug, Clone)]
pub struct HouseBalances {
    pub house_id: HouseId,
    pub members:  Vec<User>,
}

/// 立替・精算ユースケース
pub struct ExpenseUseCaseImpl {
    user_repository:    Arc<dyn UserRepository>,
    house_repository:   Arc<dyn HouseRepository>,
    expense_repository: Arc<dyn ExpenseRepository>,
    clock:              Arc<dyn Clock>,
}

impl ExpenseUseCaseImpl {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        house_repository: Arc<dyn HouseRepository>,
        expense_repository: Arc<dyn ExpenseRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repository,
            house_repository,
            expense_repository,
            clock,
        }
    }

    /// 呼び出し元の所属ハウスを取得する
    ///
    /// ユーザー未登録は 404、ハウス未所属は 400（`action` をメッセージに含める）。
    async fn caller_house(
        &self,
        caller: &VerifiedIdentity,
        action: &str,
    ) -> Result<HouseId, ApiError> {
        let user = self
            .user_repository
            .find_by_uid(&caller.uid)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        user.house_id()
            .cloned()
            .ok_or_else(|| ApiError::BadRequest(format!("User must be in a house to {action}")))
    }

    /// 立替を記録し、参加者の残高を割り勘で更新する
    ///
    /// 1. 金額・説明・参加者のバリデーション
    /// 2. 呼び出し元の所属ハウスを確認
    /// 3. 参加者全員が同じハウスのメンバーであることを確認
    /// 4. 立替を保存し、各参加者の残高に変化量を加算
    pub async fn create_expense(
        &self,
        caller: &VerifiedIdentity,
        input: CreateExpenseInput,
    ) -> Result<Expense, ApiError> {
        let amount = Money::positive(input.amount)?;
        let description = ExpenseDescription::new(input.description)?;
        let split_between = input
            .split_between
            .into_iter()
            .map(Email::new)
            .collect::<Result<Vec<_>, _>>()?;

        let house_id = self.caller_house(caller, "create expenses").await?;
        let now = self.clock.now();

        let expense = Expense::new(
            ExpenseId::new(),
            house_id,
            description,
            amount,
            caller.email.clone(),
            split_between,
            now,
        )?;

        // 残高を書き換える前に、参加者全員を uid に解決しておく
        let mut uids: HashMap<Email, Uid> = HashMap::new();
        uids.insert(caller.email.clone(), caller.uid.clone());
        for email in expense.split_between() {
            if uids.contains_key(email) {
                continue;
            }
            let member = self
                .user_repository
                .find_by_email(email)
                .await?
                .filter(|u| u.house_id() == Some(expense.house_id()))
                .ok_or_else(|| {
                    ApiError::BadRequest(format!("Participant {email} is not in your house"))
                })?;
            uids.insert(email.clone(), member.uid().clone());
        }

        self.expense_repository.insert(&expense).await?;

        for (email, delta) in expense.balance_deltas() {
            let Some(uid) = uids.get(&email) else {
                continue;
            };
            self.user_repository.add_balance(uid, delta, now).await?;
        }

        tracing::info!(
            event.kind = "business_event",
            event.entity_type = "expense",
            event.entity_id = %expense.id(),
            event.action = "expense.created",
            amount = expense.amount().value(),
            participants = expense.split_between().len(),
            "立替を記録しました"
        );

        Ok(expense)
    }

    /// 呼び出し元のハウスの立替を新しい順に一覧する
    pub async fn list_expenses(&self, caller: &VerifiedIdentity) -> Result<Vec<Expense>, ApiError> {
        let house_id = self.caller_house(caller, "view expenses").await?;

        let mut expenses = self.expense_repository.find_by_house(&house_id).await?;
        expenses.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(expenses)
    }

    /// 呼び出し元のハウスのメンバーと残高を取得する
    ///
    /// メンバー一覧の順序を保つ。ユーザードキュメントがないメンバーは含めない。
    pub async fn house_balances(
        &self,
        caller: &VerifiedIdentity,
    ) -> Result<HouseBalances, ApiError> {
        let house_id = self.caller_house(caller, "view balances").await?;

        let house = self
            .house_repository
            .find_by_id(&house_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("House not found".to_string()))?;

        let mut members = Vec::with_capacity(house.members().len());
        for email in house.members() {
            if let Some(user) = self.user_repository.find_by_email(email).await? {
                members.push(user);
            }
        }

        Ok(HouseBalances { house_id, members })
    }

    /// ルームメイトへの支払いを記録し、双方の残高を更新する
    pub async fn settle(
        &self,
        caller: &VerifiedIdentity,
        amount: f64,
        to_email: String,
        description: Option<String>,
    ) -> Result<Settlement, ApiError> {
        let amount = Money::positive(amount)?;
        if to_email.trim().is_empty() {
            return Err(ApiError::Validation("to_email is required".to_string()));
        }
        let to = Email::new(to_email)?;
        let now = self.clock.now();

        let settlement = Settlement::new(amount, caller.email.clone(), to, description, now)?;

        let recipient = self
            .user_repository
            .find_by_email(&settlement.to)
            .await?
            .ok_or_else(|| ApiError::NotFound("Recipient user not found".to_string()))?;

        self.user_repository
            .upsert_identity(&caller.uid, &caller.email, now)
            .await?;

        let [(_, payer_delta), (_, recipient_delta)] = settlement.balance_deltas();
        self.user_repository
            .add_balance(&caller.uid, payer_delta, now)
            .await?;
        self.user_repository
            .add_balance(recipient.uid(), recipient_delta, now)
            .await?;

        tracing::info!(
            event.kind = "business_event",
            event.entity_type = "user",
            event.entity_id = %caller.uid,
            event.action = "expense.settled",
            amount = settlement.amount.value(),
            recipient_uid = %recipient.uid(),
            "精算を記録しました"
        );

        Ok(settlement)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use roomiez_domain::{
        clock::FixedClock,
        house::{House, HouseName, JoinCode},
    };
    use roomiez_infra::mock::{MockExpenseRepository, MockHouseRepository, MockUserRepository};
    use rstest::rstest;

    use super::*;
    use crate::usecase::test_support::{fixed_now, identity};

    struct Fixture {
        users:    MockUserRepository,
        expenses: MockExpenseRepository,
        house_id: HouseId,
        alex:     VerifiedIdentity,
        sam:      VerifiedIdentity,
        usecase:  ExpenseUseCaseImpl,
    }

    /// alex（オーナー）と sam が同じハウス、outsider は別ハウス、lonely は未所属
    fn fixture() -> Fixture {
        let users = MockUserRepository::new();
        let houses = MockHouseRepository::new();
        let expenses = MockExpenseRepository::new();
        let alex = identity("uid-alex", "alex@example.com");
        let sam = identity("uid-sam", "sam@example.com");

        let house = House::new(
            HouseId::new(),
            HouseName::new("Maple St").unwrap(),
            JoinCode::generate(),
            alex.uid.clone(),
            alex.email.clone(),
            fixed_now(),
        )
        .with_member(sam.email.clone())
        .unwrap()
        // ユーザードキュメントのないメンバー
        .with_member(Email::new("ghost@example.com").unwrap())
        .unwrap();
        let house_id = house.id().clone();
        houses.add_house(house);

        for member in [&alex, &sam] {
            users.add_user(
                User::new(member.uid.clone(), member.email.clone(), fixed_now())
                    .with_house(house_id.clone(), fixed_now()),
            );
        }
        users.add_user(
            User::new(
                Uid::new("uid-outsider").unwrap(),
                Email::new("outsider@example.com").unwrap(),
                fixed_now(),
            )
            .with_house(HouseId::new(), fixed_now()),
        );
        users.add_user(User::new(
            Uid::new("uid-lonely").unwrap(),
            Email::new("lonely@example.com").unwrap(),
            fixed_now(),
        ));

        let usecase = ExpenseUseCaseImpl::new(
            Arc::new(users.clone()),
            Arc::new(houses),
            Arc::new(expenses.clone()),
            Arc::new(FixedClock::new(fixed_now())),
        );
        Fixture {
            users,
            expenses,
            house_id,
            alex,
            sam,
            usecase,
        }
    }

    fn input(amount: f64, split_between: &[&str]) -> CreateExpenseInput {
        CreateExpenseInput {
            amount,
            description: "Pizza night".to_string(),
            split_between: split_between.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn balance(users: &MockUserRepository, uid: &Uid) -> f64 {
        users.get(uid).unwrap().balance()
    }

    #[tokio::test]
    async fn test_立替は支払者に他の参加者の負担分を加算する() {
        let f = fixture();

        let expense = f
            .usecase
            .create_expense(
                &f.alex,
                input(30.0, &["alex@example.com", "sam@example.com"]),
            )
            .await
            .unwrap();

        assert_eq!(expense.amount_per_person(), 15.0);
        assert_eq!(expense.house_id(), &f.house_id);
        assert_eq!(balance(&f.users, &f.alex.uid), 15.0);
        assert_eq!(balance(&f.users, &f.sam.uid), -15.0);
        assert_eq!(f.expenses.count(), 1);
    }

    #[tokio::test]
    async fn test_ハウス外の参加者を含む立替は記録も残高更新もしない() {
        let f = fixture();

        let result = f
            .usecase
            .create_expense(
                &f.alex,
                input(30.0, &["sam@example.com", "outsider@example.com"]),
            )
            .await;

        assert!(
            matches!(result, Err(ApiError::BadRequest(ref m)) if m == "Participant outsider@example.com is not in your house")
        );
        assert_eq!(f.expenses.count(), 0);
        assert_eq!(balance(&f.users, &f.alex.uid), 0.0);
        assert_eq!(balance(&f.users, &f.sam.uid), 0.0);
    }

    #[rstest]
    #[case::金額が0(0.0, &["sam@example.com"], "Amount must be a positive number")]
    #[case::金額が負(-5.0, &["sam@example.com"], "Amount must be a positive number")]
    #[case::参加者なし(10.0, &[], "split_between must contain at least one user email")]
    #[case::参加者のメール不正(10.0, &["sam"], "Invalid email format")]
    #[tokio::test]
    async fn test_不正な立替はバリデーションエラー(
        #[case] amount: f64,
        #[case] split_between: &[&str],
        #[case] expected: &str,
    ) {
        let f = fixture();

        let result = f
            .usecase
            .create_expense(&f.alex, input(amount, split_between))
            .await;

        assert!(matches!(result, Err(ApiError::Validation(ref m)) if m == expected));
        assert_eq!(f.expenses.count(), 0);
    }

    #[tokio::test]
    async fn test_ハウス未所属では立替を記録できない() {
        let f = fixture();

        let result = f
            .usecase
            .create_expense(
                &identity("uid-lonely", "lonely@example.com"),
                input(10.0, &["lonely@example.com"]),
            )
            .await;

        assert!(
            matches!(result, Err(ApiError::BadRequest(ref m)) if m == "User must be in a house to create expenses")
        );
    }

    #[tokio::test]
    async fn test_未登録ユーザーの立替一覧は404() {
        let f = fixture();

        let result = f
            .usecase
            .list_expenses(&identity("uid-new", "new@example.com"))
            .await;

        assert!(matches!(result, Err(ApiError::NotFound(ref m)) if m == "User not found"));
    }

    #[tokio::test]
    async fn test_残高一覧はユーザーが存在するメンバーだけをメンバー順に返す() {
        let f = fixture();
        f.usecase
            .create_expense(&f.sam, input(20.0, &["alex@example.com"]))
            .await
            .unwrap();

        let balances = f.usecase.house_balances(&f.alex).await.unwrap();

        assert_eq!(balances.house_id, f.house_id);
        let summary: Vec<_> = balances
            .members
            .iter()
            .map(|u| (u.email().as_str(), u.balance()))
            .collect();
        assert_eq!(
            summary,
            vec![("alex@example.com", -20.0), ("sam@example.com", 20.0)]
        );
    }

    #[tokio::test]
    async fn test_精算は支払った側を減らし受け取った側を増やす() {
        let f = fixture();

        let settlement = f
            .usecase
            .settle(&f.alex, 12.5, "sam@example.com".to_string(), None)
            .await
            .unwrap();

        assert_eq!(settlement.description.as_str(), "Payment settlement");
        assert_eq!(settlement.settled_at, fixed_now());
        assert_eq!(balance(&f.users, &f.alex.uid), -12.5);
        assert_eq!(balance(&f.users, &f.sam.uid), 12.5);
    }

    #[tokio::test]
    async fn test_存在しない相手への精算は404() {
        let f = fixture();

        let result = f
            .usecase
            .settle(&f.alex, 5.0, "ghost@example.com".to_string(), None)
            .await;

        assert!(
            matches!(result, Err(ApiError::NotFound(ref m)) if m == "Recipient user not found")
        );
        assert_eq!(balance(&f.users, &f.alex.uid), 0.0);
    }

    #[rstest]
    #[case::宛先なし(5.0, " ", "to_email is required")]
    #[case::自分宛て(5.0, "alex@example.com", "Cannot settle payment to yourself")]
    #[case::金額の精度超過(5.001, "sam@example.com", "Amount must have at most 2 decimal places")]
    #[tokio::test]
    async fn test_不正な精算はバリデーションエラー(
        #[case] amount: f64,
        #[case] to_email: &str,
        #[case] expected: &str,
    ) {
        let f = fixture();

        let result = f
            .usecase
            .settle(&f.alex, amount, to_email.to_string(), None)
            .await;

        assert!(matches!(result, Err(ApiError::Validation(ref m)) if m == expected));
    }
}
