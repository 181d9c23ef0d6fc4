//! # テスト用モック
//!
//! ユースケーステスト・ルーターテストで使用するインメモリ実装。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! roomiez-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roomiez_domain::{
    chore::{Chore, ChoreId},
    expense::Expense,
    grocery::{GroceryItem, GroceryItemId},
    house::{House, HouseId, JoinCode},
    identity::VerifiedIdentity,
    notification::{EmailMessage, NotificationError},
    reservation::{Reservation, ReservationId},
    user::{BalanceChange, Email, PersonName, Uid, User},
};

use crate::{
    error::InfraError,
    identity::{IdentityError, TokenVerifier},
    notification::NotificationSender,
    repository::{
        ChoreRepository,
        ExpenseRepository,
        GroceryRepository,
        HouseRepository,
        ReservationRepository,
        UserRepository,
    },
};

// ===== MockUserRepository =====

#[derive(Clone, Default)]
pub struct MockUserRepository {
    users: Arc<Mutex<Vec<User>>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    /// 保存されているユーザーを uid で取得する（アサーション用）
    pub fn get(&self, uid: &Uid) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.uid() == uid)
            .cloned()
    }

    /// uid のユーザーを書き換える。存在しなければ `Unexpected`
    fn modify(&self, uid: &Uid, f: impl FnOnce(User) -> User) -> Result<User, InfraError> {
        let mut users = self.users.lock().unwrap();
        let pos = users
            .iter()
            .position(|u| u.uid() == uid)
            .ok_or_else(|| InfraError::unexpected(format!("user not found: {uid}")))?;
        let updated = f(users[pos].clone());
        users[pos] = updated.clone();
        Ok(updated)
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_uid(&self, uid: &Uid) -> Result<Option<User>, InfraError> {
        Ok(self.get(uid))
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, InfraError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email() == email)
            .cloned())
    }

    async fn upsert_identity(
        &self,
        uid: &Uid,
        email: &Email,
        now: DateTime<Utc>,
    ) -> Result<User, InfraError> {
        if self.get(uid).is_some() {
            return self.modify(uid, |u| u.with_email(email.clone(), now));
        }

        let user = User::new(uid.clone(), email.clone(), now);
        self.add_user(user.clone());
        Ok(user)
    }

    async fn set_house(
        &self,
        uid: &Uid,
        house_id: &HouseId,
        now: DateTime<Utc>,
    ) -> Result<(), InfraError> {
        self.modify(uid, |u| u.with_house(house_id.clone(), now))?;
        Ok(())
    }

    async fn add_balance(
        &self,
        uid: &Uid,
        amount: f64,
        now: DateTime<Utc>,
    ) -> Result<BalanceChange, InfraError> {
        let mut change = None;
        self.modify(uid, |u| {
            let (user, c) = u.with_balance_added(amount, now);
            change = Some(c);
            user
        })?;
        change.ok_or_else(|| InfraError::unexpected("balance change missing"))
    }

    async fn update_profile(
        &self,
        uid: &Uid,
        first_name: Option<&PersonName>,
        last_name: Option<&PersonName>,
        now: DateTime<Utc>,
    ) -> Result<User, InfraError> {
        self.modify(uid, |u| {
            u.with_profile(first_name.cloned(), last_name.cloned(), now)
        })
    }
}

// ===== MockHouseRepository =====

#[derive(Clone, Default)]
pub struct MockHouseRepository {
    houses: Arc<Mutex<Vec<House>>>,
}

impl MockHouseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_house(&self, house: House) {
        self.houses.lock().unwrap().push(house);
    }

    /// 保存されているハウスを取得する（アサーション用）
    pub fn get(&self, id: &HouseId) -> Option<House> {
        self.houses
            .lock()
            .unwrap()
            .iter()
            .find(|h| h.id() == id)
            .cloned()
    }

    pub fn count(&self) -> usize {
        self.houses.lock().unwrap().len()
    }
}

#[async_trait]
impl HouseRepository for MockHouseRepository {
    async fn insert(&self, house: &House) -> Result<(), InfraError> {
        let mut houses = self.houses.lock().unwrap();
        if houses.iter().any(|h| h.id() == house.id()) {
            return Err(InfraError::conflict("House", house.id().to_string()));
        }
        houses.push(house.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &HouseId) -> Result<Option<House>, InfraError> {
        Ok(self.get(id))
    }

    async fn find_by_join_code(&self, code: &JoinCode) -> Result<Option<House>, InfraError> {
        Ok(self
            .houses
            .lock()
            .unwrap()
            .iter()
            .find(|h| h.join_code() == code)
            .cloned())
    }

    async fn add_member(&self, id: &HouseId, email: &Email) -> Result<(), InfraError> {
        let mut houses = self.houses.lock().unwrap();
        let pos = houses
            .iter()
            .position(|h| h.id() == id)
            .ok_or_else(|| InfraError::conflict("House", id.to_string()))?;
        let updated = houses[pos]
            .clone()
            .with_member(email.clone())
            .map_err(|_| InfraError::conflict("House", id.to_string()))?;
        houses[pos] = updated;
        Ok(())
    }
}

// ===== MockChoreRepository =====

#[derive(Clone, Default)]
pub struct MockChoreRepository {
    chores: Arc<Mutex<Vec<Chore>>>,
}

impl MockChoreRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_chore(&self, chore: Chore) {
        self.chores.lock().unwrap().push(chore);
    }

    /// 保存されている家事を取得する（アサーション用）
    pub fn get(&self, id: &ChoreId) -> Option<Chore> {
        self.chores
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id() == id)
            .cloned()
    }

    pub fn count(&self) -> usize {
        self.chores.lock().unwrap().len()
    }
}

#[async_trait]
impl ChoreRepository for MockChoreRepository {
    async fn insert(&self, chore: &Chore) -> Result<(), InfraError> {
        self.add_chore(chore.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &ChoreId) -> Result<Option<Chore>, InfraError> {
        Ok(self.get(id))
    }

    async fn find_by_house(&self, house_id: &HouseId) -> Result<Vec<Chore>, InfraError> {
        Ok(self
            .chores
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.belongs_to(house_id))
            .cloned()
            .collect())
    }

    async fn find_by_assignee(&self, email: &Email) -> Result<Vec<Chore>, InfraError> {
        Ok(self
            .chores
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.user_email() == email)
            .cloned()
            .collect())
    }

    async fn update_status(&self, chore: &Chore) -> Result<(), InfraError> {
        let mut chores = self.chores.lock().unwrap();
        let pos = chores
            .iter()
            .position(|c| c.id() == chore.id())
            .ok_or_else(|| InfraError::conflict("Chore", chore.id().to_string()))?;
        chores[pos] = chore.clone();
        Ok(())
    }

    async fn delete(&self, id: &ChoreId) -> Result<(), InfraError> {
        self.chores.lock().unwrap().retain(|c| c.id() != id);
        Ok(())
    }
}

// ===== MockGroceryRepository =====

#[derive(Clone, Default)]
pub struct MockGroceryRepository {
    items: Arc<Mutex<Vec<GroceryItem>>>,
}

impl MockGroceryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&self, item: GroceryItem) {
        self.items.lock().unwrap().push(item);
    }

    pub fn count(&self) -> usize {
        self.items.lock().unwrap().len()
    }
}

#[async_trait]
impl GroceryRepository for MockGroceryRepository {
    async fn insert(&self, item: &GroceryItem) -> Result<(), InfraError> {
        self.add_item(item.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &GroceryItemId) -> Result<Option<GroceryItem>, InfraError> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id() == id)
            .cloned())
    }

    async fn find_by_house(&self, house_id: &HouseId) -> Result<Vec<GroceryItem>, InfraError> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.belongs_to(house_id))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &GroceryItemId) -> Result<(), InfraError> {
        self.items.lock().unwrap().retain(|i| i.id() != id);
        Ok(())
    }
}

// ===== MockExpenseRepository =====

#[derive(Clone, Default)]
pub struct MockExpenseRepository {
    expenses: Arc<Mutex<Vec<Expense>>>,
}

impl MockExpenseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_expense(&self, expense: Expense) {
        self.expenses.lock().unwrap().push(expense);
    }

    pub fn count(&self) -> usize {
        self.expenses.lock().unwrap().len()
    }
}

#[async_trait]
impl ExpenseRepository for MockExpenseRepository {
    async fn insert(&self, expense: &Expense) -> Result<(), InfraError> {
        self.add_expense(expense.clone());
        Ok(())
    }

    async fn find_by_house(&self, house_id: &HouseId) -> Result<Vec<Expense>, InfraError> {
        Ok(self
            .expenses
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.house_id() == house_id)
            .cloned()
            .collect())
    }
}

// ===== MockReservationRepository =====

#[derive(Clone, Default)]
pub struct MockReservationRepository {
    reservations: Arc<Mutex<Vec<Reservation>>>,
}

impl MockReservationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_reservation(&self, reservation: Reservation) {
        self.reservations.lock().unwrap().push(reservation);
    }

    pub fn count(&self) -> usize {
        self.reservations.lock().unwrap().len()
    }
}

#[async_trait]
impl ReservationRepository for MockReservationRepository {
    async fn insert(&self, reservation: &Reservation) -> Result<(), InfraError> {
        self.add_reservation(reservation.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &ReservationId) -> Result<Option<Reservation>, InfraError> {
        Ok(self
            .reservations
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id() == id)
            .cloned())
    }

    async fn find_by_house(&self, house_id: &HouseId) -> Result<Vec<Reservation>, InfraError> {
        Ok(self
            .reservations
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.belongs_to(house_id))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &ReservationId) -> Result<(), InfraError> {
        self.reservations.lock().unwrap().retain(|r| r.id() != id);
        Ok(())
    }
}

// ===== StubTokenVerifier =====

/// 登録済みのトークンだけを受け付けるトークン検証スタブ
///
/// 未登録のトークンは `InvalidToken`、[`StubTokenVerifier::UNAVAILABLE_TOKEN`] は
/// `Unavailable` になる。
#[derive(Clone, Default)]
pub struct StubTokenVerifier {
    identities: Arc<Mutex<HashMap<String, VerifiedIdentity>>>,
}

impl StubTokenVerifier {
    /// ID プロバイダ障害を再現するトークン
    pub const UNAVAILABLE_TOKEN: &'static str = "provider-down";

    pub fn new() -> Self {
        Self::default()
    }

    /// トークンとアイデンティティの対応を登録する
    pub fn with_identity(self, token: &str, identity: VerifiedIdentity) -> Self {
        self.identities
            .lock()
            .unwrap()
            .insert(token.to_string(), identity);
        self
    }
}

#[async_trait]
impl TokenVerifier for StubTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        if token == Self::UNAVAILABLE_TOKEN {
            return Err(IdentityError::Unavailable);
        }

        self.identities
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or(IdentityError::InvalidToken)
    }
}

// ===== RecordingNotificationSender =====

/// 送信したメールを記録する通知送信器
#[derive(Clone, Default)]
pub struct RecordingNotificationSender {
    sent:    Arc<Mutex<Vec<EmailMessage>>>,
    failing: bool,
}

impl RecordingNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// 常に送信失敗する送信器
    pub fn failing() -> Self {
        Self {
            sent:    Arc::default(),
            failing: true,
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        if self.failing {
            return Err(NotificationError::SendFailed(
                "connection refused".to_string(),
            ));
        }

        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}
