//! # 立替と精算
//!
//! ルームメイトの間で立て替えた費用の割り勘と、その精算を表す。
//!
//! ## 残高の符号
//!
//! ユーザーの `balance` は「ハウスの他のメンバーから受け取るべき額」を表す。
//!
//! - 立替: 支払者は自分の負担分を除いた額だけ増え、他の参加者は 1 人分ずつ減る
//! - 精算: 支払った側が減り、受け取った側が増える
//!
//! どちらも変化量の合計は 0 になる。
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use chrono::Utc;
//! use roomiez_domain::{
//!     expense::{Expense, ExpenseDescription, ExpenseId},
//!     house::HouseId,
//!     money::Money,
//!     user::Email,
//! };
//!
//! let alex = Email::new("alex@example.com")?;
//! let sam = Email::new("sam@example.com")?;
//! let expense = Expense::new(
//!     ExpenseId::new(),
//!     HouseId::new(),
//!     ExpenseDescription::new("Groceries")?,
//!     Money::positive(30.0)?,
//!     alex.clone(),
//!     vec![alex.clone(), sam.clone()],
//!     Utc::now(),
//! )?;
//!
//! assert_eq!(expense.amount_per_person(), 15.0);
//! assert_eq!(expense.balance_deltas(), vec![(alex, 15.0), (sam, -15.0)]);
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};

use crate::{DomainError, house::HouseId, money::Money, user::Email};

define_uuid_id! {
    /// 立替 ID
    pub struct ExpenseId;
}

define_validated_string! {
    /// 立替・精算の説明
    pub struct ExpenseDescription {
        label: "Description",
        max_length: 200,
    }
}

/// 立替エンティティ
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    id:                ExpenseId,
    house_id:          HouseId,
    description:       ExpenseDescription,
    amount:            Money,
    paid_by:           Email,
    split_between:     Vec<Email>,
    amount_per_person: f64,
    settled:           bool,
    created_at:        DateTime<Utc>,
}

impl Expense {
    /// 立替を作成する
    ///
    /// 割り勘の参加者は重複を除いて先頭からの順序を保つ。
    ///
    /// # エラー
    ///
    /// 参加者が 1 人もいない場合は `DomainError::Validation`。
    pub fn new(
        id: ExpenseId,
        house_id: HouseId,
        description: ExpenseDescription,
        amount: Money,
        paid_by: Email,
        split_between: Vec<Email>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let mut participants: Vec<Email> = Vec::with_capacity(split_between.len());
        for email in split_between {
            if !participants.contains(&email) {
                participants.push(email);
            }
        }

        if participants.is_empty() {
            return Err(DomainError::Validation(
                "split_between must contain at least one user email".to_string(),
            ));
        }

        let amount_per_person = amount.value() / participants.len() as f64;

        Ok(Self {
            id,
            house_id,
            description,
            amount,
            paid_by,
            split_between: participants,
            amount_per_person,
            settled: false,
            created_at: now,
        })
    }

    /// 永続化済みのデータから復元する
    #[allow(clippy::too_many_arguments)]
    pub fn from_stored(
        id: ExpenseId,
        house_id: HouseId,
        description: ExpenseDescription,
        amount: Money,
        paid_by: Email,
        split_between: Vec<Email>,
        amount_per_person: f64,
        settled: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            house_id,
            description,
            amount,
            paid_by,
            split_between,
            amount_per_person,
            settled,
            created_at,
        }
    }

    pub fn id(&self) -> &ExpenseId {
        &self.id
    }

    pub fn house_id(&self) -> &HouseId {
        &self.house_id
    }

    pub fn description(&self) -> &ExpenseDescription {
        &self.description
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn paid_by(&self) -> &Email {
        &self.paid_by
    }

    pub fn split_between(&self) -> &[Email] {
        &self.split_between
    }

    pub fn amount_per_person(&self) -> f64 {
        self.amount_per_person
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// 各ユーザーの残高の変化量
    ///
    /// 支払者が先頭。支払者の変化量が 0（1 人で割り勘）の場合は含めない。
    pub fn balance_deltas(&self) -> Vec<(Email, f64)> {
        let payer_share = if self.split_between.contains(&self.paid_by) {
            self.amount_per_person
        } else {
            0.0
        };
        let payer_credit = self.amount.value() - payer_share;

        let mut deltas = Vec::with_capacity(self.split_between.len() + 1);
        if payer_credit != 0.0 {
            deltas.push((self.paid_by.clone(), payer_credit));
        }
        deltas.extend(
            self.split_between
                .iter()
                .filter(|email| *email != &self.paid_by)
                .map(|email| (email.clone(), -self.amount_per_person)),
        );
        deltas
    }
}

/// 精算（ルームメイトへの直接の支払い）
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub amount:      Money,
    pub from:        Email,
    pub to:          Email,
    pub description: ExpenseDescription,
    pub settled_at:  DateTime<Utc>,
}

impl Settlement {
    /// 説明が省略されたときの既定値
    pub const DEFAULT_DESCRIPTION: &'static str = "Payment settlement";

    /// 精算を作成する
    ///
    /// 空白のみの説明は省略とみなす。
    ///
    /// # エラー
    ///
    /// 自分自身への支払いは `DomainError::Validation`。
    pub fn new(
        amount: Money,
        from: Email,
        to: Email,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if from == to {
            return Err(DomainError::Validation(
                "Cannot settle payment to yourself".to_string(),
            ));
        }

        let description = match description.filter(|d| !d.trim().is_empty()) {
            Some(description) => ExpenseDescription::new(description)?,
            None => ExpenseDescription::new(Self::DEFAULT_DESCRIPTION)?,
        };

        Ok(Self {
            amount,
            from,
            to,
            description,
            settled_at: now,
        })
    }

    /// 支払った側と受け取った側の残高の変化量
    pub fn balance_deltas(&self) -> [(Email, f64); 2] {
        [
            (self.from.clone(), -self.amount.value()),
            (self.to.clone(), self.amount.value()),
        ]
    }
}
