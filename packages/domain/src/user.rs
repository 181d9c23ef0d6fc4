//! # ユーザー
//!
//! ハウスに所属するルームメイトを表すエンティティと、その値オブジェクト。
//!
//! ## 設計方針
//!
//! - **ID は外部由来**: [`Uid`] は ID プロバイダが発行したユーザー ID をそのまま使う
//! - **メールアドレスで参照**: ハウスのメンバー一覧・家事の担当者はメールアドレスで
//!   ユーザーを指す（[`Email`]）
//! - **残高は単純な数値**: 立替精算の残高（`balance`）は符号付きの浮動小数点数
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use chrono::Utc;
//! use roomiez_domain::user::{Email, Uid, User};
//!
//! let user = User::new(
//!     Uid::new("firebase-uid-1")?,
//!     Email::new("alex@example.com")?,
//!     Utc::now(),
//! );
//! assert_eq!(user.balance(), 0.0);
//! assert!(user.house_id().is_none());
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DomainError, house::HouseId};

define_validated_string! {
    /// ID プロバイダが発行したユーザー ID
    pub struct Uid {
        label: "User ID",
        max_length: 128,
    }
}

define_validated_string! {
    /// 氏名の姓または名（PII）
    pub struct PersonName {
        label: "Name",
        max_length: 50,
        pii: true,
    }
}

/// メールアドレス（値オブジェクト）
///
/// 生成時にバリデーションを実行し、不正な値の作成を防ぐ。
/// 前後の空白は除去するが、大文字小文字は保持する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// メールアドレスを作成する
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - `local@domain` の形式で、どちらも空ではない
    /// - 最大 255 文字
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation("Email is required".to_string()));
        }

        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation("Invalid email format".to_string()));
        };

        if local.is_empty() || domain.is_empty() {
            return Err(DomainError::Validation("Invalid email format".to_string()));
        }

        if value.len() > 255 {
            return Err(DomainError::Validation(
                "Email must be at most 255 characters".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 残高の変更結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceChange {
    pub previous: f64,
    pub current:  f64,
}

/// ユーザーエンティティ
///
/// `users` テーブルの 1 ドキュメントに対応する。
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    uid:        Uid,
    email:      Email,
    house_id:   Option<HouseId>,
    balance:    f64,
    first_name: Option<PersonName>,
    last_name:  Option<PersonName>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// 初回アクセス時のユーザーを作成する
    pub fn new(uid: Uid, email: Email, now: DateTime<Utc>) -> Self {
        Self {
            uid,
            email,
            house_id: None,
            balance: 0.0,
            first_name: None,
            last_name: None,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// 永続化済みのデータから復元する
    #[allow(clippy::too_many_arguments)]
    pub fn from_stored(
        uid: Uid,
        email: Email,
        house_id: Option<HouseId>,
        balance: f64,
        first_name: Option<PersonName>,
        last_name: Option<PersonName>,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            uid,
            email,
            house_id,
            balance,
            first_name,
            last_name,
            created_at,
            updated_at,
        }
    }

    // Getter メソッド

    pub fn uid(&self) -> &Uid {
        &self.uid
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn house_id(&self) -> Option<&HouseId> {
        self.house_id.as_ref()
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn first_name(&self) -> Option<&PersonName> {
        self.first_name.as_ref()
    }

    pub fn last_name(&self) -> Option<&PersonName> {
        self.last_name.as_ref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// ハウスに所属しているか
    pub fn is_in_house(&self) -> bool {
        self.house_id.is_some()
    }

    // 状態遷移メソッド

    /// ID プロバイダ上のメールアドレスを反映する
    pub fn with_email(self, email: Email, now: DateTime<Utc>) -> Self {
        Self {
            email,
            updated_at: Some(now),
            ..self
        }
    }

    /// 所属ハウスを設定する
    pub fn with_house(self, house_id: HouseId, now: DateTime<Utc>) -> Self {
        Self {
            house_id: Some(house_id),
            updated_at: Some(now),
            ..self
        }
    }

    /// 残高に加算する（負の値で減算）
    pub fn with_balance_added(self, amount: f64, now: DateTime<Utc>) -> (Self, BalanceChange) {
        let change = BalanceChange {
            previous: self.balance,
            current:  self.balance + amount,
        };
        let user = Self {
            balance: change.current,
            updated_at: Some(now),
            ..self
        };
        (user, change)
    }

    /// 氏名を更新する
    ///
    /// `None` のフィールドは変更しない。
    pub fn with_profile(
        self,
        first_name: Option<PersonName>,
        last_name: Option<PersonName>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            first_name: first_name.or(self.first_name),
            last_name: last_name.or(self.last_name),
            updated_at: Some(now),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[fixture]
    fn new_user(now: DateTime<Utc>) -> User {
        User::new(
            Uid::new("uid-1").unwrap(),
            Email::new("alex@example.com").unwrap(),
            now,
        )
    }

    // Email のテスト

    #[test]
    fn test_メールアドレスは正常な形式を受け入れる() {
        assert!(Email::new("user@example.com").is_ok());
    }

    #[test]
    fn test_メールアドレスは前後の空白を除去する() {
        let email = Email::new("  user@example.com ").unwrap();
        assert_eq!(email.as_str(), "user@example.com");
    }

    #[rstest]
    #[case("", "空文字列")]
    #[case("no-at-sign", "@記号なし")]
    #[case("@", "@のみ")]
    #[case("@example.com", "ローカル部分が空")]
    #[case("user@", "ドメイン部分が空")]
    #[case(&format!("{}@example.com", "a".repeat(256)), "255文字超過")]
    fn test_メールアドレスは不正な形式を拒否する(
        #[case] input: &str,
        #[case] _reason: &str,
    ) {
        assert!(Email::new(input).is_err());
    }

    // PersonName のテスト

    #[test]
    fn test_氏名は51文字以上を拒否する() {
        let result = PersonName::new("a".repeat(51));
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    // User のテスト

    #[rstest]
    fn test_新規ユーザーは残高0でハウス未所属(new_user: User) {
        assert_eq!(new_user.balance(), 0.0);
        assert!(!new_user.is_in_house());
    }

    #[rstest]
    fn test_残高の加算は累積する(new_user: User, now: DateTime<Utc>) {
        let (user, first) = new_user.with_balance_added(12.5, now);
        let (user, second) = user.with_balance_added(-2.5, now);

        assert_eq!(first, BalanceChange { previous: 0.0, current: 12.5 });
        assert_eq!(second, BalanceChange { previous: 12.5, current: 10.0 });
        assert_eq!(user.balance(), 10.0);
    }

    #[rstest]
    fn test_プロフィール更新でnoneのフィールドは保持される(
        new_user: User,
        now: DateTime<Utc>,
    ) {
        let user = new_user.with_profile(
            Some(PersonName::new("Alex").unwrap()),
            Some(PersonName::new("Kim").unwrap()),
            now,
        );
        let user = user.with_profile(None, Some(PersonName::new("Lee").unwrap()), now);

        assert_eq!(user.first_name().unwrap().as_str(), "Alex");
        assert_eq!(user.last_name().unwrap().as_str(), "Lee");
    }

    #[rstest]
    fn test_ハウス設定で所属状態になる(new_user: User, now: DateTime<Utc>) {
        let house_id = HouseId::new();
        let user = new_user.with_house(house_id.clone(), now);

        assert_eq!(user.house_id(), Some(&house_id));
    }
}
