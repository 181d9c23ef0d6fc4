//! # ハウス
//!
//! ルームメイトが共同で家事を管理する単位。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`House`] | ハウス | 共同生活グループ。メンバーはメールアドレスの一覧 |
//! | [`JoinCode`] | 参加コード | 6 文字の英大文字・数字。他のメンバーを招待するときに共有する |
//!
//! ## 不変条件
//!
//! - 作成直後のメンバーは作成者のみ
//! - 同じメールアドレスが `members` に 2 度現れない

use chrono::{DateTime, Utc};

use crate::{
    DomainError,
    user::{Email, Uid},
};

define_uuid_id! {
    /// ハウス ID
    pub struct HouseId;
}

define_validated_string! {
    /// ハウス名
    pub struct HouseName {
        label: "House name",
        max_length: 100,
    }
}

/// 生成される参加コードの文字数
pub const JOIN_CODE_LENGTH: usize = 6;

/// 参加リクエストで受け付ける参加コードの最大文字数
const JOIN_CODE_MAX_INPUT_LENGTH: usize = 20;

/// 参加コード（値オブジェクト）
///
/// 生成時はランダムな UUID の先頭 6 文字を大文字化したもの。
/// 照合時は入力を trim + 大文字化して比較する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct JoinCode(String);

impl JoinCode {
    /// 新しい参加コードを生成する
    pub fn generate() -> Self {
        let simple = uuid::Uuid::new_v4().simple().to_string();
        Self(simple[..JOIN_CODE_LENGTH].to_uppercase())
    }

    /// ユーザー入力から参加コードを作成する
    ///
    /// 前後の空白を除去して大文字化する。空文字列と 20 文字超は拒否する。
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_uppercase();

        if value.is_empty() {
            return Err(DomainError::Validation("Join code is required".to_string()));
        }

        if value.chars().count() > JOIN_CODE_MAX_INPUT_LENGTH {
            return Err(DomainError::Validation(format!(
                "Join code must be at most {JOIN_CODE_MAX_INPUT_LENGTH} characters"
            )));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JoinCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ハウスエンティティ
#[derive(Debug, Clone, PartialEq)]
pub struct House {
    id:          HouseId,
    name:        HouseName,
    join_code:   JoinCode,
    owner_uid:   Uid,
    owner_email: Email,
    members:     Vec<Email>,
    created_at:  Option<DateTime<Utc>>,
}

impl House {
    /// 新しいハウスを作成する
    ///
    /// 作成者がオーナー兼唯一のメンバーになる。
    pub fn new(
        id: HouseId,
        name: HouseName,
        join_code: JoinCode,
        owner_uid: Uid,
        owner_email: Email,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            join_code,
            owner_uid,
            members: vec![owner_email.clone()],
            owner_email,
            created_at: Some(now),
        }
    }

    /// 永続化済みのデータから復元する
    pub fn from_stored(
        id: HouseId,
        name: HouseName,
        join_code: JoinCode,
        owner_uid: Uid,
        owner_email: Email,
        members: Vec<Email>,
        created_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            name,
            join_code,
            owner_uid,
            owner_email,
            members,
            created_at,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> &HouseId {
        &self.id
    }

    pub fn name(&self) -> &HouseName {
        &self.name
    }

    pub fn join_code(&self) -> &JoinCode {
        &self.join_code
    }

    pub fn owner_uid(&self) -> &Uid {
        &self.owner_uid
    }

    pub fn owner_email(&self) -> &Email {
        &self.owner_email
    }

    pub fn members(&self) -> &[Email] {
        &self.members
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// 指定したメールアドレスがメンバーか
    pub fn is_member(&self, email: &Email) -> bool {
        self.members.contains(email)
    }

    /// メンバーを追加する
    ///
    /// # エラー
    ///
    /// 既にメンバーである場合は `DomainError::Validation` を返す。
    pub fn with_member(self, email: Email) -> Result<Self, DomainError> {
        if self.is_member(&email) {
            return Err(DomainError::Validation(
                "User already in the house".to_string(),
            ));
        }

        let mut members = self.members;
        members.push(email);
        Ok(Self { members, ..self })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn owner_email() -> Email {
        Email::new("owner@example.com").unwrap()
    }

    #[fixture]
    fn house(owner_email: Email) -> House {
        House::new(
            HouseId::new(),
            HouseName::new("Maple St").unwrap(),
            JoinCode::generate(),
            Uid::new("owner-uid").unwrap(),
            owner_email,
            Utc::now(),
        )
    }

    // JoinCode のテスト

    #[test]
    fn test_生成された参加コードは6文字の英大文字と数字() {
        for _ in 0..50 {
            let code = JoinCode::generate();
            assert_eq!(code.as_str().len(), JOIN_CODE_LENGTH);
            assert!(
                code.as_str()
                    .chars()
                    .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
            );
        }
    }

    #[test]
    fn test_参加コードの入力はtrimと大文字化で正規化される() {
        let code = JoinCode::new("  ab12cd ").unwrap();
        assert_eq!(code.as_str(), "AB12CD");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("ABCDEFGHIJKLMNOPQRSTU")]
    fn test_参加コードの不正な入力を拒否する(#[case] input: &str) {
        assert!(JoinCode::new(input).is_err());
    }

    // House のテスト

    #[rstest]
    fn test_作成直後のメンバーは作成者のみ(house: House, owner_email: Email) {
        assert_eq!(house.members(), &[owner_email.clone()]);
        assert!(house.is_member(&owner_email));
        assert_eq!(house.owner_email(), &owner_email);
    }

    #[rstest]
    fn test_メンバー追加で末尾に追加される(house: House) {
        let roommate = Email::new("roommate@example.com").unwrap();
        let house = house.with_member(roommate.clone()).unwrap();

        assert_eq!(house.members().len(), 2);
        assert_eq!(house.members()[1], roommate);
    }

    #[rstest]
    fn test_既存メンバーの追加はバリデーションエラー(house: House, owner_email: Email) {
        let result = house.with_member(owner_email);

        assert!(matches!(
            result,
            Err(DomainError::Validation(msg)) if msg == "User already in the house"
        ));
    }

    #[test]
    fn test_ハウス名は101文字以上を拒否する() {
        assert!(HouseName::new("a".repeat(101)).is_err());
        assert!(HouseName::new("a".repeat(100)).is_ok());
    }
}
