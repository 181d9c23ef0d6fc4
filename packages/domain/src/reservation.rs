//! # 共用スペースの予約
//!
//! リビング・キッチン・シャワーを時間帯で予約する。
//! 同じハウス・同じ場所・同じ日で時間帯が重なる予約は作れない。
//!
//! 時刻は `HH:MM`（時は 1 桁も可）、日付は `YYYY-MM-DD` で受け付け、
//! 表示・保存時は `HH:MM` / `YYYY-MM-DD` に正規化する。

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use strum::IntoStaticStr;

use crate::{
    DomainError,
    house::HouseId,
    user::{Email, Uid},
};

define_uuid_id! {
    /// 予約 ID
    pub struct ReservationId;
}

/// 予約できる場所
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
pub enum Location {
    #[strum(serialize = "Living Room")]
    LivingRoom,
    Kitchen,
    Shower,
}

impl Location {
    /// クライアント入力から場所をパースする
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        value.trim().parse().map_err(|_| {
            DomainError::Validation(
                "Invalid location. Must be Living Room, Kitchen, or Shower".to_string(),
            )
        })
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// 予約の時間帯（日付と開始・終了時刻）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    date:  NaiveDate,
    start: NaiveTime,
    end:   NaiveTime,
}

impl TimeSlot {
    const DATE_FORMAT: &'static str = "%Y-%m-%d";
    const TIME_FORMAT: &'static str = "%H:%M";

    /// 文字列から時間帯をパースする
    ///
    /// # エラー
    ///
    /// 時刻・日付の形式が不正な場合、または終了時刻が開始時刻以前の場合は
    /// `DomainError::Validation`。
    pub fn parse(date: &str, start: &str, end: &str) -> Result<Self, DomainError> {
        let start = parse_time(start)?;
        let end = parse_time(end)?;
        let date = NaiveDate::parse_from_str(date.trim(), Self::DATE_FORMAT).map_err(|_| {
            DomainError::Validation("Invalid date format. Use YYYY-MM-DD format".to_string())
        })?;

        if start >= end {
            return Err(DomainError::Validation(
                "End time must be after start time".to_string(),
            ));
        }

        Ok(Self { date, start, end })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// `YYYY-MM-DD`
    pub fn date_string(&self) -> String {
        self.date.format(Self::DATE_FORMAT).to_string()
    }

    /// `HH:MM`
    pub fn start_string(&self) -> String {
        self.start.format(Self::TIME_FORMAT).to_string()
    }

    /// `HH:MM`
    pub fn end_string(&self) -> String {
        self.end.format(Self::TIME_FORMAT).to_string()
    }

    /// 同じ日で時間帯が重なるか（端点の接触は重ならない）
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.date == other.date && self.start < other.end && other.start < self.end
    }
}

fn parse_time(value: &str) -> Result<NaiveTime, DomainError> {
    NaiveTime::parse_from_str(value.trim(), TimeSlot::TIME_FORMAT).map_err(|_| {
        DomainError::Validation("Invalid time format. Use HH:MM format".to_string())
    })
}

/// 予約エンティティ
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    id:               ReservationId,
    house_id:         HouseId,
    slot:             TimeSlot,
    location:         Location,
    person_uid:       Uid,
    person_email:     Email,
    person_firstname: String,
    created_at:       DateTime<Utc>,
}

impl Reservation {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ReservationId,
        house_id: HouseId,
        slot: TimeSlot,
        location: Location,
        person_uid: Uid,
        person_email: Email,
        person_firstname: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            house_id,
            slot,
            location,
            person_uid,
            person_email,
            person_firstname,
            created_at,
        }
    }

    pub fn id(&self) -> &ReservationId {
        &self.id
    }

    pub fn house_id(&self) -> &HouseId {
        &self.house_id
    }

    pub fn slot(&self) -> &TimeSlot {
        &self.slot
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn person_uid(&self) -> &Uid {
        &self.person_uid
    }

    pub fn person_email(&self) -> &Email {
        &self.person_email
    }

    pub fn person_firstname(&self) -> &str {
        &self.person_firstname
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn belongs_to(&self, house_id: &HouseId) -> bool {
        &self.house_id == house_id
    }

    /// 指定したユーザーの予約か
    pub fn is_reserved_by(&self, uid: &Uid) -> bool {
        &self.person_uid == uid
    }

    /// 同じ場所で時間帯が重なるか
    pub fn conflicts_with(&self, location: Location, slot: &TimeSlot) -> bool {
        self.location == location && self.slot.overlaps(slot)
    }
}
