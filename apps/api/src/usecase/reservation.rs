//! 共用スペース予約ユースケース

use std::sync::Arc;

use chrono::{DateTime, Utc};
use roomiez_domain::{
    clock::Clock,
    identity::VerifiedIdentity,
    reservation::{Location, Reservation, ReservationId, TimeSlot},
};
use roomiez_infra::repository::{ReservationRepository, UserRepository};

use super::{caller_house_id, require_house_id};
use crate::error::ApiError;

/// 予約の作成入力
#[derive(Debug, Clone, Default)]
pub struct CreateReservationInput {
    pub date:       String,
    pub start_time: String,
    pub end_time:   String,
    pub location:   String,
}

/// 削除した予約と削除時刻
#[derive(Debug, Clone)]
pub struct DeletedReservation {
    pub reservation: Reservation,
    pub deleted_at:  DateTime<Utc>,
}

/// 予約ユースケース
pub struct ReservationUseCaseImpl {
    user_repository:        Arc<dyn UserRepository>,
    reservation_repository: Arc<dyn ReservationRepository>,
    clock:                  Arc<dyn Clock>,
}

impl ReservationUseCaseImpl {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        reservation_repository: Arc<dyn ReservationRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repository,
            reservation_repository,
            clock,
        }
    }

    /// 呼び出し元のハウスの予約を日付・開始時刻の順に一覧する
    pub async fn list_reservations(
        &self,
        caller: &VerifiedIdentity,
    ) -> Result<Vec<Reservation>, ApiError> {
        let house_id = require_house_id(self.user_repository.as_ref(), &caller.uid).await?;

        let mut reservations = self.reservation_repository.find_by_house(&house_id).await?;
        reservations.sort_by_key(|r| (r.slot().date(), r.slot().start()));
        Ok(reservations)
    }

    /// 予約を作成する
    ///
    /// 同じハウス・同じ場所で時間帯が重なる予約があれば 409。
    /// 予約者の表示名は氏名の名、未設定ならメールアドレスのローカル部を使う。
    pub async fn create_reservation(
        &self,
        caller: &VerifiedIdentity,
        input: CreateReservationInput,
    ) -> Result<Reservation, ApiError> {
        let required = [&input.start_time, &input.end_time, &input.date, &input.location];
        if required.iter().any(|value| value.trim().is_empty()) {
            return Err(ApiError::Validation(
                "start_time, end_time, date, and location are required".to_string(),
            ));
        }

        let location = Location::parse(&input.location)?;
        let slot = TimeSlot::parse(&input.date, &input.start_time, &input.end_time)?;

        let not_in_house = || ApiError::NotFound("User is not in a house".to_string());
        let user = self
            .user_repository
            .find_by_uid(&caller.uid)
            .await?
            .ok_or_else(not_in_house)?;
        let house_id = user.house_id().cloned().ok_or_else(not_in_house)?;

        let existing = self.reservation_repository.find_by_house(&house_id).await?;
        if existing.iter().any(|r| r.conflicts_with(location, &slot)) {
            return Err(ApiError::Conflict(format!(
                "The {location} is already reserved during this time slot"
            )));
        }

        let display_name = match user.first_name() {
            Some(name) => name.as_str().to_string(),
            None => caller
                .email
                .as_str()
                .split_once('@')
                .map_or_else(|| caller.email.to_string(), |(local, _)| local.to_string()),
        };

        let reservation = Reservation::new(
            ReservationId::new(),
            house_id,
            slot,
            location,
            caller.uid.clone(),
            caller.email.clone(),
            display_name,
            self.clock.now(),
        );
        self.reservation_repository.insert(&reservation).await?;

        tracing::info!(
            event.kind = "business_event",
            event.entity_type = "reservation",
            event.entity_id = %reservation.id(),
            event.action = "reservation.created",
            location = reservation.location().as_str(),
            date = %reservation.slot().date(),
            "予約を作成しました"
        );

        Ok(reservation)
    }

    /// 自分の予約を削除する
    pub async fn delete_reservation(
        &self,
        caller: &VerifiedIdentity,
        reservation_id: &str,
    ) -> Result<DeletedReservation, ApiError> {
        let not_found = || ApiError::NotFound("Reservation not found".to_string());

        let id = ReservationId::parse(reservation_id).ok_or_else(not_found)?;
        let reservation = self
            .reservation_repository
            .find_by_id(&id)
            .await?
            .ok_or_else(not_found)?;

        let house_id = caller_house_id(self.user_repository.as_ref(), &caller.uid).await?;
        if !house_id.is_some_and(|h| reservation.belongs_to(&h)) {
            return Err(ApiError::Forbidden(
                "You can only delete reservations in your house".to_string(),
            ));
        }
        if !reservation.is_reserved_by(&caller.uid) {
            return Err(ApiError::Forbidden(
                "You can only delete your own reservations".to_string(),
            ));
        }

        self.reservation_repository.delete(&id).await?;

        tracing::info!(
            event.kind = "business_event",
            event.entity_type = "reservation",
            event.entity_id = %id,
            event.action = "reservation.deleted",
            "予約を削除しました"
        );

        Ok(DeletedReservation {
            reservation,
            deleted_at: self.clock.now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use roomiez_domain::{
        clock::FixedClock,
        house::HouseId,
        user::{Email, PersonName, Uid, User},
    };
    use roomiez_infra::mock::{MockReservationRepository, MockUserRepository};
    use rstest::rstest;

    use super::*;
    use crate::usecase::test_support::{fixed_now, identity};

    struct Fixture {
        reservations: MockReservationRepository,
        house_id:     HouseId,
        alex:         VerifiedIdentity,
        sam:          VerifiedIdentity,
        usecase:      ReservationUseCaseImpl,
    }

    /// alex（名前あり）と sam（名前なし）が同じハウス
    fn fixture() -> Fixture {
        let users = MockUserRepository::new();
        let reservations = MockReservationRepository::new();
        let house_id = HouseId::new();
        let alex = identity("uid-alex", "alex@example.com");
        let sam = identity("uid-sam", "sam.lee@example.com");

        users.add_user(
            User::new(alex.uid.clone(), alex.email.clone(), fixed_now())
                .with_house(house_id.clone(), fixed_now())
                .with_profile(Some(PersonName::new("Alex").unwrap()), None, fixed_now()),
        );
        users.add_user(
            User::new(sam.uid.clone(), sam.email.clone(), fixed_now())
                .with_house(house_id.clone(), fixed_now()),
        );
        users.add_user(User::new(
            Uid::new("uid-lonely").unwrap(),
            Email::new("lonely@example.com").unwrap(),
            fixed_now(),
        ));

        let usecase = ReservationUseCaseImpl::new(
            Arc::new(users),
            Arc::new(reservations.clone()),
            Arc::new(FixedClock::new(fixed_now())),
        );
        Fixture {
            reservations,
            house_id,
            alex,
            sam,
            usecase,
        }
    }

    fn input(location: &str, date: &str, start: &str, end: &str) -> CreateReservationInput {
        CreateReservationInput {
            date:       date.to_string(),
            start_time: start.to_string(),
            end_time:   end.to_string(),
            location:   location.to_string(),
        }
    }

    #[tokio::test]
    async fn test_予約者の表示名は名を優先しなければメールのローカル部() {
        let f = fixture();

        let by_alex = f
            .usecase
            .create_reservation(&f.alex, input("Kitchen", "2026-03-01", "18:00", "19:00"))
            .await
            .unwrap();
        let by_sam = f
            .usecase
            .create_reservation(&f.sam, input("Shower", "2026-03-01", "7:00", "7:15"))
            .await
            .unwrap();

        assert_eq!(by_alex.person_firstname(), "Alex");
        assert_eq!(by_alex.house_id(), &f.house_id);
        assert_eq!(by_sam.person_firstname(), "sam.lee");
        assert_eq!(f.reservations.count(), 2);
    }

    #[rstest]
    #[case::同じ場所で重なる("Kitchen", "2026-03-01", "18:30", "19:30", true)]
    #[case::別の場所("Living Room", "2026-03-01", "18:30", "19:30", false)]
    #[case::別の日("Kitchen", "2026-03-02", "18:30", "19:30", false)]
    #[case::終了直後から("Kitchen", "2026-03-01", "19:00", "20:00", false)]
    #[tokio::test]
    async fn test_重なる予約だけが競合になる(
        #[case] location: &str,
        #[case] date: &str,
        #[case] start: &str,
        #[case] end: &str,
        #[case] conflict: bool,
    ) {
        let f = fixture();
        f.usecase
            .create_reservation(&f.alex, input("Kitchen", "2026-03-01", "18:00", "19:00"))
            .await
            .unwrap();

        let result = f
            .usecase
            .create_reservation(&f.sam, input(location, date, start, end))
            .await;

        if conflict {
            assert!(
                matches!(result, Err(ApiError::Conflict(ref m)) if m == "The Kitchen is already reserved during this time slot")
            );
            assert_eq!(f.reservations.count(), 1);
        } else {
            assert!(result.is_ok());
            assert_eq!(f.reservations.count(), 2);
        }
    }

    #[rstest]
    #[case::必須項目の欠落("Kitchen", "", "18:00", "19:00", "start_time, end_time, date, and location are required")]
    #[case::未知の場所("Garage", "2026-03-01", "18:00", "19:00", "Invalid location. Must be Living Room, Kitchen, or Shower")]
    #[case::時刻形式("Kitchen", "2026-03-01", "6pm", "19:00", "Invalid time format. Use HH:MM format")]
    #[case::開始と終了が逆("Kitchen", "2026-03-01", "19:00", "18:00", "End time must be after start time")]
    #[tokio::test]
    async fn test_不正な予約はバリデーションエラー(
        #[case] location: &str,
        #[case] date: &str,
        #[case] start: &str,
        #[case] end: &str,
        #[case] expected: &str,
    ) {
        let f = fixture();

        let result = f
            .usecase
            .create_reservation(&f.alex, input(location, date, start, end))
            .await;

        assert!(matches!(result, Err(ApiError::Validation(ref m)) if m == expected));
    }

    #[tokio::test]
    async fn test_ハウス未所属では予約できない() {
        let f = fixture();

        let result = f
            .usecase
            .create_reservation(
                &identity("uid-lonely", "lonely@example.com"),
                input("Kitchen", "2026-03-01", "18:00", "19:00"),
            )
            .await;

        assert!(matches!(result, Err(ApiError::NotFound(ref m)) if m == "User is not in a house"));
    }

    #[tokio::test]
    async fn test_一覧は日付と開始時刻の順() {
        let f = fixture();
        for (date, start, end) in [
            ("2026-03-02", "08:00", "09:00"),
            ("2026-03-01", "10:00", "11:00"),
            ("2026-03-01", "9:00", "9:30"),
        ] {
            f.usecase
                .create_reservation(&f.alex, input("Living Room", date, start, end))
                .await
                .unwrap();
        }

        let reservations = f.usecase.list_reservations(&f.sam).await.unwrap();

        let order: Vec<_> = reservations
            .iter()
            .map(|r| format!("{} {}", r.slot().date_string(), r.slot().start_string()))
            .collect();
        assert_eq!(
            order,
            vec!["2026-03-01 09:00", "2026-03-01 10:00", "2026-03-02 08:00"]
        );
    }

    #[tokio::test]
    async fn test_他人の予約は同じハウスでも削除できない() {
        let f = fixture();
        let reservation = f
            .usecase
            .create_reservation(&f.alex, input("Shower", "2026-03-01", "07:00", "07:30"))
            .await
            .unwrap();

        let result = f
            .usecase
            .delete_reservation(&f.sam, &reservation.id().to_string())
            .await;

        assert!(
            matches!(result, Err(ApiError::Forbidden(ref m)) if m == "You can only delete your own reservations")
        );
        assert_eq!(f.reservations.count(), 1);
    }

    #[tokio::test]
    async fn test_他のハウスの予約は削除できない() {
        let f = fixture();
        let other = Reservation::new(
            ReservationId::new(),
            HouseId::new(),
            TimeSlot::parse("2026-03-01", "07:00", "07:30").unwrap(),
            Location::Shower,
            f.alex.uid.clone(),
            f.alex.email.clone(),
            "Alex".to_string(),
            fixed_now(),
        );
        f.reservations.add_reservation(other.clone());

        let result = f
            .usecase
            .delete_reservation(&f.alex, &other.id().to_string())
            .await;

        assert!(
            matches!(result, Err(ApiError::Forbidden(ref m)) if m == "You can only delete reservations in your house")
        );
    }

    #[tokio::test]
    async fn test_自分の予約を削除できる() {
        let f = fixture();
        let reservation = f
            .usecase
            .create_reservation(&f.alex, input("Shower", "2026-03-01", "07:00", "07:30"))
            .await
            .unwrap();

        let deleted = f
            .usecase
            .delete_reservation(&f.alex, &reservation.id().to_string())
            .await
            .unwrap();

        assert_eq!(deleted.reservation.id(), reservation.id());
        assert_eq!(deleted.deleted_at, fixed_now());
        assert_eq!(f.reservations.count(), 0);
    }

    #[tokio::test]
    async fn test_存在しない予約の削除は404() {
        let f = fixture();

        let result = f.usecase.delete_reservation(&f.alex, "not-a-uuid").await;

        assert!(matches!(result, Err(ApiError::NotFound(ref m)) if m == "Reservation not found"));
    }
}
