//! DynamoDB 接続・テーブル自動作成・リポジトリの統合テスト
//!
//! DynamoDB Local を使用したテスト。通常の `cargo test` では実行されない。
//!
//! 実行方法:
//! ```bash
//! docker run -p 8001:8000 amazon/dynamodb-local
//! DYNAMODB_ENDPOINT=http://localhost:8001 cargo test -p roomiez-infra --test dynamodb_test -- --ignored
//! ```

use aws_sdk_dynamodb::Client;
use chrono::Utc;
use roomiez_domain::{
    chore::{Chore, ChoreId, ChoreName, ChoreStatus},
    expense::{Expense, ExpenseDescription, ExpenseId},
    house::{House, HouseId, HouseName, JoinCode},
    money::Money,
    reservation::{Location, Reservation, ReservationId, TimeSlot},
    user::{Email, PersonName, Uid},
};
use roomiez_infra::{
    InfraErrorKind,
    dynamodb::{self, TableNames},
    repository::{
        ChoreRepository,
        DynamoDbChoreRepository,
        DynamoDbExpenseRepository,
        DynamoDbHouseRepository,
        DynamoDbReservationRepository,
        DynamoDbUserRepository,
        ExpenseRepository,
        HouseRepository,
        ReservationRepository,
        UserRepository,
    },
};

/// テスト用の DynamoDB エンドポイント
///
/// `.env` があれば読み込んだうえで `DYNAMODB_ENDPOINT` を参照する。
/// 未設定ならフォールバック: `http://localhost:8001`
fn dynamodb_endpoint() -> String {
    dotenvy::dotenv().ok();
    std::env::var("DYNAMODB_ENDPOINT").unwrap_or_else(|_| "http://localhost:8001".to_string())
}

/// ランダムなプレフィックスでテーブルを作成する（他テストとの競合を防止）
async fn setup() -> (Client, TableNames) {
    let client = dynamodb::create_client(Some(&dynamodb_endpoint()), "us-east-1").await;
    let names = TableNames::with_prefix(&format!("test_{}_", uuid::Uuid::now_v7().simple()));
    dynamodb::ensure_tables(&client, &names)
        .await
        .expect("テーブル作成に失敗");
    (client, names)
}

async fn cleanup(client: &Client, names: &TableNames) {
    for spec in names.specs() {
        let _ = client.delete_table().table_name(&spec.table_name).send().await;
    }
}

#[tokio::test]
#[ignore = "DynamoDB Local が必要"]
async fn test_ensure_tablesが既存テーブルに対して冪等に動作する() {
    let (client, names) = setup().await;

    let result = dynamodb::ensure_tables(&client, &names).await;
    assert!(result.is_ok(), "2 回目の呼び出しでエラー: {:?}", result.err());

    let describe = client
        .describe_table()
        .table_name(&names.houses)
        .send()
        .await
        .unwrap();
    let table = describe.table.unwrap();
    assert!(
        table
            .global_secondary_indexes()
            .iter()
            .any(|gsi| gsi.index_name() == Some(dynamodb::JOIN_CODE_INDEX)),
        "join_code-index が見つかりません"
    );

    cleanup(&client, &names).await;
}

#[tokio::test]
#[ignore = "DynamoDB Local が必要"]
async fn test_ユーザーのupsertと残高加算() {
    let (client, names) = setup().await;
    let repo = DynamoDbUserRepository::new(client.clone(), names.users.clone());
    let uid = Uid::new("uid-1").unwrap();
    let email = Email::new("alex@example.com").unwrap();

    let created = repo.upsert_identity(&uid, &email, Utc::now()).await.unwrap();
    assert_eq!(created.balance(), 0.0);
    assert!(!created.is_in_house());

    let change = repo.add_balance(&uid, 12.5, Utc::now()).await.unwrap();
    assert_eq!(change.previous, 0.0);
    assert_eq!(change.current, 12.5);

    let change = repo.add_balance(&uid, -2.5, Utc::now()).await.unwrap();
    assert_eq!(change.previous, 12.5);
    assert_eq!(change.current, 10.0);

    // 再 upsert しても残高は保持される
    let again = repo.upsert_identity(&uid, &email, Utc::now()).await.unwrap();
    assert_eq!(again.balance(), 10.0);

    let updated = repo
        .update_profile(
            &uid,
            Some(&PersonName::new("Alex").unwrap()),
            None,
            Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(updated.first_name().map(|n| n.as_str()), Some("Alex"));
    assert!(updated.last_name().is_none());

    let found = repo.find_by_email(&email).await.unwrap().unwrap();
    assert_eq!(found.uid(), &uid);

    cleanup(&client, &names).await;
}

#[tokio::test]
#[ignore = "DynamoDB Local が必要"]
async fn test_ハウスへの重複参加はconflictになる() {
    let (client, names) = setup().await;
    let repo = DynamoDbHouseRepository::new(client.clone(), names.houses.clone());
    let owner = Email::new("owner@example.com").unwrap();
    let house = House::new(
        HouseId::new(),
        HouseName::new("Maple St").unwrap(),
        JoinCode::generate(),
        Uid::new("uid-owner").unwrap(),
        owner.clone(),
        Utc::now(),
    );
    repo.insert(&house).await.unwrap();

    let found = repo
        .find_by_join_code(house.join_code())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id(), house.id());

    let roommate = Email::new("roommate@example.com").unwrap();
    repo.add_member(house.id(), &roommate).await.unwrap();

    let err = repo.add_member(house.id(), &roommate).await.unwrap_err();
    assert!(matches!(err.kind(), InfraErrorKind::Conflict { .. }));

    let stored = repo.find_by_id(house.id()).await.unwrap().unwrap();
    assert_eq!(stored.members(), &[owner, roommate]);

    cleanup(&client, &names).await;
}

#[tokio::test]
#[ignore = "DynamoDB Local が必要"]
async fn test_家事のステータス更新と削除() {
    let (client, names) = setup().await;
    let repo = DynamoDbChoreRepository::new(client.clone(), names.chores.clone());
    let house_id = HouseId::new();
    let assignee = Email::new("roommate@example.com").unwrap();
    let chore = Chore::new(
        ChoreId::new(),
        house_id.clone(),
        assignee.clone(),
        ChoreName::new("Take out trash").unwrap(),
        None,
        Utc::now(),
    );
    repo.insert(&chore).await.unwrap();

    let completed = chore.clone().with_status(ChoreStatus::Completed, Utc::now());
    repo.update_status(&completed).await.unwrap();
    let stored = repo.find_by_id(chore.id()).await.unwrap().unwrap();
    assert_eq!(stored.status(), ChoreStatus::Completed);
    assert!(stored.completed_at().is_some());

    let pending = stored.with_status(ChoreStatus::Pending, Utc::now());
    repo.update_status(&pending).await.unwrap();
    let stored = repo.find_by_id(chore.id()).await.unwrap().unwrap();
    assert!(stored.completed_at().is_none());

    assert_eq!(repo.find_by_house(&house_id).await.unwrap().len(), 1);
    assert_eq!(repo.find_by_assignee(&assignee).await.unwrap().len(), 1);

    repo.delete(chore.id()).await.unwrap();
    assert!(repo.find_by_id(chore.id()).await.unwrap().is_none());

    // 削除済みの家事のステータス更新は conflict
    let err = repo.update_status(&completed).await.unwrap_err();
    assert!(matches!(err.kind(), InfraErrorKind::Conflict { .. }));

    cleanup(&client, &names).await;
}

#[tokio::test]
#[ignore = "DynamoDB Local が必要"]
async fn test_残高加算の結果は10進で保存された値になる() {
    let (client, names) = setup().await;
    let repo = DynamoDbUserRepository::new(client.clone(), names.users.clone());
    let uid = Uid::new("uid-1").unwrap();
    repo.upsert_identity(&uid, &Email::new("alex@example.com").unwrap(), Utc::now())
        .await
        .unwrap();

    repo.add_balance(&uid, 0.1, Utc::now()).await.unwrap();
    let change = repo.add_balance(&uid, 0.2, Utc::now()).await.unwrap();

    // f64 同士の加算（0.30000000000000004）ではなく、ストアが加算した値を返す
    assert_eq!(change.current, 0.3);
    let stored = repo.find_by_uid(&uid).await.unwrap().unwrap();
    assert_eq!(stored.balance(), change.current);

    cleanup(&client, &names).await;
}

#[tokio::test]
#[ignore = "DynamoDB Local が必要"]
async fn test_立替をハウス単位で一覧できる() {
    let (client, names) = setup().await;
    let repo = DynamoDbExpenseRepository::new(client.clone(), names.expenses.clone());
    let house_id = HouseId::new();
    let alex = Email::new("alex@example.com").unwrap();
    let expense = Expense::new(
        ExpenseId::new(),
        house_id.clone(),
        ExpenseDescription::new("Utilities").unwrap(),
        Money::positive(90.0).unwrap(),
        alex.clone(),
        vec![alex, Email::new("sam@example.com").unwrap()],
        Utc::now(),
    )
    .unwrap();
    repo.insert(&expense).await.unwrap();

    let found = repo.find_by_house(&house_id).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), expense.id());
    assert_eq!(found[0].amount_per_person(), 45.0);
    assert!(repo.find_by_house(&HouseId::new()).await.unwrap().is_empty());

    cleanup(&client, &names).await;
}

#[tokio::test]
#[ignore = "DynamoDB Local が必要"]
async fn test_予約の作成と削除() {
    let (client, names) = setup().await;
    let repo = DynamoDbReservationRepository::new(client.clone(), names.reservations.clone());
    let house_id = HouseId::new();
    let reservation = Reservation::new(
        ReservationId::new(),
        house_id.clone(),
        TimeSlot::parse("2026-03-01", "18:00", "19:00").unwrap(),
        Location::Kitchen,
        Uid::new("uid-1").unwrap(),
        Email::new("alex@example.com").unwrap(),
        "Alex".to_string(),
        Utc::now(),
    );
    repo.insert(&reservation).await.unwrap();

    let stored = repo.find_by_id(reservation.id()).await.unwrap().unwrap();
    assert_eq!(stored.slot(), reservation.slot());
    assert_eq!(repo.find_by_house(&house_id).await.unwrap().len(), 1);

    repo.delete(reservation.id()).await.unwrap();
    assert!(repo.find_by_id(reservation.id()).await.unwrap().is_none());

    cleanup(&client, &names).await;
}
