use chrono::{TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Balance, Currency, Engine, EngineError, ExpenseCmd, Scope, SettlementCmd, UserProfile,
    suggest_transfers,
};
use migration::MigratorTrait;

const GROUP: i64 = -300;
const ALICE: i64 = 1;
const BOB: i64 = 2;
const CAROL: i64 = 3;

async fn engine_with_group() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .default_currency(Currency::Eur)
        .build()
        .await
        .unwrap();

    for (id, name) in [(ALICE, "alice"), (BOB, "bob"), (CAROL, "carol")] {
        engine
            .register_user(&UserProfile {
                id,
                username: Some(name.to_string()),
                display_name: name.to_string(),
            })
            .await
            .unwrap();
    }
    engine.register_group(GROUP, "Holiday").await.unwrap();
    for id in [ALICE, BOB, CAROL] {
        engine.join_group(GROUP, id).await.unwrap();
    }
    (engine, db)
}

fn net_of(balances: &[Balance], user_id: i64) -> i64 {
    balances
        .iter()
        .find(|b| b.user_id == user_id)
        .map(|b| b.net_minor)
        .unwrap()
}

#[tokio::test]
async fn new_group_is_settled() {
    let (engine, _db) = engine_with_group().await;

    let balances = engine.group_balances(GROUP).await.unwrap();
    assert_eq!(balances.len(), 3);
    assert!(balances.iter().all(|b| b.net_minor == 0));
    assert!(suggest_transfers(&balances).is_empty());
}

#[tokio::test]
async fn payer_is_owed_the_other_shares() {
    let (engine, _db) = engine_with_group().await;
    let when = Utc.with_ymd_and_hms(2026, 10, 2, 19, 0, 0).unwrap();

    engine
        .create_expense(ExpenseCmd::new(Scope::Group(GROUP), ALICE, 3000, "Dinner", when))
        .await
        .unwrap();
    engine
        .create_expense(
            ExpenseCmd::new(Scope::Group(GROUP), BOB, 1000, "Taxi", when).participants(vec![BOB, CAROL]),
        )
        .await
        .unwrap();

    let balances = engine.group_balances(GROUP).await.unwrap();
    assert_eq!(net_of(&balances, ALICE), 2000);
    assert_eq!(net_of(&balances, BOB), -500);
    assert_eq!(net_of(&balances, CAROL), -1500);
    assert_eq!(balances.iter().map(|b| b.net_minor).sum::<i64>(), 0);
    assert_eq!(balances[0].user_id, ALICE);

    let plan = suggest_transfers(&balances);
    assert_eq!(plan.len(), 2);
    assert!(plan.iter().all(|t| t.to_user_id == ALICE));
    assert_eq!(plan.iter().map(|t| t.amount_minor).sum::<i64>(), 2000);
}

#[tokio::test]
async fn voided_expenses_do_not_count() {
    let (engine, _db) = engine_with_group().await;

    let expense = engine
        .create_expense(ExpenseCmd::new(Scope::Group(GROUP), ALICE, 3000, "Oops", Utc::now()))
        .await
        .unwrap();
    engine.void_expense(expense.id, ALICE).await.unwrap();

    let balances = engine.group_balances(GROUP).await.unwrap();
    assert!(balances.iter().all(|b| b.net_minor == 0));
}

#[tokio::test]
async fn settlement_reduces_debt() {
    let (engine, _db) = engine_with_group().await;

    engine
        .create_expense(ExpenseCmd::new(Scope::Group(GROUP), ALICE, 3000, "Hotel", Utc::now()))
        .await
        .unwrap();
    let settlement = engine
        .record_settlement(SettlementCmd::new(GROUP, BOB, ALICE, 1000, Utc::now()).note(" cash "))
        .await
        .unwrap();
    assert_eq!(settlement.currency, Currency::Eur);
    assert_eq!(settlement.note.as_deref(), Some("cash"));

    let balances = engine.group_balances(GROUP).await.unwrap();
    assert_eq!(net_of(&balances, ALICE), 1000);
    assert_eq!(net_of(&balances, BOB), 0);
    assert_eq!(net_of(&balances, CAROL), -1000);

    let history = engine.settlements(GROUP, 10).await.unwrap();
    assert_eq!(history, vec![settlement]);
}

#[tokio::test]
async fn invalid_settlements_are_rejected() {
    let (engine, _db) = engine_with_group().await;
    engine
        .register_user(&UserProfile {
            id: 42,
            username: Some("zed".to_string()),
            display_name: "Zed".to_string(),
        })
        .await
        .unwrap();

    let err = engine
        .record_settlement(SettlementCmd::new(GROUP, BOB, BOB, 100, Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotAllowed(_)));

    let err = engine
        .record_settlement(SettlementCmd::new(GROUP, BOB, ALICE, -5, Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .record_settlement(SettlementCmd::new(GROUP, 42, ALICE, 100, Utc::now()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotAllowed(_)));
}
