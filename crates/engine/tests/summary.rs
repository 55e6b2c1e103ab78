use chrono::{TimeZone, Utc};
use chrono_tz::Europe::Rome;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Currency, Engine, ExpenseCmd, MonthPeriod, Scope, SettlementCmd, UserProfile,
};
use migration::MigratorTrait;

const GROUP: i64 = -400;
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

    for (id, name) in [(ALICE, "Alice"), (BOB, "Bob"), (CAROL, "Carol")] {
        engine
            .register_user(&UserProfile {
                id,
                username: Some(name.to_lowercase()),
                display_name: name.to_string(),
            })
            .await
            .unwrap();
    }
    engine.register_group(GROUP, "Flat").await.unwrap();
    for id in [ALICE, BOB, CAROL] {
        engine.join_group(GROUP, id).await.unwrap();
    }
    (engine, db)
}

fn october() -> MonthPeriod {
    MonthPeriod::new(2026, 10).unwrap()
}

#[tokio::test]
async fn group_summary_aggregates_the_month() {
    let (engine, _db) = engine_with_group().await;
    let group = Scope::Group(GROUP);

    let expenses = [
        (ALICE, 3000, Some("food"), Utc.with_ymd_and_hms(2026, 10, 3, 19, 0, 0).unwrap()),
        (BOB, 1500, Some("food"), Utc.with_ymd_and_hms(2026, 10, 10, 12, 0, 0).unwrap()),
        (ALICE, 900, None, Utc.with_ymd_and_hms(2026, 10, 20, 8, 0, 0).unwrap()),
        // Outside October.
        (CAROL, 10000, Some("rent"), Utc.with_ymd_and_hms(2026, 9, 15, 8, 0, 0).unwrap()),
    ];
    for (payer, amount, category, when) in expenses {
        let mut cmd = ExpenseCmd::new(group, payer, amount, "Stuff", when);
        if let Some(category) = category {
            cmd = cmd.category(category);
        }
        engine.create_expense(cmd).await.unwrap();
    }
    let voided = engine
        .create_expense(ExpenseCmd::new(
            group,
            CAROL,
            7000,
            "Mistake",
            Utc.with_ymd_and_hms(2026, 10, 11, 8, 0, 0).unwrap(),
        ))
        .await
        .unwrap();
    engine.void_expense(voided.id, CAROL).await.unwrap();
    engine
        .record_settlement(SettlementCmd::new(
            GROUP,
            BOB,
            ALICE,
            500,
            Utc.with_ymd_and_hms(2026, 10, 12, 8, 0, 0).unwrap(),
        ))
        .await
        .unwrap();

    let summary = engine
        .monthly_summary(group, ALICE, october(), Rome)
        .await
        .unwrap();

    assert_eq!(summary.currency, Currency::Eur);
    assert_eq!(summary.expense_count, 3);
    assert_eq!(summary.total_minor, 5400);
    assert_eq!(summary.average_minor(), Some(1800));

    let payers: Vec<_> = summary
        .by_payer
        .iter()
        .map(|row| (row.user.id, row.amount_minor))
        .collect();
    assert_eq!(payers, [(ALICE, 3900), (BOB, 1500)]);

    let shares: Vec<_> = summary
        .by_share
        .iter()
        .map(|row| (row.user.display_name.as_str(), row.amount_minor))
        .collect();
    assert_eq!(shares, [("Alice", 1800), ("Bob", 1800), ("Carol", 1800)]);

    assert_eq!(summary.by_category.len(), 2);
    assert_eq!(summary.by_category[0].category.as_deref(), Some("food"));
    assert_eq!(summary.by_category[0].amount_minor, 4500);
    assert_eq!(summary.by_category[0].count, 2);
    assert_eq!(summary.by_category[1].category, None);

    assert_eq!(summary.settlements_count, 1);
    assert_eq!(summary.settlements_total_minor, 500);
    assert!(summary.group_shares.is_empty());
}

#[tokio::test]
async fn month_bounds_follow_the_local_timezone() {
    let (engine, _db) = engine_with_group().await;
    let group = Scope::Group(GROUP);

    // 00:30 on October 1st in Rome.
    engine
        .create_expense(ExpenseCmd::new(
            group,
            ALICE,
            300,
            "Late drink",
            Utc.with_ymd_and_hms(2026, 9, 30, 22, 30, 0).unwrap(),
        ))
        .await
        .unwrap();

    let oct_summary = engine
        .monthly_summary(group, ALICE, october(), Rome)
        .await
        .unwrap();
    assert_eq!(oct_summary.expense_count, 1);

    let september = engine
        .monthly_summary(group, ALICE, october().prev(), Rome)
        .await
        .unwrap();
    assert!(september.is_empty());
}

#[tokio::test]
async fn personal_summary_includes_group_shares() {
    let (engine, _db) = engine_with_group().await;
    let when = Utc.with_ymd_and_hms(2026, 10, 5, 10, 0, 0).unwrap();

    engine
        .create_expense(ExpenseCmd::new(Scope::Personal, BOB, 1200, "Book", when).category("books"))
        .await
        .unwrap();
    engine
        .create_expense(ExpenseCmd::new(Scope::Personal, BOB, 800, "Lunch", when))
        .await
        .unwrap();
    engine
        .create_expense(ExpenseCmd::new(Scope::Personal, ALICE, 5000, "Shoes", when))
        .await
        .unwrap();
    engine
        .create_expense(ExpenseCmd::new(Scope::Group(GROUP), ALICE, 3000, "Dinner", when))
        .await
        .unwrap();

    let summary = engine
        .monthly_summary(Scope::Personal, BOB, october(), Rome)
        .await
        .unwrap();

    assert_eq!(summary.scope, Scope::Personal);
    assert_eq!(summary.expense_count, 2);
    assert_eq!(summary.total_minor, 2000);
    assert_eq!(summary.by_category[0].category.as_deref(), Some("books"));
    assert!(summary.by_payer.is_empty());
    assert_eq!(summary.group_shares, vec![(Currency::Eur, 1000)]);
}

#[tokio::test]
async fn empty_month_is_empty() {
    let (engine, _db) = engine_with_group().await;

    let summary = engine
        .monthly_summary(Scope::Group(GROUP), ALICE, october(), Rome)
        .await
        .unwrap();
    assert!(summary.is_empty());
    assert_eq!(summary.total_minor, 0);
    assert!(summary.by_category.is_empty());
}
