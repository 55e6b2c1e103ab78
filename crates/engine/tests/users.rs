use sea_orm::{Database, DatabaseConnection};

use engine::{Engine, EngineError, UserProfile};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn profile(id: i64, username: Option<&str>, display_name: &str) -> UserProfile {
    UserProfile {
        id,
        username: username.map(str::to_string),
        display_name: display_name.to_string(),
    }
}

#[tokio::test]
async fn register_user_refreshes_profile() {
    let (engine, _db) = engine_with_db().await;

    engine
        .register_user(&profile(1, Some("@Alice"), "Alice"))
        .await
        .unwrap();
    let user = engine
        .register_user(&profile(1, Some("alice_r"), "Alice Rossi"))
        .await
        .unwrap();

    assert_eq!(user.username.as_deref(), Some("alice_r"));
    assert_eq!(user.display_name, "Alice Rossi");
    assert_eq!(engine.user(1).await.unwrap(), user);
    assert!(matches!(
        engine.user_by_username("alice").await.unwrap_err(),
        EngineError::KeyNotFound(_)
    ));
}

#[tokio::test]
async fn usernames_are_case_insensitive() {
    let (engine, _db) = engine_with_db().await;
    engine
        .register_user(&profile(1, Some("Alice"), "Alice"))
        .await
        .unwrap();

    assert_eq!(engine.user_by_username("@ALICE").await.unwrap().id, 1);
    assert_eq!(engine.user_by_username("alice").await.unwrap().id, 1);
}

#[tokio::test]
async fn username_moves_to_the_latest_owner() {
    let (engine, _db) = engine_with_db().await;
    engine
        .register_user(&profile(1, Some("pat"), "Pat One"))
        .await
        .unwrap();
    engine
        .register_user(&profile(2, Some("Pat"), "Pat Two"))
        .await
        .unwrap();

    assert_eq!(engine.user_by_username("pat").await.unwrap().id, 2);
    assert_eq!(engine.user(1).await.unwrap().username, None);
}

#[tokio::test]
async fn resolve_usernames_keeps_order_and_reports_unknown() {
    let (engine, _db) = engine_with_db().await;
    for (id, name) in [(1, "alice"), (2, "bob"), (3, "carol")] {
        engine
            .register_user(&profile(id, Some(name), name))
            .await
            .unwrap();
    }

    let users = engine
        .resolve_usernames(&["@carol".to_string(), "Alice".to_string(), "carol".to_string()])
        .await
        .unwrap();
    let ids: Vec<_> = users.iter().map(|u| u.id).collect();
    assert_eq!(ids, [3, 1]);

    let err = engine
        .resolve_usernames(&["bob".to_string(), "@zed".to_string()])
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("@zed".to_string()));
}

#[tokio::test]
async fn groups_keep_currency_and_refresh_title() {
    let (engine, _db) = engine_with_db().await;
    engine
        .register_user(&profile(1, Some("alice"), "Alice"))
        .await
        .unwrap();

    let group = engine.register_group(-5, "Old title").await.unwrap();
    assert_eq!(group.title, "Old title");
    let group = engine.register_group(-5, "  New   title ").await.unwrap();
    assert_eq!(group.title, "New title");
    assert_eq!(group.currency, engine.default_currency());
    assert_eq!(engine.group(-5).await.unwrap(), group);

    engine.join_group(-5, 1).await.unwrap();
    engine.join_group(-5, 1).await.unwrap();
    let members = engine.group_members(-5).await.unwrap();
    assert_eq!(members.len(), 1);

    assert!(matches!(
        engine.join_group(-6, 1).await.unwrap_err(),
        EngineError::KeyNotFound(_)
    ));
    assert_eq!(
        engine.group(-6).await.unwrap_err(),
        EngineError::KeyNotFound("group -6".to_string())
    );
}
