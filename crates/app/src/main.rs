use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use settings::Database;
use teloxide::types::UserId;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "dividi={level},telegram_bot={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let timezone: chrono_tz::Tz = settings
        .locale
        .timezone
        .parse()
        .map_err(|err| format!("invalid timezone {}: {err}", settings.locale.timezone))?;
    let currency = engine::Currency::try_from(settings.locale.currency.as_str())?;

    let db = match parse_database(&settings.database).await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!("failed to initialize database: {err}");
            return Err(err);
        }
    };
    let engine = engine::Engine::builder()
        .database(db)
        .default_currency(currency)
        .build()
        .await?;

    let allowed_users = settings
        .telegram
        .allowed_users
        .iter()
        .copied()
        .map(UserId)
        .collect();
    let bot = telegram_bot::Bot::builder()
        .token(&settings.telegram.token)
        .allowed_users(allowed_users)
        .engine(Arc::new(engine))
        .timezone(timezone)
        .build()?;
    bot.run().await;

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
