//! Telegram bot.
//!
//! Commands and inline buttons are turned into [`engine::Engine`] calls. The
//! bot keeps no state of its own: everything it needs to answer an update is
//! either in the update or in the database.

use std::sync::Arc;

use chrono_tz::Tz;
use engine::Engine;
use teloxide::{prelude::*, utils::command::BotCommands};

use crate::commands::Command;

mod commands;
mod handlers;
mod parsing;
mod ui;

#[derive(Clone)]
pub struct ConfigParameters {
    allowed_users: Option<Vec<UserId>>,
    engine: Arc<Engine>,
    /// Month boundaries for summaries.
    timezone: Tz,
}

pub struct Bot {
    token: String,
    allowed_users: Option<Vec<UserId>>,
    engine: Arc<Engine>,
    timezone: Tz,
}

impl Bot {
    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    pub async fn run(&self) {
        tracing::info!("Starting telegram bot...");

        let bot = teloxide::Bot::new(&self.token);
        if let Err(err) = bot.set_my_commands(Command::bot_commands()).await {
            tracing::warn!(%err, "failed to publish the command list");
        }

        let parameters = ConfigParameters {
            allowed_users: self.allowed_users.clone(),
            engine: Arc::clone(&self.engine),
            timezone: self.timezone,
        };

        let handler = dptree::entry()
            .branch(
                Update::filter_message().branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handlers::handle_command),
                ),
            )
            .branch(Update::filter_callback_query().endpoint(handlers::handle_callback));

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![parameters])
            .default_handler(|upd| async move {
                tracing::debug!("Unhandled update: {:?}", upd);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

#[derive(Default)]
pub struct BotBuilder {
    token: String,
    allowed_users: Option<Vec<UserId>>,
    engine: Option<Arc<Engine>>,
    timezone: Option<Tz>,
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.token = token.to_string();
        self
    }

    pub fn allowed_users(mut self, allowed_users: Vec<UserId>) -> BotBuilder {
        if !allowed_users.is_empty() {
            self.allowed_users = Some(allowed_users);
        }
        self
    }

    pub fn engine(mut self, engine: Arc<Engine>) -> BotBuilder {
        self.engine = Some(engine);
        self
    }

    pub fn timezone(mut self, timezone: Tz) -> BotBuilder {
        self.timezone = Some(timezone);
        self
    }

    pub fn build(self) -> Result<Bot, String> {
        tracing::info!("Initializing telegram bot...");
        if self.token.trim().is_empty() {
            return Err("missing telegram bot token".to_string());
        }
        let engine = self
            .engine
            .ok_or_else(|| "missing engine".to_string())?;
        Ok(Bot {
            token: self.token,
            allowed_users: self.allowed_users,
            engine,
            timezone: self.timezone.unwrap_or(Tz::UTC),
        })
    }
}
