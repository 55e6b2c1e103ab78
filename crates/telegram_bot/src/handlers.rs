//! Update handlers.
//!
//! Every update is handled on its own: the sender (and, in group chats, the
//! group and the membership) is registered first, then the command runs a few
//! engine calls and replies. Nothing is kept between updates.

use engine::{Currency, EngineError, Scope, UserProfile};
use teloxide::{
    prelude::*,
    types::{CallbackQuery, Chat, ChatId, InlineKeyboardMarkup, MessageId, ParseMode, User},
};

use crate::{
    ConfigParameters,
    commands::Command,
    parsing::{CallbackAction, ParseError, parse_callback},
};

/// Unwrap an engine result, or reply with the matching notice and stop the
/// handler.
macro_rules! engine_try {
    ($bot:expr, $chat_id:expr, $call:expr) => {
        match $call {
            Ok(value) => value,
            Err(err) => {
                $crate::handlers::reply_engine_error($bot, $chat_id, err).await?;
                return Ok(());
            }
        }
    };
}

mod expenses;
mod settlements;
mod start;
mod summary;
mod templates;

/// Who sent an update and where.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Context {
    pub chat_id: ChatId,
    pub user_id: i64,
    pub scope: Scope,
    /// Group currency, or the default one in private chats.
    pub currency: Currency,
}

pub(crate) async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    if !is_allowed(&cfg, msg.from.as_ref()) {
        return Ok(());
    }
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };

    let ctx = engine_try!(&bot, msg.chat.id, register(&cfg, &msg.chat, from).await);
    tracing::debug!(
        chat_id = ctx.chat_id.0,
        user_id = ctx.user_id,
        command = ?cmd,
        "command received"
    );

    match cmd {
        Command::Start => start::handle_start(&bot, &ctx, from).await,
        Command::Help => start::handle_help(&bot, &ctx).await,
        Command::Expense(args) => expenses::handle_expense(&bot, &msg, &cfg, &ctx, &args).await,
        Command::History => expenses::handle_history(&bot, &cfg, &ctx).await,
        Command::Template(args) => {
            templates::handle_template(&bot, &msg, &cfg, &ctx, &args).await
        }
        Command::Summary(args) => summary::handle_summary(&bot, &cfg, &ctx, &args).await,
        Command::Balance => settlements::handle_balance(&bot, &cfg, &ctx).await,
        Command::Settle(args) => settlements::handle_settle(&bot, &msg, &cfg, &ctx, &args).await,
    }
}

pub(crate) async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    if !is_allowed(&cfg, Some(&q.from)) {
        return Ok(());
    }

    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };
    let chat_id = message.chat().id;
    let message_id = message.id();

    let _ = bot.answer_callback_query(q.id.clone()).await;

    let Some(action) = q.data.as_deref().and_then(parse_callback) else {
        tracing::warn!(data = ?q.data, "unknown callback data");
        return Ok(());
    };

    let ctx = engine_try!(&bot, chat_id, register(&cfg, message.chat(), &q.from).await);
    tracing::debug!(chat_id = chat_id.0, user_id = ctx.user_id, ?action, "callback received");

    match action {
        CallbackAction::VoidExpense(id) => expenses::void_from_button(&bot, &cfg, &ctx, id).await,
        CallbackAction::UseTemplate(id) => templates::use_from_button(&bot, &cfg, &ctx, id).await,
        CallbackAction::DeleteTemplate(id) => {
            templates::delete_from_button(&bot, &cfg, &ctx, message_id, id).await
        }
        CallbackAction::Templates => {
            templates::show_templates(&bot, &cfg, &ctx, Some(message_id)).await
        }
        CallbackAction::Summary(period) => {
            summary::show_summary(&bot, &cfg, &ctx, period, Some(message_id)).await
        }
    }
}

/// Register the sender and, for group chats, the group and the membership.
async fn register(cfg: &ConfigParameters, chat: &Chat, from: &User) -> Result<Context, EngineError> {
    let user_id = i64::try_from(from.id.0)
        .map_err(|_| EngineError::NotAllowed("unsupported user id".to_string()))?;
    cfg.engine
        .register_user(&UserProfile {
            id: user_id,
            username: from.username.clone(),
            display_name: from.full_name(),
        })
        .await?;

    if chat.is_group() || chat.is_supergroup() {
        let group = cfg
            .engine
            .register_group(chat.id.0, chat.title().unwrap_or_default())
            .await?;
        cfg.engine.join_group(group.id, user_id).await?;
        return Ok(Context {
            chat_id: chat.id,
            user_id,
            scope: Scope::Group(group.id),
            currency: group.currency,
        });
    }

    Ok(Context {
        chat_id: chat.id,
        user_id,
        scope: Scope::Personal,
        currency: cfg.engine.default_currency(),
    })
}

fn is_allowed(cfg: &ConfigParameters, from: Option<&User>) -> bool {
    let Some(from) = from else {
        return false;
    };
    match &cfg.allowed_users {
        None => true,
        Some(ids) => ids.contains(&from.id),
    }
}

/// Key that makes a redelivered message record its expense only once.
pub(crate) fn message_key(msg: &Message) -> String {
    format!("tg:{}:{}", msg.chat.id.0, msg.id.0)
}

/// The expense for this message key is already stored.
pub(crate) fn is_replay(err: &EngineError, key: &str) -> bool {
    matches!(err, EngineError::ExistingKey(existing) if existing == key)
}

pub(crate) async fn send_html(
    bot: &Bot,
    chat_id: ChatId,
    text: String,
    kb: InlineKeyboardMarkup,
) -> ResponseResult<()> {
    let request = bot.send_message(chat_id, text).parse_mode(ParseMode::Html);
    if kb.inline_keyboard.is_empty() {
        request.await?;
    } else {
        request.reply_markup(kb).await?;
    }
    Ok(())
}

/// Replace the text of a bot message, falling back to a new message when the
/// old one can no longer be edited.
pub(crate) async fn edit_or_send(
    bot: &Bot,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    text: String,
    kb: InlineKeyboardMarkup,
) -> ResponseResult<()> {
    if let Some(message_id) = message_id {
        match bot
            .edit_message_text(chat_id, message_id, text.clone())
            .parse_mode(ParseMode::Html)
            .reply_markup(kb.clone())
            .await
        {
            Ok(_) => return Ok(()),
            Err(err) => tracing::debug!(%err, "edit failed, sending a new message"),
        }
    }
    send_html(bot, chat_id, text, kb).await
}

pub(crate) async fn reply_engine_error(
    bot: &Bot,
    chat_id: ChatId,
    err: EngineError,
) -> ResponseResult<()> {
    bot.send_message(chat_id, user_message_for_engine_error(err))
        .await?;
    Ok(())
}

pub(crate) async fn reply_parse_error(
    bot: &Bot,
    chat_id: ChatId,
    err: ParseError,
    usage: &str,
) -> ResponseResult<()> {
    bot.send_message(chat_id, format!("Sorry, {err}.\n\n{usage}"))
        .await?;
    Ok(())
}

fn user_message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::KeyNotFound(what) if what.starts_with('@') => format!(
            "I don't know {what} yet. They need to send a message in this chat first."
        ),
        EngineError::KeyNotFound(what) => format!("Not found: {what}."),
        EngineError::ExistingKey(what) => format!("\"{what}\" already exists."),
        EngineError::InvalidAmount(msg)
        | EngineError::InvalidName(msg)
        | EngineError::InvalidPeriod(msg) => format!("Invalid input: {msg}."),
        EngineError::NotAllowed(msg) => format!("Not allowed: {msg}."),
        EngineError::AlreadyVoided(_) => "This expense was already undone.".to_string(),
        EngineError::NotAGroup(_) => "This works only in group chats.".to_string(),
        err @ (EngineError::CurrencyMismatch(_) | EngineError::Database(_)) => {
            tracing::error!(%err, "engine failure");
            "Something went wrong on my side. Please try again later.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_mentions_get_a_hint() {
        let text = user_message_for_engine_error(EngineError::KeyNotFound("@zed".to_string()));
        assert!(text.starts_with("I don't know @zed yet."));
        assert_eq!(
            user_message_for_engine_error(EngineError::KeyNotFound("template".to_string())),
            "Not found: template."
        );
    }

    #[test]
    fn only_the_same_message_key_is_a_replay() {
        let key = "tg:-100:42";
        assert!(is_replay(&EngineError::ExistingKey(key.to_string()), key));
        assert!(!is_replay(&EngineError::ExistingKey("Pizza night".to_string()), key));
        assert!(!is_replay(&EngineError::KeyNotFound(key.to_string()), key));
    }

    #[test]
    fn internal_errors_stay_generic() {
        let text =
            user_message_for_engine_error(EngineError::CurrencyMismatch("invalid: XYZ".to_string()));
        assert!(!text.contains("XYZ"));
    }

    #[test]
    fn validation_errors_are_shown() {
        assert_eq!(
            user_message_for_engine_error(EngineError::InvalidAmount("amount must be > 0".to_string())),
            "Invalid input: amount must be > 0."
        );
        assert_eq!(
            user_message_for_engine_error(EngineError::NotAGroup("x".to_string())),
            "This works only in group chats."
        );
    }
}
