use chrono::Utc;
use engine::{EngineError, TemplateCmd, TemplateUse};
use teloxide::{
    prelude::*,
    types::{InlineKeyboardMarkup, MessageId},
};
use uuid::Uuid;

use super::{
    Context, edit_or_send, expenses::send_expense, is_replay, message_key, reply_engine_error,
    reply_parse_error, send_html,
};
use crate::{
    ConfigParameters,
    parsing::{TemplateAction, parse_template},
    ui,
};

pub(super) async fn handle_template(
    bot: &Bot,
    msg: &Message,
    cfg: &ConfigParameters,
    ctx: &Context,
    args: &str,
) -> ResponseResult<()> {
    let action = match parse_template(args, ctx.currency) {
        Ok(action) => action,
        Err(err) => return reply_parse_error(bot, ctx.chat_id, err, ui::template_usage()).await,
    };

    match action {
        TemplateAction::Create {
            name,
            amount_minor,
            category,
            mentions,
        } => {
            if !mentions.is_empty() && !ctx.scope.is_group() {
                return reply_engine_error(
                    bot,
                    ctx.chat_id,
                    EngineError::NotAGroup("mentions".to_string()),
                )
                .await;
            }
            let users = engine_try!(
                bot,
                ctx.chat_id,
                cfg.engine.resolve_usernames(&mentions).await
            );
            let mut cmd = TemplateCmd::new(ctx.scope, ctx.user_id, name, amount_minor)
                .participants(users.iter().map(|u| u.id).collect());
            if let Some(category) = category {
                cmd = cmd.category(category);
            }

            let template = engine_try!(bot, ctx.chat_id, cfg.engine.create_template(cmd).await);
            let (text, kb) = ui::render_template_saved(&template, &users, ctx.currency);
            send_html(bot, ctx.chat_id, text, kb).await
        }
        TemplateAction::List => show_templates(bot, cfg, ctx, None).await,
        TemplateAction::Use {
            name,
            amount_minor,
            description,
        } => {
            let template = engine_try!(
                bot,
                ctx.chat_id,
                cfg.engine
                    .template_by_name(ctx.user_id, ctx.scope, &name)
                    .await
            );
            let key = message_key(msg);
            let mut request =
                TemplateUse::new(template.id, ctx.user_id, msg.date).idempotency_key(key.clone());
            if let Some(amount_minor) = amount_minor {
                request = request.amount_minor(amount_minor);
            }
            if let Some(description) = description {
                request = request.description(description);
            }

            let expense = match cfg.engine.use_template(request).await {
                Ok(expense) => expense,
                Err(err) if is_replay(&err, &key) => {
                    tracing::debug!(%key, "expense already recorded");
                    return Ok(());
                }
                Err(err) => return reply_engine_error(bot, ctx.chat_id, err).await,
            };
            send_expense(bot, cfg, ctx, &expense).await
        }
        TemplateAction::Delete { name } => {
            let template = engine_try!(
                bot,
                ctx.chat_id,
                cfg.engine
                    .template_by_name(ctx.user_id, ctx.scope, &name)
                    .await
            );
            let deleted = engine_try!(
                bot,
                ctx.chat_id,
                cfg.engine.delete_template(ctx.user_id, template.id).await
            );
            send_html(
                bot,
                ctx.chat_id,
                ui::render_template_deleted(&deleted),
                InlineKeyboardMarkup::default(),
            )
            .await
        }
    }
}

/// List the sender's templates, editing `message_id` in place when given.
pub(super) async fn show_templates(
    bot: &Bot,
    cfg: &ConfigParameters,
    ctx: &Context,
    message_id: Option<MessageId>,
) -> ResponseResult<()> {
    let templates = engine_try!(
        bot,
        ctx.chat_id,
        cfg.engine.templates(ctx.user_id, ctx.scope).await
    );
    let (text, kb) = ui::render_templates(&templates, ctx.currency);
    edit_or_send(bot, ctx.chat_id, message_id, text, kb).await
}

pub(super) async fn use_from_button(
    bot: &Bot,
    cfg: &ConfigParameters,
    ctx: &Context,
    template_id: Uuid,
) -> ResponseResult<()> {
    let request = TemplateUse::new(template_id, ctx.user_id, Utc::now());
    let expense = engine_try!(bot, ctx.chat_id, cfg.engine.use_template(request).await);
    send_expense(bot, cfg, ctx, &expense).await
}

pub(super) async fn delete_from_button(
    bot: &Bot,
    cfg: &ConfigParameters,
    ctx: &Context,
    message_id: MessageId,
    template_id: Uuid,
) -> ResponseResult<()> {
    engine_try!(
        bot,
        ctx.chat_id,
        cfg.engine.delete_template(ctx.user_id, template_id).await
    );
    show_templates(bot, cfg, ctx, Some(message_id)).await
}
