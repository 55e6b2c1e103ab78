use engine::{EngineError, Expense, ExpenseCmd};
use teloxide::{prelude::*, types::InlineKeyboardMarkup};
use uuid::Uuid;

use super::{Context, is_replay, message_key, reply_engine_error, reply_parse_error, send_html};
use crate::{ConfigParameters, parsing::parse_expense, ui};

const EXPENSE_USAGE: &str = "Usage: /expense amount [#category] [description] [@user ...]";
const HISTORY_LIMIT: u64 = 10;

pub(super) async fn handle_expense(
    bot: &Bot,
    msg: &Message,
    cfg: &ConfigParameters,
    ctx: &Context,
    args: &str,
) -> ResponseResult<()> {
    let args = match parse_expense(args, ctx.currency) {
        Ok(args) => args,
        Err(err) => return reply_parse_error(bot, ctx.chat_id, err, EXPENSE_USAGE).await,
    };

    if !args.mentions.is_empty() && !ctx.scope.is_group() {
        return reply_engine_error(
            bot,
            ctx.chat_id,
            EngineError::NotAGroup("mentions".to_string()),
        )
        .await;
    }
    let participants: Vec<i64> = engine_try!(
        bot,
        ctx.chat_id,
        cfg.engine.resolve_usernames(&args.mentions).await
    )
    .into_iter()
    .map(|user| user.id)
    .collect();

    let description = args
        .description
        .or_else(|| args.category.clone())
        .unwrap_or_else(|| "Expense".to_string());
    let key = message_key(msg);
    let mut cmd = ExpenseCmd::new(ctx.scope, ctx.user_id, args.amount_minor, description, msg.date)
        .participants(participants)
        .idempotency_key(key.clone());
    if let Some(category) = args.category {
        cmd = cmd.category(category);
    }

    let expense = match cfg.engine.create_expense(cmd).await {
        Ok(expense) => expense,
        Err(err) if is_replay(&err, &key) => {
            tracing::debug!(%key, "expense already recorded");
            return Ok(());
        }
        Err(err) => return reply_engine_error(bot, ctx.chat_id, err).await,
    };
    send_expense(bot, cfg, ctx, &expense).await
}

pub(super) async fn handle_history(
    bot: &Bot,
    cfg: &ConfigParameters,
    ctx: &Context,
) -> ResponseResult<()> {
    let expenses = engine_try!(
        bot,
        ctx.chat_id,
        cfg.engine
            .recent_expenses(ctx.scope, ctx.user_id, HISTORY_LIMIT)
            .await
    );
    let mut payer_ids: Vec<i64> = expenses.iter().map(|e| e.payer_id).collect();
    payer_ids.sort_unstable();
    payer_ids.dedup();
    let users = engine_try!(bot, ctx.chat_id, cfg.engine.users(&payer_ids).await);

    let (text, kb) = ui::render_history(&expenses, &users, ctx.user_id);
    send_html(bot, ctx.chat_id, text, kb).await
}

pub(super) async fn void_from_button(
    bot: &Bot,
    cfg: &ConfigParameters,
    ctx: &Context,
    expense_id: Uuid,
) -> ResponseResult<()> {
    let expense = engine_try!(
        bot,
        ctx.chat_id,
        cfg.engine.void_expense(expense_id, ctx.user_id).await
    );
    send_html(
        bot,
        ctx.chat_id,
        ui::render_voided(&expense),
        InlineKeyboardMarkup::default(),
    )
    .await
}

/// Confirmation message for a freshly recorded expense, with its undo button.
pub(super) async fn send_expense(
    bot: &Bot,
    cfg: &ConfigParameters,
    ctx: &Context,
    expense: &Expense,
) -> ResponseResult<()> {
    let mut ids: Vec<i64> = expense.splits.iter().map(|s| s.user_id).collect();
    ids.push(expense.payer_id);
    ids.sort_unstable();
    ids.dedup();
    let users = engine_try!(bot, ctx.chat_id, cfg.engine.users(&ids).await);

    let (text, kb) = ui::render_expense(expense, &users);
    send_html(bot, ctx.chat_id, text, kb).await
}
