use engine::{EngineError, Scope, SettlementCmd, suggest_transfers};
use teloxide::{prelude::*, types::InlineKeyboardMarkup};

use super::{Context, reply_engine_error, reply_parse_error, send_html};
use crate::{ConfigParameters, parsing::parse_settle, ui};

const SETTLE_USAGE: &str = "Usage: /settle @user amount [note]";

pub(super) async fn handle_balance(
    bot: &Bot,
    cfg: &ConfigParameters,
    ctx: &Context,
) -> ResponseResult<()> {
    let Scope::Group(group_id) = ctx.scope else {
        return group_only(bot, ctx, "balance").await;
    };

    let balances = engine_try!(bot, ctx.chat_id, cfg.engine.group_balances(group_id).await);
    let transfers = suggest_transfers(&balances);
    let ids: Vec<i64> = balances.iter().map(|b| b.user_id).collect();
    let users = engine_try!(bot, ctx.chat_id, cfg.engine.users(&ids).await);

    send_html(
        bot,
        ctx.chat_id,
        ui::render_balances(&balances, &transfers, &users, ctx.currency),
        InlineKeyboardMarkup::default(),
    )
    .await
}

pub(super) async fn handle_settle(
    bot: &Bot,
    msg: &Message,
    cfg: &ConfigParameters,
    ctx: &Context,
    args: &str,
) -> ResponseResult<()> {
    let Scope::Group(group_id) = ctx.scope else {
        return group_only(bot, ctx, "settle").await;
    };
    let args = match parse_settle(args, ctx.currency) {
        Ok(args) => args,
        Err(err) => return reply_parse_error(bot, ctx.chat_id, err, SETTLE_USAGE).await,
    };

    let payee = engine_try!(
        bot,
        ctx.chat_id,
        cfg.engine.user_by_username(&args.mention).await
    );
    let mut cmd = SettlementCmd::new(group_id, ctx.user_id, payee.id, args.amount_minor, msg.date);
    if let Some(note) = args.note {
        cmd = cmd.note(note);
    }

    let settlement = engine_try!(bot, ctx.chat_id, cfg.engine.record_settlement(cmd).await);
    let users = engine_try!(
        bot,
        ctx.chat_id,
        cfg.engine
            .users(&[settlement.from_user_id, settlement.to_user_id])
            .await
    );
    send_html(
        bot,
        ctx.chat_id,
        ui::render_settlement(&settlement, &users),
        InlineKeyboardMarkup::default(),
    )
    .await
}

async fn group_only(bot: &Bot, ctx: &Context, command: &str) -> ResponseResult<()> {
    reply_engine_error(bot, ctx.chat_id, EngineError::NotAGroup(command.to_string())).await
}
