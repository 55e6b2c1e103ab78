use engine::MonthPeriod;
use teloxide::{prelude::*, types::MessageId};

use super::{Context, edit_or_send, reply_parse_error};
use crate::{ConfigParameters, parsing::parse_period, ui};

const SUMMARY_USAGE: &str = "Usage: /summary [YYYY-MM]";

pub(super) async fn handle_summary(
    bot: &Bot,
    cfg: &ConfigParameters,
    ctx: &Context,
    args: &str,
) -> ResponseResult<()> {
    let period = match parse_period(args, cfg.timezone) {
        Ok(period) => period,
        Err(err) => return reply_parse_error(bot, ctx.chat_id, err, SUMMARY_USAGE).await,
    };
    show_summary(bot, cfg, ctx, period, None).await
}

/// Render the summary of `period`, editing `message_id` in place when given.
pub(super) async fn show_summary(
    bot: &Bot,
    cfg: &ConfigParameters,
    ctx: &Context,
    period: MonthPeriod,
    message_id: Option<MessageId>,
) -> ResponseResult<()> {
    let summary = engine_try!(
        bot,
        ctx.chat_id,
        cfg.engine
            .monthly_summary(ctx.scope, ctx.user_id, period, cfg.timezone)
            .await
    );
    let (text, kb) = ui::render_summary(&summary);
    edit_or_send(bot, ctx.chat_id, message_id, text, kb).await
}
