use teloxide::{prelude::*, types::InlineKeyboardMarkup, types::User};

use super::{Context, send_html};
use crate::ui;

pub(super) async fn handle_start(bot: &Bot, ctx: &Context, from: &User) -> ResponseResult<()> {
    send_html(
        bot,
        ctx.chat_id,
        ui::welcome_text(&from.full_name()),
        InlineKeyboardMarkup::default(),
    )
    .await
}

pub(super) async fn handle_help(bot: &Bot, ctx: &Context) -> ResponseResult<()> {
    send_html(bot, ctx.chat_id, ui::help_text(), InlineKeyboardMarkup::default()).await
}
