//! Bot commands

use teloxide::utils::command::{BotCommands, ParseError};

/// Hand the text after the command to the handler untouched, even when empty.
fn raw_args(input: String) -> Result<(String,), ParseError> {
    Ok((input.trim().to_string(),))
}

/// Every command the bot understands. Arguments are parsed by the handlers,
/// so each variant takes the raw text after the command.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(
    rename_rule = "lowercase",
    description = "Dividi keeps track of shared expenses. Commands:"
)]
pub enum Command {
    #[command(description = "register and show the welcome message.")]
    Start,
    #[command(description = "show this message.")]
    Help,
    #[command(
        description = "record an expense: /expense 30 #food pizza @bob @carol",
        parse_with = raw_args
    )]
    Expense(String),
    #[command(
        description = "manage templates: create, list, use, delete.",
        parse_with = raw_args
    )]
    Template(String),
    #[command(
        description = "monthly summary: /summary [YYYY-MM]",
        parse_with = raw_args
    )]
    Summary(String),
    #[command(description = "who owes whom in this group.")]
    Balance,
    #[command(
        description = "record a payment: /settle @user 12.50 [note]",
        parse_with = raw_args
    )]
    Settle(String),
    #[command(description = "latest expenses, with undo buttons.")]
    History,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_keep_their_arguments() {
        assert_eq!(
            Command::parse("/expense 30 #food pizza", "dividi_bot").unwrap(),
            Command::Expense("30 #food pizza".to_string())
        );
        assert_eq!(
            Command::parse("/template@dividi_bot list", "dividi_bot").unwrap(),
            Command::Template("list".to_string())
        );
        assert_eq!(
            Command::parse("/balance", "dividi_bot").unwrap(),
            Command::Balance
        );
    }

    #[test]
    fn arguments_may_be_empty() {
        assert_eq!(
            Command::parse("/summary", "dividi_bot").unwrap(),
            Command::Summary(String::new())
        );
    }
}
