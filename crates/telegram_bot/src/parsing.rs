//! Free-text argument parsing for bot commands and callback data.

use chrono_tz::Tz;
use engine::{Currency, MonthPeriod, Money};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ExpenseArgs {
    pub amount_minor: i64,
    pub category: Option<String>,
    pub description: Option<String>,
    pub mentions: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TemplateAction {
    Create {
        name: String,
        amount_minor: i64,
        category: Option<String>,
        mentions: Vec<String>,
    },
    List,
    Use {
        name: String,
        amount_minor: Option<i64>,
        description: Option<String>,
    },
    Delete {
        name: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SettleArgs {
    pub mention: String,
    pub amount_minor: i64,
    pub note: Option<String>,
}

/// Inline button payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CallbackAction {
    VoidExpense(Uuid),
    UseTemplate(Uuid),
    DeleteTemplate(Uuid),
    Summary(MonthPeriod),
    Templates,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub(crate) enum ParseError {
    #[error("missing arguments")]
    Empty,
    #[error("invalid amount \"{0}\"")]
    InvalidAmount(String),
    #[error("only one #category is allowed")]
    TooManyTags,
    #[error("unterminated quote")]
    UnterminatedQuote,
    #[error("missing template name")]
    MissingName,
    #[error("missing subcommand")]
    MissingSubcommand,
    #[error("unknown subcommand \"{0}\"")]
    UnknownSubcommand(String),
    #[error("mention who you paid, e.g. @bob")]
    MissingMention,
    #[error("unexpected text \"{0}\"")]
    UnexpectedText(String),
    #[error("invalid month \"{0}\", use YYYY-MM")]
    InvalidPeriod(String),
}

/// Split on whitespace, keeping `"double quoted"` runs together.
///
/// Typographic quotes (`“…”`) count as quotes too, since mobile keyboards
/// substitute them.
pub(crate) fn tokenize(input: &str) -> Result<Vec<String>, ParseError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;

    for ch in input.chars() {
        match ch {
            '"' | '“' | '”' => {
                if in_quotes {
                    in_quotes = false;
                } else {
                    in_quotes = true;
                    quoted = true;
                }
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || quoted {
                    tokens.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            c => current.push(c),
        }
    }
    if in_quotes {
        return Err(ParseError::UnterminatedQuote);
    }
    if !current.is_empty() || quoted {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Parse a strictly positive amount. Signs are not accepted.
pub(crate) fn parse_amount(token: &str, currency: Currency) -> Result<i64, ParseError> {
    let invalid = || ParseError::InvalidAmount(token.to_string());
    if token.starts_with('-') || token.starts_with('+') {
        return Err(invalid());
    }
    let amount = Money::parse_major(token, currency).map_err(|_| invalid())?;
    if !amount.is_positive() {
        return Err(invalid());
    }
    Ok(amount.minor())
}

/// `<amount> [#category] [description] [@user ...]`, in any order after the
/// amount.
pub(crate) fn parse_expense(input: &str, currency: Currency) -> Result<ExpenseArgs, ParseError> {
    let tokens = tokenize(input)?;
    let mut tokens = tokens.into_iter();
    let amount = tokens.next().ok_or(ParseError::Empty)?;
    let amount_minor = parse_amount(&amount, currency)?;

    let tail = split_tail(tokens)?;
    Ok(ExpenseArgs {
        amount_minor,
        category: tail.category,
        description: tail.text,
        mentions: tail.mentions,
    })
}

/// `create "name" <amount> [#category] [@user ...]`, `list`,
/// `use "name" [amount] [description]`, `delete "name"`.
pub(crate) fn parse_template(
    input: &str,
    currency: Currency,
) -> Result<TemplateAction, ParseError> {
    let tokens = tokenize(input)?;
    let mut tokens = tokens.into_iter();
    let keyword = tokens
        .next()
        .ok_or(ParseError::MissingSubcommand)?
        .to_lowercase();

    match keyword.as_str() {
        "list" | "ls" => match tokens.next() {
            None => Ok(TemplateAction::List),
            Some(extra) => Err(ParseError::UnexpectedText(extra)),
        },
        "create" | "new" | "add" => {
            let name = next_name(&mut tokens)?;
            let amount = tokens.next().ok_or(ParseError::Empty)?;
            let amount_minor = parse_amount(&amount, currency)?;
            let tail = split_tail(tokens)?;
            if let Some(text) = tail.text {
                return Err(ParseError::UnexpectedText(text));
            }
            Ok(TemplateAction::Create {
                name,
                amount_minor,
                category: tail.category,
                mentions: tail.mentions,
            })
        }
        "use" => {
            let name = next_name(&mut tokens)?;
            let rest: Vec<String> = tokens.collect();
            let (amount_minor, words) = match rest.split_first() {
                Some((first, words)) if is_number(first) => {
                    (Some(parse_amount(first, currency)?), words)
                }
                _ => (None, rest.as_slice()),
            };
            let description = join_words(words);
            Ok(TemplateAction::Use {
                name,
                amount_minor,
                description,
            })
        }
        "delete" | "del" | "rm" => {
            let name = next_name(&mut tokens)?;
            match tokens.next() {
                None => Ok(TemplateAction::Delete { name }),
                Some(extra) => Err(ParseError::UnexpectedText(extra)),
            }
        }
        _ => Err(ParseError::UnknownSubcommand(keyword)),
    }
}

/// `@user <amount> [note]`
pub(crate) fn parse_settle(input: &str, currency: Currency) -> Result<SettleArgs, ParseError> {
    let tokens = tokenize(input)?;
    let mut tokens = tokens.into_iter();
    let mention = tokens
        .next()
        .and_then(|t| mention_of(&t))
        .ok_or(ParseError::MissingMention)?;
    let amount = tokens.next().ok_or(ParseError::Empty)?;
    let amount_minor = parse_amount(&amount, currency)?;
    let words: Vec<String> = tokens.collect();
    Ok(SettleArgs {
        mention,
        amount_minor,
        note: join_words(&words),
    })
}

/// Empty input means the current month in `tz`.
pub(crate) fn parse_period(input: &str, tz: Tz) -> Result<MonthPeriod, ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(MonthPeriod::current(tz));
    }
    MonthPeriod::parse(trimmed).map_err(|_| ParseError::InvalidPeriod(trimmed.to_string()))
}

pub(crate) fn parse_callback(data: &str) -> Option<CallbackAction> {
    if data == "nav:templates" {
        return Some(CallbackAction::Templates);
    }
    if let Some(id) = data.strip_prefix("exp:void:") {
        return Uuid::parse_str(id).ok().map(CallbackAction::VoidExpense);
    }
    if let Some(id) = data.strip_prefix("tpl:use:") {
        return Uuid::parse_str(id).ok().map(CallbackAction::UseTemplate);
    }
    if let Some(id) = data.strip_prefix("tpl:del:") {
        return Uuid::parse_str(id).ok().map(CallbackAction::DeleteTemplate);
    }
    if let Some(period) = data.strip_prefix("sum:") {
        return MonthPeriod::parse(period).ok().map(CallbackAction::Summary);
    }
    None
}

struct Tail {
    category: Option<String>,
    text: Option<String>,
    mentions: Vec<String>,
}

/// Sort trailing tokens into `#category`, `@mentions` and free text.
fn split_tail(tokens: impl Iterator<Item = String>) -> Result<Tail, ParseError> {
    let mut category: Option<String> = None;
    let mut mentions: Vec<String> = Vec::new();
    let mut words: Vec<String> = Vec::new();

    for token in tokens {
        if let Some(tag) = token.strip_prefix('#').filter(|t| !t.is_empty()) {
            if category.is_some() {
                return Err(ParseError::TooManyTags);
            }
            category = Some(tag.to_lowercase());
        } else if let Some(mention) = mention_of(&token) {
            if !mentions.contains(&mention) {
                mentions.push(mention);
            }
        } else {
            words.push(token);
        }
    }

    Ok(Tail {
        category,
        text: join_words(&words),
        mentions,
    })
}

fn next_name(tokens: &mut impl Iterator<Item = String>) -> Result<String, ParseError> {
    tokens
        .next()
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .ok_or(ParseError::MissingName)
}

fn mention_of(token: &str) -> Option<String> {
    token
        .strip_prefix('@')
        .filter(|name| !name.is_empty())
        .map(|name| name.to_lowercase())
}

/// A bare, optionally signed decimal such as `25`, `-3` or `12,50`.
fn is_number(token: &str) -> bool {
    let unsigned = token.strip_prefix(['+', '-']).unwrap_or(token);
    unsigned.starts_with(|c: char| c.is_ascii_digit())
        && unsigned.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
}

fn join_words(words: &[String]) -> Option<String> {
    let text = words
        .iter()
        .flat_map(|w| w.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}
