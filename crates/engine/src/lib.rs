//! Storage and domain logic for the Dividi expense bot.
//!
//! The [`Engine`] owns a database connection and exposes one async method per
//! bot operation: registering users and groups, recording expenses and
//! settlements, managing templates, and computing balances and monthly
//! summaries. Every method runs inside its own DB transaction.
//!
//! Amounts are always integer minor units (see [`Money`]).

pub use balances::{Balance, Transfer, suggest_transfers};
pub use commands::{ExpenseCmd, SettlementCmd, TemplateCmd, TemplateUse};
pub use currency::Currency;
pub use error::EngineError;
pub use expenses::Expense;
pub use groups::Group;
pub use money::Money;
pub use ops::{Engine, EngineBuilder};
pub use period::MonthPeriod;
pub use settlements::Settlement;
pub use splits::Split;
pub use summary::{CategoryAmount, MonthlySummary, UserAmount};
pub use templates::Template;
pub use users::{User, UserProfile};

mod balances;
mod commands;
mod currency;
mod error;
mod expenses;
mod group_members;
mod groups;
mod money;
mod ops;
mod period;
mod settlements;
mod splits;
mod summary;
mod template_participants;
mod templates;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;

/// Where an expense, template or summary lives.
///
/// Group chats share expenses between members; private chats hold the
/// user's personal expenses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    Group(i64),
    Personal,
}

impl Scope {
    #[must_use]
    pub const fn group_id(self) -> Option<i64> {
        match self {
            Scope::Group(id) => Some(id),
            Scope::Personal => None,
        }
    }

    #[must_use]
    pub const fn is_group(self) -> bool {
        matches!(self, Scope::Group(_))
    }

    pub(crate) const fn from_group_id(group_id: Option<i64>) -> Self {
        match group_id {
            Some(id) => Scope::Group(id),
            None => Scope::Personal,
        }
    }
}
