//! Command structs for engine operations.
//!
//! These types group parameters for write operations (expenses, templates,
//! settlements), keeping call sites readable and avoiding long argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::Scope;

/// Record a new expense paid by `payer_id`.
#[derive(Clone, Debug)]
pub struct ExpenseCmd {
    pub scope: Scope,
    pub payer_id: i64,
    pub amount_minor: i64,
    pub description: String,
    pub category: Option<String>,
    /// Users sharing the expense. Empty means every group member (group
    /// scope) or just the payer (personal scope).
    pub participants: Vec<i64>,
    pub template_id: Option<Uuid>,
    pub idempotency_key: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl ExpenseCmd {
    #[must_use]
    pub fn new(
        scope: Scope,
        payer_id: i64,
        amount_minor: i64,
        description: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            scope,
            payer_id,
            amount_minor,
            description: description.into(),
            category: None,
            participants: Vec::new(),
            template_id: None,
            idempotency_key: None,
            occurred_at,
        }
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn participants(mut self, participants: Vec<i64>) -> Self {
        self.participants = participants;
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    #[must_use]
    pub(crate) fn template_id(mut self, template_id: Uuid) -> Self {
        self.template_id = Some(template_id);
        self
    }
}

/// Create a spending template owned by `owner_id`.
#[derive(Clone, Debug)]
pub struct TemplateCmd {
    pub scope: Scope,
    pub owner_id: i64,
    pub name: String,
    pub amount_minor: i64,
    pub category: Option<String>,
    pub participants: Vec<i64>,
}

impl TemplateCmd {
    #[must_use]
    pub fn new(scope: Scope, owner_id: i64, name: impl Into<String>, amount_minor: i64) -> Self {
        Self {
            scope,
            owner_id,
            name: name.into(),
            amount_minor,
            category: None,
            participants: Vec::new(),
        }
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn participants(mut self, participants: Vec<i64>) -> Self {
        self.participants = participants;
        self
    }
}

/// Materialize a template into an expense paid by `payer_id`.
#[derive(Clone, Debug)]
pub struct TemplateUse {
    pub template_id: Uuid,
    pub payer_id: i64,
    /// Overrides the template amount when present.
    pub amount_minor: Option<i64>,
    /// Defaults to the template name when absent or blank.
    pub description: Option<String>,
    pub idempotency_key: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl TemplateUse {
    #[must_use]
    pub fn new(template_id: Uuid, payer_id: i64, occurred_at: DateTime<Utc>) -> Self {
        Self {
            template_id,
            payer_id,
            amount_minor: None,
            description: None,
            idempotency_key: None,
            occurred_at,
        }
    }

    #[must_use]
    pub fn amount_minor(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Record a payment from `from_user_id` to `to_user_id` inside a group.
#[derive(Clone, Debug)]
pub struct SettlementCmd {
    pub group_id: i64,
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub amount_minor: i64,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl SettlementCmd {
    #[must_use]
    pub fn new(
        group_id: i64,
        from_user_id: i64,
        to_user_id: i64,
        amount_minor: i64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            group_id,
            from_user_id,
            to_user_id,
            amount_minor,
            note: None,
            occurred_at,
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
