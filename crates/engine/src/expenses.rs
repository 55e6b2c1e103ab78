//! Expense primitives.
//!
//! An [`Expense`] is paid by one user and divided into [`Split`]s, one per
//! participant. The splits of an expense always sum to its amount. Expenses
//! are never deleted: undoing one sets `voided_at` and every aggregate skips
//! voided rows.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{Currency, EngineError, Scope, splits::Split, util::model_currency};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expense {
    pub id: Uuid,
    pub scope: Scope,
    pub payer_id: i64,
    pub amount_minor: i64,
    pub currency: Currency,
    pub description: String,
    pub category: Option<String>,
    pub template_id: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
    pub voided_at: Option<DateTime<Utc>>,
    pub splits: Vec<Split>,
}

impl Expense {
    #[must_use]
    pub fn is_voided(&self) -> bool {
        self.voided_at.is_some()
    }

    /// Share owed by `user_id`, zero when the user is not a participant.
    #[must_use]
    pub fn share_of(&self, user_id: i64) -> i64 {
        self.splits
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.amount_minor)
            .sum()
    }
}

impl TryFrom<(Model, Vec<Split>)> for Expense {
    type Error = EngineError;

    fn try_from((model, splits): (Model, Vec<Split>)) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            scope: Scope::from_group_id(model.group_id),
            payer_id: model.payer_id,
            amount_minor: model.amount_minor,
            currency: model_currency(&model.currency)?,
            description: model.description,
            category: model.category,
            template_id: model.template_id,
            occurred_at: model.occurred_at,
            voided_at: model.voided_at,
            splits,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub group_id: Option<i64>,
    pub payer_id: i64,
    pub amount_minor: i64,
    pub currency: String,
    pub description: String,
    pub category: Option<String>,
    pub template_id: Option<Uuid>,
    pub occurred_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub voided_at: Option<DateTimeUtc>,
    pub idempotency_key: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::splits::Entity")]
    Splits,
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Groups,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::PayerId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Payer,
    #[sea_orm(
        belongs_to = "super::templates::Entity",
        from = "Column::TemplateId",
        to = "super::templates::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Templates,
}

impl Related<super::splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Splits.def()
    }
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl Related<super::templates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Templates.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
