//! Spending templates: saved expense definitions a user can replay.
//!
//! A template belongs to its owner and to a scope (a group or the owner's
//! private chat). Names are unique per owner and scope after normalization.

use uuid::Uuid;

use sea_orm::entity::prelude::*;

use crate::Scope;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    pub id: Uuid,
    pub owner_id: i64,
    pub scope: Scope,
    pub name: String,
    pub amount_minor: i64,
    pub category: Option<String>,
    /// Empty means "whoever the expense would default to".
    pub participants: Vec<i64>,
}

impl From<(Model, Vec<i64>)> for Template {
    fn from((model, participants): (Model, Vec<i64>)) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            scope: Scope::from_group_id(model.group_id),
            name: model.name,
            amount_minor: model.amount_minor,
            category: model.category,
            participants,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "templates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: i64,
    pub group_id: Option<i64>,
    pub name: String,
    pub name_norm: String,
    pub amount_minor: i64,
    pub category: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::template_participants::Entity")]
    Participants,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Owner,
}

impl Related<super::template_participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
