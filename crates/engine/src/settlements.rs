//! Recorded payments between group members.
//!
//! A settlement from `A` to `B` means `A` paid `B` back: it raises `A`'s net
//! balance and lowers `B`'s by the same amount.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{Currency, EngineError, util::model_currency};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub id: Uuid,
    pub group_id: i64,
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub amount_minor: i64,
    pub currency: Currency,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl TryFrom<Model> for Settlement {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            group_id: model.group_id,
            from_user_id: model.from_user_id,
            to_user_id: model.to_user_id,
            amount_minor: model.amount_minor,
            currency: model_currency(&model.currency)?,
            note: model.note,
            occurred_at: model.occurred_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "settlements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub group_id: i64,
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub amount_minor: i64,
    pub currency: String,
    pub note: Option<String>,
    pub occurred_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Groups,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
