//! Group chats. A group owns shared expenses, settlements and templates.

use chrono::Utc;
use sea_orm::{ActiveValue, entity::prelude::*};

use crate::{Currency, ResultEngine, util::model_currency};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub currency: Currency,
}

impl TryFrom<Model> for Group {
    type Error = crate::EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            currency: model_currency(&model.currency)?,
            title: model.title,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub title: String,
    pub currency: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group_members::Entity")]
    GroupMembers,
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
    #[sea_orm(has_many = "super::settlements::Entity")]
    Settlements,
}

impl Related<super::group_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GroupMembers.def()
    }
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl Related<super::settlements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Settlements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn new_active_model(id: i64, title: &str, currency: Currency) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(id),
        title: ActiveValue::Set(title.to_string()),
        currency: ActiveValue::Set(currency.code().to_string()),
        created_at: ActiveValue::Set(Utc::now()),
    }
}
