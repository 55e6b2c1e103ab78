//! Per-participant shares of an expense.

use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Split {
    pub user_id: i64,
    pub amount_minor: i64,
}

impl From<Model> for Split {
    fn from(model: Model) -> Self {
        Self {
            user_id: model.user_id,
            amount_minor: model.amount_minor,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "splits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub expense_id: Uuid,
    pub user_id: i64,
    pub amount_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expenses::Entity",
        from = "Column::ExpenseId",
        to = "super::expenses::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Expenses,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn new_active_model(expense_id: Uuid, split: &Split) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4()),
        expense_id: ActiveValue::Set(expense_id),
        user_id: ActiveValue::Set(split.user_id),
        amount_minor: ActiveValue::Set(split.amount_minor),
    }
}
