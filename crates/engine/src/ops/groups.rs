use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*, sea_query::OnConflict,
};

use crate::{
    EngineError, Group, ResultEngine, User, group_members, groups, users,
    util::collapse_whitespace,
};

use super::{Engine, with_tx};

impl Engine {
    /// Insert a group or refresh its title. The currency of an existing group
    /// is never changed here.
    pub async fn register_group(&self, group_id: i64, title: &str) -> ResultEngine<Group> {
        let title = {
            let t = collapse_whitespace(title);
            if t.is_empty() { group_id.to_string() } else { t }
        };
        let model = groups::new_active_model(group_id, &title, self.default_currency);
        with_tx!(self, |db_tx| {
            groups::Entity::insert(model)
                .on_conflict(
                    OnConflict::column(groups::Column::Id)
                        .update_column(groups::Column::Title)
                        .to_owned(),
                )
                .exec_without_returning(&db_tx)
                .await?;
            require_group(&db_tx, group_id).await
        })
    }

    pub async fn group(&self, group_id: i64) -> ResultEngine<Group> {
        require_group(&self.database, group_id).await
    }

    /// Add `user_id` to the group. Joining twice is a no-op.
    pub async fn join_group(&self, group_id: i64, user_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            require_group(&db_tx, group_id).await?;
            add_member(&db_tx, group_id, user_id).await
        })
    }

    /// Members of a group, sorted by display name.
    pub async fn group_members(&self, group_id: i64) -> ResultEngine<Vec<User>> {
        with_tx!(self, |db_tx| {
            require_group(&db_tx, group_id).await?;
            let members = users::Entity::find()
                .inner_join(group_members::Entity)
                .filter(group_members::Column::GroupId.eq(group_id))
                .order_by_asc(users::Column::DisplayName)
                .order_by_asc(users::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(User::from)
                .collect::<Vec<_>>();
            Ok(members)
        })
    }
}

pub(super) async fn require_group<C: ConnectionTrait>(db: &C, group_id: i64) -> ResultEngine<Group> {
    let model = groups::Entity::find_by_id(group_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("group {group_id}")))?;
    Group::try_from(model)
}

/// Member ids in join order.
pub(super) async fn member_ids<C: ConnectionTrait>(db: &C, group_id: i64) -> ResultEngine<Vec<i64>> {
    let ids = group_members::Entity::find()
        .select_only()
        .column(group_members::Column::UserId)
        .filter(group_members::Column::GroupId.eq(group_id))
        .order_by_asc(group_members::Column::JoinedAt)
        .order_by_asc(group_members::Column::UserId)
        .into_tuple::<i64>()
        .all(db)
        .await?;
    Ok(ids)
}

pub(super) async fn add_member<C: ConnectionTrait>(
    db: &C,
    group_id: i64,
    user_id: i64,
) -> ResultEngine<()> {
    let exists = group_members::Entity::find_by_id((group_id, user_id))
        .one(db)
        .await?
        .is_some();
    if exists {
        return Ok(());
    }
    group_members::ActiveModel {
        group_id: ActiveValue::Set(group_id),
        user_id: ActiveValue::Set(user_id),
        joined_at: ActiveValue::Set(Utc::now()),
    }
    .insert(db)
    .await?;
    Ok(())
}

/// Fail with `NotAllowed` unless every id is a member of the group.
pub(super) async fn ensure_members<C: ConnectionTrait>(
    db: &C,
    group_id: i64,
    user_ids: &[i64],
) -> ResultEngine<()> {
    let members = member_ids(db, group_id).await?;
    if let Some(outsider) = user_ids.iter().find(|id| !members.contains(id)) {
        return Err(EngineError::NotAllowed(format!(
            "user {outsider} is not a member of this group"
        )));
    }
    Ok(())
}
