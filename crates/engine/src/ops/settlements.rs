use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Settlement, SettlementCmd, settlements,
    util::{ensure_positive, normalize_optional_text},
};

use super::{
    Engine,
    groups::{ensure_members, require_group},
    with_tx,
};

impl Engine {
    /// Record that `from_user_id` paid `to_user_id` back.
    ///
    /// Both users must already be members of the group; the amount is in the
    /// group currency.
    pub async fn record_settlement(&self, cmd: SettlementCmd) -> ResultEngine<Settlement> {
        ensure_positive(cmd.amount_minor, "amount")?;
        if cmd.from_user_id == cmd.to_user_id {
            return Err(EngineError::NotAllowed(
                "cannot settle with yourself".to_string(),
            ));
        }
        let note = normalize_optional_text(cmd.note.as_deref());

        with_tx!(self, |db_tx| {
            let group = require_group(&db_tx, cmd.group_id).await?;
            ensure_members(&db_tx, cmd.group_id, &[cmd.from_user_id, cmd.to_user_id]).await?;

            let model = settlements::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                group_id: ActiveValue::Set(cmd.group_id),
                from_user_id: ActiveValue::Set(cmd.from_user_id),
                to_user_id: ActiveValue::Set(cmd.to_user_id),
                amount_minor: ActiveValue::Set(cmd.amount_minor),
                currency: ActiveValue::Set(group.currency.code().to_string()),
                note: ActiveValue::Set(note),
                occurred_at: ActiveValue::Set(cmd.occurred_at),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(
                group_id = cmd.group_id,
                from_user_id = cmd.from_user_id,
                to_user_id = cmd.to_user_id,
                amount_minor = cmd.amount_minor,
                "settlement recorded"
            );
            Settlement::try_from(model)
        })
    }

    /// Latest settlements of a group, newest first.
    pub async fn settlements(&self, group_id: i64, limit: u64) -> ResultEngine<Vec<Settlement>> {
        settlements::Entity::find()
            .filter(settlements::Column::GroupId.eq(group_id))
            .order_by_desc(settlements::Column::OccurredAt)
            .order_by_desc(settlements::Column::CreatedAt)
            .limit(limit)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Settlement::try_from)
            .collect()
    }
}
