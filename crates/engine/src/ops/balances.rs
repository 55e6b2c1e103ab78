use std::collections::HashMap;

use sea_orm::{
    ConnectionTrait, QueryFilter, QuerySelect, TransactionTrait, prelude::*, sea_query::Expr,
};

use crate::{Balance, ResultEngine, expenses, settlements, splits};

use super::{
    Engine,
    groups::{member_ids, require_group},
    with_tx,
};

impl Engine {
    /// Net balance of every group member, largest creditor first.
    ///
    /// `net = paid - owed + settled_out - settled_in`. Voided expenses are
    /// skipped. Members with no activity show up with a zero balance.
    pub async fn group_balances(&self, group_id: i64) -> ResultEngine<Vec<Balance>> {
        with_tx!(self, |db_tx| {
            require_group(&db_tx, group_id).await?;
            let members = member_ids(&db_tx, group_id).await?;

            let mut nets: HashMap<i64, i64> = members.iter().map(|id| (*id, 0)).collect();
            for (user_id, paid) in paid_by_user(&db_tx, group_id).await? {
                *nets.entry(user_id).or_default() += paid;
            }
            for (user_id, owed) in owed_by_user(&db_tx, group_id).await? {
                *nets.entry(user_id).or_default() -= owed;
            }
            for (user_id, sent, received) in settled_by_user(&db_tx, group_id).await? {
                *nets.entry(user_id).or_default() += sent - received;
            }

            let mut balances: Vec<Balance> = nets
                .into_iter()
                .map(|(user_id, net_minor)| Balance { user_id, net_minor })
                .collect();
            balances.sort_by(|a, b| {
                b.net_minor
                    .cmp(&a.net_minor)
                    .then(a.user_id.cmp(&b.user_id))
            });
            Ok(balances)
        })
    }
}

async fn paid_by_user<C: ConnectionTrait>(db: &C, group_id: i64) -> ResultEngine<Vec<(i64, i64)>> {
    let rows = expenses::Entity::find()
        .select_only()
        .column(expenses::Column::PayerId)
        .column_as(
            Expr::col((expenses::Entity, expenses::Column::AmountMinor)).sum(),
            "total",
        )
        .filter(expenses::Column::GroupId.eq(group_id))
        .filter(expenses::Column::VoidedAt.is_null())
        .group_by(expenses::Column::PayerId)
        .into_tuple::<(i64, i64)>()
        .all(db)
        .await?;
    Ok(rows)
}

async fn owed_by_user<C: ConnectionTrait>(db: &C, group_id: i64) -> ResultEngine<Vec<(i64, i64)>> {
    let rows = splits::Entity::find()
        .select_only()
        .column(splits::Column::UserId)
        .column_as(
            Expr::col((splits::Entity, splits::Column::AmountMinor)).sum(),
            "total",
        )
        .inner_join(expenses::Entity)
        .filter(expenses::Column::GroupId.eq(group_id))
        .filter(expenses::Column::VoidedAt.is_null())
        .group_by(splits::Column::UserId)
        .into_tuple::<(i64, i64)>()
        .all(db)
        .await?;
    Ok(rows)
}

/// `(user_id, sent, received)` per user with at least one settlement.
async fn settled_by_user<C: ConnectionTrait>(
    db: &C,
    group_id: i64,
) -> ResultEngine<Vec<(i64, i64, i64)>> {
    let sum_by = |column: settlements::Column| {
        settlements::Entity::find()
            .select_only()
            .column(column)
            .column_as(
                Expr::col((settlements::Entity, settlements::Column::AmountMinor)).sum(),
                "total",
            )
            .filter(settlements::Column::GroupId.eq(group_id))
            .group_by(column)
            .into_tuple::<(i64, i64)>()
    };
    let sent = sum_by(settlements::Column::FromUserId).all(db).await?;
    let received = sum_by(settlements::Column::ToUserId).all(db).await?;

    let mut totals: HashMap<i64, (i64, i64)> = HashMap::new();
    for (user_id, amount) in sent {
        totals.entry(user_id).or_default().0 += amount;
    }
    for (user_id, amount) in received {
        totals.entry(user_id).or_default().1 += amount;
    }
    Ok(totals
        .into_iter()
        .map(|(user_id, (sent, received))| (user_id, sent, received))
        .collect())
}
