use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sea_orm::{
    Condition, ConnectionTrait, QueryFilter, QuerySelect, TransactionTrait, prelude::*,
    sea_query::Expr,
};

use crate::{
    CategoryAmount, Currency, MonthPeriod, MonthlySummary, ResultEngine, Scope, UserAmount,
    expenses, settlements, splits,
    summary::{sort_category_amounts, sort_user_amounts},
    util::model_currency,
};

use super::{Engine, groups::require_group, load_users, require_user, with_tx};

/// Half-open UTC range of the month being summarized.
#[derive(Clone, Copy)]
struct Range {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Engine {
    /// Aggregate one calendar month of a group or of a user's personal expenses.
    ///
    /// Month boundaries are local midnight in `tz`. Voided expenses are skipped.
    pub async fn monthly_summary(
        &self,
        scope: Scope,
        user_id: i64,
        period: MonthPeriod,
        tz: Tz,
    ) -> ResultEngine<MonthlySummary> {
        let (start, end) = period.bounds(tz)?;
        let range = Range { start, end };
        let default_currency = self.default_currency;

        with_tx!(self, |db_tx| {
            let summary = match scope {
                Scope::Group(group_id) => {
                    let group = require_group(&db_tx, group_id).await?;
                    group_summary(&db_tx, group_id, group.currency, period, range).await?
                }
                Scope::Personal => {
                    require_user(&db_tx, user_id).await?;
                    personal_summary(&db_tx, user_id, default_currency, period, range).await?
                }
            };
            tracing::debug!(
                ?scope,
                %period,
                expenses = summary.expense_count,
                total_minor = summary.total_minor,
                "monthly summary computed"
            );
            Ok(summary)
        })
    }
}

async fn group_summary<C: ConnectionTrait>(
    db: &C,
    group_id: i64,
    currency: Currency,
    period: MonthPeriod,
    range: Range,
) -> ResultEngine<MonthlySummary> {
    let filter = Condition::all()
        .add(expenses::Column::GroupId.eq(group_id))
        .add(in_range(range));

    let (expense_count, total_minor) = count_and_total(db, filter.clone()).await?;

    let paid = expenses::Entity::find()
        .select_only()
        .column(expenses::Column::PayerId)
        .column_as(
            Expr::col((expenses::Entity, expenses::Column::AmountMinor)).sum(),
            "total",
        )
        .filter(filter.clone())
        .group_by(expenses::Column::PayerId)
        .into_tuple::<(i64, i64)>()
        .all(db)
        .await?;

    let shares = splits::Entity::find()
        .select_only()
        .column(splits::Column::UserId)
        .column_as(
            Expr::col((splits::Entity, splits::Column::AmountMinor)).sum(),
            "total",
        )
        .inner_join(expenses::Entity)
        .filter(filter.clone())
        .group_by(splits::Column::UserId)
        .into_tuple::<(i64, i64)>()
        .all(db)
        .await?;

    let by_category = categories(db, filter).await?;

    let (settlements_count, settlements_total_minor) = settlements::Entity::find()
        .select_only()
        .column_as(
            Expr::col((settlements::Entity, settlements::Column::Id)).count(),
            "count",
        )
        .column_as(
            Expr::col((settlements::Entity, settlements::Column::AmountMinor)).sum(),
            "total",
        )
        .filter(settlements::Column::GroupId.eq(group_id))
        .filter(settlements::Column::OccurredAt.gte(range.start))
        .filter(settlements::Column::OccurredAt.lt(range.end))
        .into_tuple::<(i64, Option<i64>)>()
        .one(db)
        .await?
        .unwrap_or((0, None));

    Ok(MonthlySummary {
        scope: Scope::Group(group_id),
        period,
        currency,
        expense_count,
        total_minor,
        by_payer: user_amounts(db, paid).await?,
        by_share: user_amounts(db, shares).await?,
        by_category,
        settlements_count: u64::try_from(settlements_count).unwrap_or_default(),
        settlements_total_minor: settlements_total_minor.unwrap_or_default(),
        group_shares: Vec::new(),
    })
}

async fn personal_summary<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
    currency: Currency,
    period: MonthPeriod,
    range: Range,
) -> ResultEngine<MonthlySummary> {
    let filter = Condition::all()
        .add(expenses::Column::GroupId.is_null())
        .add(expenses::Column::PayerId.eq(user_id))
        .add(in_range(range));

    let (expense_count, total_minor) = count_and_total(db, filter.clone()).await?;
    let by_category = categories(db, filter).await?;

    // The user's share of group expenses, one row per currency.
    let rows = splits::Entity::find()
        .select_only()
        .column(expenses::Column::Currency)
        .column_as(
            Expr::col((splits::Entity, splits::Column::AmountMinor)).sum(),
            "total",
        )
        .inner_join(expenses::Entity)
        .filter(splits::Column::UserId.eq(user_id))
        .filter(expenses::Column::GroupId.is_not_null())
        .filter(in_range(range))
        .group_by(expenses::Column::Currency)
        .into_tuple::<(String, i64)>()
        .all(db)
        .await?;
    let mut group_shares = rows
        .into_iter()
        .map(|(code, total)| Ok((model_currency(&code)?, total)))
        .collect::<ResultEngine<Vec<(Currency, i64)>>>()?;
    group_shares.retain(|(_, total)| *total != 0);
    group_shares.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.code().cmp(b.0.code())));

    Ok(MonthlySummary {
        scope: Scope::Personal,
        period,
        currency,
        expense_count,
        total_minor,
        by_payer: Vec::new(),
        by_share: Vec::new(),
        by_category,
        settlements_count: 0,
        settlements_total_minor: 0,
        group_shares,
    })
}

/// Non-voided expenses that occurred inside the range.
fn in_range(range: Range) -> Condition {
    Condition::all()
        .add(expenses::Column::VoidedAt.is_null())
        .add(expenses::Column::OccurredAt.gte(range.start))
        .add(expenses::Column::OccurredAt.lt(range.end))
}

async fn count_and_total<C: ConnectionTrait>(
    db: &C,
    filter: Condition,
) -> ResultEngine<(u64, i64)> {
    let (count, total) = expenses::Entity::find()
        .select_only()
        .column_as(
            Expr::col((expenses::Entity, expenses::Column::Id)).count(),
            "count",
        )
        .column_as(
            Expr::col((expenses::Entity, expenses::Column::AmountMinor)).sum(),
            "total",
        )
        .filter(filter)
        .into_tuple::<(i64, Option<i64>)>()
        .one(db)
        .await?
        .unwrap_or((0, None));
    Ok((
        u64::try_from(count).unwrap_or_default(),
        total.unwrap_or_default(),
    ))
}

async fn categories<C: ConnectionTrait>(
    db: &C,
    filter: Condition,
) -> ResultEngine<Vec<CategoryAmount>> {
    let rows = expenses::Entity::find()
        .select_only()
        .column(expenses::Column::Category)
        .column_as(
            Expr::col((expenses::Entity, expenses::Column::AmountMinor)).sum(),
            "total",
        )
        .column_as(
            Expr::col((expenses::Entity, expenses::Column::Id)).count(),
            "count",
        )
        .filter(filter)
        .group_by(expenses::Column::Category)
        .into_tuple::<(Option<String>, i64, i64)>()
        .all(db)
        .await?;
    let mut out: Vec<CategoryAmount> = rows
        .into_iter()
        .map(|(category, amount_minor, count)| CategoryAmount {
            category,
            amount_minor,
            count: u64::try_from(count).unwrap_or_default(),
        })
        .collect();
    sort_category_amounts(&mut out);
    Ok(out)
}

async fn user_amounts<C: ConnectionTrait>(
    db: &C,
    rows: Vec<(i64, i64)>,
) -> ResultEngine<Vec<UserAmount>> {
    let ids: Vec<i64> = rows.iter().map(|(id, _)| *id).collect();
    let users = load_users(db, &ids).await?;
    let mut out: Vec<UserAmount> = users
        .into_iter()
        .zip(rows)
        .map(|(user, (_, amount_minor))| UserAmount { user, amount_minor })
        .collect();
    sort_user_amounts(&mut out);
    Ok(out)
}
