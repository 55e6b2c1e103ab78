use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    Currency, EngineError, Expense, ExpenseCmd, Money, ResultEngine, Scope, Split, expenses,
    splits,
    util::{dedup_in_order, ensure_positive, normalize_category, normalize_description},
};

use super::{
    Engine,
    groups::{add_member, ensure_members, member_ids, require_group},
    require_user, with_tx,
};

impl Engine {
    /// Record an expense and its even splits.
    pub async fn create_expense(&self, cmd: ExpenseCmd) -> ResultEngine<Expense> {
        let default_currency = self.default_currency;
        with_tx!(self, |db_tx| {
            insert_expense(&db_tx, cmd, default_currency).await
        })
    }

    pub async fn expense(&self, expense_id: Uuid) -> ResultEngine<Expense> {
        load_expense(&self.database, expense_id).await
    }

    /// Soft-delete an expense. Only the payer may void it.
    pub async fn void_expense(&self, expense_id: Uuid, user_id: i64) -> ResultEngine<Expense> {
        with_tx!(self, |db_tx| {
            let model = expenses::Entity::find_by_id(expense_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("expense".to_string()))?;
            if model.payer_id != user_id {
                return Err(EngineError::NotAllowed(
                    "only the payer can undo an expense".to_string(),
                ));
            }
            if model.voided_at.is_some() {
                return Err(EngineError::AlreadyVoided("expense".to_string()));
            }

            expenses::ActiveModel {
                id: ActiveValue::Set(expense_id),
                voided_at: ActiveValue::Set(Some(Utc::now())),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            tracing::info!(%expense_id, user_id, "expense voided");

            load_expense(&db_tx, expense_id).await
        })
    }

    /// Latest non-voided expenses of a scope, newest first.
    ///
    /// Personal scope lists the personal expenses paid by `user_id`.
    pub async fn recent_expenses(
        &self,
        scope: Scope,
        user_id: i64,
        limit: u64,
    ) -> ResultEngine<Vec<Expense>> {
        let query = expenses::Entity::find().filter(expenses::Column::VoidedAt.is_null());
        let query = match scope {
            Scope::Group(group_id) => query.filter(expenses::Column::GroupId.eq(group_id)),
            Scope::Personal => query
                .filter(expenses::Column::GroupId.is_null())
                .filter(expenses::Column::PayerId.eq(user_id)),
        };
        let models = query
            .order_by_desc(expenses::Column::OccurredAt)
            .order_by_desc(expenses::Column::CreatedAt)
            .limit(limit)
            .all(&self.database)
            .await?;
        with_splits(&self.database, models).await
    }
}

/// Shared by plain expenses and template materialization.
pub(super) async fn insert_expense<C: ConnectionTrait>(
    db: &C,
    cmd: ExpenseCmd,
    default_currency: Currency,
) -> ResultEngine<Expense> {
    ensure_positive(cmd.amount_minor, "amount")?;
    let description = normalize_description(&cmd.description)?;
    let category = normalize_category(cmd.category.as_deref());
    require_user(db, cmd.payer_id).await?;

    if let Some(key) = cmd.idempotency_key.as_deref() {
        let existing = expenses::Entity::find()
            .filter(expenses::Column::IdempotencyKey.eq(key))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(EngineError::ExistingKey(key.to_string()));
        }
    }

    let (currency, participants) = match cmd.scope {
        Scope::Group(group_id) => {
            let group = require_group(db, group_id).await?;
            add_member(db, group_id, cmd.payer_id).await?;
            let participants = if cmd.participants.is_empty() {
                member_ids(db, group_id).await?
            } else {
                let participants = dedup_in_order(cmd.participants.iter().copied());
                ensure_members(db, group_id, &participants).await?;
                participants
            };
            (group.currency, participants)
        }
        Scope::Personal => (default_currency, vec![cmd.payer_id]),
    };

    let shares = Money::new(cmd.amount_minor).split_even(participants.len())?;
    let splits: Vec<Split> = participants
        .iter()
        .zip(shares)
        .map(|(user_id, share)| Split {
            user_id: *user_id,
            amount_minor: share.minor(),
        })
        .collect();

    let now = Utc::now();
    let id = Uuid::new_v4();
    expenses::ActiveModel {
        id: ActiveValue::Set(id),
        group_id: ActiveValue::Set(cmd.scope.group_id()),
        payer_id: ActiveValue::Set(cmd.payer_id),
        amount_minor: ActiveValue::Set(cmd.amount_minor),
        currency: ActiveValue::Set(currency.code().to_string()),
        description: ActiveValue::Set(description.clone()),
        category: ActiveValue::Set(category.clone()),
        template_id: ActiveValue::Set(cmd.template_id),
        occurred_at: ActiveValue::Set(cmd.occurred_at),
        created_at: ActiveValue::Set(now),
        voided_at: ActiveValue::Set(None),
        idempotency_key: ActiveValue::Set(cmd.idempotency_key.clone()),
    }
    .insert(db)
    .await?;

    for split in &splits {
        splits::new_active_model(id, split).insert(db).await?;
    }

    tracing::info!(
        expense_id = %id,
        payer_id = cmd.payer_id,
        amount_minor = cmd.amount_minor,
        participants = splits.len(),
        "expense recorded"
    );

    Ok(Expense {
        id,
        scope: cmd.scope,
        payer_id: cmd.payer_id,
        amount_minor: cmd.amount_minor,
        currency,
        description,
        category,
        template_id: cmd.template_id,
        occurred_at: cmd.occurred_at,
        voided_at: None,
        splits,
    })
}

async fn load_expense<C: ConnectionTrait>(db: &C, expense_id: Uuid) -> ResultEngine<Expense> {
    let model = expenses::Entity::find_by_id(expense_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("expense".to_string()))?;
    with_splits(db, vec![model])
        .await?
        .pop()
        .ok_or_else(|| EngineError::KeyNotFound("expense".to_string()))
}

async fn with_splits<C: ConnectionTrait>(
    db: &C,
    models: Vec<expenses::Model>,
) -> ResultEngine<Vec<Expense>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let split_models = splits::Entity::find()
        .filter(splits::Column::ExpenseId.is_in(ids))
        .order_by_desc(splits::Column::AmountMinor)
        .order_by_asc(splits::Column::UserId)
        .all(db)
        .await?;

    let mut by_expense: HashMap<Uuid, Vec<Split>> = HashMap::new();
    for model in split_models {
        by_expense
            .entry(model.expense_id)
            .or_default()
            .push(Split::from(model));
    }

    models
        .into_iter()
        .map(|model| {
            let splits = by_expense.remove(&model.id).unwrap_or_default();
            Expense::try_from((model, splits))
        })
        .collect()
}
