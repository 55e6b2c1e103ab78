use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, Expense, ExpenseCmd, ResultEngine, Scope, Template, TemplateCmd, TemplateUse,
    template_participants, templates,
    util::{
        dedup_in_order, ensure_positive, name_key, normalize_category, normalize_optional_text,
        normalize_required_name,
    },
};

use super::{
    Engine,
    expenses::insert_expense,
    groups::{add_member, ensure_members, require_group},
    require_user, with_tx,
};

impl Engine {
    /// Save a new spending template.
    pub async fn create_template(&self, cmd: TemplateCmd) -> ResultEngine<Template> {
        let name = normalize_required_name(&cmd.name, "template")?;
        let name_norm = name_key(&name)
            .ok_or_else(|| EngineError::InvalidName("template name must not be empty".to_string()))?;
        ensure_positive(cmd.amount_minor, "amount")?;
        let category = normalize_category(cmd.category.as_deref());
        let participants = dedup_in_order(cmd.participants.iter().copied());

        with_tx!(self, |db_tx| {
            require_user(&db_tx, cmd.owner_id).await?;
            if let Scope::Group(group_id) = cmd.scope {
                require_group(&db_tx, group_id).await?;
                add_member(&db_tx, group_id, cmd.owner_id).await?;
                ensure_members(&db_tx, group_id, &participants).await?;
            } else if participants.iter().any(|id| *id != cmd.owner_id) {
                return Err(EngineError::NotAGroup(
                    "personal templates cannot have other participants".to_string(),
                ));
            }

            if find_by_norm(&db_tx, cmd.owner_id, cmd.scope, &name_norm)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(name));
            }

            let id = Uuid::new_v4();
            let model = templates::ActiveModel {
                id: ActiveValue::Set(id),
                owner_id: ActiveValue::Set(cmd.owner_id),
                group_id: ActiveValue::Set(cmd.scope.group_id()),
                name: ActiveValue::Set(name.clone()),
                name_norm: ActiveValue::Set(name_norm.clone()),
                amount_minor: ActiveValue::Set(cmd.amount_minor),
                category: ActiveValue::Set(category),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;

            for (position, user_id) in participants.iter().enumerate() {
                template_participants::ActiveModel {
                    template_id: ActiveValue::Set(id),
                    user_id: ActiveValue::Set(*user_id),
                    position: ActiveValue::Set(i32::try_from(position).unwrap_or(i32::MAX)),
                }
                .insert(&db_tx)
                .await?;
            }

            tracing::info!(template_id = %id, owner_id = cmd.owner_id, "template created");
            Ok(Template::from((model, participants)))
        })
    }

    /// Templates of `owner_id` in a scope, sorted by name.
    pub async fn templates(&self, owner_id: i64, scope: Scope) -> ResultEngine<Vec<Template>> {
        let query = templates::Entity::find().filter(templates::Column::OwnerId.eq(owner_id));
        let models = scope_filter(query, scope)
            .order_by_asc(templates::Column::NameNorm)
            .all(&self.database)
            .await?;
        with_participants(&self.database, models).await
    }

    pub async fn template(&self, template_id: Uuid) -> ResultEngine<Template> {
        load_template(&self.database, template_id).await
    }

    /// Look a template up by name, ignoring case, accents and extra spaces.
    pub async fn template_by_name(
        &self,
        owner_id: i64,
        scope: Scope,
        name: &str,
    ) -> ResultEngine<Template> {
        let name_norm =
            name_key(name).ok_or_else(|| EngineError::InvalidName("empty template name".to_string()))?;
        let model = find_by_norm(&self.database, owner_id, scope, &name_norm)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("template \"{}\"", name.trim())))?;
        with_participants(&self.database, vec![model])
            .await?
            .pop()
            .ok_or_else(|| EngineError::KeyNotFound("template".to_string()))
    }

    /// Delete a template. Expenses created from it keep existing.
    pub async fn delete_template(&self, owner_id: i64, template_id: Uuid) -> ResultEngine<Template> {
        with_tx!(self, |db_tx| {
            let template = load_template(&db_tx, template_id).await?;
            if template.owner_id != owner_id {
                return Err(EngineError::NotAllowed(
                    "only the owner can delete a template".to_string(),
                ));
            }
            template_participants::Entity::delete_many()
                .filter(template_participants::Column::TemplateId.eq(template_id))
                .exec(&db_tx)
                .await?;
            templates::Entity::delete_by_id(template_id)
                .exec(&db_tx)
                .await?;
            tracing::info!(%template_id, owner_id, "template deleted");
            Ok(template)
        })
    }

    /// Turn a template into a new expense paid by `payer_id`.
    ///
    /// - amount: the override, else the template amount
    /// - description: the given text, else the template name
    /// - participants: the template list, else the scope default
    pub async fn use_template(&self, request: TemplateUse) -> ResultEngine<Expense> {
        let default_currency = self.default_currency;
        with_tx!(self, |db_tx| {
            let template = load_template(&db_tx, request.template_id).await?;
            if template.scope == Scope::Personal && template.owner_id != request.payer_id {
                return Err(EngineError::NotAllowed(
                    "personal templates can only be used by their owner".to_string(),
                ));
            }

            let cmd = expense_from_template(&template, &request);
            insert_expense(&db_tx, cmd, default_currency).await
        })
    }
}

/// Build the expense a template expands into.
pub(crate) fn expense_from_template(template: &Template, request: &TemplateUse) -> ExpenseCmd {
    let description = normalize_optional_text(request.description.as_deref())
        .unwrap_or_else(|| template.name.clone());
    let amount_minor = request.amount_minor.unwrap_or(template.amount_minor);

    let mut cmd = ExpenseCmd::new(
        template.scope,
        request.payer_id,
        amount_minor,
        description,
        request.occurred_at,
    )
    .participants(template.participants.clone())
    .template_id(template.id);
    if let Some(category) = &template.category {
        cmd = cmd.category(category.clone());
    }
    if let Some(key) = &request.idempotency_key {
        cmd = cmd.idempotency_key(key.clone());
    }
    cmd
}

fn scope_filter(query: Select<templates::Entity>, scope: Scope) -> Select<templates::Entity> {
    match scope {
        Scope::Group(group_id) => query.filter(templates::Column::GroupId.eq(group_id)),
        Scope::Personal => query.filter(templates::Column::GroupId.is_null()),
    }
}

async fn find_by_norm<C: ConnectionTrait>(
    db: &C,
    owner_id: i64,
    scope: Scope,
    name_norm: &str,
) -> ResultEngine<Option<templates::Model>> {
    let query = templates::Entity::find()
        .filter(templates::Column::OwnerId.eq(owner_id))
        .filter(templates::Column::NameNorm.eq(name_norm));
    Ok(scope_filter(query, scope).one(db).await?)
}

async fn load_template<C: ConnectionTrait>(db: &C, template_id: Uuid) -> ResultEngine<Template> {
    let model = templates::Entity::find_by_id(template_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("template".to_string()))?;
    with_participants(db, vec![model])
        .await?
        .pop()
        .ok_or_else(|| EngineError::KeyNotFound("template".to_string()))
}

async fn with_participants<C: ConnectionTrait>(
    db: &C,
    models: Vec<templates::Model>,
) -> ResultEngine<Vec<Template>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let rows = template_participants::Entity::find()
        .filter(template_participants::Column::TemplateId.is_in(ids))
        .order_by_asc(template_participants::Column::Position)
        .all(db)
        .await?;

    let mut by_template: HashMap<Uuid, Vec<i64>> = HashMap::new();
    for row in rows {
        by_template.entry(row.template_id).or_default().push(row.user_id);
    }

    Ok(models
        .into_iter()
        .map(|model| {
            let participants = by_template.remove(&model.id).unwrap_or_default();
            Template::from((model, participants))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn template() -> Template {
        Template {
            id: Uuid::new_v4(),
            owner_id: 1,
            scope: Scope::Group(-100),
            name: "Pizza night".to_string(),
            amount_minor: 4500,
            category: Some("food".to_string()),
            participants: vec![1, 2],
        }
    }

    #[test]
    fn missing_description_defaults_to_template_name() {
        let when = Utc.with_ymd_and_hms(2026, 10, 1, 20, 0, 0).unwrap();
        let request = TemplateUse::new(Uuid::new_v4(), 2, when).amount_minor(2500);
        let cmd = expense_from_template(&template(), &request);
        assert_eq!(cmd.amount_minor, 2500);
        assert_eq!(cmd.description, "Pizza night");
        assert_eq!(cmd.payer_id, 2);
        assert_eq!(cmd.participants, vec![1, 2]);
        assert_eq!(cmd.category.as_deref(), Some("food"));
    }

    #[test]
    fn blank_description_also_defaults_to_template_name() {
        let request = TemplateUse::new(Uuid::new_v4(), 1, Utc::now()).description("   ");
        let cmd = expense_from_template(&template(), &request);
        assert_eq!(cmd.description, "Pizza night");
        assert_eq!(cmd.amount_minor, 4500);
    }

    #[test]
    fn explicit_description_wins() {
        let template = template();
        let request = TemplateUse::new(template.id, 1, Utc::now()).description("Friday pizza");
        let cmd = expense_from_template(&template, &request);
        assert_eq!(cmd.description, "Friday pizza");
        assert_eq!(cmd.template_id, Some(template.id));
    }
}
