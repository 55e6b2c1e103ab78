use sea_orm::{
    QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
    sea_query::{Expr, OnConflict},
};

use crate::{EngineError, ResultEngine, User, UserProfile, users, util::normalize_username};

use super::{Engine, load_users, require_user, with_tx};

impl Engine {
    /// Insert or refresh a user from an incoming update.
    ///
    /// Telegram usernames can move between accounts, so a username claimed by
    /// this user is cleared from any other row first.
    pub async fn register_user(&self, profile: &UserProfile) -> ResultEngine<User> {
        let model = users::ActiveModel::from(profile);
        let username_norm = profile.username.as_deref().and_then(normalize_username);
        with_tx!(self, |db_tx| {
            if let Some(norm) = username_norm {
                users::Entity::update_many()
                    .col_expr(users::Column::Username, Expr::value(Option::<String>::None))
                    .col_expr(users::Column::UsernameNorm, Expr::value(Option::<String>::None))
                    .filter(users::Column::UsernameNorm.eq(norm))
                    .filter(users::Column::Id.ne(profile.id))
                    .exec(&db_tx)
                    .await?;
            }

            users::Entity::insert(model)
                .on_conflict(
                    OnConflict::column(users::Column::Id)
                        .update_columns([
                            users::Column::Username,
                            users::Column::UsernameNorm,
                            users::Column::DisplayName,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(&db_tx)
                .await?;

            require_user(&db_tx, profile.id).await
        })
    }

    pub async fn user(&self, user_id: i64) -> ResultEngine<User> {
        require_user(&self.database, user_id).await
    }

    /// Load several users at once, in the order of `user_ids`.
    pub async fn users(&self, user_ids: &[i64]) -> ResultEngine<Vec<User>> {
        load_users(&self.database, user_ids).await
    }

    /// Find a user by Telegram username (case-insensitive, `@` optional).
    pub async fn user_by_username(&self, username: &str) -> ResultEngine<User> {
        let norm = normalize_username(username)
            .ok_or_else(|| EngineError::InvalidName("empty username".to_string()))?;
        users::Entity::find()
            .filter(users::Column::UsernameNorm.eq(norm.as_str()))
            .one(&self.database)
            .await?
            .map(User::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("@{norm}")))
    }

    /// Resolve a list of mentions, preserving order.
    ///
    /// Fails with `KeyNotFound("@name")` on the first unknown username.
    pub async fn resolve_usernames(&self, usernames: &[String]) -> ResultEngine<Vec<User>> {
        let mut norms: Vec<String> = Vec::with_capacity(usernames.len());
        for raw in usernames {
            let norm = normalize_username(raw)
                .ok_or_else(|| EngineError::InvalidName("empty username".to_string()))?;
            if !norms.contains(&norm) {
                norms.push(norm);
            }
        }
        if norms.is_empty() {
            return Ok(Vec::new());
        }

        let models = users::Entity::find()
            .filter(users::Column::UsernameNorm.is_in(norms.clone()))
            .order_by_asc(users::Column::Id)
            .all(&self.database)
            .await?;

        norms
            .iter()
            .map(|norm| {
                models
                    .iter()
                    .find(|m| m.username_norm.as_deref() == Some(norm.as_str()))
                    .cloned()
                    .map(User::from)
                    .ok_or_else(|| EngineError::KeyNotFound(format!("@{norm}")))
            })
            .collect()
    }
}
