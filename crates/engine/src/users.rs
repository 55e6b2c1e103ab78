//! Telegram users known to the bot.
//!
//! Users are registered (or refreshed) on every update, keyed by their
//! Telegram id. The username is optional on Telegram, so mentions can only
//! resolve users that have one.

use chrono::Utc;
use sea_orm::{ActiveValue, entity::prelude::*};

use crate::util::{collapse_whitespace, normalize_username};

/// Profile data taken from an incoming update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub id: i64,
    pub username: Option<String>,
    pub display_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub display_name: String,
}

impl User {
    /// Name used in reports: `@username` when available.
    #[must_use]
    pub fn mention(&self) -> String {
        match &self.username {
            Some(username) => format!("@{username}"),
            None => self.display_name.clone(),
        }
    }
}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            display_name: model.display_name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub username: Option<String>,
    pub username_norm: Option<String>,
    pub display_name: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group_members::Entity")]
    GroupMembers,
}

impl Related<super::group_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GroupMembers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&UserProfile> for ActiveModel {
    fn from(value: &UserProfile) -> Self {
        let username = value
            .username
            .as_deref()
            .map(|u| u.trim().trim_start_matches('@').to_string())
            .filter(|u| !u.is_empty());
        let display_name = {
            let name = collapse_whitespace(&value.display_name);
            if name.is_empty() {
                username.clone().unwrap_or_else(|| value.id.to_string())
            } else {
                name
            }
        };
        Self {
            id: ActiveValue::Set(value.id),
            username_norm: ActiveValue::Set(username.as_deref().and_then(normalize_username)),
            username: ActiveValue::Set(username),
            display_name: ActiveValue::Set(display_name),
            created_at: ActiveValue::Set(Utc::now()),
        }
    }
}
