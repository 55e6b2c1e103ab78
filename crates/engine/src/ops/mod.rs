use sea_orm::{ConnectionTrait, DatabaseConnection, QueryFilter, prelude::*};

use crate::{Currency, EngineError, ResultEngine, User};

mod balances;
mod expenses;
mod groups;
mod settlements;
mod summary;
mod templates;
mod users;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    default_currency: Currency,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Currency used for personal expenses and for newly registered groups.
    #[must_use]
    pub fn default_currency(&self) -> Currency {
        self.default_currency
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    default_currency: Currency,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    pub fn default_currency(mut self, currency: Currency) -> EngineBuilder {
        self.default_currency = currency;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            default_currency: self.default_currency,
        })
    }
}

/// Load users by id, failing on the first unknown one.
pub(crate) async fn load_users<C: ConnectionTrait>(db: &C, ids: &[i64]) -> ResultEngine<Vec<User>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let models = crate::users::Entity::find()
        .filter(crate::users::Column::Id.is_in(ids.iter().copied()))
        .all(db)
        .await?;
    ids.iter()
        .map(|id| {
            models
                .iter()
                .find(|m| m.id == *id)
                .cloned()
                .map(User::from)
                .ok_or_else(|| EngineError::KeyNotFound(format!("user {id}")))
        })
        .collect()
}

pub(crate) async fn require_user<C: ConnectionTrait>(db: &C, user_id: i64) -> ResultEngine<User> {
    crate::users::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .map(User::from)
        .ok_or_else(|| EngineError::KeyNotFound(format!("user {user_id}")))
}
