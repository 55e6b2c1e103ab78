//! The module contains the errors the engine can throw.
//!
//! Most variants carry a short, lowercase description of what went wrong.
//! The bot maps them to user-facing messages, so keep them free of internal
//! details. [`Database`] wraps every store failure and is never shown to
//! users as-is.
//!
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
    #[error("Not allowed: {0}")]
    NotAllowed(String),
    #[error("\"{0}\" already voided!")]
    AlreadyVoided(String),
    #[error("Operation available only in groups: {0}")]
    NotAGroup(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidPeriod(a), Self::InvalidPeriod(b)) => a == b,
            (Self::NotAllowed(a), Self::NotAllowed(b)) => a == b,
            (Self::AlreadyVoided(a), Self::AlreadyVoided(b)) => a == b,
            (Self::NotAGroup(a), Self::NotAGroup(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
