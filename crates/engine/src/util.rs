//! Internal helpers for input normalization and model conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{Currency, EngineError, ResultEngine};

pub(crate) const MAX_NAME_CHARS: usize = 64;
pub(crate) const MAX_DESCRIPTION_CHARS: usize = 256;

/// Collapse runs of whitespace into single spaces.
pub(crate) fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lookup key for names: accents stripped, lowercase, whitespace collapsed.
/// `"Caffè  Bar"` and `"caffe bar"` share the same key; punctuation is kept.
pub(crate) fn name_key(input: &str) -> Option<String> {
    let folded: String = input
        .nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
        .collect();
    let normalized = collapse_whitespace(&folded);
    (!normalized.is_empty()).then_some(normalized)
}

/// Validate a display name and return it with collapsed whitespace.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let display = collapse_whitespace(value);
    if display.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    if display.chars().count() > MAX_NAME_CHARS {
        return Err(EngineError::InvalidName(format!(
            "{label} name must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(display)
}

pub(crate) fn normalize_description(value: &str) -> ResultEngine<String> {
    let description = collapse_whitespace(value);
    if description.is_empty() {
        return Err(EngineError::InvalidName(
            "description must not be empty".to_string(),
        ));
    }
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(EngineError::InvalidName(format!(
            "description must be at most {MAX_DESCRIPTION_CHARS} characters"
        )));
    }
    Ok(description)
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty())
}

pub(crate) fn normalize_category(value: Option<&str>) -> Option<String> {
    normalize_optional_text(value.map(|v| v.trim_start_matches('#'))).map(|c| c.to_lowercase())
}

/// Telegram usernames are case-insensitive and often typed with a leading `@`.
pub(crate) fn normalize_username(value: &str) -> Option<String> {
    let trimmed = value.trim().trim_start_matches('@');
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

pub(crate) fn ensure_positive(amount_minor: i64, label: &str) -> ResultEngine<()> {
    if amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(format!("{label} must be > 0")));
    }
    Ok(())
}

/// Parse a currency code stored in the DB into a strongly typed `Currency`.
pub(crate) fn model_currency(value: &str) -> ResultEngine<Currency> {
    Currency::try_from(value)
        .map_err(|_| EngineError::CurrencyMismatch(format!("invalid currency: {value}")))
}

/// Deduplicate ids keeping the first occurrence.
pub(crate) fn dedup_in_order(ids: impl IntoIterator<Item = i64>) -> Vec<i64> {
    let mut out: Vec<i64> = Vec::new();
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
