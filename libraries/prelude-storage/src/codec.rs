//! Column encodings shared by the slices

use crate::error::{Result, StorageError};
use chrono::{DateTime, Utc};
use prelude_core::{Scope, ScopeSet};
use serde::{de::DeserializeOwned, Serialize};

/// Scopes are stored as a JSON array of wire names. Names that no longer
/// parse are dropped so that retiring a scope cannot lock anybody out.
pub(crate) fn decode_scopes(text: &str) -> Result<ScopeSet> {
    let names: Vec<String> = serde_json::from_str(text)?;
    Ok(names
        .iter()
        .filter_map(|name| name.parse::<Scope>().ok())
        .collect())
}

pub(crate) fn encode_scopes(scopes: &ScopeSet) -> Result<String> {
    Ok(serde_json::to_string(scopes)?)
}

pub(crate) fn decode_json<T: DeserializeOwned>(column: &'static str, text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| StorageError::corrupt(column, e))
}

pub(crate) fn encode_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

pub(crate) fn decode_timestamp(secs: Option<i64>) -> Result<Option<DateTime<Utc>>> {
    secs.map(|secs| {
        DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| StorageError::corrupt("expires", format!("{secs} out of range")))
    })
    .transpose()
}

pub(crate) fn count(total: i64) -> u64 {
    u64::try_from(total).unwrap_or(0)
}
