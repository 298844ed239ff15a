//! Request body field validation.
//!
//! Each helper reports a failure as a field error keyed by the field name.

use crate::api::ApiError;
use chrono::{DateTime, Utc};
use prelude_core::{Scope, ScopeSet};
use serde_json::{Map, Value};

pub type Object = Map<String, Value>;

/// A required, non-empty string
pub fn required_string<'a>(body: &'a Object, name: &str, missing: &str) -> Result<&'a str, ApiError> {
    match optional_string(body, name)? {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ApiError::field(name, missing)),
    }
}

/// A string that may be absent or null
pub fn optional_string<'a>(body: &'a Object, name: &str) -> Result<Option<&'a str>, ApiError> {
    match body.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(_) => Err(ApiError::field(name, "Must be a string.")),
    }
}

pub fn length_between(name: &str, value: &str, min: usize, max: usize) -> Result<(), ApiError> {
    let length = value.chars().count();
    if length < min {
        return Err(ApiError::field(
            name,
            format!("Must be at least {} characters long.", min),
        ));
    }
    if length > max {
        return Err(ApiError::field(
            name,
            format!("Must not be longer than {} characters.", max),
        ));
    }
    Ok(())
}

pub fn max_length(name: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.chars().count() > max {
        return Err(ApiError::field(
            name,
            format!("Must be {} characters or less.", max),
        ));
    }
    Ok(())
}

/// A list of strings. Form bodies send a lone value as a plain string.
pub fn string_list(body: &Object, name: &str, missing: &str) -> Result<Vec<String>, ApiError> {
    match body.get(name) {
        None | Some(Value::Null) => Err(ApiError::field(name, missing)),
        Some(Value::String(value)) => Ok(vec![value.clone()]),
        Some(Value::Array(values)) => values
            .iter()
            .map(|value| match value {
                Value::String(value) => Ok(value.clone()),
                _ => Err(ApiError::field(name, "Must be an array of strings.")),
            })
            .collect(),
        Some(_) => Err(ApiError::field(name, "Must be an array.")),
    }
}

pub fn scopes(body: &Object, name: &str) -> Result<ScopeSet, ApiError> {
    string_list(body, name, "This field is required.")?
        .iter()
        .map(|scope| {
            scope
                .parse::<Scope>()
                .map_err(|err| ApiError::field(name, err.to_string()))
        })
        .collect()
}

/// A boolean, also accepted in its form-encoded spellings; absent is false
pub fn boolean(body: &Object, name: &str) -> Result<bool, ApiError> {
    let invalid = || ApiError::field(name, "Must be a boolean.");
    match body.get(name) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(value)) => Ok(*value),
        Some(Value::Number(number)) => match number.as_i64() {
            Some(1) => Ok(true),
            Some(0) => Ok(false),
            _ => Err(invalid()),
        },
        Some(Value::String(value)) => match value.as_str() {
            "true" | "1" | "on" => Ok(true),
            "false" | "0" | "off" | "" => Ok(false),
            _ => Err(invalid()),
        },
        Some(_) => Err(invalid()),
    }
}

/// A future UNIX time in seconds. `null` means no expiry.
pub fn future_time(body: &Object, name: &str, missing: &str) -> Result<Option<DateTime<Utc>>, ApiError> {
    let invalid = || ApiError::field(name, "Must be a number representing UNIX time.");
    let seconds = match body.get(name) {
        None => return Err(ApiError::field(name, missing)),
        Some(Value::Null) => return Ok(None),
        Some(Value::String(value)) if value == "null" => return Ok(None),
        Some(Value::String(value)) => value.trim().parse::<i64>().map_err(|_| invalid())?,
        Some(Value::Number(number)) => number.as_i64().ok_or_else(invalid)?,
        Some(_) => return Err(invalid()),
    };

    let time = DateTime::from_timestamp(seconds, 0).ok_or_else(invalid)?;
    if time <= Utc::now() {
        return Err(ApiError::field(name, "Must be in the future."));
    }
    Ok(Some(time))
}
