//! Request body decoding by declared content type

use super::ApiError;
use axum::body::Body;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, Method};
use bytes::Bytes;
use serde_json::{Map, Value};
use std::convert::Infallible;
use url::form_urlencoded;

/// A decoded request body
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Form(Map<String, Value>),
    Multipart(Vec<FormField>),
    Raw(Bytes),
}

impl Default for RequestBody {
    fn default() -> Self {
        RequestBody::Raw(Bytes::new())
    }
}

/// One named part of a `multipart/form-data` body
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub name: String,
    pub value: FormValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File {
        file_name: String,
        content_type: Option<String>,
        data: Bytes,
    },
}

/// Methods whose bodies are never read
pub fn carries_body(method: &Method) -> bool {
    !matches!(
        *method,
        Method::CONNECT | Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Read and decode a request body.
///
/// The body is bounded by its declared `Content-Length` and by `max_size`.
pub async fn decode(
    method: &Method,
    headers: &HeaderMap,
    body: Body,
    max_size: usize,
) -> Result<RequestBody, ApiError> {
    if !carries_body(method) {
        return Ok(RequestBody::default());
    }

    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<usize>().ok());
    if declared.is_some_and(|length| length > max_size) {
        return Err(ApiError::BadRequest("The request body is too large.".to_string()));
    }

    let limit = declared.unwrap_or(max_size);
    let bytes = axum::body::to_bytes(body, limit).await.map_err(|err| {
        ApiError::BadRequest(format!("The request body could not be read: {}", err))
    })?;

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    match media_type(content_type).as_str() {
        "application/json" => serde_json::from_slice(&bytes)
            .map(RequestBody::Json)
            .map_err(|err| {
                ApiError::BadRequest(format!("The request body is not valid JSON: {}", err))
            }),
        "application/x-www-form-urlencoded" => Ok(RequestBody::Form(decode_form(&bytes))),
        "multipart/form-data" => decode_multipart(content_type, bytes).await,
        _ => Ok(RequestBody::Raw(bytes)),
    }
}

/// Lowercased media type with any parameters removed
fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Repeated keys collect into an array
fn decode_form(bytes: &[u8]) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in form_urlencoded::parse(bytes) {
        let value = Value::String(value.into_owned());
        match map.get_mut(key.as_ref()) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key.into_owned(), value);
            }
        }
    }
    map
}

async fn decode_multipart(content_type: &str, bytes: Bytes) -> Result<RequestBody, ApiError> {
    let invalid = |err: multer::Error| {
        ApiError::BadRequest(format!("The multipart request body is invalid: {}", err))
    };

    let boundary = multer::parse_boundary(content_type).map_err(invalid)?;
    let stream = futures_util::stream::once(async move { Ok::<_, Infallible>(bytes) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        let name = field.name().unwrap_or_default().to_string();
        let value = match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().map(ToString::to_string);
                FormValue::File {
                    file_name,
                    content_type,
                    data: field.bytes().await.map_err(invalid)?,
                }
            }
            None => FormValue::Text(field.text().await.map_err(invalid)?),
        };
        fields.push(FormField { name, value });
    }

    Ok(RequestBody::Multipart(fields))
}
