//! Request bodies accepted as JSON or as URL-encoded forms

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::error::{ApiError, ApiErrorType};
use super::json::Json;

/// Body extractor that picks the decoder from `Content-Type`
///
/// An empty body without a content type decodes as `{}`, so field-less
/// requests (a bare `PATCH`) reach the handler with every field unset.
#[derive(Debug, Clone, Default)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.contains("json") {
            let Json(value) = Json::<T>::from_request(req, state).await?;
            return Ok(Payload(value));
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(value) = Form::<T>::from_request(req, state).await.map_err(|rejection| {
                ApiError::new(
                    rejection.status(),
                    ApiErrorType::InvalidRequestError,
                    format!("Invalid form data: {}", rejection.body_text()),
                )
            })?;
            return Ok(Payload(value));
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return serde_json::from_str("{}")
                .map(Payload)
                .map_err(|e| ApiError::bad_request(format!("Missing request body: {}", e)));
        }

        Err(ApiError::unsupported_media_type(
            "Expected 'application/json' or 'application/x-www-form-urlencoded'",
        ))
    }
}

/// Parameters of one entity, which clients may nest under its root key
pub trait Rooted: DeserializeOwned {
    /// `team` for `{"team": {...}}` and `team[name]=...`
    const ROOT: &'static str;
}

/// Entity parameters accepted flat or under the entity's root key
///
/// Form keys ending in `[]` collect into a list, so
/// `project[member_ids][]=1&project[member_ids][]=2` reads as
/// `{"member_ids": ["1", "2"]}`.
#[derive(Debug, Clone, Default)]
pub struct Params<T>(pub T);

impl<S, T> FromRequest<S> for Params<T>
where
    T: Rooted,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| {
                value
                    .to_ascii_lowercase()
                    .starts_with("application/x-www-form-urlencoded")
            });

        let fields = if is_form {
            let Payload(pairs) = Payload::<Vec<(String, String)>>::from_request(req, state).await?;
            form_fields(pairs)
        } else {
            let Payload(fields) = Payload::<Map<String, Value>>::from_request(req, state).await?;
            fields
        };

        serde_json::from_value(Value::Object(unwrap_root(fields, T::ROOT)))
            .map(Params)
            .map_err(|e| ApiError::bad_request(format!("Invalid parameters: {}", e)))
    }
}

fn form_fields(pairs: Vec<(String, String)>) -> Map<String, Value> {
    let mut fields = Map::new();

    for (key, value) in pairs {
        match key.strip_suffix("[]") {
            Some(list) => {
                let entry = fields
                    .entry(list.to_string())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(items) = entry {
                    items.push(Value::String(value));
                }
            }
            None => {
                fields.insert(key, Value::String(value));
            }
        }
    }

    fields
}

/// Lift `root: {...}` and `root[field]` entries to top-level fields
fn unwrap_root(mut fields: Map<String, Value>, root: &str) -> Map<String, Value> {
    if matches!(fields.get(root), Some(Value::Object(_))) {
        if let Some(Value::Object(nested)) = fields.remove(root) {
            fields.extend(nested);
        }
    }

    let prefix = format!("{}[", root);
    let bracketed: Vec<String> = fields
        .keys()
        .filter(|key| key.starts_with(&prefix) && key.ends_with(']'))
        .cloned()
        .collect();

    for key in bracketed {
        if let Some(value) = fields.remove(&key) {
            let field = key[prefix.len()..key.len() - 1].to_string();
            fields.insert(field, value);
        }
    }

    fields
}

/// An id field that may arrive as a JSON number or as text
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IdParam {
    Number(i64),
    Text(String),
}

impl IdParam {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }

    /// Raw text, for error messages
    pub fn raw(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(text) => text.clone(),
        }
    }
}

/// A list of ids: a JSON array, or comma-separated text from a form
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IdList {
    Many(Vec<IdParam>),
    Joined(String),
}

impl IdList {
    /// Parsed ids with blank entries skipped; `None` if any entry is not an integer
    pub fn ids(&self) -> Option<Vec<i64>> {
        match self {
            Self::Many(items) => items
                .iter()
                .filter(|item| !item.is_blank())
                .map(IdParam::as_i64)
                .collect(),
            Self::Joined(text) => text
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| part.parse().ok())
                .collect(),
        }
    }
}
