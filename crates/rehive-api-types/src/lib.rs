//! Wire shapes for the Directus REST endpoints consumed by Re:hive.
//!
//! Both the public site and the seeder talk to the same `/items/posts` and
//! `/auth/login` surface; the types here describe those payloads without
//! imposing any of the site's normalisation rules. Relations arrive in whatever
//! shape the CMS chose to expand them, so they are kept as raw JSON values and
//! interpreted by the consumer.

use std::fmt;

use serde::de::{Deserializer, Error as DeError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Standard Directus response envelope: `{ "data": ..., "meta": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemsEnvelope<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ItemsMeta>,
}

/// Counts returned when the request asked for `meta=filter_count` or `meta=total_count`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsMeta {
    #[serde(default, deserialize_with = "lenient_count")]
    pub filter_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_count: Option<u64>,
}

/// Primary key of a Directus item. Collections may use string (uuid) or
/// integer keys; both are carried as their textual form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(value) => Ok(Self(value)),
            Value::Number(value) => Ok(Self(value.to_string())),
            Value::Null => Ok(Self::default()),
            other => Err(D::Error::custom(format!(
                "expected string or number item id, found {other}"
            ))),
        }
    }
}

/// A post record exactly as the CMS returns it.
///
/// Scalar columns are typed; relation and loosely-typed columns stay as JSON
/// values. Columns the site does not know about are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPost {
    #[serde(default)]
    pub id: ItemId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub featured_image: Value,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub date_updated: Option<String>,
    #[serde(default)]
    pub category: Value,
    #[serde(default)]
    pub tags: Value,
    #[serde(default)]
    pub reading_time: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reference to a file in the CMS asset store.
///
/// Depending on the requested fields the CMS returns either the bare file key
/// or the expanded file object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    Id(String),
    File(ImageFile),
}

/// Expanded file object. Any of these columns may identify the asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFile {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub filename_disk: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub filename: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub key: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub uuid: Option<String>,
}

impl ImageRef {
    /// Interpret an arbitrary JSON value as an image reference.
    ///
    /// Strings become [`ImageRef::Id`], objects become [`ImageRef::File`];
    /// every other shape is treated as "no image".
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(id) => Some(Self::Id(id.clone())),
            Value::Object(_) => serde_json::from_value(value.clone())
                .ok()
                .map(Self::File),
            _ => None,
        }
    }
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response of `POST /auth/login`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub data: Option<LoginData>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginData {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl LoginResponse {
    /// The bearer token, if the CMS issued a non-empty one.
    pub fn access_token(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|data| data.access_token.as_deref())
            .filter(|token| !token.is_empty())
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(value) => Some(value),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    })
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(value) => value.as_u64(),
        Value::String(value) => value.trim().parse().ok(),
        _ => None,
    })
}
