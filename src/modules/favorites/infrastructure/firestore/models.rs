use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::modules::favorites::domain::FavoriteEntry;
use crate::shared::errors::{AppError, AppResult};

pub const FAVORITES_COLLECTION: &str = "favorites";

/// Typed Firestore value as it appears in REST payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FirestoreValue {
    StringValue(String),
    /// int64 travels as a decimal string
    IntegerValue(String),
    DoubleValue(f64),
    BooleanValue(bool),
    TimestampValue(String),
    NullValue(()),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirestoreDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FirestoreValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

/// One element of a `:runQuery` response stream
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryResponseItem {
    #[serde(default)]
    pub document: Option<FirestoreDocument>,
    #[serde(default)]
    pub read_time: Option<String>,
}

impl FirestoreDocument {
    pub fn from_entry(entry: &FavoriteEntry) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(
            "userId".to_string(),
            FirestoreValue::StringValue(entry.user_id.clone()),
        );
        fields.insert(
            "movieId".to_string(),
            FirestoreValue::IntegerValue(entry.movie_id.to_string()),
        );
        fields.insert(
            "title".to_string(),
            FirestoreValue::StringValue(entry.title.clone()),
        );
        fields.insert("posterPath".to_string(), optional_string(&entry.poster_path));
        fields.insert(
            "voteAverage".to_string(),
            FirestoreValue::DoubleValue(f64::from(entry.vote_average)),
        );
        fields.insert(
            "overview".to_string(),
            FirestoreValue::StringValue(entry.overview.clone()),
        );
        fields.insert("releaseDate".to_string(), optional_string(&entry.release_date));
        fields.insert(
            "addedAt".to_string(),
            FirestoreValue::TimestampValue(entry.added_at.to_rfc3339()),
        );

        Self {
            name: None,
            fields,
            update_time: None,
        }
    }

    pub fn to_entry(&self) -> AppResult<FavoriteEntry> {
        let added_at = match self.fields.get("addedAt") {
            Some(FirestoreValue::TimestampValue(ts)) => {
                DateTime::parse_from_rfc3339(ts)?.with_timezone(&Utc)
            }
            _ => return Err(self.missing("addedAt")),
        };

        Ok(FavoriteEntry {
            user_id: self.string("userId")?.ok_or_else(|| self.missing("userId"))?,
            movie_id: self.integer("movieId")?,
            title: self.string("title")?.unwrap_or_default(),
            poster_path: self.string("posterPath")?,
            vote_average: self.double("voteAverage") as f32,
            overview: self.string("overview")?.unwrap_or_default(),
            release_date: self.string("releaseDate")?,
            added_at,
        })
    }

    fn string(&self, field: &str) -> AppResult<Option<String>> {
        match self.fields.get(field) {
            Some(FirestoreValue::StringValue(value)) => Ok(Some(value.clone())),
            Some(FirestoreValue::NullValue(())) | None => Ok(None),
            Some(other) => Err(AppError::DecodeError(format!(
                "Field '{}' is not a string: {:?}",
                field, other
            ))),
        }
    }

    fn integer(&self, field: &str) -> AppResult<i64> {
        match self.fields.get(field) {
            Some(FirestoreValue::IntegerValue(value)) => Ok(value.parse()?),
            Some(FirestoreValue::DoubleValue(value)) => Ok(*value as i64),
            _ => Err(self.missing(field)),
        }
    }

    fn double(&self, field: &str) -> f64 {
        match self.fields.get(field) {
            Some(FirestoreValue::DoubleValue(value)) => *value,
            Some(FirestoreValue::IntegerValue(value)) => value.parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    fn missing(&self, field: &str) -> AppError {
        AppError::DecodeError(format!(
            "Favorite document {} has no valid '{}'",
            self.name.as_deref().unwrap_or("<unnamed>"),
            field
        ))
    }
}

fn optional_string(value: &Option<String>) -> FirestoreValue {
    match value {
        Some(value) => FirestoreValue::StringValue(value.clone()),
        None => FirestoreValue::NullValue(()),
    }
}

/// `:runQuery` body selecting every favorite of `user_id`
pub fn favorites_query(user_id: &str) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": FAVORITES_COLLECTION }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": "userId" },
                    "op": "EQUAL",
                    "value": { "stringValue": user_id }
                }
            },
            "orderBy": [{
                "field": { "fieldPath": "addedAt" },
                "direction": "DESCENDING"
            }]
        }
    })
}
