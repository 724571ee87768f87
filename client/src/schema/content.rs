//! Content items and the generate / by-id / delete / favorite contracts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::{deserialize_at, MessageExtra, Schema, Success};
use crate::ValidationError;

/// A generated content item as stored by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub topic: String,
    pub titles: Vec<String>,
    pub description: String,
    pub tags: Vec<String>,
    pub thumbnail_ideas: Vec<String>,
    pub script_outline: Vec<String>,
    pub is_favorite: bool,
    pub ai_model: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "__v")]
    pub revision: u32,
}

/// Freshly generated content returned by the generate endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub titles: Vec<String>,
    pub description: String,
    pub tags: Vec<String>,
    pub thumbnail_ideas: Vec<String>,
    pub script_outline: Vec<String>,
    pub ai_model: String,
}

/// Generate request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, message = "Topic is required"))]
    pub topic: String,
    #[validate(length(min = 1, message = "Model is required"))]
    pub model: String,
}

impl GenerateRequest {
    pub fn new(topic: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            model: model.into(),
        }
    }

    /// Check field constraints. Strings are taken as given, not trimmed.
    pub fn check(&self) -> Result<(), ValidationError> {
        self.validate()
            .map_err(|e| ValidationError::from_validator(&e))
    }
}

impl Schema for GenerateRequest {
    fn parse(raw: &Value) -> Result<Self, ValidationError> {
        let request: GenerateRequest = deserialize_at("", raw)?;
        request.check()?;
        Ok(request)
    }
}

/// Validate a content id used as a path parameter.
pub fn check_content_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::at("id", "Content id is required"));
    }
    Ok(())
}

/// Success body of `POST /api/content/generate`.
pub type GeneratePayload = Success<GeneratedContent>;

/// Success body of `GET /api/content/{id}`.
pub type ContentPayload = Success<ContentItem>;

/// Success body of `DELETE /api/content/{id}`; the server may echo data back.
pub type DeletePayload = Success<Option<Value>, MessageExtra>;

/// Success body of `PATCH /api/content/{id}/favorite`.
pub type ToggleFavoritePayload = Success<ContentItem, MessageExtra>;

/// Sibling fields of the favorites list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountExtra {
    pub count: u64,
}

/// Success body of `GET /api/content/favorites`.
pub type FavoritesPayload = Success<Vec<ContentItem>, CountExtra>;
