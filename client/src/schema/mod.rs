//! Wire contracts for every TubeGenie API operation.
//!
//! Each request and response shape is a Rust type; [`Schema::parse`] turns a
//! raw JSON value into that type or a [`ValidationError`] naming the
//! offending paths. Responses are [`Envelope`]s: callers must match on the
//! variant before touching the data.

pub mod analytics;
pub mod content;
pub mod history;
pub mod models;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::ValidationError;

pub use analytics::{
    AnalyticsPayload, AnalyticsSnapshot, ContentByModel, GenerationTimeline, RecentActivity,
    TagCloudEntry, TopTopic, UsageStats,
};
pub use content::{
    check_content_id, ContentItem, ContentPayload, CountExtra, DeletePayload, FavoritesPayload,
    GenerateRequest, GeneratePayload, GeneratedContent, ToggleFavoritePayload,
};
pub use history::{HistoryExtra, HistoryPayload, HistoryQuery};
pub use models::{AiModel, ModelsExtra, ModelsPayload};

/// Deserialize `raw`, reporting failures at their full path under `scope`.
pub(crate) fn deserialize_at<T: DeserializeOwned>(
    scope: &str,
    raw: &Value,
) -> Result<T, ValidationError> {
    serde_path_to_error::deserialize(raw).map_err(|e| ValidationError::from_deserialize(scope, &e))
}

/// Parse-and-validate contract shared by requests and responses.
pub trait Schema: Sized {
    fn parse(raw: &Value) -> Result<Self, ValidationError>;
}

/// Response envelope: `{success: true, ...}` or `{success: false, error, path?}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    Success(T),
    Failure(ApiFailure),
}

/// Body of a `success: false` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiFailure {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            Envelope::Success(body) => Some(body),
            Envelope::Failure(_) => None,
        }
    }

    pub fn into_result(self) -> Result<T, ApiFailure> {
        match self {
            Envelope::Success(body) => Ok(body),
            Envelope::Failure(failure) => Err(failure),
        }
    }

    /// Like [`Envelope::into_result`], with a failure raised as
    /// [`Error::Application`](crate::Error::Application).
    pub fn into_body(self) -> crate::Result<T> {
        self.into_result().map_err(|failure| crate::Error::Application {
            message: failure.error,
            path: failure.path,
        })
    }
}

/// Success body: the `data` field plus any operation-specific siblings
/// (`message`, `count`, `defaultModel`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Success<D, E = NoExtra> {
    pub data: D,
    #[serde(flatten)]
    pub extra: E,
}

impl<D> Success<D> {
    pub fn new(data: D) -> Self {
        Self {
            data,
            extra: NoExtra {},
        }
    }
}

/// No sibling fields besides `data`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoExtra {}

/// Optional human-readable confirmation sent with mutations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageExtra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<D, E> Schema for Envelope<Success<D, E>>
where
    D: DeserializeOwned,
    E: DeserializeOwned,
{
    fn parse(raw: &Value) -> Result<Self, ValidationError> {
        let object = raw
            .as_object()
            .ok_or_else(|| ValidationError::at("", "expected a JSON object"))?;

        match object.get("success") {
            Some(Value::Bool(true)) => {
                let data_raw = object.get("data").unwrap_or(&Value::Null);
                let data = deserialize_at::<D>("data", data_raw)?;
                let extra = deserialize_at::<E>("", raw)?;
                Ok(Envelope::Success(Success { data, extra }))
            }
            Some(Value::Bool(false)) => deserialize_at::<ApiFailure>("", raw).map(Envelope::Failure),
            Some(other) => Err(ValidationError::at(
                "success",
                format!("expected boolean literal, got {}", other),
            )),
            None => Err(ValidationError::at("success", "required")),
        }
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Tagged<'a, B> {
            success: bool,
            #[serde(flatten)]
            body: &'a B,
        }

        match self {
            Envelope::Success(body) => Tagged {
                success: true,
                body,
            }
            .serialize(serializer),
            Envelope::Failure(failure) => Tagged {
                success: false,
                body: failure,
            }
            .serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    type Strings = Envelope<Success<Vec<String>, MessageExtra>>;

    #[test]
    fn test_success_with_extra() {
        let raw = json!({"success": true, "data": ["a", "b"], "message": "ok", "ignored": 1});
        let parsed = Strings::parse(&raw).unwrap();
        match parsed {
            Envelope::Success(body) => {
                assert_eq!(body.data, vec!["a", "b"]);
                assert_eq!(body.extra.message.as_deref(), Some("ok"));
            }
            Envelope::Failure(_) => panic!("expected success"),
        }
    }

    #[test]
    fn test_failure_with_path() {
        let raw = json!({"success": false, "error": "Content not found", "path": "/api/content/x"});
        let parsed = Strings::parse(&raw).unwrap();
        assert_eq!(
            parsed,
            Envelope::Failure(ApiFailure {
                error: "Content not found".to_string(),
                path: Some("/api/content/x".to_string()),
            })
        );
    }

    #[test]
    fn test_discriminant_required() {
        let err = Strings::parse(&json!({"data": []})).unwrap_err();
        assert_eq!(err.paths(), vec!["success"]);

        let err = Strings::parse(&json!({"success": "true", "data": []})).unwrap_err();
        assert_eq!(err.paths(), vec!["success"]);

        let err = Strings::parse(&json!([])).unwrap_err();
        assert_eq!(err.paths(), vec![""]);
    }

    #[test]
    fn test_malformed_variants() {
        // success without the success-shaped fields
        let err = Strings::parse(&json!({"success": true, "error": "nope"})).unwrap_err();
        assert_eq!(err.paths(), vec!["data"]);

        // failure without an error message
        let err = Strings::parse(&json!({"success": false, "data": []})).unwrap_err();
        assert_eq!(err.paths(), vec!["error"]);
    }

    #[test]
    fn test_serialize_wire_shape() {
        let envelope: Strings = Envelope::Success(Success {
            data: vec!["x".to_string()],
            extra: MessageExtra { message: None },
        });
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"success": true, "data": ["x"]})
        );

        let failure: Strings = Envelope::Failure(ApiFailure {
            error: "boom".to_string(),
            path: None,
        });
        assert_eq!(
            serde_json::to_value(&failure).unwrap(),
            json!({"success": false, "error": "boom"})
        );
    }
}
