//! Error types for the TubeGenie API client.

use std::fmt::{self, Write};

use serde_path_to_error::Segment;

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the TubeGenie API.
#[derive(Error, Debug)]
pub enum Error {
    /// A request or response failed schema validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No bearer token was available when the operation started.
    #[error("User not authenticated")]
    AuthRequired,

    /// Network failure or non-2xx status, with the failed operation named.
    #[error("Failed to {operation}: {message}")]
    Transport {
        operation: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// The server answered with `success: false`.
    #[error("{message}")]
    Application {
        message: String,
        path: Option<String>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status reported by the server, if the failure came with one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether retrying the same call could succeed without user action.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport { status: None, .. } => true,
            Error::Transport {
                status: Some(status),
                ..
            } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// One constraint violation found while parsing a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Location of the offending value (`data[1].userId`, `limit`).
    pub path: String,
    /// The constraint that was not met.
    pub message: String,
}

/// Schema validation failure listing every offending path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        let mut issues = issues;
        issues.sort_by(|a, b| a.path.cmp(&b.path));
        Self { issues }
    }

    /// Single-issue error.
    pub fn at(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![ValidationIssue {
            path: path.into(),
            message: message.into(),
        }])
    }

    /// Build from a tracked serde failure inside `scope`.
    ///
    /// The path is `scope` followed by the keys and indexes walked before the
    /// failure (`data[1].userId`). A missing field is reported at the field
    /// itself rather than at the object that lacks it.
    pub fn from_deserialize(
        scope: &str,
        err: &serde_path_to_error::Error<serde_json::Error>,
    ) -> Self {
        let mut path = scope.to_string();
        for segment in err.path().iter() {
            match segment {
                Segment::Seq { index } => {
                    let _ = write!(path, "[{}]", index);
                }
                other => push_key(&mut path, &other.to_string()),
            }
        }

        let message = err.inner().to_string();
        if let Some(field) = message
            .strip_prefix("missing field `")
            .and_then(|rest| rest.split('`').next())
        {
            push_key(&mut path, field);
        }

        Self::at(path, message)
    }

    /// Build from the `validator` crate's derive output.
    pub fn from_validator(errors: &validator::ValidationErrors) -> Self {
        let issues = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| ValidationIssue {
                    path: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        Self::new(issues)
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Offending paths in sorted order.
    pub fn paths(&self) -> Vec<&str> {
        self.issues.iter().map(|i| i.path.as_str()).collect()
    }

    pub fn has_path(&self, path: &str) -> bool {
        self.issues.iter().any(|i| i.path == path)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .issues
            .iter()
            .map(|i| {
                if i.path.is_empty() {
                    i.message.clone()
                } else {
                    format!("{}: {}", i.path, i.message)
                }
            })
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationError {}

fn push_key(path: &mut String, key: &str) {
    if !path.is_empty() {
        path.push('.');
    }
    path.push_str(key);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Deserialize, Debug)]
    #[allow(dead_code)]
    struct Item {
        #[serde(rename = "userId")]
        user_id: String,
        views: u32,
    }

    fn tracked<T: serde::de::DeserializeOwned + std::fmt::Debug>(
        raw: serde_json::Value,
    ) -> serde_path_to_error::Error<serde_json::Error> {
        serde_path_to_error::deserialize::<_, T>(&raw).unwrap_err()
    }

    #[test]
    fn test_missing_field_path() {
        let err = tracked::<Item>(serde_json::json!({"views": 1}));
        let v = ValidationError::from_deserialize("data", &err);
        assert_eq!(v.paths(), vec!["data.userId"]);
        assert!(v.to_string().starts_with("data.userId: missing field `userId`"));

        let v = ValidationError::from_deserialize("", &err);
        assert_eq!(v.paths(), vec!["userId"]);
    }

    #[test]
    fn test_nested_type_mismatch_path() {
        let err = tracked::<Vec<Item>>(serde_json::json!([
            {"userId": "u1", "views": 1},
            {"userId": "u2", "views": "many"}
        ]));
        let v = ValidationError::from_deserialize("data", &err);
        assert_eq!(v.paths(), vec!["data[1].views"]);

        let err = tracked::<Vec<Item>>(serde_json::json!([{"userId": "u1", "views": 1}, {}]));
        let v = ValidationError::from_deserialize("data", &err);
        assert_eq!(v.paths(), vec!["data[1].userId"]);
    }

    #[test]
    fn test_top_level_type_mismatch_keeps_scope() {
        let err = tracked::<Vec<Item>>(serde_json::json!({"not": "a list"}));
        let v = ValidationError::from_deserialize("data", &err);
        assert_eq!(v.paths(), vec!["data"]);
    }

    #[test]
    fn test_transport_display_names_operation() {
        let err = Error::Transport {
            operation: "delete content",
            status: Some(404),
            message: "Content not found".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to delete content: Content not found");
        assert_eq!(err.status_code(), Some(404));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_retryable() {
        let network = Error::Transport {
            operation: "fetch models",
            status: None,
            message: "connection refused".to_string(),
        };
        assert!(network.is_retryable());
        assert!(!Error::AuthRequired.is_retryable());
    }
}
