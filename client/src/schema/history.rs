//! Content history contract.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::{ContentItem, Schema, Success};
use crate::ValidationError;

/// Query parameters of `GET /api/content/history`.
///
/// An unset limit sends no `limit` parameter, leaving the page size to the
/// server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Validate)]
pub struct HistoryQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<u32>,
}

impl HistoryQuery {
    pub fn with_limit(limit: u32) -> Result<Self, ValidationError> {
        let query = Self { limit: Some(limit) };
        query.check()?;
        Ok(query)
    }

    pub fn check(&self) -> Result<(), ValidationError> {
        self.validate()
            .map_err(|e| ValidationError::from_validator(&e))
    }
}

impl Schema for HistoryQuery {
    fn parse(raw: &Value) -> Result<Self, ValidationError> {
        let object = match raw {
            Value::Null => return Ok(Self::default()),
            Value::Object(object) => object,
            _ => return Err(ValidationError::at("", "expected an object")),
        };

        let limit = match object.get("limit") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => {
                if let Some(v) = n.as_u64() {
                    Some(u32::try_from(v).map_err(|_| {
                        ValidationError::at("limit", "limit must be between 1 and 100")
                    })?)
                } else if n.as_i64().is_some() {
                    return Err(ValidationError::at(
                        "limit",
                        "limit must be between 1 and 100",
                    ));
                } else {
                    return Err(ValidationError::at("limit", "expected an integer"));
                }
            }
            Some(other) => {
                return Err(ValidationError::at(
                    "limit",
                    format!("expected a number, got {}", other),
                ))
            }
        };

        let query = Self { limit };
        query.check()?;
        Ok(query)
    }
}

/// Sibling fields of the history list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryExtra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

/// Success body of `GET /api/content/history`.
pub type HistoryPayload = Success<Vec<ContentItem>, HistoryExtra>;
