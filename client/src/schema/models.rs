//! Available AI models.

use serde::{Deserialize, Serialize};

use super::Success;

/// An AI model the generator can use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiModel {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub description: String,
    pub capabilities: Vec<String>,
    pub is_default: bool,
}

/// Sibling fields of the models list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelsExtra {
    pub default_model: String,
}

/// Success body of `GET /api/content/models`.
pub type ModelsPayload = Success<Vec<AiModel>, ModelsExtra>;

impl Success<Vec<AiModel>, ModelsExtra> {
    /// Model the generator should preselect.
    ///
    /// Prefers the server's `defaultModel` when it names a listed model, then
    /// the first model flagged `isDefault`, then the first model.
    pub fn default_selection(&self) -> Option<&AiModel> {
        self.data
            .iter()
            .find(|m| m.id == self.extra.default_model)
            .or_else(|| self.data.iter().find(|m| m.is_default))
            .or_else(|| self.data.first())
    }
}
