//! Analytics snapshot contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Success;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentByModel {
    pub model_id: String,
    pub model_name: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopTopic {
    pub topic: String,
    pub count: u64,
    pub last_generated: DateTime<Utc>,
}

/// One point of the generation timeline; `date` is the server's bucket label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationTimeline {
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub content_id: String,
    pub topic: String,
    pub created_at: DateTime<Utc>,
    pub ai_model: String,
    pub is_favorite: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub this_week: u64,
    pub this_month: u64,
    pub all_time: u64,
    pub average_per_week: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCloudEntry {
    pub tag: String,
    pub count: u64,
}

/// Aggregate usage numbers for the signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub total_content: u64,
    pub total_favorites: u64,
    pub content_by_model: Vec<ContentByModel>,
    pub top_topics: Vec<TopTopic>,
    pub generation_timeline: Vec<GenerationTimeline>,
    pub recent_activity: Vec<RecentActivity>,
    pub usage_stats: UsageStats,
    pub tag_cloud: Vec<TagCloudEntry>,
}

/// Success body of `GET /api/content/analytics`.
pub type AnalyticsPayload = Success<AnalyticsSnapshot>;
