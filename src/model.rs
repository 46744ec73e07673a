use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub content: String,
    pub review_id: Option<String>,
    pub user_name: Option<String>,
    pub star_rating: Option<u8>,
    pub at: Option<DateTime<Utc>>,
}

#[cfg(test)]
impl Review {
    pub fn from_content(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawClassification {
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelResult {
    pub mean_score: f64,
    pub sample_count: usize,
    pub failure_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SentimentTier {
    #[serde(rename = "Very Positive")]
    VeryPositive,
    #[serde(rename = "Mildly Positive")]
    MildlyPositive,
    #[serde(rename = "Neutral")]
    Neutral,
    #[serde(rename = "Mildly Negative")]
    MildlyNegative,
    #[serde(rename = "Very Negative")]
    VeryNegative,
}

impl SentimentTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VeryPositive => "Very Positive",
            Self::MildlyPositive => "Mildly Positive",
            Self::Neutral => "Neutral",
            Self::MildlyNegative => "Mildly Negative",
            Self::VeryNegative => "Very Negative",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentCategory {
    pub category: SentimentTier,
    pub color: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelReport {
    pub score: f64,
    pub sentiment: SentimentCategory,
    pub description: &'static str,
    pub sample_count: usize,
    pub failed_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub app_name: String,
    pub app_title: String,
    pub app_url: String,
    pub review_count: usize,
    pub models: BTreeMap<String, ModelReport>,
    pub generated_at: String,
}
