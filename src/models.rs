use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::Analysis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    School,
    University,
    Professional,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::School => "School",
            Category::University => "University",
            Category::Professional => "Professional",
        };
        f.write_str(label)
    }
}

/// Dashboard-level filter over [`Category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CategoryFilter {
    #[default]
    All,
    School,
    University,
    Professional,
}

impl CategoryFilter {
    /// The single category selected, or `None` for [`CategoryFilter::All`].
    pub fn category(self) -> Option<Category> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::School => Some(Category::School),
            CategoryFilter::University => Some(Category::University),
            CategoryFilter::Professional => Some(Category::Professional),
        }
    }

    pub fn matches(self, category: Category) -> bool {
        self.category().map_or(true, |selected| selected == category)
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.category() {
            Some(category) => fmt::Display::fmt(&category, f),
            None => f.write_str("All"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub category: Category,
    #[serde(default)]
    pub syllabus: Vec<String>,
    #[serde(default)]
    pub avatar_url: String,
}

/// A single piece of student feedback. The ML-derived fields are expected to
/// be populated before the record reaches the stats engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub id: String,
    pub teacher_id: String,
    #[serde(default)]
    pub student_hash: String,
    pub timestamp: DateTime<Utc>,
    pub numeric_rating: f64,
    pub comment: String,
    pub sentiment_score: f64,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub is_flagged: bool,
}

impl FeedbackRecord {
    /// Builds a freshly submitted record from an already analyzed comment.
    pub fn submit(
        teacher_id: &str,
        rating: f64,
        comment: &str,
        analysis: Analysis,
        now: DateTime<Utc>,
    ) -> Self {
        let hash = Uuid::new_v4().simple().to_string();
        FeedbackRecord {
            id: Uuid::new_v4().to_string(),
            teacher_id: teacher_id.to_string(),
            student_hash: format!("anon_{}", &hash[..5]),
            timestamp: now,
            numeric_rating: rating,
            comment: comment.to_string(),
            sentiment_score: analysis.sentiment_score,
            topics: analysis.topics,
            is_flagged: analysis.is_flagged,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        };
        f.write_str(label)
    }
}

pub const PENDING_SUMMARY_TEXT: &str = "Pending AI Analysis...";
pub const INSUFFICIENT_DATA_TEXT: &str = "Insufficient data for analysis.";

/// Narrative summary state. Only [`AiSummary::Text`] is ever written by a
/// summary source; the other two states are produced by the stats engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "text", rename_all = "camelCase")]
pub enum AiSummary {
    Pending,
    Text(String),
    Unavailable,
}

impl AiSummary {
    pub fn text(&self) -> Option<&str> {
        match self {
            AiSummary::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for AiSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiSummary::Pending => f.write_str(PENDING_SUMMARY_TEXT),
            AiSummary::Text(text) => f.write_str(text),
            AiSummary::Unavailable => f.write_str(INSUFFICIENT_DATA_TEXT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: DateTime<Utc>,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSummary {
    pub topic: String,
    pub count: usize,
    pub sentiment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherStats {
    pub teacher_id: String,
    pub average_rating: f64,
    pub quality_score: f64,
    pub total_reviews: usize,
    pub sentiment_trend: Vec<TrendPoint>,
    pub top_topics: Vec<TopicSummary>,
    pub risk_level: RiskLevel,
    pub ai_summary: AiSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub teachers: Vec<Teacher>,
    pub feedback: Vec<FeedbackRecord>,
}
