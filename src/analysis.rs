use serde::{Deserialize, Serialize};

/// ML-derived fields attached to a feedback record at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub sentiment_score: f64,
    pub topics: Vec<String>,
    pub is_flagged: bool,
}

/// Source of sentiment, topics and the review flag for a comment.
pub trait FeedbackAnalyzer {
    fn analyze(&self, comment: &str, rating: f64) -> Analysis;
}

/// Offline stand-in used when no model is reachable. Derives everything
/// from the numeric rating and ignores the comment text.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAnalyzer;

impl FeedbackAnalyzer for HeuristicAnalyzer {
    fn analyze(&self, _comment: &str, rating: f64) -> Analysis {
        Analysis {
            sentiment_score: if rating > 5.0 { 0.5 } else { -0.5 },
            topics: vec!["General".to_string()],
            is_flagged: rating < 3.0,
        }
    }
}
