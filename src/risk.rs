use crate::config::ScoringConfig;
use crate::models::RiskLevel;

/// Maps a mean sentiment in [-1, 1] onto the 0-10 rating scale.
pub fn normalize_sentiment(avg_sentiment: f64) -> f64 {
    (avg_sentiment + 1.0) * 5.0
}

pub fn quality_score(average_rating: f64, avg_sentiment: f64, config: &ScoringConfig) -> f64 {
    average_rating * config.rating_weight
        + normalize_sentiment(avg_sentiment) * config.sentiment_weight
}

pub fn flag_ratio(flagged: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        flagged as f64 / total as f64
    }
}

/// Comparisons are strict: values sitting exactly on a threshold fall to the
/// less severe tier.
pub fn classify_risk(risk_ratio: f64, quality_score: f64, config: &ScoringConfig) -> RiskLevel {
    if risk_ratio > config.high_flag_ratio || quality_score < config.high_quality_floor {
        RiskLevel::High
    } else if risk_ratio > config.medium_flag_ratio || quality_score < config.medium_quality_floor
    {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}
