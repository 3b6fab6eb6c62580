//! Per-teacher aggregation: composite quality score, risk tier, topic
//! ranking and the sentiment trend.

use std::collections::HashMap;

use crate::config::ScoringConfig;
use crate::models::{
    AiSummary, FeedbackRecord, RiskLevel, Teacher, TeacherStats, TopicSummary, TrendPoint,
};
use crate::risk;

/// Computes a fresh [`TeacherStats`] for `teacher_id` from the full,
/// unfiltered feedback collection.
///
/// `existing` is the summary currently shown for this teacher. A non-empty
/// [`AiSummary::Text`] survives the recomputation; anything else becomes
/// [`AiSummary::Pending`]. With no matching feedback the result is the
/// empty sentinel and `existing` is ignored.
pub fn compute_teacher_stats(
    teacher_id: &str,
    all_feedback: &[FeedbackRecord],
    existing: Option<&AiSummary>,
    config: &ScoringConfig,
) -> TeacherStats {
    let feedback: Vec<&FeedbackRecord> = all_feedback
        .iter()
        .filter(|f| f.teacher_id == teacher_id)
        .collect();

    if feedback.is_empty() {
        return TeacherStats {
            teacher_id: teacher_id.to_string(),
            average_rating: 0.0,
            quality_score: 0.0,
            total_reviews: 0,
            sentiment_trend: Vec::new(),
            top_topics: Vec::new(),
            risk_level: RiskLevel::Low,
            ai_summary: AiSummary::Unavailable,
        };
    }

    let total = feedback.len();
    let average_rating = feedback.iter().map(|f| f.numeric_rating).sum::<f64>() / total as f64;
    let avg_sentiment = feedback.iter().map(|f| f.sentiment_score).sum::<f64>() / total as f64;
    let quality_score = risk::quality_score(average_rating, avg_sentiment, config);

    let flagged = feedback.iter().filter(|f| f.is_flagged).count();
    let risk_ratio = risk::flag_ratio(flagged, total);
    let risk_level = risk::classify_risk(risk_ratio, quality_score, config);

    let ai_summary = match existing {
        Some(AiSummary::Text(text)) if !text.is_empty() => AiSummary::Text(text.clone()),
        _ => AiSummary::Pending,
    };

    TeacherStats {
        teacher_id: teacher_id.to_string(),
        average_rating,
        quality_score,
        total_reviews: total,
        sentiment_trend: sentiment_trend(&feedback),
        top_topics: top_topics(&feedback, config.top_topics),
        risk_level,
        ai_summary,
    }
}

/// Initial pass over a freshly loaded dataset. Summaries start pending.
pub fn compute_all(
    teachers: &[Teacher],
    feedback: &[FeedbackRecord],
    config: &ScoringConfig,
) -> Vec<TeacherStats> {
    teachers
        .iter()
        .map(|t| compute_teacher_stats(&t.id, feedback, None, config))
        .collect()
}

/// Ranks topics by occurrence. Each topic is credited with its parent
/// record's sentiment; ties keep first-appearance order.
pub fn top_topics(feedback: &[&FeedbackRecord], limit: usize) -> Vec<TopicSummary> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut tallies: Vec<(&str, usize, f64)> = Vec::new();

    for record in feedback {
        for topic in &record.topics {
            let slot = *index.entry(topic.as_str()).or_insert_with(|| {
                tallies.push((topic.as_str(), 0, 0.0));
                tallies.len() - 1
            });
            tallies[slot].1 += 1;
            tallies[slot].2 += record.sentiment_score;
        }
    }

    let mut topics: Vec<TopicSummary> = tallies
        .into_iter()
        .map(|(topic, count, sentiment_sum)| TopicSummary {
            topic: topic.to_string(),
            count,
            sentiment: sentiment_sum / count as f64,
        })
        .collect();

    topics.sort_by(|a, b| b.count.cmp(&a.count));
    topics.truncate(limit);
    topics
}

/// One point per record, oldest first.
pub fn sentiment_trend(feedback: &[&FeedbackRecord]) -> Vec<TrendPoint> {
    let mut ordered = feedback.to_vec();
    ordered.sort_by_key(|f| f.timestamp);
    ordered
        .into_iter()
        .map(|f| TrendPoint {
            date: f.timestamp,
            score: f.sentiment_score,
        })
        .collect()
}
