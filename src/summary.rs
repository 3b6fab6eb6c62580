//! Narrative summary sources.
//!
//! A source turns a teacher's feedback into prose. Whatever happens inside
//! the source, callers always get back an [`AiSummary::Text`]: errors and
//! empty answers degrade to fixed fallback strings.

use async_trait::async_trait;

use crate::models::{AiSummary, FeedbackRecord, Teacher};

pub const DELAYED_SUMMARY_TEXT: &str = "Data processing for insights is currently delayed.";
pub const EMPTY_SUMMARY_TEXT: &str = "Analysis pending.";

/// Comments beyond this many are not shown to a summary source.
pub const MAX_SUMMARY_COMMENTS: usize = 10;

#[async_trait]
pub trait SummarySource: Send + Sync {
    async fn summarize(
        &self,
        teacher: &Teacher,
        feedback: &[FeedbackRecord],
    ) -> anyhow::Result<String>;
}

/// Runs `source` and maps its outcome onto a displayable summary.
pub async fn resolve_summary(
    source: &dyn SummarySource,
    teacher: &Teacher,
    feedback: &[FeedbackRecord],
) -> AiSummary {
    let window = &feedback[..feedback.len().min(MAX_SUMMARY_COMMENTS)];
    match source.summarize(teacher, window).await {
        Ok(text) if text.trim().is_empty() => AiSummary::Text(EMPTY_SUMMARY_TEXT.to_string()),
        Ok(text) => AiSummary::Text(text),
        Err(err) => {
            tracing::warn!(teacher = %teacher.id, error = %err, "summary source failed");
            AiSummary::Text(DELAYED_SUMMARY_TEXT.to_string())
        }
    }
}

/// Offline two-sentence digest built from ratings and topic labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestSummarizer;

#[async_trait]
impl SummarySource for DigestSummarizer {
    async fn summarize(
        &self,
        teacher: &Teacher,
        feedback: &[FeedbackRecord],
    ) -> anyhow::Result<String> {
        if feedback.is_empty() {
            return Ok(String::new());
        }

        let average = feedback.iter().map(|f| f.numeric_rating).sum::<f64>() / feedback.len() as f64;
        let flagged = feedback.iter().filter(|f| f.is_flagged).count();

        let mut counts: Vec<(&str, usize)> = Vec::new();
        for topic in feedback.iter().flat_map(|f| f.topics.iter()) {
            match counts.iter_mut().find(|(name, _)| *name == topic.as_str()) {
                Some(entry) => entry.1 += 1,
                None => counts.push((topic.as_str(), 1)),
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        let mut text = format!(
            "{} averages {:.1}/10 across {} recent reviews.",
            teacher.name,
            average,
            feedback.len()
        );
        match counts.first() {
            Some((topic, _)) => text.push_str(&format!(" Students mostly discuss {topic}")),
            None => text.push_str(" No recurring topics yet"),
        }
        if flagged > 0 {
            text.push_str(&format!(", with {flagged} comment(s) flagged for review."));
        } else {
            text.push('.');
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fallback_dataset;

    struct FailingSource;

    #[async_trait]
    impl SummarySource for FailingSource {
        async fn summarize(&self, _: &Teacher, _: &[FeedbackRecord]) -> anyhow::Result<String> {
            anyhow::bail!("quota exceeded")
        }
    }

    struct CountingSource;

    #[async_trait]
    impl SummarySource for CountingSource {
        async fn summarize(&self, _: &Teacher, f: &[FeedbackRecord]) -> anyhow::Result<String> {
            Ok(f.len().to_string())
        }
    }

    fn teacher_and_feedback(id: &str) -> (Teacher, Vec<FeedbackRecord>) {
        let dataset = fallback_dataset();
        let teacher = dataset.teachers.iter().find(|t| t.id == id).unwrap().clone();
        let feedback = dataset
            .feedback
            .into_iter()
            .filter(|f| f.teacher_id == id)
            .collect();
        (teacher, feedback)
    }

    #[tokio::test]
    async fn failures_degrade_to_delayed_text() {
        let (teacher, feedback) = teacher_and_feedback("s1");
        let summary = resolve_summary(&FailingSource, &teacher, &feedback).await;
        assert_eq!(summary, AiSummary::Text(DELAYED_SUMMARY_TEXT.to_string()));
    }

    #[tokio::test]
    async fn empty_answer_degrades_to_pending_text() {
        let (teacher, _) = teacher_and_feedback("s1");
        let summary = resolve_summary(&DigestSummarizer, &teacher, &[]).await;
        assert_eq!(summary, AiSummary::Text(EMPTY_SUMMARY_TEXT.to_string()));
    }

    #[tokio::test]
    async fn source_sees_at_most_ten_records() {
        let (teacher, feedback) = teacher_and_feedback("s1");
        let many: Vec<FeedbackRecord> = std::iter::repeat(feedback[0].clone()).take(25).collect();
        let summary = resolve_summary(&CountingSource, &teacher, &many).await;
        assert_eq!(summary, AiSummary::Text("10".to_string()));
    }

    #[tokio::test]
    async fn digest_mentions_name_and_topic() {
        let (teacher, feedback) = teacher_and_feedback("p_python");
        let text = DigestSummarizer.summarize(&teacher, &feedback).await.unwrap();
        assert!(text.starts_with("Ms. Aditi Rao averages 9.0/10 across 1 recent reviews."));
        assert!(text.contains("Clarity"));
        assert!(text.ends_with('.'));
    }
}
