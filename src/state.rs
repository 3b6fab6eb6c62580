//! Application state and the single-writer update channel.
//!
//! [`AppState::apply`] is the reducer: every change to teachers, feedback or
//! stats goes through it. [`StatsUpdater`] owns the state and serializes
//! actions coming from callers and from background summary tasks.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::ScoringConfig;
use crate::error::{InsightError, Result};
use crate::models::{AiSummary, Dataset, FeedbackRecord, Teacher, TeacherStats};
use crate::stats;
use crate::summary::{self, SummarySource, DELAYED_SUMMARY_TEXT};

#[derive(Debug, Clone)]
pub enum Action {
    /// Replace all collections and recompute every teacher.
    LoadDataset(Dataset),
    /// Append one fully analyzed record and recompute its teacher.
    SubmitFeedback(FeedbackRecord),
    /// Overwrite only the summary of the current entry for a teacher.
    MergeSummary {
        teacher_id: String,
        summary: AiSummary,
    },
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub teachers: Vec<Teacher>,
    pub feedback: Vec<FeedbackRecord>,
    pub stats: Vec<TeacherStats>,
    pub config: ScoringConfig,
}

impl AppState {
    pub fn new(config: ScoringConfig) -> Self {
        AppState {
            config,
            ..AppState::default()
        }
    }

    /// Applies `action` and returns the teacher ids whose stats changed.
    pub fn apply(&mut self, action: Action) -> Vec<String> {
        match action {
            Action::LoadDataset(dataset) => {
                self.stats = stats::compute_all(&dataset.teachers, &dataset.feedback, &self.config);
                self.teachers = dataset.teachers;
                self.feedback = dataset.feedback;
                info!(
                    teachers = self.teachers.len(),
                    feedback = self.feedback.len(),
                    "dataset loaded"
                );
                self.teachers.iter().map(|t| t.id.clone()).collect()
            }
            Action::SubmitFeedback(record) => {
                let teacher_id = record.teacher_id.clone();
                self.feedback.push(record);
                let previous = self
                    .stats_for(&teacher_id)
                    .map(|s| s.ai_summary.clone());
                let updated = stats::compute_teacher_stats(
                    &teacher_id,
                    &self.feedback,
                    previous.as_ref(),
                    &self.config,
                );
                debug!(
                    teacher = %teacher_id,
                    quality = updated.quality_score,
                    risk = %updated.risk_level,
                    "stats recomputed"
                );
                match self.stats.iter_mut().find(|s| s.teacher_id == teacher_id) {
                    Some(slot) => *slot = updated,
                    None => self.stats.push(updated),
                }
                vec![teacher_id]
            }
            Action::MergeSummary {
                teacher_id,
                summary,
            } => match self.stats.iter_mut().find(|s| s.teacher_id == teacher_id) {
                Some(slot) => {
                    slot.ai_summary = summary;
                    vec![teacher_id]
                }
                None => {
                    debug!(teacher = %teacher_id, "summary for unknown teacher dropped");
                    Vec::new()
                }
            },
        }
    }

    pub fn stats_for(&self, teacher_id: &str) -> Option<&TeacherStats> {
        self.stats.iter().find(|s| s.teacher_id == teacher_id)
    }

    pub fn teacher(&self, teacher_id: &str) -> Option<&Teacher> {
        self.teachers.iter().find(|t| t.id == teacher_id)
    }

    pub fn feedback_for(&self, teacher_id: &str) -> Vec<FeedbackRecord> {
        self.feedback
            .iter()
            .filter(|f| f.teacher_id == teacher_id)
            .cloned()
            .collect()
    }

    pub fn dataset(&self) -> Dataset {
        Dataset {
            teachers: self.teachers.clone(),
            feedback: self.feedback.clone(),
        }
    }
}

/// Cloneable sender for posting actions into a [`StatsUpdater`].
#[derive(Clone)]
pub struct UpdateHandle {
    sender: mpsc::UnboundedSender<Action>,
}

impl UpdateHandle {
    pub fn send(&self, action: Action) -> Result<()> {
        self.sender
            .send(action)
            .map_err(|_| InsightError::ChannelClosed)
    }
}

/// Owns [`AppState`] and is its only writer. Summary requests run as
/// background tasks that post [`Action::MergeSummary`] back through the
/// same channel when they resolve.
pub struct StatsUpdater {
    state: AppState,
    source: Arc<dyn SummarySource>,
    sender: mpsc::UnboundedSender<Action>,
    receiver: mpsc::UnboundedReceiver<Action>,
    in_flight: usize,
}

impl StatsUpdater {
    pub fn new(state: AppState, source: Arc<dyn SummarySource>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        StatsUpdater {
            state,
            source,
            sender,
            receiver,
            in_flight: 0,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn into_state(self) -> AppState {
        self.state
    }

    pub fn handle(&self) -> UpdateHandle {
        UpdateHandle {
            sender: self.sender.clone(),
        }
    }

    pub fn pending_summaries(&self) -> usize {
        self.in_flight
    }

    /// Applies `action` now and requests fresh summaries for every teacher
    /// it touched. Must be called from within a tokio runtime.
    pub fn dispatch(&mut self, action: Action) {
        let request = !matches!(action, Action::MergeSummary { .. });
        let touched = self.apply(action);
        if request {
            for teacher_id in touched {
                self.request_summary(&teacher_id);
            }
        }
    }

    /// Fire-and-forget: snapshots the teacher's feedback now and merges the
    /// result into whatever entry exists when it resolves. A merge is posted
    /// even if the source panics, so `drain` always terminates.
    pub fn request_summary(&mut self, teacher_id: &str) {
        let Some(teacher) = self.state.teacher(teacher_id).cloned() else {
            debug!(teacher = %teacher_id, "no teacher record; summary not requested");
            return;
        };
        let feedback = self.state.feedback_for(teacher_id);
        let source = Arc::clone(&self.source);
        let sender = self.sender.clone();
        self.in_flight += 1;

        let teacher_id = teacher.id.clone();
        let task = tokio::spawn(async move {
            summary::resolve_summary(source.as_ref(), &teacher, &feedback).await
        });

        tokio::spawn(async move {
            let summary = match task.await {
                Ok(summary) => summary,
                Err(err) => {
                    warn!(teacher = %teacher_id, error = %err, "summary task aborted");
                    AiSummary::Text(DELAYED_SUMMARY_TEXT.to_string())
                }
            };
            let _ = sender.send(Action::MergeSummary {
                teacher_id,
                summary,
            });
        });
    }

    /// Applies every action already queued on the channel without waiting.
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(action) = self.receiver.try_recv() {
            self.apply_queued(action);
            applied += 1;
        }
        applied
    }

    /// Waits for all outstanding summary requests to merge.
    pub async fn drain(&mut self) {
        while self.in_flight > 0 {
            match self.receiver.recv().await {
                Some(action) => self.apply_queued(action),
                None => break,
            }
        }
        self.process_pending();
    }

    fn apply_queued(&mut self, action: Action) {
        if matches!(action, Action::MergeSummary { .. }) {
            self.in_flight = self.in_flight.saturating_sub(1);
            self.apply(action);
        } else {
            self.dispatch(action);
        }
    }

    fn apply(&mut self, action: Action) -> Vec<String> {
        self.state.apply(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Analysis, FeedbackAnalyzer, HeuristicAnalyzer};
    use crate::dataset::fallback_dataset;
    use crate::models::RiskLevel;
    use async_trait::async_trait;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    struct FixedSource(&'static str);

    struct PanickingSource;

    #[async_trait]
    impl SummarySource for PanickingSource {
        async fn summarize(&self, _: &Teacher, _: &[FeedbackRecord]) -> anyhow::Result<String> {
            panic!("summary backend crashed")
        }
    }

    #[async_trait]
    impl SummarySource for FixedSource {
        async fn summarize(&self, _: &Teacher, _: &[FeedbackRecord]) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn loaded_state() -> AppState {
        let mut state = AppState::new(ScoringConfig::default());
        state.apply(Action::LoadDataset(fallback_dataset()));
        state
    }

    fn low_rating(teacher_id: &str) -> FeedbackRecord {
        let analysis = HeuristicAnalyzer.analyze("Too fast", 1.0);
        FeedbackRecord::submit(teacher_id, 1.0, "Too fast", analysis, Utc::now())
    }

    #[test]
    fn load_computes_stats_for_every_teacher() {
        let state = loaded_state();
        assert_eq!(state.stats.len(), state.teachers.len());
        assert!(state
            .stats
            .iter()
            .all(|s| s.ai_summary == AiSummary::Pending || s.ai_summary == AiSummary::Unavailable));
        assert_eq!(
            state.stats_for("u1").unwrap().ai_summary,
            AiSummary::Unavailable
        );
    }

    #[test]
    fn submit_replaces_only_the_affected_slot() {
        let mut state = loaded_state();
        let before_python = state.stats_for("p_python").cloned().unwrap();
        state.apply(Action::MergeSummary {
            teacher_id: "s1".to_string(),
            summary: AiSummary::Text("Warm and patient.".to_string()),
        });

        let touched = state.apply(Action::SubmitFeedback(low_rating("s1")));
        assert_eq!(touched, vec!["s1".to_string()]);

        let s1 = state.stats_for("s1").unwrap();
        assert_eq!(s1.total_reviews, 2);
        assert_eq!(s1.ai_summary, AiSummary::Text("Warm and patient.".to_string()));
        assert_eq!(s1.risk_level, RiskLevel::High);
        assert_eq!(state.stats_for("p_python").unwrap(), &before_python);
        assert_eq!(state.stats.len(), state.teachers.len());
    }

    #[test]
    fn first_feedback_for_unscored_teacher_appends_slot() {
        let mut state = AppState::new(ScoringConfig::default());
        let analysis = Analysis {
            sentiment_score: 0.4,
            topics: vec![],
            is_flagged: false,
        };
        let record = FeedbackRecord::submit("new", 8.0, "good", analysis, Utc::now());
        state.apply(Action::SubmitFeedback(record));
        assert_eq!(state.stats.len(), 1);
        assert_eq!(state.stats_for("new").unwrap().ai_summary, AiSummary::Pending);
    }

    #[test]
    fn merge_for_unknown_teacher_is_ignored() {
        let mut state = loaded_state();
        let before = state.stats.clone();
        let touched = state.apply(Action::MergeSummary {
            teacher_id: "ghost".to_string(),
            summary: AiSummary::Text("x".to_string()),
        });
        assert!(touched.is_empty());
        assert_eq!(state.stats, before);
    }

    #[test]
    fn merge_keeps_newer_stats() {
        let mut state = loaded_state();
        state.apply(Action::SubmitFeedback(low_rating("s1")));
        let recomputed = state.stats_for("s1").cloned().unwrap();

        state.apply(Action::MergeSummary {
            teacher_id: "s1".to_string(),
            summary: AiSummary::Text("Stale but merged".to_string()),
        });
        let merged = state.stats_for("s1").unwrap();
        assert_eq!(merged.total_reviews, recomputed.total_reviews);
        assert_eq!(merged.quality_score, recomputed.quality_score);
        assert_eq!(merged.ai_summary.text(), Some("Stale but merged"));
    }

    #[tokio::test]
    async fn updater_merges_background_summaries() {
        let mut updater = StatsUpdater::new(
            AppState::new(ScoringConfig::default()),
            Arc::new(FixedSource("Consistently clear.")),
        );
        updater.dispatch(Action::LoadDataset(fallback_dataset()));
        assert_eq!(updater.pending_summaries(), updater.state().teachers.len());

        updater.drain().await;
        assert_eq!(updater.pending_summaries(), 0);
        assert!(updater
            .state()
            .stats
            .iter()
            .all(|s| s.ai_summary.text() == Some("Consistently clear.")));
    }

    #[tokio::test]
    async fn actions_posted_through_handle_are_serialized() {
        let mut updater = StatsUpdater::new(loaded_state(), Arc::new(FixedSource("Updated.")));
        let handle = updater.handle();
        handle.send(Action::SubmitFeedback(low_rating("p_rust"))).unwrap();

        assert_eq!(updater.process_pending(), 1);
        assert_eq!(updater.state().stats_for("p_rust").unwrap().total_reviews, 1);
        assert_eq!(updater.pending_summaries(), 1);

        updater.drain().await;
        let state = updater.into_state();
        assert_eq!(state.stats_for("p_rust").unwrap().ai_summary.text(), Some("Updated."));
    }

    #[tokio::test]
    async fn panicking_source_degrades_and_drain_finishes() {
        let mut updater = StatsUpdater::new(
            AppState::new(ScoringConfig::default()),
            Arc::new(PanickingSource),
        );
        updater.dispatch(Action::LoadDataset(fallback_dataset()));

        let drained =
            tokio::time::timeout(std::time::Duration::from_secs(5), updater.drain()).await;
        assert!(drained.is_ok());
        assert_eq!(updater.pending_summaries(), 0);
        assert!(updater
            .state()
            .stats
            .iter()
            .all(|s| s.ai_summary.text() == Some(DELAYED_SUMMARY_TEXT)));
    }

    #[test]
    fn handle_reports_closed_channel() {
        let updater = StatsUpdater::new(loaded_state(), Arc::new(FixedSource("x")));
        let handle = updater.handle();
        drop(updater);
        let err = handle
            .send(Action::SubmitFeedback(low_rating("s1")))
            .unwrap_err();
        assert!(matches!(err, InsightError::ChannelClosed));
    }
}
