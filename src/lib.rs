//! Teacher quality analytics: feedback aggregation, composite scoring and
//! risk triage for the EduInsight dashboard.

pub mod analysis;
pub mod config;
pub mod dataset;
pub mod error;
pub mod models;
pub mod report;
pub mod risk;
pub mod state;
pub mod stats;
pub mod summary;

pub use config::ScoringConfig;
pub use error::{InsightError, Result};
pub use models::{AiSummary, FeedbackRecord, RiskLevel, Teacher, TeacherStats};
pub use stats::compute_teacher_stats;
