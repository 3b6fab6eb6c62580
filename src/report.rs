use std::fmt::Write;

use serde::Serialize;

use crate::models::{CategoryFilter, RiskLevel, Teacher, TeacherStats};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemHealth {
    pub average_quality: f64,
    pub high_risk_count: usize,
    pub total_reviews: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub teacher_id: String,
    pub name: String,
    pub quality_score: f64,
    pub average_rating: f64,
    pub risk_level: RiskLevel,
}

/// Averages quality over every stats entry, including teachers with no
/// reviews (their score is 0).
pub fn system_health(stats: &[TeacherStats]) -> SystemHealth {
    if stats.is_empty() {
        return SystemHealth {
            average_quality: 0.0,
            high_risk_count: 0,
            total_reviews: 0,
        };
    }

    SystemHealth {
        average_quality: stats.iter().map(|s| s.quality_score).sum::<f64>() / stats.len() as f64,
        high_risk_count: stats
            .iter()
            .filter(|s| s.risk_level == RiskLevel::High)
            .count(),
        total_reviews: stats.iter().map(|s| s.total_reviews).sum(),
    }
}

/// Stats whose teacher belongs to `filter`. Entries without a known teacher
/// only survive [`CategoryFilter::All`].
pub fn filter_by_category<'a>(
    teachers: &[Teacher],
    stats: &'a [TeacherStats],
    filter: CategoryFilter,
) -> Vec<&'a TeacherStats> {
    stats
        .iter()
        .filter(|s| match filter {
            CategoryFilter::All => true,
            _ => teachers
                .iter()
                .find(|t| t.id == s.teacher_id)
                .is_some_and(|t| filter.matches(t.category)),
        })
        .collect()
}

pub fn leaderboard(teachers: &[Teacher], stats: &[&TeacherStats]) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = stats
        .iter()
        .map(|s| LeaderboardEntry {
            teacher_id: s.teacher_id.clone(),
            name: teachers
                .iter()
                .find(|t| t.id == s.teacher_id)
                .map(|t| t.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            quality_score: s.quality_score,
            average_rating: s.average_rating,
            risk_level: s.risk_level,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.quality_score
            .partial_cmp(&a.quality_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    entries
}

pub fn build_report(
    teachers: &[Teacher],
    stats: &[TeacherStats],
    filter: CategoryFilter,
    limit: usize,
) -> String {
    let health = system_health(stats);
    let filtered = filter_by_category(teachers, stats, filter);
    let board = leaderboard(teachers, &filtered);

    let mut output = String::new();
    let _ = writeln!(output, "# Teacher Quality Report");
    let _ = writeln!(output, "Category: {filter}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## System Health");
    let _ = writeln!(output, "- System quality: {:.1}", health.average_quality);
    let _ = writeln!(output, "- Total feedback: {}", health.total_reviews);
    let _ = writeln!(output, "- Intervention needed: {}", health.high_risk_count);
    let _ = writeln!(
        output,
        "- Top performer: {}",
        board.first().map(|e| e.name.as_str()).unwrap_or("N/A")
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Leaderboard");

    if board.is_empty() {
        let _ = writeln!(output, "No teachers in this category.");
    } else {
        for entry in board.iter().take(limit) {
            let _ = writeln!(
                output,
                "- {} score {:.2} (rating {:.2}, {} risk)",
                entry.name, entry.quality_score, entry.average_rating, entry.risk_level
            );
        }
    }

    let mut high_risk: Vec<&TeacherStats> = filtered
        .iter()
        .copied()
        .filter(|s| s.risk_level == RiskLevel::High)
        .collect();
    high_risk.sort_by(|a, b| {
        a.quality_score
            .partial_cmp(&b.quality_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let _ = writeln!(output);
    let _ = writeln!(output, "## High Risk");

    if high_risk.is_empty() {
        let _ = writeln!(output, "No teachers currently need intervention.");
    } else {
        for s in high_risk {
            let name = teachers
                .iter()
                .find(|t| t.id == s.teacher_id)
                .map(|t| t.name.as_str())
                .unwrap_or("Unknown");
            let topics: Vec<String> = s
                .top_topics
                .iter()
                .map(|t| format!("{} ({}, {:+.2})", t.topic, t.count, t.sentiment))
                .collect();
            let _ = writeln!(
                output,
                "- {} score {:.2} across {} reviews",
                name, s.quality_score, s.total_reviews
            );
            if !topics.is_empty() {
                let _ = writeln!(output, "  - Topics: {}", topics.join(", "));
            }
            let _ = writeln!(output, "  - Summary: {}", s.ai_summary);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::dataset::fallback_dataset;
    use crate::models::{AiSummary, Category};
    use crate::stats::compute_all;

    fn stats_entry(id: &str, quality: f64, risk: RiskLevel, reviews: usize) -> TeacherStats {
        TeacherStats {
            teacher_id: id.to_string(),
            average_rating: quality,
            quality_score: quality,
            total_reviews: reviews,
            sentiment_trend: Vec::new(),
            top_topics: Vec::new(),
            risk_level: risk,
            ai_summary: AiSummary::Pending,
        }
    }

    fn teacher(id: &str, name: &str, category: Category) -> Teacher {
        Teacher {
            id: id.to_string(),
            name: name.to_string(),
            subject: "Maths".to_string(),
            category,
            syllabus: Vec::new(),
            avatar_url: String::new(),
        }
    }

    #[test]
    fn health_of_empty_stats_is_zero() {
        let health = system_health(&[]);
        assert_eq!(health.average_quality, 0.0);
        assert_eq!(health.high_risk_count, 0);
        assert_eq!(health.total_reviews, 0);
    }

    #[test]
    fn health_aggregates_all_entries() {
        let stats = vec![
            stats_entry("a", 8.0, RiskLevel::Low, 3),
            stats_entry("b", 3.0, RiskLevel::High, 2),
            stats_entry("c", 0.0, RiskLevel::Low, 0),
        ];
        let health = system_health(&stats);
        assert!((health.average_quality - 11.0 / 3.0).abs() < 1e-9);
        assert_eq!(health.high_risk_count, 1);
        assert_eq!(health.total_reviews, 5);
    }

    #[test]
    fn category_filter_and_leaderboard_order() {
        let teachers = vec![
            teacher("a", "Ada", Category::School),
            teacher("b", "Ben", Category::University),
            teacher("c", "Cyd", Category::School),
        ];
        let stats = vec![
            stats_entry("a", 6.0, RiskLevel::Medium, 1),
            stats_entry("b", 9.0, RiskLevel::Low, 1),
            stats_entry("c", 7.5, RiskLevel::Low, 1),
            stats_entry("orphan", 9.5, RiskLevel::Low, 1),
        ];

        let school = filter_by_category(&teachers, &stats, CategoryFilter::School);
        let board = leaderboard(&teachers, &school);
        let names: Vec<&str> = board.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Cyd", "Ada"]);

        let all = filter_by_category(&teachers, &stats, CategoryFilter::All);
        let board = leaderboard(&teachers, &all);
        assert_eq!(board[0].name, "Unknown");
        assert_eq!(board.len(), 4);
    }

    #[test]
    fn report_lists_high_risk_with_summary() {
        let teachers = vec![teacher("a", "Ada", Category::School)];
        let mut entry = stats_entry("a", 3.0, RiskLevel::High, 4);
        entry.ai_summary = AiSummary::Text("Pace is too fast.".to_string());
        let report = build_report(&teachers, &[entry], CategoryFilter::All, 10);

        assert!(report.contains("## High Risk"));
        assert!(report.contains("- Ada score 3.00 across 4 reviews"));
        assert!(report.contains("Summary: Pace is too fast."));
        assert!(report.contains("Top performer: Ada"));
    }

    #[test]
    fn report_on_fallback_dataset() {
        let dataset = fallback_dataset();
        let stats = compute_all(&dataset.teachers, &dataset.feedback, &ScoringConfig::default());
        let report = build_report(&dataset.teachers, &stats, CategoryFilter::Professional, 3);

        assert!(report.starts_with("# Teacher Quality Report"));
        assert!(report.contains("Category: Professional"));
        assert!(report.contains("Total feedback: 4"));
        assert!(report.contains("Top performer: Ms. Aditi Rao"));
        assert!(!report.contains("Mrs. Sunita Devi score"));
    }
}
