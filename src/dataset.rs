use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::analysis::FeedbackAnalyzer;
use crate::error::{InsightError, Result};
use crate::models::{Category, Dataset, FeedbackRecord, Teacher};

pub fn load(path: &Path) -> Result<Dataset> {
    let raw = std::fs::read_to_string(path).map_err(|source| InsightError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset: Dataset = serde_json::from_str(&raw)?;
    debug!(
        path = %path.display(),
        teachers = dataset.teachers.len(),
        feedback = dataset.feedback.len(),
        "dataset read"
    );
    Ok(dataset)
}

/// Loads `path` if it exists, otherwise the built-in dataset.
pub fn load_or_fallback(path: &Path) -> Result<Dataset> {
    if path.exists() {
        load(path)
    } else {
        warn!(path = %path.display(), "dataset not found; using built-in fallback data");
        Ok(fallback_dataset())
    }
}

pub fn save(path: &Path, dataset: &Dataset) -> Result<()> {
    let json = serde_json::to_string_pretty(dataset)?;
    std::fs::write(path, json).map_err(|source| InsightError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    teacher_id: String,
    numeric_rating: f64,
    comment: String,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    student_hash: Option<String>,
    #[serde(default)]
    sentiment_score: Option<f64>,
    #[serde(default)]
    topics: Option<String>,
    #[serde(default)]
    is_flagged: Option<bool>,
}

/// Appends feedback rows from a CSV file to `dataset`, returning how many
/// were added.
///
/// Rows without a sentiment score are completed by `analyzer`; explicit
/// topic or flag columns still win over its output. Ratings outside 1-10
/// and sentiment outside [-1, 1] (including NaN) abort the import. Rows for unknown
/// teachers and rows whose id is already present are skipped.
pub fn import_csv(
    dataset: &mut Dataset,
    csv_path: &Path,
    analyzer: &dyn FeedbackAnalyzer,
) -> Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)?;
    let teacher_ids: HashSet<String> = dataset.teachers.iter().map(|t| t.id.clone()).collect();
    let mut seen: HashSet<String> = dataset.feedback.iter().map(|f| f.id.clone()).collect();
    let mut inserted = 0usize;

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result?;
        if !(1.0..=10.0).contains(&row.numeric_rating) {
            return Err(InsightError::RatingOutOfRange {
                rating: row.numeric_rating,
                line: index as u64 + 2,
            });
        }
        if let Some(sentiment) = row.sentiment_score {
            if !(-1.0..=1.0).contains(&sentiment) {
                return Err(InsightError::SentimentOutOfRange {
                    sentiment,
                    line: index as u64 + 2,
                });
            }
        }

        if !teacher_ids.contains(&row.teacher_id) {
            warn!(teacher = %row.teacher_id, "skipping feedback for unknown teacher");
            continue;
        }

        let id = row
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));
        if !seen.insert(id.clone()) {
            debug!(%id, "duplicate feedback id skipped");
            continue;
        }

        let topics = row.topics.map(|raw| {
            raw.split(';')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        });

        let (sentiment_score, topics, is_flagged) = match row.sentiment_score {
            Some(score) => (
                score,
                topics.unwrap_or_default(),
                row.is_flagged.unwrap_or(false),
            ),
            None => {
                let analysis = analyzer.analyze(&row.comment, row.numeric_rating);
                (
                    analysis.sentiment_score,
                    topics.unwrap_or(analysis.topics),
                    row.is_flagged.unwrap_or(analysis.is_flagged),
                )
            }
        };

        dataset.feedback.push(FeedbackRecord {
            id,
            teacher_id: row.teacher_id,
            student_hash: row.student_hash.unwrap_or_default(),
            timestamp: row.timestamp,
            numeric_rating: row.numeric_rating,
            comment: row.comment,
            sentiment_score,
            topics,
            is_flagged,
        });
        inserted += 1;
    }

    Ok(inserted)
}

/// Offline dataset shown when no generated data is available.
pub fn fallback_dataset() -> Dataset {
    let teachers = FALLBACK_TEACHERS
        .iter()
        .map(|(id, name, subject, category, seed, syllabus)| Teacher {
            id: id.to_string(),
            name: name.to_string(),
            subject: subject.to_string(),
            category: *category,
            syllabus: syllabus.iter().map(|s| s.to_string()).collect(),
            avatar_url: format!("https://api.dicebear.com/7.x/avataaars/svg?seed={seed}"),
        })
        .collect();

    let now = Utc::now();
    let feedback = FALLBACK_FEEDBACK
        .iter()
        .enumerate()
        .map(
            |(i, (id, teacher_id, rating, comment, sentiment, topics, flagged))| FeedbackRecord {
                id: id.to_string(),
                teacher_id: teacher_id.to_string(),
                student_hash: format!("h{}", i + 1),
                timestamp: now - Duration::hours((FALLBACK_FEEDBACK.len() - i) as i64),
                numeric_rating: *rating,
                comment: comment.to_string(),
                sentiment_score: *sentiment,
                topics: topics.iter().map(|t| t.to_string()).collect(),
                is_flagged: *flagged,
            },
        )
        .collect();

    Dataset { teachers, feedback }
}

#[allow(clippy::type_complexity)]
const FALLBACK_FEEDBACK: &[(&str, &str, f64, &str, f64, &[&str], bool)] = &[
    (
        "f1",
        "s1",
        10.0,
        "My daughter loves the way she teaches counting!",
        0.9,
        &["Engagement", "Care"],
        false,
    ),
    (
        "f2",
        "p_python",
        9.0,
        "Python concepts explained beautifully.",
        0.8,
        &["Clarity", "Knowledge"],
        false,
    ),
    (
        "f3",
        "p_js",
        5.0,
        "React hooks are still confusing.",
        -0.2,
        &["Clarity"],
        false,
    ),
    (
        "f4",
        "p_java",
        8.0,
        "Java course is very comprehensive.",
        0.7,
        &["Content"],
        false,
    ),
];

#[allow(clippy::type_complexity)]
const FALLBACK_TEACHERS: &[(&str, &str, &str, Category, &str, &[&str])] = &[
    (
        "s1",
        "Mrs. Sunita Devi",
        "Grade 1: Basics",
        Category::School,
        "Sunita",
        &[
            "Unit A: Alphabets & Phonics",
            "Unit B: Numbers 1-100",
            "Unit C: Basic Math",
            "Unit D: Colors & Shapes",
        ],
    ),
    (
        "s3",
        "Mrs. Geeta Verma",
        "Grade 10: Maths",
        Category::School,
        "Geeta",
        &[
            "1. Real Numbers",
            "2. Polynomials",
            "3. Pair of Linear Eq.",
            "4. Quadratic Equations",
        ],
    ),
    (
        "s4",
        "Mr. H.C. Verma Clone",
        "Grade 12: Physics",
        Category::School,
        "HCV",
        &[
            "1. Electric Charges & Fields",
            "2. Potential & Capacitance",
            "3. Current Electricity",
            "4. Moving Charges & Magnetism",
        ],
    ),
    (
        "u1",
        "Prof. Feynman",
        "B.Sc Physics",
        Category::University,
        "Feynman",
        &[
            "1. Mathematical Physics",
            "2. Classical Mechanics",
            "3. Special Relativity",
            "4. Quantum Mechanics I",
        ],
    ),
    (
        "p_python",
        "Ms. Aditi Rao",
        "Python Programming",
        Category::Professional,
        "Aditi",
        &[
            "1. Python Intro & Setup",
            "2. Variables & Data Types",
            "3. Operators & Expressions",
            "4. Control Flow (If/Else)",
        ],
    ),
    (
        "p_java",
        "Mr. James G.",
        "Java Language",
        Category::Professional,
        "Java",
        &[
            "1. Java Environment & JVM",
            "2. Variables & Data Types",
            "3. Operators & Control Flow",
            "4. Loops & Arrays",
        ],
    ),
    (
        "p_js",
        "Mr. Tanay Gupta",
        "JavaScript & Web",
        Category::Professional,
        "Tanay",
        &[
            "1. JS Intro & Engine",
            "2. Variables (let/const/var)",
            "3. Data Types & Operators",
            "4. Control Flow & Loops",
        ],
    ),
    (
        "p_cpp",
        "Mr. Bjarne S.",
        "C++ Programming",
        Category::Professional,
        "CPP",
        &[
            "1. C++ Basics & Setup",
            "2. Input/Output (cin/cout)",
            "3. Variables & Data Types",
            "4. Control Structures",
        ],
    ),
    (
        "p_csharp",
        "Ms. Anders H.",
        "C# (.NET)",
        Category::Professional,
        "CSharp",
        &[
            "1. C# & .NET Architecture",
            "2. Syntax & Basic Types",
            "3. Control Flow & Loops",
            "4. Methods & Parameters",
        ],
    ),
    (
        "p_c",
        "Mr. Dennis R.",
        "C Language",
        Category::Professional,
        "Dennis",
        &[
            "1. C Intro & Compilation",
            "2. Variables, Constants, Keywords",
            "3. Operators & Expressions",
            "4. Conditional Statements",
        ],
    ),
    (
        "p_go",
        "Mr. Gopher",
        "Go (Golang)",
        Category::Professional,
        "Go",
        &[
            "1. Go Intro & Workspace",
            "2. Variables & Constants",
            "3. Data Types & Zero Values",
            "4. Control Structures (If/Switch)",
        ],
    ),
    (
        "p_rust",
        "Mr. Ferris",
        "Rust Systems",
        Category::Professional,
        "Rust",
        &[
            "1. Rust Intro & Cargo",
            "2. Variables & Mutability",
            "3. Data Types & Functions",
            "4. Control Flow",
        ],
    ),
    (
        "p_sql",
        "Mr. Sequel",
        "SQL & Databases",
        Category::Professional,
        "SQL",
        &[
            "1. Database Concepts (RDBMS)",
            "2. SQL Syntax & Data Types",
            "3. CREATE & DROP Tables",
            "4. INSERT, UPDATE, DELETE",
        ],
    ),
    (
        "p_php",
        "Mr. Rasmus",
        "PHP Backend",
        Category::Professional,
        "PHP",
        &[
            "1. PHP Intro & Syntax",
            "2. Echo & Print",
            "3. Variables & Data Types",
            "4. Strings & Numbers",
        ],
    ),
    (
        "p_swift",
        "Mr. Apple",
        "Swift (iOS)",
        Category::Professional,
        "Swift",
        &[
            "1. Swift Basics & Playgrounds",
            "2. Variables & Constants",
            "3. Basic Types & Tuples",
            "4. Optionals & Unwrapping",
        ],
    ),
    (
        "p_kotlin",
        "Ms. JetBrains",
        "Kotlin (Android)",
        Category::Professional,
        "Kotlin",
        &[
            "1. Kotlin Intro & JVM",
            "2. Variables (val/var)",
            "3. Basic Types & Strings",
            "4. Control Flow (If/When)",
        ],
    ),
    (
        "p_ruby",
        "Ms. Rails",
        "Ruby Language",
        Category::Professional,
        "Ruby",
        &[
            "1. Ruby Intro & Interactive Ruby",
            "2. Variables & Data Types",
            "3. Strings & Interpolation",
            "4. Symbols",
        ],
    ),
    (
        "p_ts",
        "Mr. Typer",
        "TypeScript",
        Category::Professional,
        "TS",
        &[
            "1. TS Intro & Configuration",
            "2. Basic Types (Number/String)",
            "3. Special Types (Any/Unknown/Never)",
            "4. Arrays & Tuples",
        ],
    ),
    (
        "p_r",
        "Dr. Statistica",
        "R Programming",
        Category::Professional,
        "RLang",
        &[
            "1. R Intro & RStudio",
            "2. Variables & Data Types",
            "3. Vectors & Lists",
            "4. Matrices & Arrays",
        ],
    ),
    (
        "p_dart",
        "Mr. Flutter",
        "Dart Language",
        Category::Professional,
        "Dart",
        &[
            "1. Dart Intro & Syntax",
            "2. Variables (var, final, const)",
            "3. Built-in Types",
            "4. Functions",
        ],
    ),
    (
        "p_scala",
        "Ms. Scalable",
        "Scala Language",
        Category::Professional,
        "Scala",
        &[
            "1. Scala Intro & REPL",
            "2. Basics & Variables",
            "3. Control Structures",
            "4. Functions",
        ],
    ),
];
