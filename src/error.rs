use std::path::PathBuf;

use thiserror::Error;

/// Errors raised at the dataset and configuration boundary. Scoring itself
/// never fails.
#[derive(Error, Debug)]
pub enum InsightError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid dataset JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("rating {rating} on line {line} is outside 1-10")]
    RatingOutOfRange { rating: f64, line: u64 },

    #[error("sentiment {sentiment} on line {line} is outside -1 to 1")]
    SentimentOutOfRange { sentiment: f64, line: u64 },

    #[error("unknown teacher: {0}")]
    UnknownTeacher(String),

    #[error("stats updater has shut down")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, InsightError>;
