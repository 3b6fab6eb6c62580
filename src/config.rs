use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{InsightError, Result};

/// Scoring policy. Every field defaults to the values the dashboard has
/// always used, so a partial TOML file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub rating_weight: f64,
    pub sentiment_weight: f64,
    /// Flagged share strictly above this is High risk.
    pub high_flag_ratio: f64,
    /// Quality strictly below this is High risk.
    pub high_quality_floor: f64,
    pub medium_flag_ratio: f64,
    pub medium_quality_floor: f64,
    pub top_topics: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            rating_weight: 0.7,
            sentiment_weight: 0.3,
            high_flag_ratio: 0.3,
            high_quality_floor: 4.0,
            medium_flag_ratio: 0.1,
            medium_quality_floor: 6.0,
            top_topics: 5,
        }
    }
}

impl ScoringConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: ScoringConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| InsightError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Loads `path` when given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let config = Self::load(path)?;
                tracing::debug!(path = %path.display(), ?config, "loaded scoring config");
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        let weights = [self.rating_weight, self.sentiment_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(InsightError::InvalidConfig(
                "weights must be finite and non-negative".to_string(),
            ));
        }
        if self.top_topics == 0 {
            return Err(InsightError::InvalidConfig(
                "top_topics must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
