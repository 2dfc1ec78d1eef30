//! Scoring configuration
//!
//! Loaded from JSON by the host app. Every field has a default, so an empty
//! object `{}` is a complete configuration.
//!
//! ```json
//! {
//!   "missing_policy": "zero_fill",
//!   "domain_weights": { "air_quality": 0.5, "wildfire": 0.5 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::MissingPolicy;
use crate::environment::DomainWeights;
use crate::error::{Result, ScoreError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    pub missing_policy: MissingPolicy,
    pub domain_weights: DomainWeights,
}

impl ScoringConfig {
    /// Parse and validate a JSON document
    ///
    /// # Errors
    ///
    /// * `ScoreError::InvalidConfig` - malformed JSON, unknown field or unknown domain
    /// * `ScoreError::InvalidWeights` - weight table fails validation
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ScoreError::InvalidConfig(e.to_string()))?;
        config.domain_weights.validate()?;
        debug!(policy = ?config.missing_policy, "loaded scoring config");
        Ok(config)
    }

    /// # Errors
    ///
    /// * `ScoreError::InvalidConfig` - serialization failed
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ScoreError::InvalidConfig(e.to_string()))
    }
}
