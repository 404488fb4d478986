use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Routing engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Assignment and scoring behaviour of a routing pass
    pub routing: RoutingConfig,

    /// Score predictor selection
    pub predictor: PredictorConfig,

    /// Logging output
    pub logging: LogSettings,
}

/// Routing pass configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Score delta below which two candidate agents count as equivalent
    pub tie_break_threshold: f64,

    /// How near-equal candidates are resolved
    pub tie_break_mode: TieBreakMode,

    /// How many new conversations one agent may receive per pass
    pub assignment_policy: AssignmentPolicy,

    /// Maximum pair predictions in flight while building the score matrix
    pub scoring_concurrency: usize,
}

/// Tie-break resolution between agents whose scores are within the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakMode {
    /// Compare each visited agent with the running best only; the outcome
    /// depends on agent order
    VisitationOrder,

    /// Collect every agent within the threshold of the top score and pick the
    /// least loaded one, independent of agent order
    Symmetric,
}

/// Per-pass assignment limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignmentPolicy {
    /// New assignments one agent can receive in a single pass; still bounded
    /// by the agent's remaining capacity
    pub max_new_assignments_per_agent: u32,
}

/// Score predictor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Scoring artifact to load at startup; the rule-based fallback is used
    /// when unset or unloadable
    pub model_path: Option<PathBuf>,

    /// Upper bound on a single model inference (milliseconds)
    pub inference_timeout_ms: u64,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl EngineConfig {
    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> Result<(), String> {
        let threshold = self.routing.tie_break_threshold;
        if !(0.0..1.0).contains(&threshold) {
            return Err(format!("tie_break_threshold must be in [0, 1), got {}", threshold));
        }

        if self.routing.assignment_policy.max_new_assignments_per_agent == 0 {
            return Err("max_new_assignments_per_agent must be greater than 0".to_string());
        }

        if self.routing.scoring_concurrency == 0 {
            return Err("scoring_concurrency must be greater than 0".to_string());
        }

        if self.predictor.inference_timeout_ms == 0 {
            return Err("inference_timeout_ms must be greater than 0".to_string());
        }

        if self.predictor.inference_timeout_ms > 60_000 {
            return Err("inference_timeout_ms cannot exceed 60000 (1 minute)".to_string());
        }

        if let Some(path) = &self.predictor.model_path {
            if path.as_os_str().is_empty() {
                return Err("model_path cannot be empty when set".to_string());
            }
        }

        if crate::logging::parse_log_level(&self.logging.level).is_err() {
            return Err(format!("Invalid log level: {}", self.logging.level));
        }

        Ok(())
    }
}

impl PredictorConfig {
    /// Inference timeout as a [`Duration`]
    pub fn inference_timeout(&self) -> Duration {
        Duration::from_millis(self.inference_timeout_ms)
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            tie_break_threshold: 0.03,
            tie_break_mode: TieBreakMode::VisitationOrder,
            assignment_policy: AssignmentPolicy::default(),
            scoring_concurrency: 16,
        }
    }
}

impl Default for AssignmentPolicy {
    fn default() -> Self {
        // One new conversation per agent per routing invocation
        Self { max_new_assignments_per_agent: 1 }
    }
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            inference_timeout_ms: 250,
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.routing.tie_break_threshold, 0.03);
        assert_eq!(config.routing.tie_break_mode, TieBreakMode::VisitationOrder);
        assert_eq!(config.routing.assignment_policy.max_new_assignments_per_agent, 1);
        assert_eq!(config.predictor.inference_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.routing.tie_break_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.routing.assignment_policy.max_new_assignments_per_agent = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.predictor.inference_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(
            r#"{"routing": {"tie_break_mode": "symmetric"}, "predictor": {"model_path": "model.json"}}"#,
        )
        .unwrap();
        assert_eq!(config.routing.tie_break_mode, TieBreakMode::Symmetric);
        assert_eq!(config.routing.tie_break_threshold, 0.03);
        assert_eq!(config.predictor.model_path, Some(PathBuf::from("model.json")));
        assert_eq!(config.predictor.inference_timeout_ms, 250);
        assert_eq!(config.logging.level, "info");
    }
}
