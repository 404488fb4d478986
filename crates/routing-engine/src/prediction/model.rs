//! Model-backed prediction
//!
//! A scoring model is an opaque artifact loaded once at startup. Inference
//! runs on the blocking pool under a timeout; any failure (timeout, panic,
//! error, non-finite output) is absorbed here and replaced by the rule-based
//! score so a routing pass never aborts because of the model.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, RoutingError};
use crate::types::{Agent, Customer};

use super::fallback::RuleBasedFallbackPredictor;
use super::features::{FeatureContext, FeatureEncoder, FeatureVector};

/// An externally supplied scoring artifact
pub trait ScoringModel: Send + Sync {
    /// Short identifier reported in model info
    fn name(&self) -> &str;

    /// Success probability for an encoded pair
    fn score(&self, features: &FeatureVector) -> anyhow::Result<f64>;
}

fn default_model_type() -> String {
    "logistic_regression".to_string()
}

/// Standard-scaled logistic regression stored as JSON
///
/// Each feature is scaled as `(x - mean) / scale` before the linear term;
/// the output is the logistic sigmoid of `intercept + sum(coef * x')`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    #[serde(default = "default_model_type")]
    pub model_type: String,
    pub feature_names: Vec<String>,
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticModel {
    /// Load and validate a model file
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading scoring model {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("loading scoring model {}", path.display()))
    }

    /// Parse and validate a model from its JSON form
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let model: Self = serde_json::from_str(raw).context("malformed model JSON")?;
        model.validate()?;
        Ok(model)
    }

    /// Check the artifact matches the encoder's feature layout
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.model_type == "logistic_regression",
            "unsupported model type {}",
            self.model_type
        );

        let expected = FeatureVector::LEN;
        for (what, len) in [
            ("feature_names", self.feature_names.len()),
            ("means", self.means.len()),
            ("scales", self.scales.len()),
            ("coefficients", self.coefficients.len()),
        ] {
            ensure!(len == expected, "{} has {} entries, expected {}", what, len, expected);
        }

        for (idx, (name, expected_name)) in self.feature_names.iter().zip(FeatureVector::NAMES).enumerate() {
            if name != expected_name {
                bail!("feature {} is {}, expected {}", idx, name, expected_name);
            }
        }

        if let Some(idx) = self.scales.iter().position(|s| *s == 0.0 || !s.is_finite()) {
            bail!("scale for {} must be finite and non-zero", FeatureVector::NAMES[idx]);
        }

        let params_finite = self
            .means
            .iter()
            .chain(&self.coefficients)
            .chain(std::iter::once(&self.intercept))
            .all(|v| v.is_finite());
        ensure!(params_finite, "model parameters must be finite");

        Ok(())
    }
}

impl ScoringModel for LogisticModel {
    fn name(&self) -> &str {
        &self.model_type
    }

    fn score(&self, features: &FeatureVector) -> anyhow::Result<f64> {
        let values = features.as_slice();
        ensure!(
            values.len() == self.coefficients.len(),
            "expected {} features, got {}",
            self.coefficients.len(),
            values.len()
        );

        let z = values
            .iter()
            .zip(&self.means)
            .zip(&self.scales)
            .zip(&self.coefficients)
            .fold(self.intercept, |acc, (((x, mean), scale), coef)| {
                acc + coef * (x - mean) / scale
            });

        Ok(1.0 / (1.0 + (-z).exp()))
    }
}

/// Predictor that consults a scoring model and falls back per call on failure
#[derive(Clone)]
pub struct ModelBackedPredictor {
    model: Arc<dyn ScoringModel>,
    encoder: FeatureEncoder,
    fallback: RuleBasedFallbackPredictor,
    timeout: Duration,
}

impl fmt::Debug for ModelBackedPredictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBackedPredictor")
            .field("model", &self.model.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ModelBackedPredictor {
    pub fn new(model: Arc<dyn ScoringModel>, timeout: Duration) -> Self {
        Self {
            model,
            encoder: FeatureEncoder::new(),
            fallback: RuleBasedFallbackPredictor::new(),
            timeout,
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Model score for the pair, or the rule-based score if inference fails
    pub async fn predict(&self, customer: &Customer, agent: &Agent, context: &FeatureContext) -> f64 {
        match self.infer(customer, agent, context).await {
            Ok(score) => score,
            Err(e) => {
                warn!(
                    customer_id = %customer.id,
                    agent_id = %agent.id,
                    error = %e,
                    "model inference failed, using rule-based score"
                );
                self.fallback.predict(customer, agent)
            }
        }
    }

    /// Raw model inference, clamped to [0, 1]
    pub async fn infer(&self, customer: &Customer, agent: &Agent, context: &FeatureContext) -> Result<f64> {
        let features = self.encoder.encode(customer, agent, context);
        if !features.is_finite() {
            return Err(RoutingError::model("feature vector contains non-finite values"));
        }

        let model = Arc::clone(&self.model);
        // A timed-out task keeps running on the blocking pool; its result is dropped.
        let task = tokio::task::spawn_blocking(move || model.score(&features));

        let raw = match tokio::time::timeout(self.timeout, task).await {
            Err(_) => {
                return Err(RoutingError::model(format!("inference timed out after {:?}", self.timeout)));
            }
            Ok(Err(join_error)) => {
                return Err(RoutingError::model(format!("inference task failed: {}", join_error)));
            }
            Ok(Ok(Err(e))) => return Err(RoutingError::model(format!("{:#}", e))),
            Ok(Ok(Ok(score))) => score,
        };

        if !raw.is_finite() {
            return Err(RoutingError::model(format!("model returned non-finite score {}", raw)));
        }

        debug!(customer_id = %customer.id, agent_id = %agent.id, score = raw, "model score");
        Ok(raw.clamp(0.0, 1.0))
    }
}
