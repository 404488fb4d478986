//! # Success Score Prediction
//!
//! Every customer/agent pair considered by a routing pass is given a
//! predicted success probability. Two predictors exist:
//!
//! - [`ModelBackedPredictor`] consults a loaded [`ScoringModel`] artifact and
//!   falls back per call when inference fails or times out
//! - [`RuleBasedFallbackPredictor`] applies a fixed heuristic formula and is
//!   used whenever no artifact is available
//!
//! [`ScorePredictor`] holds exactly one of them. The choice is made once when
//! the predictor is constructed and is never revisited per call.
//!
//! ```rust
//! use qroute_routing_engine::prelude::*;
//!
//! # async fn example() {
//! let predictor = ScorePredictor::rule_based();
//! let customer = Customer::new("Ada", "billing");
//! let agent = Agent::new("Bob", ["billing"]);
//!
//! let score = predictor.predict(&customer, &agent, &FeatureContext::default()).await;
//! assert!((0.0..=1.0).contains(&score));
//! # }
//! ```

pub mod fallback;
pub mod features;
pub mod model;

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::PredictorConfig;
use crate::types::{Agent, Customer};

pub use fallback::RuleBasedFallbackPredictor;
pub use features::{FeatureContext, FeatureEncoder, FeatureVector};
pub use model::{LogisticModel, ModelBackedPredictor, ScoringModel};

/// Pair predictions kept in flight by [`ScorePredictor::predict_batch`]
const DEFAULT_BATCH_CONCURRENCY: usize = 16;

/// Description of the active predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorInfo {
    pub model_loaded: bool,
    pub model_type: String,
    pub feature_count: usize,
    pub features: Vec<String>,
}

/// Success predictor selected at construction
#[derive(Debug, Clone)]
pub enum ScorePredictor {
    /// Scores come from a loaded artifact
    ModelBacked(ModelBackedPredictor),
    /// Scores come from the heuristic formula
    RuleBased(RuleBasedFallbackPredictor),
}

impl ScorePredictor {
    /// Load the configured artifact, or select the rule-based predictor when
    /// none is configured or the artifact cannot be loaded
    pub fn from_config(config: &PredictorConfig) -> Self {
        let Some(path) = &config.model_path else {
            info!("no scoring model configured, using rule-based predictor");
            return Self::rule_based();
        };

        match LogisticModel::from_path(path) {
            Ok(model) => {
                info!(path = %path.display(), model_type = %model.model_type, "scoring model loaded");
                Self::with_model(Arc::new(model), config.inference_timeout())
            }
            Err(e) => {
                let reason = format!("{:#}", e);
                warn!(path = %path.display(), error = %reason, "failed to load scoring model, using rule-based predictor");
                Self::rule_based()
            }
        }
    }

    /// Predictor backed by an already loaded model
    pub fn with_model(model: Arc<dyn ScoringModel>, inference_timeout: Duration) -> Self {
        Self::ModelBacked(ModelBackedPredictor::new(model, inference_timeout))
    }

    pub fn rule_based() -> Self {
        Self::RuleBased(RuleBasedFallbackPredictor::new())
    }

    pub fn is_model_backed(&self) -> bool {
        matches!(self, Self::ModelBacked(_))
    }

    /// Success probability in [0, 1] for the pair; never fails
    pub async fn predict(&self, customer: &Customer, agent: &Agent, context: &FeatureContext) -> f64 {
        match self {
            Self::ModelBacked(predictor) => predictor.predict(customer, agent, context).await,
            Self::RuleBased(predictor) => predictor.predict(customer, agent),
        }
    }

    /// Predictions for each pair, in input order
    pub async fn predict_batch(&self, pairs: &[(&Customer, &Agent)], context: &FeatureContext) -> Vec<f64> {
        self.predict_batch_with_concurrency(pairs, context, DEFAULT_BATCH_CONCURRENCY)
            .await
    }

    /// Like [`predict_batch`](Self::predict_batch) with an explicit bound on
    /// predictions in flight
    pub async fn predict_batch_with_concurrency(
        &self,
        pairs: &[(&Customer, &Agent)],
        context: &FeatureContext,
        concurrency: usize,
    ) -> Vec<f64> {
        // A mapping closure kept inside the stream would make callers' futures
        // impossible to pass to `tokio::spawn`
        let predictions: Vec<_> = pairs
            .iter()
            .map(|&(customer, agent)| self.predict(customer, agent, context))
            .collect();

        // `buffered` yields in submission order
        stream::iter(predictions)
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    pub fn model_info(&self) -> PredictorInfo {
        let (model_loaded, model_type) = match self {
            Self::ModelBacked(predictor) => (true, predictor.model_name().to_string()),
            Self::RuleBased(_) => (false, "rule_based".to_string()),
        };

        PredictorInfo {
            model_loaded,
            model_type,
            feature_count: FeatureVector::LEN,
            features: FeatureVector::NAMES.iter().map(|name| name.to_string()).collect(),
        }
    }
}

impl Default for ScorePredictor {
    fn default() -> Self {
        Self::rule_based()
    }
}
