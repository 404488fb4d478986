//! Pairwise score matrix for one routing pass

use std::sync::Arc;

use tracing::debug;

use crate::prediction::{FeatureContext, ScorePredictor};
use crate::types::{Agent, Customer};

/// Dense customers x agents score matrix, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingMatrix {
    customers: usize,
    agents: usize,
    scores: Vec<f64>,
}

impl RoutingMatrix {
    /// Build from per-customer rows; `None` if rows are ragged or empty
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Option<Self> {
        let agents = rows.first().map(Vec::len)?;
        if agents == 0 || rows.iter().any(|row| row.len() != agents) {
            return None;
        }

        let customers = rows.len();
        let scores = rows.into_iter().flatten().collect();
        Some(Self { customers, agents, scores })
    }

    pub fn customers(&self) -> usize {
        self.customers
    }

    pub fn agents(&self) -> usize {
        self.agents
    }

    pub fn get(&self, customer_idx: usize, agent_idx: usize) -> Option<f64> {
        if customer_idx >= self.customers || agent_idx >= self.agents {
            return None;
        }
        self.scores.get(customer_idx * self.agents + agent_idx).copied()
    }

    /// Scores of one customer against every agent
    pub fn row(&self, customer_idx: usize) -> &[f64] {
        let start = (customer_idx * self.agents).min(self.scores.len());
        let end = (start + self.agents).min(self.scores.len());
        &self.scores[start..end]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.scores.chunks(self.agents)
    }
}

/// Scores every customer/agent pair of a pass through the predictor
#[derive(Debug, Clone)]
pub struct RoutingMatrixBuilder {
    predictor: Arc<ScorePredictor>,
    concurrency: usize,
}

impl RoutingMatrixBuilder {
    pub fn new(predictor: Arc<ScorePredictor>, concurrency: usize) -> Self {
        Self {
            predictor,
            concurrency: concurrency.max(1),
        }
    }

    /// Score matrix for the pass, or `None` without allocating when either
    /// side is empty
    pub async fn build(&self, customers: &[Customer], agents: &[Agent], context: &FeatureContext) -> Option<RoutingMatrix> {
        if customers.is_empty() || agents.is_empty() {
            return None;
        }

        let pairs: Vec<(&Customer, &Agent)> = customers
            .iter()
            .flat_map(|customer| agents.iter().map(move |agent| (customer, agent)))
            .collect();

        let scores = self
            .predictor
            .predict_batch_with_concurrency(&pairs, context, self.concurrency)
            .await;

        debug!(customers = customers.len(), agents = agents.len(), "score matrix built");

        Some(RoutingMatrix {
            customers: customers.len(),
            agents: agents.len(),
            scores,
        })
    }
}
