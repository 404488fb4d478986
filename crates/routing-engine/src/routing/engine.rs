//! Orchestration of one routing pass over caller-supplied snapshots

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::RoutingConfig;
use crate::prediction::{FeatureContext, ScorePredictor};
use crate::types::{Agent, Customer, RoutingResult};

use super::matrix::{RoutingMatrix, RoutingMatrixBuilder};
use super::reasoning::ReasoningGenerator;
use super::solver::{Assignment, AssignmentSolver};

/// Decision half of a routing pass
///
/// Scores the snapshot, solves the assignment and annotates every pick. The
/// returned results are `pending`; nothing is mutated until they are
/// committed through the [`WorkloadAccountant`](crate::lifecycle::WorkloadAccountant).
#[derive(Debug, Clone)]
pub struct RoutingEngine {
    predictor: Arc<ScorePredictor>,
    matrix_builder: RoutingMatrixBuilder,
    solver: AssignmentSolver,
    reasoning: ReasoningGenerator,
}

impl RoutingEngine {
    pub fn new(predictor: Arc<ScorePredictor>, config: &RoutingConfig) -> Self {
        Self {
            matrix_builder: RoutingMatrixBuilder::new(Arc::clone(&predictor), config.scoring_concurrency),
            predictor,
            solver: AssignmentSolver::from_config(config),
            reasoning: ReasoningGenerator::new(),
        }
    }

    pub fn predictor(&self) -> &ScorePredictor {
        &self.predictor
    }

    pub fn reasoning(&self) -> &ReasoningGenerator {
        &self.reasoning
    }

    /// Route a snapshot using the wall clock for time features
    pub async fn route_customers(&self, customers: &[Customer], agents: &[Agent]) -> Vec<RoutingResult> {
        let context = FeatureContext::now(customers.len());
        self.route_customers_with_context(customers, agents, &context).await
    }

    /// Route a snapshot with explicit feature context
    ///
    /// Agents that are not available or are at capacity are dropped before
    /// scoring. Empty input on either side yields no results.
    pub async fn route_customers_with_context(
        &self,
        customers: &[Customer],
        agents: &[Agent],
        context: &FeatureContext,
    ) -> Vec<RoutingResult> {
        let candidates: Vec<Agent> = agents.iter().filter(|agent| agent.is_routable()).cloned().collect();

        info!(
            customers = customers.len(),
            agents = agents.len(),
            candidates = candidates.len(),
            "routing pass"
        );

        let Some(matrix) = self.matrix_builder.build(customers, &candidates, context).await else {
            return Vec::new();
        };

        self.solver
            .solve(customers, &candidates, &matrix)
            .into_iter()
            .map(|Assignment { customer_idx, agent_idx, score }| {
                let customer = &customers[customer_idx];
                let agent = &candidates[agent_idx];
                debug!(customer_id = %customer.id, agent_id = %agent.id, score, "customer assigned");
                let reasoning = self.reasoning.generate(customer, agent, score);
                RoutingResult::pending(customer, agent, score, reasoning)
            })
            .collect()
    }

    /// Full score matrix for the routable subset of `agents`
    ///
    /// Returns the candidates the columns refer to alongside the matrix.
    pub async fn score_matrix(
        &self,
        customers: &[Customer],
        agents: &[Agent],
        context: &FeatureContext,
    ) -> Option<(Vec<Agent>, RoutingMatrix)> {
        let candidates: Vec<Agent> = agents.iter().filter(|agent| agent.is_routable()).cloned().collect();
        let matrix = self.matrix_builder.build(customers, &candidates, context).await?;
        Some((candidates, matrix))
    }

    /// Score a single pair, as used for manual routing
    pub async fn score_pair(&self, customer: &Customer, agent: &Agent, context: &FeatureContext) -> f64 {
        self.predictor.predict(customer, agent, context).await
    }
}
