//! Priority-ordered greedy assignment
//!
//! Customers are served in descending priority (stable, so equal priorities
//! keep enqueue order). Each customer takes the best agent that still has
//! quota left in this pass. The result is not globally score-optimal.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::{AssignmentPolicy, RoutingConfig, TieBreakMode};
use crate::types::{Agent, Customer};

use super::matrix::RoutingMatrix;

/// One (customer, agent, score) decision, indexed into the pass inputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub customer_idx: usize,
    pub agent_idx: usize,
    pub score: f64,
}

/// Greedy matcher with a configurable tie-break and per-pass quota
#[derive(Debug, Clone)]
pub struct AssignmentSolver {
    tie_break_threshold: f64,
    tie_break_mode: TieBreakMode,
    policy: AssignmentPolicy,
}

impl Default for AssignmentSolver {
    fn default() -> Self {
        Self::from_config(&RoutingConfig::default())
    }
}

impl AssignmentSolver {
    pub fn new(tie_break_threshold: f64, tie_break_mode: TieBreakMode, policy: AssignmentPolicy) -> Self {
        Self {
            tie_break_threshold,
            tie_break_mode,
            policy,
        }
    }

    pub fn from_config(config: &RoutingConfig) -> Self {
        Self::new(config.tie_break_threshold, config.tie_break_mode, config.assignment_policy)
    }

    pub fn tie_break_mode(&self) -> TieBreakMode {
        self.tie_break_mode
    }

    /// Assign customers to agents
    ///
    /// `customers` and `agents` must be the inputs `matrix` was built from.
    /// Output order is the order customers were served.
    pub fn solve(&self, customers: &[Customer], agents: &[Agent], matrix: &RoutingMatrix) -> Vec<Assignment> {
        let n = customers.len().min(matrix.customers());
        let m = agents.len().min(matrix.agents());
        if n == 0 || m == 0 {
            return Vec::new();
        }

        let mut order: Vec<usize> = (0..n).collect();
        // sort_by_key is stable
        order.sort_by_key(|&idx| Reverse(customers[idx].priority));

        let per_agent = self.policy.max_new_assignments_per_agent;
        let mut quota: Vec<u32> = agents[..m]
            .iter()
            .map(|agent| agent.remaining_capacity().min(per_agent))
            .collect();
        // Workload as it will be once this pass commits
        let mut load: Vec<u32> = agents[..m].iter().map(|agent| agent.current_workload).collect();

        let mut assignments = Vec::with_capacity(n.min(m));
        for customer_idx in order {
            let row = &matrix.row(customer_idx)[..m];
            let pick = match self.tie_break_mode {
                TieBreakMode::VisitationOrder => self.pick_in_visitation_order(row, &quota, &load),
                TieBreakMode::Symmetric => self.pick_symmetric(row, &quota, &load),
            };

            let Some((agent_idx, score)) = pick else {
                trace!(customer_idx, "no agent left for customer");
                continue;
            };

            quota[agent_idx] -= 1;
            load[agent_idx] += 1;
            assignments.push(Assignment {
                customer_idx,
                agent_idx,
                score,
            });
        }

        assignments
    }

    /// Running-best scan; a near-equal candidate only replaces the current
    /// best when it is less loaded, so the outcome depends on agent order
    fn pick_in_visitation_order(&self, row: &[f64], quota: &[u32], load: &[u32]) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;

        for (agent_idx, &score) in row.iter().enumerate() {
            if quota[agent_idx] == 0 {
                continue;
            }

            match best {
                None => best = Some((agent_idx, score)),
                Some((_, best_score)) if score > best_score => best = Some((agent_idx, score)),
                Some((best_idx, best_score)) => {
                    if (score - best_score).abs() < self.tie_break_threshold && load[agent_idx] < load[best_idx] {
                        best = Some((agent_idx, score));
                    }
                }
            }
        }

        best
    }

    /// Every candidate within the threshold of the top score competes on
    /// load, then score, then index
    fn pick_symmetric(&self, row: &[f64], quota: &[u32], load: &[u32]) -> Option<(usize, f64)> {
        let top = row
            .iter()
            .enumerate()
            .filter(|(agent_idx, _)| quota[*agent_idx] > 0)
            .map(|(_, &score)| score)
            .fold(None, |acc: Option<f64>, score| Some(acc.map_or(score, |best| best.max(score))))?;

        row.iter()
            .enumerate()
            .filter(|(agent_idx, _)| quota[*agent_idx] > 0)
            .filter(|(_, &score)| score == top || top - score < self.tie_break_threshold)
            .min_by(|(a_idx, a_score), (b_idx, b_score)| {
                load[*a_idx]
                    .cmp(&load[*b_idx])
                    .then_with(|| b_score.total_cmp(a_score))
                    .then_with(|| a_idx.cmp(b_idx))
            })
            .map(|(agent_idx, &score)| (agent_idx, score))
    }
}
