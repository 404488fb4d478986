//! # Customer Routing Module
//!
//! The decision step of a routing pass: score every waiting customer against
//! every routable agent, assign customers greedily in priority order and
//! explain each pick.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │           Snapshot: waiting customers + agents              │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │ filter: available && under capacity
//! ┌─────────────────────────▼───────────────────────────────────┐
//! │                  RoutingMatrixBuilder                       │
//! │  - one prediction per pair, bounded concurrency             │
//! │  - no matrix when either side is empty                      │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │ N x M scores
//! ┌─────────────────────────▼───────────────────────────────────┐
//! │                   AssignmentSolver                          │
//! │  - stable sort by priority (descending)                     │
//! │  - best remaining agent per customer                        │
//! │  - workload tie-break within the threshold                  │
//! │  - per-agent quota for the pass                             │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │ (customer, agent, score)
//! ┌─────────────────────────▼───────────────────────────────────┐
//! │                  ReasoningGenerator                         │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │
//!                  pending RoutingResults
//! ```
//!
//! ## Tie-Breaking
//!
//! Two modes are available through [`TieBreakMode`](crate::config::TieBreakMode):
//!
//! - **Visitation order** (default): agents are scanned in snapshot order and
//!   a candidate within the threshold of the running best replaces it only if
//!   it carries less workload. A near-equal agent that is visited *after* a
//!   strictly better but busier one can therefore win, while the same agent
//!   visited *before* it loses.
//! - **Symmetric**: every agent within the threshold of the top score is a
//!   candidate and the least loaded one wins regardless of order.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use qroute_routing_engine::prelude::*;
//!
//! # async fn example() {
//! let engine = RoutingEngine::new(Arc::new(ScorePredictor::rule_based()), &RoutingConfig::default());
//!
//! let customers = vec![Customer::new("Ada", "billing").with_priority(9)];
//! let agents = vec![Agent::new("Bob", ["billing"]), Agent::new("Cy", ["sales"])];
//!
//! let results = engine.route_customers(&customers, &agents).await;
//! assert_eq!(results.len(), 1);
//! assert_eq!(results[0].agent_name.as_deref(), Some("Bob"));
//! # }
//! ```

pub mod engine;
pub mod matrix;
pub mod reasoning;
pub mod solver;

pub use engine::RoutingEngine;
pub use matrix::{RoutingMatrix, RoutingMatrixBuilder};
pub use reasoning::ReasoningGenerator;
pub use solver::{Assignment, AssignmentSolver};
