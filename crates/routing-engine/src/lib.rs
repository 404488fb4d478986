//! # Queue Routing Engine
//!
//! This crate matches waiting customers to service agents. Each
//! customer/agent pair is given a predicted success probability, customers
//! are assigned greedily in priority order, and every assignment is
//! committed as a unit of work against the agent pool and result store.
//!
//! ## Features
//!
//! - **Score Prediction**: Loadable logistic model with a deterministic rule-based fallback
//! - **Assignment**: Priority-ordered greedy matching with a workload tie-break
//! - **Reasoning**: Human-readable tags explaining each decision
//! - **Lifecycle**: Workload accounting with rollback, completion and reset
//! - **Statistics**: Confidence buckets and score spread over routing results
//!
//! ## Architecture
//!
//! - [`prediction`]: Feature encoding and the two score predictors
//! - [`routing`]: Score matrix, assignment solver, reasoning, engine
//! - [`lifecycle`]: Workload accounting and result state machine
//! - [`repository`]: Queue/fleet and result-store interfaces
//! - [`service`]: Serialized routing operations for applications
//! - [`monitoring`]: Routing statistics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use qroute_routing_engine::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let fleet = Arc::new(InMemoryQueueFleet::from_snapshots(
//!         vec![Customer::new("Ada", "billing").with_priority(8)],
//!         vec![Agent::new("Bob", ["billing", "account_management"])],
//!     )?);
//!     let store = Arc::new(InMemoryResultStore::new());
//!
//!     let service = RoutingService::new(&EngineConfig::default(), fleet, store);
//!     let report = service.auto_route().await?;
//!
//!     for result in &report.results {
//!         println!("{} -> {} ({:.3})", result.customer_id, result.agent_id, result.routing_score);
//!     }
//!     Ok(())
//! }
//! ```

// Core modules
pub mod config;
pub mod error;
pub mod logging;
pub mod types;

// Matching engine
pub mod lifecycle;
pub mod monitoring;
pub mod prediction;
pub mod routing;

// Collaborators and service surface
pub mod repository;
pub mod service;

pub use config::EngineConfig;
pub use error::{Result, RoutingError};
pub use service::{RoutingPassReport, RoutingService};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{AssignmentPolicy, EngineConfig, LogSettings, PredictorConfig, RoutingConfig, TieBreakMode};
    pub use crate::error::{Result, RoutingError};
    pub use crate::lifecycle::WorkloadAccountant;
    pub use crate::logging::{setup_logging, LogFormat, LoggingConfig};
    pub use crate::monitoring::{get_routing_statistics, RoutingStatistics, ScoreDistribution};
    pub use crate::prediction::{
        FeatureContext, FeatureEncoder, FeatureVector, LogisticModel, ModelBackedPredictor, PredictorInfo,
        RuleBasedFallbackPredictor, ScorePredictor, ScoringModel,
    };
    pub use crate::repository::{DequeuedCustomer, InMemoryQueueFleet, InMemoryResultStore, QueueFleet, ResultStore};
    pub use crate::routing::{
        Assignment, AssignmentSolver, ReasoningGenerator, RoutingEngine, RoutingMatrix, RoutingMatrixBuilder,
    };
    pub use crate::service::{RoutingPassReport, RoutingService};
    pub use crate::types::{
        Agent, AgentStatus, Channel, CompletionOutcome, ConversationSummary, Customer, CustomerFeedback,
        CustomerTier, RoutingResult, RoutingStatus, Sentiment,
    };

    pub use chrono::{DateTime, Utc};
}
