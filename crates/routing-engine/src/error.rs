use thiserror::Error;

use crate::types::{AgentStatus, RoutingStatus};

/// Routing engine errors
#[derive(Error, Debug)]
pub enum RoutingError {
    /// Customer is not (or no longer) waiting in the queue
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Agent is unknown to the fleet
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    /// Agent exists but is not accepting new conversations
    #[error("Agent {agent_id} is not available (status: {status})")]
    AgentUnavailable {
        agent_id: String,
        status: AgentStatus,
    },

    /// Agent has no headroom left under its concurrency limit
    #[error("Agent {agent_id} is at capacity ({current_workload}/{max_concurrent})")]
    AgentAtCapacity {
        agent_id: String,
        current_workload: u32,
        max_concurrent: u32,
    },

    /// Routing result id is unknown to the result store
    #[error("Routing result not found: {0}")]
    RoutingResultNotFound(String),

    /// Lifecycle transition that would move a result backwards
    #[error("Invalid transition for routing {routing_id}: {from} -> {to}")]
    InvalidTransition {
        routing_id: String,
        from: RoutingStatus,
        to: RoutingStatus,
    },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Scoring model errors (load or inference)
    #[error("Model error: {0}")]
    Model(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors surfaced by the queue/fleet or result-store collaborators
    #[error("Repository error: {0}")]
    Repository(#[from] anyhow::Error),

    /// A routing pass or manual assignment could not be committed
    #[error("Commit failed: {reason} (rolled back: {rolled_back})")]
    CommitFailed { reason: String, rolled_back: bool },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RoutingError {
    /// Create a new InvalidInput error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Model error
    pub fn model<S: Into<String>>(msg: S) -> Self {
        Self::Model(msg.into())
    }

    /// Create a new Config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new Internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the error describes a rejected request rather than a fault
    ///
    /// Rejected requests leave every piece of state untouched.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::CustomerNotFound(_)
                | Self::AgentNotFound(_)
                | Self::AgentUnavailable { .. }
                | Self::AgentAtCapacity { .. }
                | Self::RoutingResultNotFound(_)
                | Self::InvalidTransition { .. }
                | Self::InvalidInput(_)
        )
    }
}

/// Result type for routing engine operations
pub type Result<T> = std::result::Result<T, RoutingError>;
