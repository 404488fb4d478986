//! # Collaborator Interfaces
//!
//! The matching engine never owns customers, agents or routing results. It
//! talks to two collaborators:
//!
//! - [`QueueFleet`]: the waiting-customer queue and the agent pool
//! - [`ResultStore`]: persistence for routing results
//!
//! Both return `anyhow::Result` so implementations can surface whatever their
//! backing store raises; the service maps those into
//! [`RoutingError::Repository`](crate::error::RoutingError::Repository).
//!
//! [`InMemoryQueueFleet`] and [`InMemoryResultStore`] are reference
//! implementations used by the CLI and tests.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{Agent, AgentStatus, Customer, RoutingResult};

pub use memory::{InMemoryQueueFleet, InMemoryResultStore};

/// A customer taken out of the queue together with the slot it held
///
/// `position` is opaque to callers; handing the value back to
/// [`QueueFleet::restore_customer`] puts the customer where it was.
#[derive(Debug, Clone, PartialEq)]
pub struct DequeuedCustomer {
    pub customer: Customer,
    pub position: u64,
}

/// Waiting-customer queue and agent pool
#[async_trait]
pub trait QueueFleet: Send + Sync {
    /// Customers in enqueue order
    async fn list_waiting_customers(&self) -> Result<Vec<Customer>>;

    /// Agents that are available and under capacity
    async fn list_available_agents(&self) -> Result<Vec<Agent>>;

    /// Every agent regardless of status
    async fn list_agents(&self) -> Result<Vec<Agent>>;

    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>>;

    async fn get_agent(&self, agent_id: &str) -> Result<Option<Agent>>;

    /// Take a customer out of the queue; `None` if it was not waiting
    async fn remove_customer(&self, customer_id: &str) -> Result<Option<DequeuedCustomer>>;

    /// Put a removed customer back in the slot it held; no-op if it is
    /// already queued
    async fn restore_customer(&self, dequeued: DequeuedCustomer) -> Result<()>;

    async fn update_agent_workload(&self, agent_id: &str, workload: u32) -> Result<()>;

    async fn update_agent_status(&self, agent_id: &str, status: AgentStatus) -> Result<()>;
}

/// Routing result persistence
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Store a new result; fails if the id is already present
    async fn insert(&self, result: RoutingResult) -> Result<()>;

    async fn get(&self, routing_id: &str) -> Result<Option<RoutingResult>>;

    /// Replace an existing result; fails if the id is unknown
    async fn update(&self, result: RoutingResult) -> Result<()>;

    async fn remove(&self, routing_id: &str) -> Result<bool>;

    /// All results, oldest first
    async fn list(&self) -> Result<Vec<RoutingResult>>;

    async fn clear(&self) -> Result<()>;
}
