//! # Workload Accounting and Result Lifecycle
//!
//! Every change a routing decision causes outside the engine goes through
//! [`WorkloadAccountant`]:
//!
//! - **commit**: pending results become `active`, each agent's workload is
//!   incremented and the customer leaves the queue
//! - **complete**: an `active` result becomes `completed` and the agent's
//!   workload is released
//! - **reset**: results are cleared and every agent is idle and available
//!
//! A commit is a unit of work. Each applied step is recorded in an undo log
//! and, if a later step fails, the log is replayed in reverse so no workload
//! increment survives without its stored result.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::{Result, RoutingError};
use crate::repository::{DequeuedCustomer, QueueFleet, ResultStore};
use crate::types::{AgentStatus, CompletionOutcome, CustomerFeedback, RoutingResult, RoutingStatus};

/// Compensation for one applied commit step
#[derive(Debug)]
enum Undo {
    Workload { agent_id: String, previous: u32 },
    Customer(DequeuedCustomer),
    Result(String),
}

/// Agent state before a completion released it
#[derive(Debug)]
struct Released {
    agent_id: String,
    workload: u32,
    status: AgentStatus,
}

/// Applies routing decisions to the queue/fleet and the result store
#[derive(Clone)]
pub struct WorkloadAccountant {
    fleet: Arc<dyn QueueFleet>,
    store: Arc<dyn ResultStore>,
}

impl std::fmt::Debug for WorkloadAccountant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkloadAccountant").finish_non_exhaustive()
    }
}

impl WorkloadAccountant {
    pub fn new(fleet: Arc<dyn QueueFleet>, store: Arc<dyn ResultStore>) -> Self {
        Self { fleet, store }
    }

    /// Activate and persist a batch of pending results, all or nothing
    ///
    /// Each agent is re-read from the fleet; an agent that is no longer
    /// available or has no capacity left fails the whole batch.
    pub async fn commit(&self, pending: Vec<RoutingResult>) -> Result<Vec<RoutingResult>> {
        let mut undo = Vec::new();
        let mut committed = Vec::with_capacity(pending.len());

        for result in pending {
            let routing_id = result.id.clone();
            match self.apply(result, &mut undo).await {
                Ok(active) => committed.push(active),
                Err(e) => {
                    let rolled_back = self.rollback(undo).await;
                    error!(routing_id = %routing_id, error = %e, rolled_back, "commit failed");
                    return Err(RoutingError::CommitFailed {
                        reason: e.to_string(),
                        rolled_back,
                    });
                }
            }
        }

        if !committed.is_empty() {
            info!(count = committed.len(), "routing results committed");
        }
        Ok(committed)
    }

    async fn apply(&self, mut result: RoutingResult, undo: &mut Vec<Undo>) -> Result<RoutingResult> {
        let agent = self
            .fleet
            .get_agent(&result.agent_id)
            .await?
            .ok_or_else(|| RoutingError::AgentNotFound(result.agent_id.clone()))?;

        if agent.status != AgentStatus::Available {
            return Err(RoutingError::AgentUnavailable {
                agent_id: agent.id,
                status: agent.status,
            });
        }
        if agent.current_workload >= agent.max_concurrent {
            return Err(RoutingError::AgentAtCapacity {
                agent_id: agent.id,
                current_workload: agent.current_workload,
                max_concurrent: agent.max_concurrent,
            });
        }

        result.transition(RoutingStatus::Active)?;

        self.fleet
            .update_agent_workload(&agent.id, agent.current_workload + 1)
            .await?;
        undo.push(Undo::Workload {
            agent_id: agent.id.clone(),
            previous: agent.current_workload,
        });

        match self.fleet.remove_customer(&result.customer_id).await? {
            Some(dequeued) => undo.push(Undo::Customer(dequeued)),
            None => warn!(customer_id = %result.customer_id, "routed customer was not in the queue"),
        }

        self.store.insert(result.clone()).await?;
        undo.push(Undo::Result(result.id.clone()));

        debug!(
            routing_id = %result.id,
            agent_id = %agent.id,
            workload = agent.current_workload + 1,
            max = agent.max_concurrent,
            "routing activated"
        );
        Ok(result)
    }

    /// Replay the undo log in reverse; `true` if every step was compensated
    async fn rollback(&self, undo: Vec<Undo>) -> bool {
        let mut clean = true;

        for step in undo.into_iter().rev() {
            let outcome = match step {
                Undo::Workload { agent_id, previous } => self.fleet.update_agent_workload(&agent_id, previous).await,
                Undo::Customer(dequeued) => self.fleet.restore_customer(dequeued).await,
                Undo::Result(routing_id) => self.store.remove(&routing_id).await.map(|_| ()),
            };

            if let Err(e) = outcome {
                error!(error = %e, "rollback step failed");
                clean = false;
            }
        }

        clean
    }

    /// Complete a routing and release its agent
    pub async fn complete(&self, routing_id: &str, outcome: CompletionOutcome) -> Result<RoutingResult> {
        let mut result = self
            .store
            .get(routing_id)
            .await?
            .ok_or_else(|| RoutingError::RoutingResultNotFound(routing_id.to_string()))?;

        let was_active = result.status == RoutingStatus::Active;
        result.transition(RoutingStatus::Completed)?;

        let CompletionOutcome {
            conversation_summary,
            actual_handling_time,
            success_outcome,
        } = outcome;
        if conversation_summary.is_some() {
            result.conversation_summary = conversation_summary;
        }
        if actual_handling_time.is_some() {
            result.actual_handling_time = actual_handling_time;
        }
        if success_outcome.is_some() {
            result.success_outcome = success_outcome;
        }

        // Pending results never took capacity
        let released = if was_active {
            self.release_agent(&result.agent_id).await?
        } else {
            None
        };

        if let Err(e) = self.store.update(result.clone()).await {
            if let Some(released) = released {
                self.restore_agent(released).await;
            }
            return Err(e.into());
        }

        info!(routing_id = %result.id, agent_id = %result.agent_id, "routing completed");
        Ok(result)
    }

    /// Complete every active routing; returns how many were completed
    pub async fn complete_all_active(&self) -> Result<usize> {
        let active: Vec<String> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|r| r.status == RoutingStatus::Active)
            .map(|r| r.id)
            .collect();

        for routing_id in &active {
            self.complete(routing_id, CompletionOutcome::default()).await?;
        }

        info!(count = active.len(), "active routings completed");
        Ok(active.len())
    }

    async fn release_agent(&self, agent_id: &str) -> Result<Option<Released>> {
        let Some(agent) = self.fleet.get_agent(agent_id).await? else {
            warn!(agent_id = %agent_id, "completed routing references an unknown agent");
            return Ok(None);
        };

        let workload = agent.current_workload.saturating_sub(1);
        self.fleet.update_agent_workload(agent_id, workload).await?;

        let released = Released {
            agent_id: agent.id,
            workload: agent.current_workload,
            status: agent.status,
        };

        // Completion only relieves pressure; it never marks an agent busy
        if workload < agent.max_concurrent && agent.status != AgentStatus::Available {
            if let Err(e) = self.fleet.update_agent_status(agent_id, AgentStatus::Available).await {
                self.restore_agent(released).await;
                return Err(e.into());
            }
        }

        Ok(Some(released))
    }

    async fn restore_agent(&self, released: Released) {
        let Released {
            agent_id,
            workload,
            status,
        } = released;
        if let Err(e) = self.fleet.update_agent_workload(&agent_id, workload).await {
            error!(agent_id = %agent_id, error = %e, "failed to restore agent workload");
        }
        if let Err(e) = self.fleet.update_agent_status(&agent_id, status).await {
            error!(agent_id = %agent_id, error = %e, "failed to restore agent status");
        }
    }

    /// Attach customer feedback to a completed routing
    pub async fn attach_feedback(&self, routing_id: &str, feedback: CustomerFeedback) -> Result<RoutingResult> {
        feedback.validate()?;
        if feedback.routing_id != routing_id {
            return Err(RoutingError::invalid_input(format!(
                "feedback is for routing {}, not {}",
                feedback.routing_id, routing_id
            )));
        }

        let mut result = self
            .store
            .get(routing_id)
            .await?
            .ok_or_else(|| RoutingError::RoutingResultNotFound(routing_id.to_string()))?;

        if result.status != RoutingStatus::Completed {
            return Err(RoutingError::invalid_input(format!(
                "routing {} is {}, feedback requires a completed routing",
                routing_id, result.status
            )));
        }

        result.customer_feedback = Some(feedback);
        self.store.update(result.clone()).await?;
        debug!(routing_id = %routing_id, "feedback attached");
        Ok(result)
    }

    /// Clear all results and return every agent to idle and available
    ///
    /// Calling this repeatedly leaves the same state as calling it once.
    pub async fn reset(&self) -> Result<()> {
        self.store.clear().await?;

        for agent in self.fleet.list_agents().await? {
            if agent.current_workload != 0 {
                self.fleet.update_agent_workload(&agent.id, 0).await?;
            }
            if agent.status != AgentStatus::Available {
                self.fleet.update_agent_status(&agent.id, AgentStatus::Available).await?;
            }
        }

        info!("routing state reset");
        Ok(())
    }
}
