//! # Routing Service
//!
//! [`RoutingService`] is the entry point applications embed. It ties the
//! decision step ([`RoutingEngine`]) to the bookkeeping step
//! ([`WorkloadAccountant`]) and serializes every operation that reads agent
//! capacity and then mutates it, so two concurrent passes (or a pass and a
//! manual assignment) can never both observe the same free slot.
//!
//! ```rust
//! use std::sync::Arc;
//! use qroute_routing_engine::prelude::*;
//!
//! # async fn example() -> qroute_routing_engine::error::Result<()> {
//! let fleet = Arc::new(InMemoryQueueFleet::from_snapshots(
//!     vec![Customer::new("Ada", "billing")],
//!     vec![Agent::new("Bob", ["billing"])],
//! )?);
//! let store = Arc::new(InMemoryResultStore::new());
//!
//! let service = RoutingService::new(&EngineConfig::default(), fleet, store);
//! let report = service.auto_route().await?;
//! assert_eq!(report.results.len(), 1);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use crate::config::{EngineConfig, RoutingConfig};
use crate::error::{Result, RoutingError};
use crate::lifecycle::WorkloadAccountant;
use crate::monitoring::{get_routing_statistics, RoutingStatistics};
use crate::prediction::{FeatureContext, PredictorInfo, ScorePredictor};
use crate::repository::{QueueFleet, ResultStore};
use crate::routing::RoutingEngine;
use crate::types::{Agent, AgentStatus, CompletionOutcome, Customer, CustomerFeedback, RoutingResult};

/// Outcome of one automatic routing pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingPassReport {
    /// Committed results, in the order customers were served
    pub results: Vec<RoutingResult>,
    pub statistics: RoutingStatistics,
    pub waiting_customers: usize,
    pub available_agents: usize,
    /// Customers left in the queue after the pass
    pub unrouted_customers: usize,
}

impl RoutingPassReport {
    fn empty(waiting_customers: usize, available_agents: usize) -> Self {
        Self {
            results: Vec::new(),
            statistics: RoutingStatistics::default(),
            waiting_customers,
            available_agents,
            unrouted_customers: waiting_customers,
        }
    }
}

/// Serialized routing, manual assignment and lifecycle operations
pub struct RoutingService {
    engine: RoutingEngine,
    accountant: WorkloadAccountant,
    fleet: Arc<dyn QueueFleet>,
    store: Arc<dyn ResultStore>,
    /// Guards read-capacity-then-mutate sections
    pass_lock: Mutex<()>,
}

impl std::fmt::Debug for RoutingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingService")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl RoutingService {
    /// Build a service, loading the predictor described by `config`
    pub fn new(config: &EngineConfig, fleet: Arc<dyn QueueFleet>, store: Arc<dyn ResultStore>) -> Self {
        let predictor = ScorePredictor::from_config(&config.predictor);
        Self::with_predictor(predictor, &config.routing, fleet, store)
    }

    /// Build a service around an already selected predictor
    pub fn with_predictor(
        predictor: ScorePredictor,
        routing: &RoutingConfig,
        fleet: Arc<dyn QueueFleet>,
        store: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            engine: RoutingEngine::new(Arc::new(predictor), routing),
            accountant: WorkloadAccountant::new(Arc::clone(&fleet), Arc::clone(&store)),
            fleet,
            store,
            pass_lock: Mutex::new(()),
        }
    }

    pub fn engine(&self) -> &RoutingEngine {
        &self.engine
    }

    /// Route caller-supplied snapshots and commit the decisions
    ///
    /// Every snapshot is validated first and a malformed one rejects the
    /// whole pass with [`RoutingError::InvalidInput`]. The commit re-reads
    /// each agent, so a stale snapshot cannot push an agent past
    /// `max_concurrent`; such a pass fails as a whole.
    pub async fn route_customers(&self, customers: &[Customer], agents: &[Agent]) -> Result<Vec<RoutingResult>> {
        for customer in customers {
            customer.validate()?;
        }
        for agent in agents {
            agent.validate()?;
        }

        let _guard = self.pass_lock.lock().await;
        let pending = self.engine.route_customers(customers, agents).await;
        self.accountant.commit(pending).await
    }

    /// Route everyone waiting in the queue against the current fleet
    pub async fn auto_route(&self) -> Result<RoutingPassReport> {
        let _guard = self.pass_lock.lock().await;

        let customers = self.fleet.list_waiting_customers().await?;
        let agents = self.fleet.list_available_agents().await?;

        if customers.is_empty() || agents.is_empty() {
            info!(
                customers = customers.len(),
                agents = agents.len(),
                "nothing to route"
            );
            return Ok(RoutingPassReport::empty(customers.len(), agents.len()));
        }

        let pending = self.engine.route_customers(&customers, &agents).await;
        let results = self.accountant.commit(pending).await?;
        let statistics = get_routing_statistics(&results);

        info!(
            routed = results.len(),
            waiting = customers.len(),
            average_score = statistics.average_score,
            "routing pass complete"
        );

        Ok(RoutingPassReport {
            unrouted_customers: customers.len() - results.len(),
            waiting_customers: customers.len(),
            available_agents: agents.len(),
            statistics,
            results,
        })
    }

    /// Assign a specific customer to a specific agent
    ///
    /// Unknown ids, an agent that is not available and an agent with no
    /// capacity left are reported as distinct errors and change nothing.
    pub async fn manual_route(
        &self,
        customer_id: &str,
        agent_id: &str,
        reasoning: impl Into<String>,
    ) -> Result<RoutingResult> {
        let _guard = self.pass_lock.lock().await;

        let customer = self
            .fleet
            .get_customer(customer_id)
            .await?
            .ok_or_else(|| RoutingError::CustomerNotFound(customer_id.to_string()))?;
        let agent = self
            .fleet
            .get_agent(agent_id)
            .await?
            .ok_or_else(|| RoutingError::AgentNotFound(agent_id.to_string()))?;

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

        let queue_length = self.fleet.list_waiting_customers().await?.len();
        let score = self
            .engine
            .score_pair(&customer, &agent, &FeatureContext::now(queue_length))
            .await;

        let pending = RoutingResult::pending(&customer, &agent, score, vec![reasoning.into()]);
        let result = self
            .accountant
            .commit(vec![pending])
            .await?
            .pop()
            .ok_or_else(|| RoutingError::internal("manual commit produced no result"))?;

        info!(
            routing_id = %result.id,
            customer_id = %customer_id,
            agent_id = %agent_id,
            score = result.routing_score,
            "manual routing committed"
        );
        Ok(result)
    }

    /// Complete one routing and release its agent
    pub async fn complete_routing(&self, routing_id: &str, outcome: CompletionOutcome) -> Result<RoutingResult> {
        let _guard = self.pass_lock.lock().await;
        self.accountant.complete(routing_id, outcome).await
    }

    /// Complete every active routing
    pub async fn complete_all_active(&self) -> Result<usize> {
        let _guard = self.pass_lock.lock().await;
        self.accountant.complete_all_active().await
    }

    /// Attach feedback to a completed routing
    pub async fn submit_feedback(&self, routing_id: &str, feedback: CustomerFeedback) -> Result<RoutingResult> {
        self.accountant.attach_feedback(routing_id, feedback).await
    }

    /// Set an agent's workload directly; status follows the load
    ///
    /// A workload of `max_concurrent` marks the agent busy and anything lower
    /// marks it available. Offline agents keep their status.
    pub async fn set_agent_workload(&self, agent_id: &str, workload: u32) -> Result<Agent> {
        let _guard = self.pass_lock.lock().await;

        let agent = self
            .fleet
            .get_agent(agent_id)
            .await?
            .ok_or_else(|| RoutingError::AgentNotFound(agent_id.to_string()))?;
        if workload > agent.max_concurrent {
            return Err(RoutingError::invalid_input(format!(
                "workload {} exceeds max_concurrent {} for agent {}",
                workload, agent.max_concurrent, agent_id
            )));
        }

        self.fleet.update_agent_workload(agent_id, workload).await?;
        if agent.status != AgentStatus::Offline {
            let status = if workload >= agent.max_concurrent {
                AgentStatus::Busy
            } else {
                AgentStatus::Available
            };
            self.fleet.update_agent_status(agent_id, status).await?;
        }

        self.fleet
            .get_agent(agent_id)
            .await?
            .ok_or_else(|| RoutingError::AgentNotFound(agent_id.to_string()))
    }

    /// Explicit agent status change
    pub async fn update_agent_status(&self, agent_id: &str, status: AgentStatus) -> Result<Agent> {
        let _guard = self.pass_lock.lock().await;

        if self.fleet.get_agent(agent_id).await?.is_none() {
            return Err(RoutingError::AgentNotFound(agent_id.to_string()));
        }
        self.fleet.update_agent_status(agent_id, status).await?;

        self.fleet
            .get_agent(agent_id)
            .await?
            .ok_or_else(|| RoutingError::AgentNotFound(agent_id.to_string()))
    }

    /// All stored routing results, oldest first
    pub async fn routing_results(&self) -> Result<Vec<RoutingResult>> {
        Ok(self.store.list().await?)
    }

    /// Statistics over every stored routing result
    pub async fn get_routing_statistics(&self) -> Result<RoutingStatistics> {
        let results = self.store.list().await?;
        Ok(get_routing_statistics(&results))
    }

    pub fn model_info(&self) -> PredictorInfo {
        self.engine.predictor().model_info()
    }

    /// Clear results and return every agent to idle; idempotent
    pub async fn reset(&self) -> Result<()> {
        let _guard = self.pass_lock.lock().await;
        self.accountant.reset().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::repository::{InMemoryQueueFleet, InMemoryResultStore};

    fn service(customers: Vec<Customer>, agents: Vec<Agent>) -> (RoutingService, Arc<InMemoryQueueFleet>) {
        let fleet = Arc::new(InMemoryQueueFleet::from_snapshots(customers, agents).unwrap());
        let store = Arc::new(InMemoryResultStore::new());
        let service = RoutingService::new(&EngineConfig::default(), fleet.clone(), store);
        (service, fleet)
    }

    #[tokio::test]
    async fn test_auto_route_reports_unrouted_customers() {
        let (service, fleet) = service(
            vec![
                Customer::new("Ada", "billing").with_id("c1"),
                Customer::new("Cy", "sales").with_id("c2"),
            ],
            vec![Agent::new("Bob", ["billing"]).with_id("a1")],
        );

        let report = service.auto_route().await.unwrap();
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.unrouted_customers, 1);
        assert_eq!(report.statistics.total_routings, 1);
        assert_eq!(fleet.queue_len(), 1);
    }

    #[tokio::test]
    async fn test_auto_route_with_empty_queue() {
        let (service, _) = service(vec![], vec![Agent::new("Bob", ["billing"])]);
        let report = service.auto_route().await.unwrap();
        assert!(report.results.is_empty());
        assert_eq!(report.available_agents, 1);
    }

    #[tokio::test]
    async fn test_set_agent_workload_derives_status() {
        let (service, _) = service(vec![], vec![Agent::new("Bob", ["billing"]).with_id("a1")]);

        let agent = service.set_agent_workload("a1", 3).await.unwrap();
        assert_eq!(agent.status, AgentStatus::Busy);

        let agent = service.set_agent_workload("a1", 1).await.unwrap();
        assert_eq!(agent.status, AgentStatus::Available);

        assert!(service.set_agent_workload("a1", 4).await.unwrap_err().is_rejection());
        assert!(matches!(
            service.set_agent_workload("nobody", 1).await,
            Err(RoutingError::AgentNotFound(_))
        ));

        service.update_agent_status("a1", AgentStatus::Offline).await.unwrap();
        let agent = service.set_agent_workload("a1", 0).await.unwrap();
        assert_eq!(agent.status, AgentStatus::Offline);
    }

    #[tokio::test]
    async fn test_route_customers_rejects_malformed_snapshots() {
        let agent = Agent::new("Bob", ["billing"]).with_id("a1");
        let (service, fleet) = service(vec![Customer::new("Ada", "billing").with_id("c1")], vec![agent.clone()]);

        let customer = fleet.get_customer("c1").await.unwrap().unwrap();
        let err = service
            .route_customers(&[customer.clone().with_complexity(f64::NAN)], &[agent.clone()])
            .await
            .unwrap_err();
        assert!(matches!(err, RoutingError::InvalidInput(_)));

        let err = service
            .route_customers(&[customer], &[agent.with_success_rate(f64::NAN)])
            .await
            .unwrap_err();
        assert!(err.is_rejection());

        assert!(service.routing_results().await.unwrap().is_empty());
        assert_eq!(fleet.queue_len(), 1);
        assert_eq!(fleet.get_agent("a1").await.unwrap().unwrap().current_workload, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_route_customers_runs_on_spawned_task() {
        let (service, fleet) = service(
            vec![Customer::new("Ada", "billing").with_id("c1")],
            vec![Agent::new("Bob", ["billing"]).with_id("a1")],
        );
        let service = Arc::new(service);
        let customers = fleet.list_waiting_customers().await.unwrap();
        let agents = fleet.list_available_agents().await.unwrap();

        let task = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.route_customers(&customers, &agents).await })
        };

        let results = task.await.unwrap().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].agent_id, "a1");
        assert_eq!(fleet.queue_len(), 0);
    }

    #[tokio::test]
    async fn test_model_info_reflects_rule_based_default() {
        let (service, _) = service(vec![], vec![]);
        assert!(!service.model_info().model_loaded);
    }
}
