//! In-memory collaborators

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::types::{Agent, AgentStatus, Customer, RoutingResult};

use super::{DequeuedCustomer, QueueFleet, ResultStore};

/// Waiting customers tagged with their enqueue sequence
#[derive(Debug, Default)]
struct Queue {
    entries: Vec<(u64, Customer)>,
    next_seq: u64,
}

impl Queue {
    fn push(&mut self, customer: Customer) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push((seq, customer));
    }

    fn position(&self, customer_id: &str) -> Option<usize> {
        self.entries.iter().position(|(_, c)| c.id == customer_id)
    }
}

/// Queue and agent pool held in process memory
///
/// Customers keep enqueue order and agents keep insertion order, so routing
/// passes over the same state visit agents identically.
#[derive(Debug, Default)]
pub struct InMemoryQueueFleet {
    queue: RwLock<Queue>,
    agents: RwLock<Vec<Agent>>,
}

impl InMemoryQueueFleet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fleet from snapshots, validating every entry
    pub fn from_snapshots(customers: Vec<Customer>, agents: Vec<Agent>) -> Result<Self> {
        let fleet = Self::new();
        for agent in agents {
            fleet.add_agent(agent)?;
        }
        for customer in customers {
            fleet.enqueue_customer(customer)?;
        }
        Ok(fleet)
    }

    /// Append a customer to the back of the queue
    pub fn enqueue_customer(&self, customer: Customer) -> Result<()> {
        customer.validate()?;
        let mut queue = self.queue.write();
        if queue.position(&customer.id).is_some() {
            bail!("customer {} is already queued", customer.id);
        }
        debug!(customer_id = %customer.id, priority = customer.priority, "customer enqueued");
        queue.push(customer);
        Ok(())
    }

    pub fn add_agent(&self, agent: Agent) -> Result<()> {
        agent.validate()?;
        let mut agents = self.agents.write();
        if agents.iter().any(|a| a.id == agent.id) {
            bail!("agent {} already exists", agent.id);
        }
        agents.push(agent);
        Ok(())
    }

    /// Recompute every waiting customer's `wait_time` from the current time
    pub fn refresh_wait_times(&self) {
        let now = Utc::now();
        for (_, customer) in self.queue.write().entries.iter_mut() {
            customer.refresh_wait_time(now);
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.read().entries.len()
    }

    fn with_agent<T>(&self, agent_id: &str, f: impl FnOnce(&mut Agent) -> Result<T>) -> Result<T> {
        let mut agents = self.agents.write();
        let agent = agents
            .iter_mut()
            .find(|a| a.id == agent_id)
            .ok_or_else(|| anyhow!("agent {} not found", agent_id))?;
        let out = f(&mut *agent)?;
        agent.last_updated = Utc::now();
        Ok(out)
    }
}

#[async_trait]
impl QueueFleet for InMemoryQueueFleet {
    async fn list_waiting_customers(&self) -> Result<Vec<Customer>> {
        Ok(self.queue.read().entries.iter().map(|(_, c)| c.clone()).collect())
    }

    async fn list_available_agents(&self) -> Result<Vec<Agent>> {
        Ok(self.agents.read().iter().filter(|a| a.is_routable()).cloned().collect())
    }

    async fn list_agents(&self) -> Result<Vec<Agent>> {
        Ok(self.agents.read().clone())
    }

    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>> {
        let queue = self.queue.read();
        Ok(queue.position(customer_id).map(|idx| queue.entries[idx].1.clone()))
    }

    async fn get_agent(&self, agent_id: &str) -> Result<Option<Agent>> {
        Ok(self.agents.read().iter().find(|a| a.id == agent_id).cloned())
    }

    async fn remove_customer(&self, customer_id: &str) -> Result<Option<DequeuedCustomer>> {
        let mut queue = self.queue.write();
        Ok(queue.position(customer_id).map(|idx| {
            let (position, customer) = queue.entries.remove(idx);
            DequeuedCustomer { customer, position }
        }))
    }

    async fn restore_customer(&self, dequeued: DequeuedCustomer) -> Result<()> {
        let DequeuedCustomer { customer, position } = dequeued;
        let mut queue = self.queue.write();
        if queue.position(&customer.id).is_some() {
            return Ok(());
        }

        let idx = queue
            .entries
            .iter()
            .position(|(seq, _)| *seq > position)
            .unwrap_or(queue.entries.len());
        queue.entries.insert(idx, (position, customer));
        Ok(())
    }

    async fn update_agent_workload(&self, agent_id: &str, workload: u32) -> Result<()> {
        self.with_agent(agent_id, |agent| {
            if workload > agent.max_concurrent {
                bail!(
                    "workload {} exceeds max_concurrent {} for agent {}",
                    workload,
                    agent.max_concurrent,
                    agent.id
                );
            }
            agent.current_workload = workload;
            Ok(())
        })
    }

    async fn update_agent_status(&self, agent_id: &str, status: AgentStatus) -> Result<()> {
        self.with_agent(agent_id, |agent| {
            agent.status = status;
            Ok(())
        })
    }
}

/// Routing results keyed by id
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    results: DashMap<String, RoutingResult>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn insert(&self, result: RoutingResult) -> Result<()> {
        match self.results.entry(result.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => bail!("routing result {} already stored", result.id),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(result);
                Ok(())
            }
        }
    }

    async fn get(&self, routing_id: &str) -> Result<Option<RoutingResult>> {
        Ok(self.results.get(routing_id).map(|r| r.value().clone()))
    }

    async fn update(&self, result: RoutingResult) -> Result<()> {
        match self.results.get_mut(&result.id) {
            Some(mut slot) => {
                *slot = result;
                Ok(())
            }
            None => bail!("routing result {} not found", result.id),
        }
    }

    async fn remove(&self, routing_id: &str) -> Result<bool> {
        Ok(self.results.remove(routing_id).is_some())
    }

    async fn list(&self) -> Result<Vec<RoutingResult>> {
        let mut results: Vec<RoutingResult> = self.results.iter().map(|r| r.value().clone()).collect();
        results.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(results)
    }

    async fn clear(&self) -> Result<()> {
        self.results.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fleet_validates_and_orders() {
        let fleet = InMemoryQueueFleet::new();
        fleet.enqueue_customer(Customer::new("Ada", "billing").with_id("c1")).unwrap();
        fleet.enqueue_customer(Customer::new("Cy", "sales").with_id("c2")).unwrap();
        assert!(fleet.enqueue_customer(Customer::new("Dup", "sales").with_id("c1")).is_err());
        assert!(fleet.enqueue_customer(Customer::new("Bad", "sales").with_priority(0)).is_err());
        assert!(fleet.add_agent(Agent::new("Over", ["sales"]).with_workload(4, 3)).is_err());

        let ids: Vec<String> = fleet.list_waiting_customers().await.unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
    }

    #[tokio::test]
    async fn test_remove_and_restore_keep_position() {
        let first = Customer::new("Ada", "billing").with_id("c1");
        let second = Customer::new("Cy", "sales").with_id("c2");
        let third = Customer::new("Dee", "sales").with_id("c3");

        let fleet = InMemoryQueueFleet::from_snapshots(vec![first.clone(), second.clone(), third], vec![]).unwrap();
        let removed_second = fleet.remove_customer("c2").await.unwrap().unwrap();
        assert_eq!(removed_second.customer, second);
        assert!(fleet.remove_customer("c2").await.unwrap().is_none());
        let removed_first = fleet.remove_customer("c1").await.unwrap().unwrap();

        // Restored in reverse removal order, as a rollback would
        fleet.restore_customer(removed_first.clone()).await.unwrap();
        fleet.restore_customer(removed_second).await.unwrap();
        let ids: Vec<String> = fleet.list_waiting_customers().await.unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);

        // Already queued
        fleet.restore_customer(removed_first).await.unwrap();
        assert_eq!(fleet.queue_len(), 3);
    }

    #[tokio::test]
    async fn test_removed_customers_leave_no_bookkeeping() {
        let customers: Vec<Customer> = (0..1000)
            .map(|i| Customer::new(format!("C{i}"), "billing").with_id(format!("c{i}")))
            .collect();
        let fleet = InMemoryQueueFleet::from_snapshots(customers, vec![]).unwrap();

        let mut removed = Vec::new();
        for i in 0..1000 {
            removed.push(fleet.remove_customer(&format!("c{i}")).await.unwrap().unwrap());
        }
        {
            // Exhaustive so any new per-customer state has to be accounted for here
            let Queue { entries, next_seq } = &*fleet.queue.read();
            assert!(entries.is_empty());
            assert_eq!(*next_seq, 1000);
        }

        // A late arrival queues behind a restored early customer
        fleet.enqueue_customer(Customer::new("Late", "sales").with_id("late")).unwrap();
        fleet.restore_customer(removed.swap_remove(10)).await.unwrap();
        let ids: Vec<String> = fleet.list_waiting_customers().await.unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["c10", "late"]);
    }

    #[tokio::test]
    async fn test_agent_updates() {
        let fleet = InMemoryQueueFleet::from_snapshots(vec![], vec![Agent::new("Bob", ["billing"]).with_id("a1")]).unwrap();

        fleet.update_agent_workload("a1", 3).await.unwrap();
        assert!(fleet.list_available_agents().await.unwrap().is_empty());
        assert!(fleet.update_agent_workload("a1", 4).await.is_err());
        assert!(fleet.update_agent_workload("missing", 1).await.is_err());

        fleet.update_agent_workload("a1", 1).await.unwrap();
        fleet.update_agent_status("a1", AgentStatus::Offline).await.unwrap();
        assert!(fleet.list_available_agents().await.unwrap().is_empty());
        assert_eq!(fleet.list_agents().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_result_store_crud() {
        let store = InMemoryResultStore::new();
        let customer = Customer::new("Ada", "billing");
        let agent = Agent::new("Bob", ["billing"]);
        let mut result = RoutingResult::pending(&customer, &agent, 0.7, vec![]);

        store.insert(result.clone()).await.unwrap();
        assert!(store.insert(result.clone()).await.is_err());

        result.routing_score = 0.75;
        store.update(result.clone()).await.unwrap();
        assert_eq!(store.get(&result.id).await.unwrap().unwrap().routing_score, 0.75);

        assert!(store.remove(&result.id).await.unwrap());
        assert!(store.update(result).await.is_err());

        store.insert(RoutingResult::pending(&customer, &agent, 0.5, vec![])).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.is_empty());
    }
}
