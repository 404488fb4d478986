//! Integration tests for the routing service
//!
//! These tests drive complete routing passes against the in-memory queue,
//! fleet and result store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use qroute_routing_engine::prelude::*;

fn build_service(customers: Vec<Customer>, agents: Vec<Agent>) -> (Arc<RoutingService>, Arc<InMemoryQueueFleet>) {
    let fleet = Arc::new(InMemoryQueueFleet::from_snapshots(customers, agents).expect("valid snapshots"));
    let store = Arc::new(InMemoryResultStore::new());
    let service = RoutingService::new(&EngineConfig::default(), fleet.clone(), store);
    (Arc::new(service), fleet)
}

async fn agent_state(fleet: &InMemoryQueueFleet) -> Vec<(String, u32, AgentStatus)> {
    fleet
        .list_agents()
        .await
        .unwrap()
        .into_iter()
        .map(|a| (a.id, a.current_workload, a.status))
        .collect()
}

async fn queue_ids(fleet: &InMemoryQueueFleet) -> Vec<String> {
    fleet
        .list_waiting_customers()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect()
}

#[tokio::test]
async fn test_empty_inputs_return_no_results() {
    let customers = vec![Customer::new("Ada", "billing")];
    let agents = vec![Agent::new("Bob", ["billing"])];
    let (service, _) = build_service(customers.clone(), agents.clone());

    assert!(service.route_customers(&[], &agents).await.unwrap().is_empty());
    assert!(service.route_customers(&customers, &[]).await.unwrap().is_empty());
    assert!(service.routing_results().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_high_priority_customer_gets_the_only_agent() {
    let (service, fleet) = build_service(
        vec![
            Customer::new("B", "billing").with_id("low").with_priority(2),
            Customer::new("A", "billing").with_id("high").with_priority(9),
        ],
        vec![Agent::new("Bob", ["billing"]).with_id("a1")],
    );

    let report = service.auto_route().await.unwrap();
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].customer_id, "high");
    assert_eq!(report.results[0].status, RoutingStatus::Active);
    assert_eq!(queue_ids(&fleet).await, vec!["low"]);
}

#[tokio::test]
async fn test_near_equal_scores_pick_less_loaded_agent() {
    // The busier agent scores 0.01 higher (better success rate, 1/10 load)
    let (service, _) = build_service(
        vec![Customer::new("Ada", "billing").with_id("c1")],
        vec![
            Agent::new("Busy", ["billing"]).with_id("busy").with_success_rate(0.6).with_workload(1, 10),
            Agent::new("Idle", ["billing"]).with_id("idle").with_success_rate(0.5).with_workload(0, 10),
        ],
    );

    let report = service.auto_route().await.unwrap();
    assert_eq!(report.results[0].agent_id, "idle");
}

#[tokio::test]
async fn test_agent_at_capacity_drops_out_of_later_passes() {
    let (service, fleet) = build_service(vec![], vec![Agent::new("Bob", ["billing"]).with_id("a1").with_workload(0, 2)]);

    for round in 0..2 {
        fleet
            .enqueue_customer(Customer::new("C", "billing").with_id(format!("c{round}")))
            .unwrap();
        let report = service.auto_route().await.unwrap();
        assert_eq!(report.results.len(), 1);
    }

    assert!(fleet.list_available_agents().await.unwrap().is_empty());

    fleet.enqueue_customer(Customer::new("C", "billing").with_id("c2")).unwrap();
    let report = service.auto_route().await.unwrap();
    assert!(report.results.is_empty());
    assert_eq!(report.unrouted_customers, 1);
    assert_eq!(agent_state(&fleet).await[0].1, 2);
}

#[tokio::test]
async fn test_one_new_assignment_per_agent_per_pass() {
    let (service, fleet) = build_service(
        (0..3).map(|i| Customer::new("C", "billing").with_id(format!("c{i}"))).collect(),
        vec![Agent::new("Bob", ["billing"]).with_id("a1").with_workload(0, 3)],
    );

    assert_eq!(service.auto_route().await.unwrap().results.len(), 1);
    assert_eq!(service.auto_route().await.unwrap().results.len(), 1);
    assert_eq!(agent_state(&fleet).await[0].1, 2);
}

#[tokio::test]
async fn test_reset_is_idempotent() {
    let (service, fleet) = build_service(
        (0..4).map(|i| Customer::new("C", "sales").with_id(format!("c{i}"))).collect(),
        vec![
            Agent::new("Bob", ["sales"]).with_id("a1"),
            Agent::new("Cy", ["billing"]).with_id("a2").with_status(AgentStatus::Offline),
        ],
    );
    service.auto_route().await.unwrap();
    assert!(!service.routing_results().await.unwrap().is_empty());

    service.reset().await.unwrap();
    let once = agent_state(&fleet).await;
    let results_once = service.routing_results().await.unwrap();

    service.reset().await.unwrap();
    assert_eq!(agent_state(&fleet).await, once);
    assert_eq!(service.routing_results().await.unwrap(), results_once);

    assert!(results_once.is_empty());
    assert!(once.iter().all(|(_, load, status)| *load == 0 && *status == AgentStatus::Available));
}

/// Result store that refuses the n-th insert
struct FlakyStore {
    inner: InMemoryResultStore,
    inserts: AtomicUsize,
    fail_on: usize,
}

#[async_trait]
impl ResultStore for FlakyStore {
    async fn insert(&self, result: RoutingResult) -> anyhow::Result<()> {
        if self.inserts.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on {
            bail!("disk full");
        }
        self.inner.insert(result).await
    }

    async fn get(&self, routing_id: &str) -> anyhow::Result<Option<RoutingResult>> {
        self.inner.get(routing_id).await
    }

    async fn update(&self, result: RoutingResult) -> anyhow::Result<()> {
        self.inner.update(result).await
    }

    async fn remove(&self, routing_id: &str) -> anyhow::Result<bool> {
        self.inner.remove(routing_id).await
    }

    async fn list(&self) -> anyhow::Result<Vec<RoutingResult>> {
        self.inner.list().await
    }

    async fn clear(&self) -> anyhow::Result<()> {
        self.inner.clear().await
    }
}

#[tokio::test]
async fn test_failed_persistence_rolls_back_the_whole_pass() {
    let fleet = Arc::new(
        InMemoryQueueFleet::from_snapshots(
            (0..3).map(|i| Customer::new("C", "billing").with_id(format!("c{i}"))).collect(),
            (0..3)
                .map(|i| Agent::new("A", ["billing"]).with_id(format!("a{i}")).with_workload(1, 3))
                .collect(),
        )
        .unwrap(),
    );
    let store = Arc::new(FlakyStore {
        inner: InMemoryResultStore::new(),
        inserts: AtomicUsize::new(0),
        fail_on: 3,
    });
    let service = RoutingService::new(&EngineConfig::default(), fleet.clone(), store.clone());

    let agents_before = agent_state(&fleet).await;
    let queue_before = queue_ids(&fleet).await;

    let err = service.auto_route().await.unwrap_err();
    assert!(matches!(err, RoutingError::CommitFailed { rolled_back: true, .. }));

    assert_eq!(agent_state(&fleet).await, agents_before);
    assert_eq!(queue_ids(&fleet).await, queue_before);
    assert!(store.inner.is_empty());

    // The next pass goes through once the store recovers
    let report = service.auto_route().await.unwrap();
    assert_eq!(report.results.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_passes_never_overcommit() {
    let (service, fleet) = build_service(
        (0..12).map(|i| Customer::new("C", "billing").with_id(format!("c{i}"))).collect(),
        vec![Agent::new("Bob", ["billing"]).with_id("a1").with_workload(0, 3)],
    );

    let mut handles = Vec::new();
    for _ in 0..10 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move { service.auto_route().await }));
    }

    let mut routed = 0;
    for handle in handles {
        routed += handle.await.unwrap().unwrap().results.len();
    }

    assert_eq!(routed, 3);
    assert_eq!(agent_state(&fleet).await[0].1, 3);
    assert_eq!(fleet.queue_len(), 9);
}

#[tokio::test]
async fn test_stale_snapshot_cannot_exceed_capacity() {
    let (service, fleet) = build_service(
        vec![Customer::new("Ada", "billing").with_id("c1")],
        vec![Agent::new("Bob", ["billing"]).with_id("a1").with_workload(0, 1)],
    );
    let stale_agents = fleet.list_agents().await.unwrap();
    let customers = fleet.list_waiting_customers().await.unwrap();

    service.set_agent_workload("a1", 1).await.unwrap();
    let err = service.route_customers(&customers, &stale_agents).await.unwrap_err();
    assert!(matches!(err, RoutingError::CommitFailed { rolled_back: true, .. }));
    assert_eq!(agent_state(&fleet).await[0].1, 1);
    assert_eq!(queue_ids(&fleet).await, vec!["c1"]);
}

#[tokio::test]
async fn test_manual_route_rejections_leave_state_untouched() {
    let (service, fleet) = build_service(
        vec![Customer::new("Ada", "billing").with_id("c1")],
        vec![
            Agent::new("Busy", ["billing"]).with_id("busy").with_status(AgentStatus::Busy),
            Agent::new("Full", ["billing"]).with_id("full").with_workload(3, 3),
            Agent::new("Free", ["billing"]).with_id("free"),
        ],
    );
    let agents_before = agent_state(&fleet).await;

    assert!(matches!(
        service.manual_route("nobody", "free", "vip").await,
        Err(RoutingError::CustomerNotFound(_))
    ));
    assert!(matches!(
        service.manual_route("c1", "ghost", "vip").await,
        Err(RoutingError::AgentNotFound(_))
    ));
    assert!(matches!(
        service.manual_route("c1", "busy", "vip").await,
        Err(RoutingError::AgentUnavailable { status: AgentStatus::Busy, .. })
    ));
    assert!(matches!(
        service.manual_route("c1", "full", "vip").await,
        Err(RoutingError::AgentAtCapacity { .. })
    ));

    assert_eq!(agent_state(&fleet).await, agents_before);
    assert_eq!(queue_ids(&fleet).await, vec!["c1"]);
    assert!(service.routing_results().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_manual_route_commits_through_the_accountant() {
    let customer = Customer::new("Ada", "billing").with_id("c1");
    let agent = Agent::new("Bob", ["sales"]).with_id("a1");
    let (service, fleet) = build_service(vec![customer.clone()], vec![agent.clone()]);

    let result = service.manual_route("c1", "a1", "Customer asked for Bob").await.unwrap();
    assert_eq!(result.status, RoutingStatus::Active);
    assert_eq!(result.reasoning, vec!["Customer asked for Bob"]);
    assert_eq!(result.routing_score, RuleBasedFallbackPredictor::new().predict(&customer, &agent));

    assert_eq!(agent_state(&fleet).await[0].1, 1);
    assert!(queue_ids(&fleet).await.is_empty());
}

#[tokio::test]
async fn test_completion_and_feedback_lifecycle() {
    let (service, fleet) = build_service(
        vec![
            Customer::new("Ada", "billing").with_id("c1"),
            Customer::new("Cy", "sales").with_id("c2"),
        ],
        vec![
            Agent::new("Bob", ["billing"]).with_id("a1"),
            Agent::new("Dee", ["sales"]).with_id("a2"),
        ],
    );

    let report = service.auto_route().await.unwrap();
    assert_eq!(report.results.len(), 2);
    let first = report.results[0].id.clone();

    let outcome = CompletionOutcome {
        actual_handling_time: Some(12.0),
        success_outcome: Some(true),
        ..Default::default()
    };
    let done = service.complete_routing(&first, outcome).await.unwrap();
    assert_eq!(done.status, RoutingStatus::Completed);
    assert!(service.complete_routing(&first, CompletionOutcome::default()).await.is_err());
    assert!(matches!(
        service.complete_routing("missing", CompletionOutcome::default()).await,
        Err(RoutingError::RoutingResultNotFound(_))
    ));

    assert_eq!(service.complete_all_active().await.unwrap(), 1);
    assert_eq!(service.complete_all_active().await.unwrap(), 0);
    assert!(agent_state(&fleet).await.iter().all(|(_, load, _)| *load == 0));

    let feedback = CustomerFeedback {
        id: "f1".to_string(),
        routing_id: first.clone(),
        customer_id: done.customer_id.clone(),
        agent_id: done.agent_id.clone(),
        satisfaction_score: 4,
        agent_professionalism: 5,
        issue_resolution: 4,
        wait_time_satisfaction: 3,
        would_recommend: true,
        comments: Some("quick".to_string()),
        submitted_at: Utc::now(),
    };
    let with_feedback = service.submit_feedback(&first, feedback).await.unwrap();
    assert!(with_feedback.customer_feedback.is_some());

    let stats = service.get_routing_statistics().await.unwrap();
    assert_eq!(stats.total_routings, 2);
}

struct BrokenModel;

impl ScoringModel for BrokenModel {
    fn name(&self) -> &str {
        "broken"
    }

    fn score(&self, _features: &FeatureVector) -> anyhow::Result<f64> {
        bail!("weights missing")
    }
}

#[tokio::test]
async fn test_model_failure_falls_back_without_aborting_the_pass() {
    let customer = Customer::new("Ada", "billing").with_id("c1");
    let agent = Agent::new("Bob", ["billing"]).with_id("a1").with_experience(3.0);
    let fleet = Arc::new(InMemoryQueueFleet::from_snapshots(vec![customer.clone()], vec![agent.clone()]).unwrap());
    let service = RoutingService::with_predictor(
        ScorePredictor::with_model(Arc::new(BrokenModel), Duration::from_millis(100)),
        &RoutingConfig::default(),
        fleet,
        Arc::new(InMemoryResultStore::new()),
    );

    let info = service.model_info();
    assert!(info.model_loaded);
    assert_eq!(info.model_type, "broken");

    let report = service.auto_route().await.unwrap();
    assert_eq!(report.results.len(), 1);
    assert_eq!(
        report.results[0].routing_score,
        RuleBasedFallbackPredictor::new().predict(&customer, &agent)
    );
}
