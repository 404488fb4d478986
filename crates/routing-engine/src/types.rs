//! # Routing Data Model
//!
//! Snapshots of the entities the matching engine reasons about: waiting
//! [`Customer`]s, service [`Agent`]s and the [`RoutingResult`]s that an
//! assignment produces. The engine never owns these collections; it is handed
//! snapshots by the queue/fleet collaborator and returns result objects.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, RoutingError};

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_priority() -> u8 {
    5
}

fn default_complexity() -> f64 {
    3.0
}

fn default_max_concurrent() -> u32 {
    3
}

/// Customer sentiment as detected when the customer was enqueued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
}

/// Customer service tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerTier {
    Basic,
    Standard,
    Premium,
}

/// Contact channel the customer arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Chat,
    Voice,
    Phone,
    Email,
}

/// Agent availability status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Agent accepts new conversations
    Available,
    /// Agent is occupied and skipped by routing
    Busy,
    /// Agent is logged out
    Offline,
}

/// Lifecycle state of a routing result
///
/// Transitions are forward-only: `pending -> active -> completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingStatus {
    Pending,
    Active,
    Completed,
}

macro_rules! impl_label {
    ($ty:ty { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $ty {
            /// Lower-case label used in logs and serialized forms
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = RoutingError;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($label => Ok(Self::$variant),)+
                    other => Err(RoutingError::invalid_input(format!(
                        "unknown {} value: {}",
                        stringify!($ty),
                        other
                    ))),
                }
            }
        }
    };
}

impl_label!(Sentiment { Negative => "negative", Neutral => "neutral", Positive => "positive" });
impl_label!(CustomerTier { Basic => "basic", Standard => "standard", Premium => "premium" });
impl_label!(Channel { Chat => "chat", Voice => "voice", Phone => "phone", Email => "email" });
impl_label!(AgentStatus { Available => "available", Busy => "busy", Offline => "offline" });
impl_label!(RoutingStatus { Pending => "pending", Active => "active", Completed => "completed" });

impl RoutingStatus {
    /// Whether moving from `self` to `next` is a legal forward transition
    pub fn can_transition_to(&self, next: RoutingStatus) -> bool {
        matches!(
            (self, next),
            (RoutingStatus::Pending, RoutingStatus::Active)
                | (RoutingStatus::Pending, RoutingStatus::Completed)
                | (RoutingStatus::Active, RoutingStatus::Completed)
        )
    }

    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, RoutingStatus::Completed)
    }
}

/// A customer waiting in the queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default = "new_id")]
    pub id: String,
    pub name: String,
    pub sentiment: Sentiment,
    pub tier: CustomerTier,
    pub issue_type: String,
    /// Issue complexity on a 1.0 - 5.0 scale
    #[serde(default = "default_complexity")]
    pub issue_complexity: f64,
    pub channel: Channel,
    /// Seconds spent waiting since `created_at`
    #[serde(default)]
    pub wait_time: u64,
    /// Priority level 1 - 10, higher is served first
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub context: HashMap<String, serde_json::Value>,
}

impl Customer {
    /// Create a neutral, standard-tier chat customer with default priority
    pub fn new(name: impl Into<String>, issue_type: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            sentiment: Sentiment::Neutral,
            tier: CustomerTier::Standard,
            issue_type: issue_type.into(),
            issue_complexity: default_complexity(),
            channel: Channel::Chat,
            wait_time: 0,
            priority: default_priority(),
            created_at: Utc::now(),
            context: HashMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = sentiment;
        self
    }

    pub fn with_tier(mut self, tier: CustomerTier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_complexity(mut self, issue_complexity: f64) -> Self {
        self.issue_complexity = issue_complexity;
        self
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// Recompute `wait_time` from the enqueue instant
    pub fn refresh_wait_time(&mut self, now: DateTime<Utc>) {
        self.wait_time = now.signed_duration_since(self.created_at).num_seconds().max(0) as u64;
    }

    /// Check the value ranges a queued customer must satisfy
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(RoutingError::invalid_input("customer id cannot be empty"));
        }
        if !(1.0..=5.0).contains(&self.issue_complexity) {
            return Err(RoutingError::invalid_input(format!(
                "customer {}: issue_complexity {} outside [1.0, 5.0]",
                self.id, self.issue_complexity
            )));
        }
        if !(1..=10).contains(&self.priority) {
            return Err(RoutingError::invalid_input(format!(
                "customer {}: priority {} outside [1, 10]",
                self.id, self.priority
            )));
        }
        Ok(())
    }
}

/// A service agent in the fleet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    #[serde(default = "new_id")]
    pub id: String,
    pub name: String,
    /// Issue types the agent specializes in
    #[serde(default)]
    pub specialty: Vec<String>,
    /// Experience in years
    #[serde(default)]
    pub experience: f64,
    /// Average handling time in minutes
    #[serde(default)]
    pub avg_handling_time: f64,
    /// Historical success rate in [0, 1]
    #[serde(default)]
    pub past_success_rate: f64,
    #[serde(default)]
    pub current_workload: u32,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: u32,
    pub status: AgentStatus,
    /// Issue type -> proficiency
    #[serde(default)]
    pub skills: HashMap<String, f64>,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

impl Agent {
    /// Create an idle, available agent with the given specialties
    pub fn new<S: Into<String>>(name: impl Into<String>, specialty: impl IntoIterator<Item = S>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            specialty: specialty.into_iter().map(Into::into).collect(),
            experience: 0.0,
            avg_handling_time: 0.0,
            past_success_rate: 0.5,
            current_workload: 0,
            max_concurrent: default_max_concurrent(),
            status: AgentStatus::Available,
            skills: HashMap::new(),
            last_updated: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_experience(mut self, years: f64) -> Self {
        self.experience = years;
        self
    }

    pub fn with_success_rate(mut self, rate: f64) -> Self {
        self.past_success_rate = rate;
        self
    }

    pub fn with_avg_handling_time(mut self, minutes: f64) -> Self {
        self.avg_handling_time = minutes;
        self
    }

    pub fn with_workload(mut self, current: u32, max: u32) -> Self {
        self.current_workload = current;
        self.max_concurrent = max;
        self
    }

    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_skill(mut self, issue_type: impl Into<String>, proficiency: f64) -> Self {
        self.skills.insert(issue_type.into(), proficiency);
        self
    }

    /// Share of the agent's capacity currently in use
    pub fn workload_ratio(&self) -> f64 {
        f64::from(self.current_workload) / f64::from(self.max_concurrent.max(1))
    }

    /// Conversations the agent can still take before hitting `max_concurrent`
    pub fn remaining_capacity(&self) -> u32 {
        self.max_concurrent.saturating_sub(self.current_workload)
    }

    /// Available and under capacity
    pub fn is_routable(&self) -> bool {
        self.status == AgentStatus::Available && self.current_workload < self.max_concurrent
    }

    /// Check the value ranges and the capacity invariant
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(RoutingError::invalid_input("agent id cannot be empty"));
        }
        if self.max_concurrent < 1 {
            return Err(RoutingError::invalid_input(format!(
                "agent {}: max_concurrent must be at least 1",
                self.id
            )));
        }
        if self.current_workload > self.max_concurrent {
            return Err(RoutingError::invalid_input(format!(
                "agent {}: current_workload {} exceeds max_concurrent {}",
                self.id, self.current_workload, self.max_concurrent
            )));
        }
        if !(0.0..=1.0).contains(&self.past_success_rate) {
            return Err(RoutingError::invalid_input(format!(
                "agent {}: past_success_rate {} outside [0, 1]",
                self.id, self.past_success_rate
            )));
        }
        if !(self.experience >= 0.0) || !(self.avg_handling_time >= 0.0) {
            return Err(RoutingError::invalid_input(format!(
                "agent {}: experience and avg_handling_time must be non-negative",
                self.id
            )));
        }
        Ok(())
    }
}

/// Summary of a finished conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub routing_id: String,
    pub customer_id: String,
    pub agent_id: String,
    pub customer_name: String,
    pub agent_name: String,
    pub channel: Channel,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<f64>,
    pub issue_type: String,
    pub issue_description: String,
    pub resolution_summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub actions_taken: Vec<String>,
    #[serde(default)]
    pub follow_up_required: bool,
    pub follow_up_notes: Option<String>,
}

/// Customer feedback submitted after a completed conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerFeedback {
    #[serde(default = "new_id")]
    pub id: String,
    pub routing_id: String,
    pub customer_id: String,
    pub agent_id: String,
    /// 1 - 5 star ratings
    pub satisfaction_score: u8,
    pub agent_professionalism: u8,
    pub issue_resolution: u8,
    pub wait_time_satisfaction: u8,
    pub would_recommend: bool,
    pub comments: Option<String>,
    #[serde(default = "Utc::now")]
    pub submitted_at: DateTime<Utc>,
}

impl CustomerFeedback {
    /// Check every rating is a 1 - 5 star value
    pub fn validate(&self) -> Result<()> {
        let ratings = [
            ("satisfaction_score", self.satisfaction_score),
            ("agent_professionalism", self.agent_professionalism),
            ("issue_resolution", self.issue_resolution),
            ("wait_time_satisfaction", self.wait_time_satisfaction),
        ];
        for (field, value) in ratings {
            if !(1..=5).contains(&value) {
                return Err(RoutingError::invalid_input(format!(
                    "feedback {field} must be between 1 and 5, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Routing result with score and reasoning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingResult {
    pub id: String,
    pub customer_id: String,
    pub agent_id: String,
    pub customer_name: Option<String>,
    pub agent_name: Option<String>,
    /// Predicted success probability in [0, 1]
    pub routing_score: f64,
    pub reasoning: Vec<String>,
    pub status: RoutingStatus,
    pub timestamp: DateTime<Utc>,
    pub conversation_summary: Option<ConversationSummary>,
    pub customer_feedback: Option<CustomerFeedback>,
    /// Handling time in minutes, known once completed
    pub actual_handling_time: Option<f64>,
    pub success_outcome: Option<bool>,
}

impl RoutingResult {
    /// Create a pending result for a chosen customer/agent pair
    pub fn pending(customer: &Customer, agent: &Agent, routing_score: f64, reasoning: Vec<String>) -> Self {
        Self {
            id: new_id(),
            customer_id: customer.id.clone(),
            agent_id: agent.id.clone(),
            customer_name: Some(customer.name.clone()),
            agent_name: Some(agent.name.clone()),
            routing_score: routing_score.clamp(0.0, 1.0),
            reasoning,
            status: RoutingStatus::Pending,
            timestamp: Utc::now(),
            conversation_summary: None,
            customer_feedback: None,
            actual_handling_time: None,
            success_outcome: None,
        }
    }

    /// Move the result forward in its lifecycle
    pub fn transition(&mut self, next: RoutingStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(RoutingError::InvalidTransition {
                routing_id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

/// Details recorded when a routing is completed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub conversation_summary: Option<ConversationSummary>,
    pub actual_handling_time: Option<f64>,
    pub success_outcome: Option<bool>,
}
