//! Feature encoding for customer/agent pairs
//!
//! Everything here is a pure function of its inputs. Clock-dependent inputs
//! (hour of day, weekday) and queue length travel in an explicit
//! [`FeatureContext`] so that encoding the same pair twice yields the same
//! vector.

use chrono::{Datelike, Local, Timelike};
use serde::{Deserialize, Serialize};

use crate::types::{Agent, Channel, Customer, CustomerTier, Sentiment};

/// Score for an agent that lists the customer's issue type as a specialty
pub const SPECIALTY_DIRECT: f64 = 0.9;
/// Score for an agent with a specialty related to the customer's issue type
pub const SPECIALTY_RELATED: f64 = 0.6;
/// Score for an agent with no declared specialties
pub const SPECIALTY_GENERALIST: f64 = 0.3;
/// Score for an agent whose specialties are unrelated to the issue
pub const SPECIALTY_POOR: f64 = 0.2;

/// Issue types an agent can cover through a neighbouring specialty
///
/// Keyed by the customer's issue type; values are the agent specialties that
/// count as related experience.
const RELATED_SPECIALTIES: &[(&str, &[&str])] = &[
    ("technical_support", &["product_inquiry"]),
    ("billing", &["account_management"]),
    ("sales", &["product_inquiry"]),
    ("account_management", &["billing"]),
    ("product_inquiry", &["technical_support", "sales"]),
    ("complaint_resolution", &["account_management"]),
];

/// Specialties related to `issue_type`, empty when the issue type has none
pub fn related_specialties(issue_type: &str) -> &'static [&'static str] {
    RELATED_SPECIALTIES
        .iter()
        .find(|(issue, _)| *issue == issue_type)
        .map(|(_, related)| *related)
        .unwrap_or(&[])
}

/// negative=0, neutral=1, positive=2
pub fn sentiment_code(sentiment: Sentiment) -> f64 {
    match sentiment {
        Sentiment::Negative => 0.0,
        Sentiment::Neutral => 1.0,
        Sentiment::Positive => 2.0,
    }
}

/// basic=0, standard=1, premium=2
pub fn tier_code(tier: CustomerTier) -> f64 {
    match tier {
        CustomerTier::Basic => 0.0,
        CustomerTier::Standard => 1.0,
        CustomerTier::Premium => 2.0,
    }
}

/// voice=1; every other channel shares chat's code 0
pub fn channel_code(channel: Channel) -> f64 {
    match channel {
        Channel::Voice => 1.0,
        Channel::Chat | Channel::Phone | Channel::Email => 0.0,
    }
}

/// How well the agent's declared specialties cover the customer's issue type
pub fn specialty_match(agent: &Agent, customer: &Customer) -> f64 {
    if agent.specialty.is_empty() {
        return SPECIALTY_GENERALIST;
    }

    if agent.specialty.iter().any(|s| *s == customer.issue_type) {
        return SPECIALTY_DIRECT;
    }

    let related = related_specialties(&customer.issue_type);
    if agent.specialty.iter().any(|s| related.contains(&s.as_str())) {
        return SPECIALTY_RELATED;
    }

    SPECIALTY_POOR
}

/// `current_workload / max(max_concurrent, 1)`
pub fn workload_ratio(agent: &Agent) -> f64 {
    agent.workload_ratio()
}

/// Ambient inputs to the model features that do not belong to either party
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureContext {
    /// Hour of day, 0 - 23
    pub time_of_day: u32,
    /// Weekday, Monday = 0
    pub day_of_week: u32,
    /// Customers waiting in the current pass
    pub queue_length: usize,
}

impl FeatureContext {
    /// Context stamped with the local wall clock
    pub fn now(queue_length: usize) -> Self {
        let now = Local::now();
        Self {
            time_of_day: now.hour(),
            day_of_week: now.weekday().num_days_from_monday(),
            queue_length,
        }
    }

    /// Business hours, 09:00 - 17:59
    pub fn is_peak_hour(&self) -> bool {
        (9..=17).contains(&self.time_of_day)
    }
}

impl Default for FeatureContext {
    fn default() -> Self {
        Self {
            time_of_day: 12,
            day_of_week: 0,
            queue_length: 5,
        }
    }
}

/// Ordered model input for one customer/agent pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    /// Feature names, in vector order
    pub const NAMES: [&'static str; 22] = [
        "customer_sentiment",
        "customer_tier",
        "issue_complexity",
        "channel_type",
        "agent_experience",
        "agent_specialty_match",
        "agent_past_success",
        "agent_avg_handling_time",
        "agent_current_workload",
        "time_of_day",
        "day_of_week",
        "queue_length",
        "text_embedding_similarity",
        "intent_confidence",
        "sentiment_confidence",
        "urgency_score",
        "complexity_text_score",
        "agent_customer_match_score",
        "workload_efficiency_ratio",
        "experience_complexity_ratio",
        "tier_sentiment_interaction",
        "peak_hour_indicator",
    ];

    /// Number of features
    pub const LEN: usize = Self::NAMES.len();

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Look a feature up by name
    pub fn get(&self, name: &str) -> Option<f64> {
        Self::NAMES
            .iter()
            .position(|n| *n == name)
            .and_then(|idx| self.values.get(idx).copied())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Every value is a finite number
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }
}

/// Stateless encoder from a customer/agent pair to a [`FeatureVector`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEncoder;

impl FeatureEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Customer-only part of the vector: sentiment, tier, complexity, channel
    pub fn encode_customer(&self, customer: &Customer) -> [f64; 4] {
        [
            sentiment_code(customer.sentiment),
            tier_code(customer.tier),
            customer.issue_complexity,
            channel_code(customer.channel),
        ]
    }

    /// Full model input for the pair
    pub fn encode(&self, customer: &Customer, agent: &Agent, context: &FeatureContext) -> FeatureVector {
        let [sentiment, tier, complexity, channel] = self.encode_customer(customer);
        let specialty = specialty_match(agent, customer);
        let workload = workload_ratio(agent);

        // Stand-ins for text-derived signals that are not available at routing time
        let text_embedding_similarity = 0.7;
        let intent_confidence = 0.8;

        let sentiment_confidence = if customer.sentiment == Sentiment::Neutral { 0.6 } else { 0.9 };
        let urgency_score = if customer.priority > 7 { 0.3 } else { 0.1 };

        let values = vec![
            sentiment,
            tier,
            complexity,
            channel,
            agent.experience,
            specialty,
            agent.past_success_rate,
            agent.avg_handling_time,
            workload,
            f64::from(context.time_of_day),
            f64::from(context.day_of_week),
            context.queue_length as f64,
            text_embedding_similarity,
            intent_confidence,
            sentiment_confidence,
            urgency_score,
            complexity * intent_confidence,
            specialty * sentiment_confidence * (1.0 - urgency_score),
            agent.past_success_rate / (workload + 0.1),
            agent.experience / (complexity + 0.1),
            tier * sentiment,
            if context.is_peak_hour() { 1.0 } else { 0.0 },
        ];

        FeatureVector { values }
    }
}
