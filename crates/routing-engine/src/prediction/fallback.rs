//! Rule-based success score used whenever no scoring model is available
//!
//! The formula is applied in a fixed order and must stay bit-reproducible:
//! reordering the terms changes the floating point result.

use crate::types::{Agent, Customer, CustomerTier, Sentiment};

use super::features::{specialty_match, workload_ratio};

/// Starting point before any adjustment
pub const BASE_SCORE: f64 = 0.5;
/// Lower clamp of the fallback score
pub const MIN_SCORE: f64 = 0.1;
/// Upper clamp of the fallback score
pub const MAX_SCORE: f64 = 0.9;

fn sentiment_bonus(sentiment: Sentiment) -> f64 {
    match sentiment {
        Sentiment::Negative => -0.2,
        Sentiment::Neutral => 0.0,
        Sentiment::Positive => 0.1,
    }
}

fn tier_bonus(tier: CustomerTier) -> f64 {
    match tier {
        CustomerTier::Basic => -0.05,
        CustomerTier::Standard => 0.0,
        CustomerTier::Premium => 0.1,
    }
}

/// Deterministic heuristic predictor
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedFallbackPredictor;

impl RuleBasedFallbackPredictor {
    pub fn new() -> Self {
        Self
    }

    /// Success score for the pair, clamped to [0.1, 0.9]
    pub fn predict(&self, customer: &Customer, agent: &Agent) -> f64 {
        let mut score = BASE_SCORE;

        score += sentiment_bonus(customer.sentiment);
        score += tier_bonus(customer.tier);

        // Complexity 1-5 normalised to 0-1
        let normalized_complexity = (customer.issue_complexity - 1.0) / 4.0;
        score -= normalized_complexity * 0.3;

        score += specialty_match(agent, customer) * 0.4;

        // Diminishing returns after four years
        score += (agent.experience * 0.05).min(0.2);

        score += (agent.past_success_rate - 0.5) * 0.3;

        score -= workload_ratio(agent) * 0.2;

        score.clamp(MIN_SCORE, MAX_SCORE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::types::{AgentStatus, Channel};

    #[test]
    fn test_reference_scenario() {
        let customer = Customer::new("Ada", "billing")
            .with_sentiment(Sentiment::Negative)
            .with_tier(CustomerTier::Premium)
            .with_complexity(4.0);
        let agent = Agent::new("Bob", ["billing"])
            .with_experience(5.0)
            .with_success_rate(0.9)
            .with_workload(0, 3);

        // 0.5 - 0.2 + 0.1 - 0.225 + 0.36 + 0.2 + 0.12 - 0
        let score = RuleBasedFallbackPredictor::new().predict(&customer, &agent);
        assert!((score - 0.855).abs() < 1e-6, "score was {}", score);
    }

    #[test]
    fn test_clamps_to_upper_bound() {
        let customer = Customer::new("Ada", "sales")
            .with_sentiment(Sentiment::Positive)
            .with_tier(CustomerTier::Premium)
            .with_complexity(1.0);
        let agent = Agent::new("Bob", ["sales"]).with_experience(10.0).with_success_rate(1.0);

        assert_eq!(RuleBasedFallbackPredictor::new().predict(&customer, &agent), MAX_SCORE);
    }

    #[test]
    fn test_clamps_to_lower_bound() {
        let customer = Customer::new("Ada", "billing")
            .with_sentiment(Sentiment::Negative)
            .with_tier(CustomerTier::Basic)
            .with_complexity(5.0);
        let agent = Agent::new("Bob", ["sales"]).with_success_rate(0.0).with_workload(3, 3);

        assert_eq!(RuleBasedFallbackPredictor::new().predict(&customer, &agent), MIN_SCORE);
    }

    #[test]
    fn test_workload_and_experience_terms() {
        let customer = Customer::new("Ada", "billing");
        let idle = Agent::new("Bob", ["billing"]).with_workload(0, 4);
        let loaded = idle.clone().with_workload(2, 4);
        let predictor = RuleBasedFallbackPredictor::new();

        // Half the capacity in use costs 0.1
        let delta = predictor.predict(&customer, &idle) - predictor.predict(&customer, &loaded);
        assert!((delta - 0.1).abs() < 1e-9);

        // Experience bonus saturates at 0.2
        let hard = customer.clone().with_complexity(5.0);
        let veteran = idle.clone().with_experience(4.0);
        let elder = idle.clone().with_experience(20.0);
        let veteran_score = predictor.predict(&hard, &veteran);
        assert!(veteran_score < MAX_SCORE);
        assert_eq!(veteran_score, predictor.predict(&hard, &elder));
    }

    #[test]
    fn test_status_and_channel_do_not_affect_score() {
        let predictor = RuleBasedFallbackPredictor::new();
        let customer = Customer::new("Ada", "billing");
        let agent = Agent::new("Bob", ["billing"]);

        let voice = customer.clone().with_channel(Channel::Voice);
        let busy = agent.clone().with_status(AgentStatus::Busy);
        assert_eq!(predictor.predict(&customer, &agent), predictor.predict(&voice, &busy));
    }
}
