//! Human-readable explanation of an assignment

use crate::prediction::features::specialty_match;
use crate::types::{Agent, Customer, CustomerTier, Sentiment};

/// Builds the ordered reasoning tags attached to a routing result
#[derive(Debug, Clone, Copy, Default)]
pub struct ReasoningGenerator;

impl ReasoningGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Tags in fixed order: score, specialty, experience, workload, then the
    /// optional tier and sentiment notes
    pub fn generate(&self, customer: &Customer, agent: &Agent, score: f64) -> Vec<String> {
        let mut reasoning = Vec::with_capacity(6);

        reasoning.push(
            if score >= 0.8 {
                "Excellent match - high success probability"
            } else if score >= 0.6 {
                "Good match - moderate success probability"
            } else {
                "Fair match - lower success probability"
            }
            .to_string(),
        );

        let specialty = specialty_match(agent, customer);
        let issue = &customer.issue_type;
        reasoning.push(if specialty >= 0.8 {
            format!("Agent specializes in {issue}")
        } else if specialty >= 0.5 {
            format!("Agent has related experience with {issue}")
        } else {
            format!("Agent has limited experience with {issue}")
        });

        let years = agent.experience;
        reasoning.push(if years >= 5.0 {
            format!("Highly experienced agent ({years:.1} years)")
        } else if years >= 2.0 {
            format!("Experienced agent ({years:.1} years)")
        } else {
            format!("Junior agent ({years:.1} years)")
        });

        let ratio = agent.workload_ratio();
        reasoning.push(
            if ratio <= 0.3 {
                "Agent has light workload"
            } else if ratio <= 0.7 {
                "Agent has moderate workload"
            } else {
                "Agent is busy but available"
            }
            .to_string(),
        );

        if customer.tier == CustomerTier::Premium {
            reasoning.push("Premium customer - prioritized routing".to_string());
        }

        match customer.sentiment {
            Sentiment::Negative => reasoning.push("Negative sentiment - needs experienced handling".to_string()),
            Sentiment::Positive => reasoning.push("Positive sentiment - good interaction expected".to_string()),
            Sentiment::Neutral => {}
        }

        reasoning
    }
}
