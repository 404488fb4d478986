//! Terminal rendering of routing outputs

use colored::Colorize;
use qroute_routing_engine::monitoring::{RoutingStatistics, HIGH_CONFIDENCE, MEDIUM_CONFIDENCE};
use qroute_routing_engine::prediction::PredictorInfo;
use qroute_routing_engine::routing::RoutingMatrix;
use qroute_routing_engine::types::{Agent, Customer, RoutingResult};
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct AssignmentRow {
    #[tabled(rename = "Customer")]
    customer: String,
    #[tabled(rename = "Agent")]
    agent: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Reasoning")]
    reasoning: String,
}

impl From<&RoutingResult> for AssignmentRow {
    fn from(result: &RoutingResult) -> Self {
        Self {
            customer: display_name(result.customer_name.as_deref(), &result.customer_id),
            agent: display_name(result.agent_name.as_deref(), &result.agent_id),
            score: format!("{:.3}", result.routing_score),
            reasoning: result.reasoning.join("\n"),
        }
    }
}

fn display_name(name: Option<&str>, id: &str) -> String {
    match name {
        Some(name) => format!("{} ({})", name, id),
        None => id.to_string(),
    }
}

/// Assignments of one pass as a table
pub fn render_assignments(results: &[RoutingResult]) -> String {
    if results.is_empty() {
        return "No assignments".to_string();
    }
    let rows: Vec<AssignmentRow> = results.iter().map(AssignmentRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Customer rows against agent columns
pub fn render_matrix(customers: &[Customer], agents: &[Agent], matrix: &RoutingMatrix) -> String {
    let mut builder = Builder::default();

    let mut header = vec![String::from("Customer")];
    header.extend(agents.iter().map(|agent| agent.name.clone()));
    builder.push_record(header);

    for (customer, row) in customers.iter().zip(matrix.rows()) {
        let mut record = vec![format!("{} (p{})", customer.name, customer.priority)];
        record.extend(row.iter().map(|score| format!("{:.3}", score)));
        builder.push_record(record);
    }

    builder.build().with(Style::rounded()).to_string()
}

pub fn render_statistics(statistics: &RoutingStatistics, unrouted: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "Routing statistics".bold()));
    out.push_str(&format!("  total routings:   {}\n", statistics.total_routings));
    out.push_str(&format!("  average score:    {:.3}\n", statistics.average_score));
    out.push_str(&format!(
        "  high (>= {:.1}):      {}\n",
        HIGH_CONFIDENCE,
        statistics.high_confidence_matches.to_string().green()
    ));
    out.push_str(&format!(
        "  medium (>= {:.1}):    {}\n",
        MEDIUM_CONFIDENCE,
        statistics.medium_confidence_matches.to_string().yellow()
    ));
    out.push_str(&format!(
        "  low:              {}\n",
        statistics.low_confidence_matches.to_string().red()
    ));
    if let Some(spread) = &statistics.score_distribution {
        out.push_str(&format!(
            "  score spread:     min {:.3} / max {:.3} / std {:.3}\n",
            spread.min, spread.max, spread.std
        ));
    }
    out.push_str(&format!("  unrouted:         {}", unrouted));
    out
}

pub fn render_model_info(info: &PredictorInfo) -> String {
    let state = if info.model_loaded {
        "loaded".green()
    } else {
        "rule-based fallback".yellow()
    };
    let mut out = format!(
        "{} {}\n  type:     {}\n  features: {}\n",
        "Predictor".bold(),
        state,
        info.model_type,
        info.feature_count
    );
    for name in &info.features {
        out.push_str(&format!("    - {}\n", name));
    }
    out
}
