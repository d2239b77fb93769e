//! # Cost Calculator
//!
//! Maps conversation records through the price book to produce
//! cost-annotated records. Pure and deterministic: same records plus same
//! book always yield the same output, and inputs are never mutated.

use crate::models::{AppliedPrice, ConversationRecord, CostedConversation};
use crate::pricebook::{PriceBook, Resolution};

const TOKENS_PER_RATE_UNIT: f64 = 1_000_000.0;

/// What unpriced conversations contribute to aggregate views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnpricedPolicy {
    /// Keep them in every aggregate at zero cost, flagged. Default.
    IncludeAsZero,
    /// Drop them from aggregates entirely.
    Exclude,
}

/// Compute costs for every record against the given price book snapshot.
/// Records with a malformed timestamp are unpriceable, never an error.
pub fn calculate_costs(records: &[ConversationRecord], book: &PriceBook) -> Vec<CostedConversation> {
    records
        .iter()
        .map(|record| {
            let applied = record.timestamp.and_then(|ts| match book.resolve(&record.model, ts) {
                Resolution::Dated(v) => Some(AppliedPrice {
                    id: v.id.clone(),
                    input_rate: v.input_rate,
                    output_rate: v.output_rate,
                    currency: v.currency.clone(),
                    effective_at: Some(v.effective_at),
                }),
                Resolution::Legacy(c) => Some(AppliedPrice {
                    id: "legacy".to_string(),
                    input_rate: c.input_rate,
                    output_rate: c.output_rate,
                    currency: c.currency.clone(),
                    effective_at: None,
                }),
                Resolution::Unpriced => None,
            });

            let (input_cost, output_cost) = match &applied {
                Some(p) => (
                    record.input_tokens as f64 / TOKENS_PER_RATE_UNIT * p.input_rate,
                    record.output_tokens as f64 / TOKENS_PER_RATE_UNIT * p.output_rate,
                ),
                None => (0.0, 0.0),
            };

            CostedConversation {
                record: record.clone(),
                input_cost,
                output_cost,
                total_cost: input_cost + output_cost,
                has_pricing: applied.is_some(),
                applied_price: applied,
            }
        })
        .collect()
}

/// Apply the unpriced policy ahead of aggregation.
pub fn apply_policy(costed: Vec<CostedConversation>, policy: UnpricedPolicy) -> Vec<CostedConversation> {
    match policy {
        UnpricedPolicy::IncludeAsZero => costed,
        UnpricedPolicy::Exclude => costed.into_iter().filter(|c| c.has_pricing).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PricingDto;

    fn record(model: &str, input: u64, output: u64, date: &str, time: &str) -> ConversationRecord {
        ConversationRecord {
            id: 1,
            model: model.to_string(),
            input_tokens: input,
            output_tokens: output,
            section: "sec".to_string(),
            system: "sys".to_string(),
            username: None,
            email: None,
            sector: None,
            tools_used: None,
            user_prompt: String::new(),
            agent_response: String::new(),
            date: date.to_string(),
            time: time.to_string(),
            timestamp: crate::utils::parse_wire_timestamp(date, time),
        }
    }

    fn book() -> PriceBook {
        let rows: Vec<PricingDto> = serde_json::from_value(serde_json::json!([
            {"modelo":"gpt-4o","entrada":"0.40","saida":"1.60","moeda":"USD",
             "data":"2025-01-01T00:00:00Z","ID":"v1","ativo":0},
            {"modelo":"gpt-4o","entrada":"0.20","saida":"0.80","moeda":"USD",
             "data":"2025-06-01T00:00:00Z","ID":"v2","ativo":1},
        ]))
        .unwrap();
        PriceBook::from_rows(rows)
    }

    #[test]
    fn cost_formula_per_million_tokens() {
        let recs = vec![record("gpt-4o", 100_000, 50_000, "15/03/25", "12:00:00")];
        let costed = calculate_costs(&recs, &book());
        let c = &costed[0];
        assert!(c.has_pricing);
        assert!((c.input_cost - 0.04).abs() < 1e-12);
        assert!((c.output_cost - 0.08).abs() < 1e-12);
        assert!((c.total_cost - 0.12).abs() < 1e-12);
        assert_eq!(c.applied_price.as_ref().unwrap().id, "v1");
    }

    #[test]
    fn later_conversation_picks_the_newer_version() {
        let recs = vec![record("gpt-4o", 100_000, 50_000, "01/07/25", "00:00:00")];
        let costed = calculate_costs(&recs, &book());
        let c = &costed[0];
        assert!((c.total_cost - 0.06).abs() < 1e-12);
        assert_eq!(c.applied_price.as_ref().unwrap().id, "v2");
    }

    #[test]
    fn malformed_timestamp_is_unpriced_not_an_error() {
        let recs = vec![record("gpt-4o", 1000, 1000, "not-a-date", "99:99")];
        let costed = calculate_costs(&recs, &book());
        let c = &costed[0];
        assert!(!c.has_pricing);
        assert_eq!(c.total_cost, 0.0);
        assert!(c.applied_price.is_none());
    }

    #[test]
    fn repeated_runs_are_identical() {
        let recs = vec![
            record("gpt-4o", 100_000, 50_000, "15/03/25", "12:00:00"),
            record("gpt-4o", 7, 11, "02/06/25", ""),
            record("unknown", 5, 5, "15/03/25", "12:00:00"),
        ];
        let b = book();
        let a = calculate_costs(&recs, &b);
        let c = calculate_costs(&recs, &b);
        assert_eq!(a.len(), c.len());
        for (x, y) in a.iter().zip(&c) {
            assert_eq!(x.total_cost, y.total_cost);
            assert_eq!(x.has_pricing, y.has_pricing);
            assert_eq!(
                x.applied_price.as_ref().map(|p| &p.id),
                y.applied_price.as_ref().map(|p| &p.id)
            );
        }
    }

    #[test]
    fn exclude_policy_drops_unpriced_records() {
        let recs = vec![
            record("gpt-4o", 100_000, 50_000, "15/03/25", "12:00:00"),
            record("unknown", 5, 5, "15/03/25", "12:00:00"),
        ];
        let costed = calculate_costs(&recs, &book());
        assert_eq!(costed.len(), 2);
        let kept = apply_policy(costed.clone(), UnpricedPolicy::Exclude);
        assert_eq!(kept.len(), 1);
        let all = apply_policy(costed, UnpricedPolicy::IncludeAsZero);
        assert_eq!(all.len(), 2);
    }
}
