use chrono::{DateTime, Utc};

use super::conversation::ConversationRecord;

/// The price actually applied to a conversation.
#[derive(Debug, Clone)]
pub struct AppliedPrice {
    /// Version record id, or `"legacy"` for the undated current-price fallback.
    pub id: String,
    pub input_rate: f64,
    pub output_rate: f64,
    pub currency: String,
    /// `None` for the legacy fallback.
    pub effective_at: Option<DateTime<Utc>>,
}

/// A conversation record enriched with its resolved price and computed cost.
/// Derived data, recomputed in full whenever conversations or price history
/// change; never persisted.
#[derive(Debug, Clone)]
pub struct CostedConversation {
    pub record: ConversationRecord,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
    /// False when no price version applied at the conversation's timestamp.
    /// A normal, surfaced state rather than an error.
    pub has_pricing: bool,
    pub applied_price: Option<AppliedPrice>,
}
