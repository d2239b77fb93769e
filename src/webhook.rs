//! # Webhook Adapters
//!
//! Blocking HTTP clients for the external collaborators: the conversation
//! source, the pricing source, price submission and the permission service.
//! Transport failures surface as errors; data-quality problems never do.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::filters::DateFilter;
use crate::models::{ConversationDto, ConversationRecord, PriceVersion, PricingDto, RoleFlags};
use crate::pricebook::PriceBook;

const TIMEOUT_SECS: u64 = 15;

/// All webhook responses wrap their payload in a `data` array.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

/// A new price version submission. Every submission creates a new version;
/// when a prior active version exists the request also deactivates it by id.
/// Field names are the upstream wire contract.
#[derive(Debug, Clone, Serialize)]
pub struct NewPriceRequest {
    #[serde(rename = "Modelo")]
    pub model: String,
    #[serde(rename = "Entrada")]
    pub input_rate: String,
    #[serde(rename = "Saída")]
    pub output_rate: String,
    #[serde(rename = "Moeda")]
    pub currency: String,
    #[serde(rename = "DataHora")]
    pub effective_at: String,
    #[serde(rename = "Ativo")]
    pub active: u8,
    #[serde(rename = "ModeloAnteriorID", skip_serializing_if = "Option::is_none")]
    pub previous_version_id: Option<String>,
    #[serde(rename = "ModeloAnteriorAtivo", skip_serializing_if = "Option::is_none")]
    pub previous_version_active: Option<u8>,
}

/// Build a submission for `model`, chaining deactivation of the previous
/// active version when one exists.
pub fn build_submission(
    model: &str,
    input_rate: f64,
    output_rate: f64,
    currency: &str,
    now: DateTime<Utc>,
    previous_active: Option<&PriceVersion>,
) -> NewPriceRequest {
    NewPriceRequest {
        model: model.to_string(),
        input_rate: input_rate.to_string(),
        output_rate: output_rate.to_string(),
        currency: currency.to_string(),
        effective_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        active: 1,
        previous_version_id: previous_active.map(|v| v.id.clone()),
        previous_version_active: previous_active.map(|_| 0),
    }
}

pub struct WebhookClient {
    agent: ureq::Agent,
    /// Optional custom auth header (name, value) sent on every request.
    auth: Option<(String, String)>,
}

impl WebhookClient {
    pub fn new(auth: Option<(String, String)>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_read(Duration::from_secs(TIMEOUT_SECS))
            .timeout_write(Duration::from_secs(TIMEOUT_SECS))
            .build();
        WebhookClient { agent, auth }
    }

    fn apply_auth(&self, req: ureq::Request) -> ureq::Request {
        match &self.auth {
            Some((name, value)) => req.set(name, value),
            None => req,
        }
    }

    /// Fetch conversations for the given period, optionally restricted to
    /// one user's email (server-side filter).
    pub fn fetch_conversations(
        &self,
        url: &str,
        filter: &DateFilter,
        email: Option<&str>,
        today: NaiveDate,
    ) -> Result<Vec<ConversationRecord>> {
        let sql = filter.sql_query(today);
        debug!("fetching conversations ({filter:?})");
        let mut req = self
            .apply_auth(self.agent.get(url))
            .query("query", &sql);
        if let Some(email) = email {
            req = req.query("email", email);
        }
        let envelope: DataEnvelope<ConversationDto> = req
            .call()
            .context("conversation webhook request failed")?
            .into_json()
            .context("malformed conversation webhook response")?;

        let records: Vec<ConversationRecord> = envelope
            .data
            .into_iter()
            .map(ConversationRecord::from)
            .collect();
        let unparsed = records.iter().filter(|r| r.timestamp.is_none()).count();
        if unparsed > 0 {
            warn!("{unparsed} conversation(s) carry an unparseable date/time and will be unpriced");
        }
        debug!("fetched {} conversation(s)", records.len());
        Ok(records)
    }

    /// Fetch the full price-version history and normalize it into a book.
    pub fn fetch_pricing(&self, url: &str) -> Result<PriceBook> {
        debug!("fetching price history");
        let envelope: DataEnvelope<PricingDto> = self
            .apply_auth(self.agent.get(url))
            .call()
            .context("pricing webhook request failed")?
            .into_json()
            .context("malformed pricing webhook response")?;
        debug!("fetched {} price row(s)", envelope.data.len());
        Ok(PriceBook::from_rows(envelope.data))
    }

    /// Submit a new price version. The upstream creates a version record;
    /// it never mutates an existing one.
    pub fn submit_price(&self, url: &str, request: &NewPriceRequest) -> Result<()> {
        debug!("submitting price version for {}", request.model);
        self.apply_auth(self.agent.post(url))
            .send_json(
                serde_json::to_value(request).context("serialize price submission")?,
            )
            .context("price submission request failed")?;
        Ok(())
    }

    /// Fetch advisory role flags for an authenticated user.
    pub fn fetch_roles(&self, url: &str, name: Option<&str>, email: &str) -> Result<RoleFlags> {
        debug!("fetching role flags for {email}");
        let roles: RoleFlags = self
            .apply_auth(self.agent.post(url))
            .send_json(serde_json::json!({ "nome": name, "email": email }))
            .context("permission webhook request failed")?
            .into_json()
            .context("malformed permission webhook response")?;
        Ok(roles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn submission_carries_wire_field_names() {
        let now = Utc.with_ymd_and_hms(2025, 8, 21, 3, 0, 0).unwrap();
        let prev = PriceVersion {
            model: "gpt-4o".to_string(),
            input_rate: 0.40,
            output_rate: 1.60,
            currency: "USD".to_string(),
            effective_at: now,
            id: "41".to_string(),
            active: true,
        };
        let req = build_submission("gpt-4o", 0.20, 0.80, "USD", now, Some(&prev));
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["Modelo"], "gpt-4o");
        assert_eq!(v["Entrada"], "0.2");
        assert_eq!(v["Saída"], "0.8");
        assert_eq!(v["Moeda"], "USD");
        assert_eq!(v["Ativo"], 1);
        assert_eq!(v["DataHora"], "2025-08-21T03:00:00.000Z");
        assert_eq!(v["ModeloAnteriorID"], "41");
        assert_eq!(v["ModeloAnteriorAtivo"], 0);
    }

    #[test]
    fn first_submission_omits_predecessor_fields() {
        let now = Utc.with_ymd_and_hms(2025, 8, 21, 3, 0, 0).unwrap();
        let req = build_submission("new-model", 1.0, 2.0, "USD", now, None);
        let v = serde_json::to_value(&req).unwrap();
        assert!(v.get("ModeloAnteriorID").is_none());
        assert!(v.get("ModeloAnteriorAtivo").is_none());
    }
}
