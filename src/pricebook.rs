//! # Price Book
//!
//! Normalizes the raw webhook pricing rows into the per-model version
//! history consumed by cost calculation, and resolves which price version
//! was in force at a given instant.
//!
//! ## Resolution rule
//!
//! The version applied to a conversation is the one with the greatest
//! `effective_at` that is at or before the conversation's timestamp. A price
//! defined after a conversation is never back-applied: a model with dated
//! versions that all start later than the timestamp resolves to nothing.
//! Only a model with no dated history at all falls back to its undated
//! "current" price.

use chrono::{DateTime, Utc};
use log::warn;
use std::collections::HashMap;

use crate::models::{CurrentPrice, PriceVersion, PricingDto};

/// Immutable snapshot of all known pricing. Built once per fetch and
/// replaced wholesale; resolution is a pure read over it.
#[derive(Debug, Default)]
pub struct PriceBook {
    /// Per-model dated versions, ascending by (`effective_at`, `id`).
    versions: HashMap<String, Vec<PriceVersion>>,
    current: HashMap<String, CurrentPrice>,
}

/// Outcome of resolving a model/timestamp pair.
#[derive(Debug)]
pub enum Resolution<'a> {
    /// A dated version was in force at the timestamp.
    Dated(&'a PriceVersion),
    /// The model has no dated history; its undated current price applies.
    Legacy(&'a CurrentPrice),
    /// No applicable price. Surfaced as `has_pricing = false`, never an error.
    Unpriced,
}

// Candidate for the per-model "current" price. Undated rows sort before any
// dated row so they only win when nothing better exists.
struct CurrentCandidate {
    active: bool,
    effective_at: Option<DateTime<Utc>>,
    id: String,
    price: CurrentPrice,
}

fn replaces(new: &CurrentCandidate, prev: &CurrentCandidate) -> bool {
    if new.active != prev.active {
        return new.active;
    }
    if new.effective_at != prev.effective_at {
        return new.effective_at > prev.effective_at;
    }
    new.id > prev.id
}

impl PriceBook {
    pub fn empty() -> Self {
        PriceBook::default()
    }

    /// Build a book from raw webhook rows. Rows without parseable rates are
    /// dropped; rows without a parseable `data` timestamp are undated and
    /// participate only in current-price selection.
    pub fn from_rows(rows: Vec<PricingDto>) -> Self {
        let mut versions: HashMap<String, Vec<PriceVersion>> = HashMap::new();
        let mut current_candidates: HashMap<String, CurrentCandidate> = HashMap::new();

        for row in rows {
            if row.modelo.is_empty() {
                continue;
            }
            let (input_rate, output_rate) = match (row.entrada, row.saida) {
                (Some(i), Some(o)) if i >= 0.0 && o >= 0.0 => (i, o),
                _ => {
                    warn!("dropping price row {} for {}: unparseable rates", row.id, row.modelo);
                    continue;
                }
            };
            let effective_at = DateTime::parse_from_rfc3339(row.data.trim())
                .ok()
                .map(|d| d.with_timezone(&Utc));

            if let Some(at) = effective_at {
                versions.entry(row.modelo.clone()).or_default().push(PriceVersion {
                    model: row.modelo.clone(),
                    input_rate,
                    output_rate,
                    currency: row.moeda.clone(),
                    effective_at: at,
                    id: row.id.clone(),
                    active: row.ativo,
                });
            }

            let candidate = CurrentCandidate {
                active: row.ativo,
                effective_at,
                id: row.id,
                price: CurrentPrice {
                    model: row.modelo.clone(),
                    input_rate,
                    output_rate,
                    currency: row.moeda,
                },
            };
            match current_candidates.get(&row.modelo) {
                Some(prev) if !replaces(&candidate, prev) => {}
                _ => {
                    current_candidates.insert(row.modelo, candidate);
                }
            }
        }

        for (model, list) in versions.iter_mut() {
            list.sort_by(|a, b| {
                a.effective_at
                    .cmp(&b.effective_at)
                    .then_with(|| a.id.cmp(&b.id))
            });
            if list
                .windows(2)
                .any(|w| w[0].effective_at == w[1].effective_at)
            {
                // Upstream does not enforce uniqueness; the highest id wins.
                warn!("model {model} has price versions sharing an effective_at");
            }
        }

        let current = current_candidates
            .into_iter()
            .map(|(model, c)| (model, c.price))
            .collect();

        PriceBook { versions, current }
    }

    /// The price version in force for `model` at `at`.
    pub fn resolve(&self, model: &str, at: DateTime<Utc>) -> Resolution<'_> {
        if let Some(list) = self.versions.get(model) {
            // Sorted ascending, so the last match carries both the greatest
            // effective_at and the greatest id among ties.
            if let Some(v) = list.iter().rev().find(|v| v.effective_at <= at) {
                return Resolution::Dated(v);
            }
            // Dated history exists but starts after `at`: never back-apply.
            return Resolution::Unpriced;
        }
        match self.current.get(model) {
            Some(c) => Resolution::Legacy(c),
            None => Resolution::Unpriced,
        }
    }

    /// The currently active dated version for a model, if any. Used when
    /// submitting a new version to deactivate its predecessor.
    pub fn active_version(&self, model: &str) -> Option<&PriceVersion> {
        self.versions
            .get(model)?
            .iter()
            .rev()
            .find(|v| v.active)
    }

    pub fn current_price(&self, model: &str) -> Option<&CurrentPrice> {
        self.current.get(model)
    }

    pub fn dated_versions(&self, model: &str) -> &[PriceVersion] {
        self.versions.get(model).map_or(&[], Vec::as_slice)
    }

    /// All models with any pricing, sorted.
    pub fn models(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .versions
            .keys()
            .chain(self.current.keys())
            .map(String::as_str)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}
