//! # LLM Cost Report
//!
//! Cost reporting over LLM conversation logs fetched from webhook-backed
//! data sources. Applies time-versioned per-model pricing to each
//! conversation and produces aggregated views (by section, user, sector,
//! month) with spreadsheet-style export.
//!
//! ## How pricing works
//!
//! Each model carries a history of dated price versions. A conversation is
//! charged at the version with the greatest `effective_at` at or before its
//! timestamp; a price defined after a conversation is never back-applied.
//! Models with no dated history fall back to their undated "current" price.
//! Conversations with no applicable price are surfaced as unpriced, never
//! as errors.
//!
//! ## Features
//!
//! - `colors` (default): colored terminal output via owo-colors

/// Command-line argument parsing and configuration
pub mod cli;

/// Cost calculation over conversation records
pub mod cost;

/// Display formatting for text and JSON output
pub mod display;

/// Consolidated workbook export (CSV sheets)
pub mod export;

/// Date filters and the conversation-source SQL contract
pub mod filters;

/// Data models: conversations, price versions, costed records, role flags
pub mod models;

/// Price history normalization and version resolution
pub mod pricebook;

/// Aggregation: grouping, monthly totals, summary stats
pub mod report;

/// Snapshot store with stale-response sequencing
pub mod snapshot;

/// Utility functions for wire timestamps and formatting
pub mod utils;

/// HTTP adapters for the webhook collaborators
pub mod webhook;
