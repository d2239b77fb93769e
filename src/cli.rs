use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::path::PathBuf;

use crate::cost::UnpricedPolicy;
use crate::filters::DateFilter;
use crate::report::GroupingMode;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilterArg {
    Today,
    Week,
    Month,
    Year,
    All,
    /// Requires --start and --end (DD/MM/YYYY)
    Custom,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum GroupByArg {
    Section,
    User,
    Sector,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum UnpricedArg {
    /// Keep unpriced conversations in aggregates at zero cost, flagged
    IncludeZero,
    /// Drop unpriced conversations from aggregates
    Exclude,
}

#[derive(clap::Parser, Debug)]
pub struct Args {
    /// Conversation webhook URL
    #[arg(long, env = "COST_CONVERSATIONS_URL")]
    pub conversations_url: Option<String>,

    /// Pricing webhook URL (price-version history)
    #[arg(long, env = "COST_PRICING_URL")]
    pub pricing_url: Option<String>,

    /// Price submission webhook URL
    #[arg(long, env = "COST_SAVE_PRICING_URL")]
    pub save_pricing_url: Option<String>,

    /// Permission webhook URL (advisory role flags)
    #[arg(long, env = "COST_PERMISSIONS_URL")]
    pub permissions_url: Option<String>,

    /// Custom auth header name sent on every webhook request
    #[arg(long, env = "COST_AUTH_HEADER_NAME")]
    pub auth_header_name: Option<String>,

    /// Custom auth header value
    #[arg(long, env = "COST_AUTH_HEADER_VALUE", hide_env_values = true)]
    pub auth_header_value: Option<String>,

    /// Reporting period
    #[arg(long, value_enum, default_value_t = DateFilterArg::All)]
    pub filter: DateFilterArg,

    /// Custom period start, DD/MM/YYYY
    #[arg(long)]
    pub start: Option<String>,

    /// Custom period end, DD/MM/YYYY
    #[arg(long)]
    pub end: Option<String>,

    /// Restrict to one user's conversations (also used for role lookup)
    #[arg(long)]
    pub email: Option<String>,

    /// Display name sent with the role lookup
    #[arg(long)]
    pub name: Option<String>,

    /// Restrict aggregation to one system
    #[arg(long)]
    pub system: Option<String>,

    /// Aggregation mode: section|user|sector
    #[arg(long, value_enum, default_value_t = GroupByArg::Section)]
    pub group_by: GroupByArg,

    /// What unpriced conversations contribute to aggregates
    #[arg(long, value_enum, default_value_t = UnpricedArg::IncludeZero)]
    pub unpriced: UnpricedArg,

    /// Emit JSON instead of colored text
    #[arg(long)]
    pub json: bool,

    /// Export the consolidated workbook under this directory
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Submit a new price version for this model, then exit
    #[arg(long)]
    pub set_price: Option<String>,

    /// New input rate (per 1M tokens), required with --set-price
    #[arg(long)]
    pub input_rate: Option<f64>,

    /// New output rate (per 1M tokens), required with --set-price
    #[arg(long)]
    pub output_rate: Option<f64>,

    /// Currency code for --set-price
    #[arg(long, default_value = "USD")]
    pub currency: String,

    /// Verbose diagnostics (same as RUST_LOG=debug)
    #[arg(long, env = "COST_DEBUG")]
    pub debug: bool,
}

fn parse_ddmmyyyy(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%d/%m/%Y")
        .with_context(|| format!("invalid date '{s}', expected DD/MM/YYYY"))
}

impl Args {
    pub fn parse() -> Self {
        <Args as clap::Parser>::parse()
    }

    pub fn auth_header(&self) -> Option<(String, String)> {
        match (&self.auth_header_name, &self.auth_header_value) {
            (Some(name), Some(value)) if !name.is_empty() => {
                Some((name.clone(), value.clone()))
            }
            _ => None,
        }
    }

    pub fn date_filter(&self) -> Result<DateFilter> {
        Ok(match self.filter {
            DateFilterArg::Today => DateFilter::Today,
            DateFilterArg::Week => DateFilter::Week,
            DateFilterArg::Month => DateFilter::Month,
            DateFilterArg::Year => DateFilter::Year,
            DateFilterArg::All => DateFilter::All,
            DateFilterArg::Custom => {
                let (Some(start), Some(end)) = (&self.start, &self.end) else {
                    bail!("--filter custom requires --start and --end");
                };
                let start = parse_ddmmyyyy(start)?;
                let end = parse_ddmmyyyy(end)?;
                if end < start {
                    bail!("custom period end precedes start");
                }
                DateFilter::Custom { start, end }
            }
        })
    }

    pub fn grouping_mode(&self) -> GroupingMode {
        match self.group_by {
            GroupByArg::Section => GroupingMode::Section,
            GroupByArg::User => GroupingMode::User,
            GroupByArg::Sector => GroupingMode::Sector,
        }
    }

    pub fn unpriced_policy(&self) -> UnpricedPolicy {
        match self.unpriced {
            UnpricedArg::IncludeZero => UnpricedPolicy::IncludeAsZero,
            UnpricedArg::Exclude => UnpricedPolicy::Exclude,
        }
    }
}
