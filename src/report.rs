//! # Aggregation
//!
//! Presentation-layer grouping over costed conversations: by section, user
//! or sector, plus monthly totals and overall summary stats. All functions
//! are pure reads over the costed slice.

use std::collections::{BTreeMap, HashSet};

use crate::models::{ConversationRecord, CostedConversation, RoleFlags};
use crate::utils::month_key;

pub const NO_SECTOR: &str = "Sem Setor";
pub const NO_SYSTEM: &str = "Sem Sistema";
pub const ANONYMOUS_USER: &str = "Anônimo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupingMode {
    Section,
    User,
    Sector,
}

/// One aggregation row: a section, user or sector with its totals.
#[derive(Debug, Clone)]
pub struct Group {
    pub key: String,
    pub conversations: usize,
    pub unique_users: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_cost: f64,
    pub unpriced: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub total_conversations: usize,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub unpriced: usize,
    pub unique_users: usize,
    pub unique_sectors: usize,
}

#[derive(Debug, Clone)]
pub struct MonthlyTotal {
    /// `YYYY-MM`; records with unusable dates are excluded.
    pub month: String,
    pub conversations: usize,
    pub tokens: u64,
    pub cost: f64,
}

/// Pure authorization predicate applied before aggregation. Admin and
/// controladoria roles see everything; anyone else sees only their own
/// records (matched by email, case-insensitive).
pub fn visible_to(record: &ConversationRecord, roles: &RoleFlags, viewer_email: Option<&str>) -> bool {
    if roles.sees_all() {
        return true;
    }
    match (record.email.as_deref(), viewer_email) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

fn group_key(c: &CostedConversation, mode: GroupingMode) -> String {
    match mode {
        GroupingMode::Section => c.record.section.clone(),
        GroupingMode::User => c
            .record
            .username
            .clone()
            .unwrap_or_else(|| ANONYMOUS_USER.to_string()),
        GroupingMode::Sector => c
            .record
            .sector
            .clone()
            .unwrap_or_else(|| NO_SECTOR.to_string()),
    }
}

fn user_key(record: &ConversationRecord) -> Option<String> {
    record
        .email
        .clone()
        .or_else(|| record.username.clone())
        .map(|s| s.to_lowercase())
}

/// Group costed conversations, optionally restricted to one system, sorted
/// by descending group cost (key as deterministic tie-break).
pub fn group_by(
    costed: &[CostedConversation],
    mode: GroupingMode,
    system_filter: Option<&str>,
) -> Vec<Group> {
    let mut buckets: BTreeMap<String, (Vec<&CostedConversation>, HashSet<String>)> =
        BTreeMap::new();
    for c in costed {
        if let Some(sys) = system_filter {
            if c.record.system != sys {
                continue;
            }
        }
        let entry = buckets.entry(group_key(c, mode)).or_default();
        entry.0.push(c);
        if let Some(u) = user_key(&c.record) {
            entry.1.insert(u);
        }
    }

    let mut groups: Vec<Group> = buckets
        .into_iter()
        .map(|(key, (convs, users))| Group {
            key,
            conversations: convs.len(),
            unique_users: users.len(),
            input_tokens: convs.iter().map(|c| c.record.input_tokens).sum(),
            output_tokens: convs.iter().map(|c| c.record.output_tokens).sum(),
            total_cost: convs.iter().map(|c| c.total_cost).sum(),
            unpriced: convs.iter().filter(|c| !c.has_pricing).count(),
        })
        .collect();
    groups.sort_by(|a, b| {
        b.total_cost
            .partial_cmp(&a.total_cost)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });
    groups
}

pub fn summarize(costed: &[CostedConversation]) -> Summary {
    let mut users = HashSet::new();
    let mut sectors = HashSet::new();
    let mut s = Summary::default();
    for c in costed {
        s.total_conversations += 1;
        s.total_tokens += c.record.input_tokens + c.record.output_tokens;
        s.total_cost += c.total_cost;
        if !c.has_pricing {
            s.unpriced += 1;
        }
        if let Some(u) = user_key(&c.record) {
            users.insert(u);
        }
        if let Some(sec) = &c.record.sector {
            sectors.insert(sec.clone());
        }
    }
    s.unique_users = users.len();
    s.unique_sectors = sectors.len();
    s
}

fn monthly_map<'a, I>(convs: I) -> Vec<MonthlyTotal>
where
    I: IntoIterator<Item = &'a CostedConversation>,
{
    let mut map: BTreeMap<String, MonthlyTotal> = BTreeMap::new();
    for c in convs {
        let Some(mk) = month_key(&c.record.date) else {
            continue;
        };
        let entry = map.entry(mk.clone()).or_insert_with(|| MonthlyTotal {
            month: mk,
            conversations: 0,
            tokens: 0,
            cost: 0.0,
        });
        entry.conversations += 1;
        entry.tokens += c.record.input_tokens + c.record.output_tokens;
        entry.cost += c.total_cost;
    }
    map.into_values().collect()
}

/// Overall monthly totals, ascending by month.
pub fn monthly_totals(costed: &[CostedConversation]) -> Vec<MonthlyTotal> {
    monthly_map(costed)
}

/// Monthly totals per system, deterministically ordered by system name.
pub fn monthly_by_system(costed: &[CostedConversation]) -> BTreeMap<String, Vec<MonthlyTotal>> {
    by_key_monthly(costed, |r| {
        if r.system.is_empty() {
            NO_SYSTEM.to_string()
        } else {
            r.system.clone()
        }
    })
}

/// Monthly totals per sector, deterministically ordered by sector name.
pub fn monthly_by_sector(costed: &[CostedConversation]) -> BTreeMap<String, Vec<MonthlyTotal>> {
    by_key_monthly(costed, |r| {
        r.sector.clone().unwrap_or_else(|| NO_SECTOR.to_string())
    })
}

fn by_key_monthly<F>(costed: &[CostedConversation], key: F) -> BTreeMap<String, Vec<MonthlyTotal>>
where
    F: Fn(&ConversationRecord) -> String,
{
    let mut grouped: BTreeMap<String, Vec<&CostedConversation>> = BTreeMap::new();
    for c in costed {
        grouped.entry(key(&c.record)).or_default().push(c);
    }
    grouped
        .into_iter()
        .map(|(k, convs)| (k, monthly_map(convs)))
        .collect()
}

/// Distinct systems present in the data, sorted.
pub fn available_systems(costed: &[CostedConversation]) -> Vec<String> {
    let mut systems: Vec<String> = costed
        .iter()
        .map(|c| {
            if c.record.system.is_empty() {
                NO_SYSTEM.to_string()
            } else {
                c.record.system.clone()
            }
        })
        .collect();
    systems.sort();
    systems.dedup();
    systems
}
