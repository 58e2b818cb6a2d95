//! Cross-site click-delta analysis over the configured flows.
//!
//! Click counts are a static property of configuration: the number of
//! `click` steps a flow declares, not what actually ran.

use std::collections::HashMap;

use serde::Serialize;

use crate::config::{FlowStep, SitesConfig};

/// Browse flows make no consent choice, so they have no click cost to
/// compare.
const BROWSE_FLOW: &str = "browse";

const ACCEPT_FLOW: &str = "accept";
const REJECT_FLOW: &str = "reject";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClickDelta {
    pub url: String,
    /// Reject-flow clicks minus accept-flow clicks.
    pub delta: i64,
}

/// Count the configured `click` steps per (url, flow_type).
pub fn click_counts(config: &SitesConfig) -> HashMap<String, HashMap<String, i64>> {
    let mut counts: HashMap<String, HashMap<String, i64>> = HashMap::new();
    for site in &config.sites {
        if site.flow_type == BROWSE_FLOW {
            continue;
        }
        let clicks = site
            .flow
            .iter()
            .filter(|step| matches!(step, FlowStep::Click { .. }))
            .count() as i64;
        counts
            .entry(site.url.clone())
            .or_default()
            .insert(site.flow_type.clone(), clicks);
    }
    counts
}

/// Per-url reject − accept deltas, ascending by delta.
///
/// Urls without both an accept and a reject entry are incomplete and are
/// dropped entirely, not zero-filled.
pub fn click_deltas(counts: &HashMap<String, HashMap<String, i64>>) -> Vec<ClickDelta> {
    let mut deltas: Vec<ClickDelta> = counts
        .iter()
        .filter(|(_, flows)| flows.len() >= 2)
        .filter_map(|(url, flows)| {
            let accept = flows.get(ACCEPT_FLOW)?;
            let reject = flows.get(REJECT_FLOW)?;
            Some(ClickDelta {
                url: url.clone(),
                delta: reject - accept,
            })
        })
        .collect();
    deltas.sort_by(|a, b| a.delta.cmp(&b.delta).then_with(|| a.url.cmp(&b.url)));
    deltas
}

/// Percentage of result urls per distinct delta value, nearest integer,
/// ordered by delta.
pub fn delta_frequencies(deltas: &[ClickDelta]) -> Vec<(i64, i64)> {
    if deltas.is_empty() {
        return Vec::new();
    }
    let mut freq: HashMap<i64, usize> = HashMap::new();
    for d in deltas {
        *freq.entry(d.delta).or_default() += 1;
    }
    let mut table: Vec<(i64, i64)> = freq
        .into_iter()
        .map(|(delta, n)| (delta, ((n * 100) as f64 / deltas.len() as f64).round() as i64))
        .collect();
    table.sort_by_key(|(delta, _)| *delta);
    table
}
