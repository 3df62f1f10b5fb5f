//! Aggregation over the interaction log for `credit-dashboard history`.

use std::collections::{BTreeMap, HashSet};

use crate::analytics::logger::InteractionLogEntry;

/// Summary of a slice of the interaction log.
#[derive(Debug, Default, PartialEq)]
pub struct HistorySummary {
    pub total: usize,
    pub succeeded: usize,
    /// Number of distinct clients resolved.
    pub distinct_clients: usize,
    pub avg_latency_ms: f64,
    /// Count per outcome name, sorted by name.
    pub outcomes: Vec<(String, usize)>,
    /// Count per section slug, sorted by slug.
    pub sections: Vec<(String, usize)>,
}

impl HistorySummary {
    /// Success rate in percent, 0.0 for an empty log.
    pub fn success_pct(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.succeeded as f64 / self.total as f64) * 100.0
        }
    }
}

pub fn summarize(entries: &[InteractionLogEntry]) -> HistorySummary {
    if entries.is_empty() {
        return HistorySummary::default();
    }

    let mut outcomes: BTreeMap<&str, usize> = BTreeMap::new();
    let mut sections: BTreeMap<&str, usize> = BTreeMap::new();
    let mut clients = HashSet::new();
    let mut latency_total = 0u64;

    for entry in entries {
        *outcomes.entry(&entry.outcome).or_default() += 1;
        *sections.entry(&entry.section).or_default() += 1;
        if let Some(id) = entry.client_id {
            clients.insert(id);
        }
        latency_total += entry.latency_ms;
    }

    HistorySummary {
        total: entries.len(),
        succeeded: entries.iter().filter(|e| e.succeeded()).count(),
        distinct_clients: clients.len(),
        avg_latency_ms: latency_total as f64 / entries.len() as f64,
        outcomes: outcomes.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        sections: sections.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(client_id: Option<u32>, section: &str, outcome: &str, latency_ms: u64) -> InteractionLogEntry {
        InteractionLogEntry {
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            input: client_id.map(|id| id.to_string()).unwrap_or_default(),
            client_id,
            section: section.to_string(),
            outcome: outcome.to_string(),
            status_code: None,
            latency_ms,
        }
    }

    #[test]
    fn empty_log_summarizes_to_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.success_pct(), 0.0);
    }

    #[test]
    fn counts_outcomes_sections_and_clients() {
        let entries = vec![
            entry(Some(100002), "prediction", "rendered", 10),
            entry(Some(100002), "interpretation", "rendered", 30),
            entry(Some(100003), "prediction", "api_status", 20),
            entry(None, "prediction", "invalid_input", 0),
        ];
        let summary = summarize(&entries);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.distinct_clients, 2);
        assert!((summary.avg_latency_ms - 15.0).abs() < 1e-9);
        assert!((summary.success_pct() - 50.0).abs() < 1e-9);
        assert_eq!(
            summary.sections,
            vec![
                ("interpretation".to_string(), 1),
                ("prediction".to_string(), 3)
            ]
        );
        assert_eq!(summary.outcomes[0], ("api_status".to_string(), 1));
        assert_eq!(summary.outcomes[2], ("rendered".to_string(), 2));
    }
}
