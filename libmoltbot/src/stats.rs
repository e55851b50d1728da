//! Per-kind action counters

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::types::ActionKind;

/// Counts successful actions per kind since process start
#[derive(Debug, Default, Clone)]
pub struct Stats {
    counts: BTreeMap<ActionKind, u64>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, kind: ActionKind) {
        *self.counts.entry(kind).or_insert(0) += 1;
    }

    pub fn get(&self, kind: ActionKind) -> u64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Point-in-time copy of all counters, zero counts included
    pub fn snapshot(&self) -> StatsSnapshot {
        let counts = ActionKind::ALL
            .iter()
            .map(|kind| (*kind, self.get(*kind)))
            .collect();
        StatsSnapshot { counts }
    }
}

/// Immutable view of the counters, ordered like, follow, reply, post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub counts: BTreeMap<ActionKind, u64>,
}

impl StatsSnapshot {
    pub fn get(&self, kind: ActionKind) -> u64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "counts": self.counts,
            "total": self.total(),
        })
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .counts
            .iter()
            .map(|(kind, count)| format!("{}: {}", kind, count))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_zero() {
        let stats = Stats::new();
        let snapshot = stats.snapshot();

        assert_eq!(snapshot.total(), 0);
        assert_eq!(snapshot.counts.len(), 4);
    }

    #[test]
    fn test_increment_is_per_kind() {
        let mut stats = Stats::new();
        stats.increment(ActionKind::Like);
        stats.increment(ActionKind::Like);
        stats.increment(ActionKind::Post);

        assert_eq!(stats.get(ActionKind::Like), 2);
        assert_eq!(stats.get(ActionKind::Post), 1);
        assert_eq!(stats.get(ActionKind::Follow), 0);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut stats = Stats::new();
        stats.increment(ActionKind::Reply);
        let before = stats.snapshot();
        stats.increment(ActionKind::Reply);

        assert_eq!(before.get(ActionKind::Reply), 1);
        assert_eq!(stats.snapshot().get(ActionKind::Reply), 2);
    }

    #[test]
    fn test_display_lists_every_kind_in_order() {
        let mut stats = Stats::new();
        stats.increment(ActionKind::Follow);

        assert_eq!(
            stats.snapshot().to_string(),
            "like: 0, follow: 1, reply: 0, post: 0"
        );
    }

    #[test]
    fn test_json_output() {
        let mut stats = Stats::new();
        stats.increment(ActionKind::Like);
        let json = stats.snapshot().to_json();

        assert_eq!(json["counts"]["like"], 1);
        assert_eq!(json["counts"]["post"], 0);
        assert_eq!(json["total"], 1);
    }
}
