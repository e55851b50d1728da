//! De-duplication of remote actions
//!
//! Records `(kind, target)` pairs that the remote service has confirmed, so no
//! task acts on the same target twice during one process lifetime.

use std::collections::HashSet;

use crate::types::ActionKind;

/// Idempotence guard for remote actions
///
/// Task policies check `seen` before attempting an action and call `record`
/// only after the remote service confirmed it. Kinds are independent: liking
/// post `x` says nothing about following user `x`.
pub trait DedupStore: Send + Sync {
    /// Whether `(kind, target_id)` has already been acted upon
    fn seen(&self, kind: ActionKind, target_id: &str) -> bool;

    /// Remember a confirmed action
    fn record(&mut self, kind: ActionKind, target_id: &str);

    /// Number of recorded actions
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process dedup store, lost on restart
#[derive(Debug, Default, Clone)]
pub struct MemoryDedupStore {
    records: HashSet<(ActionKind, String)>,
}

impl MemoryDedupStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DedupStore for MemoryDedupStore {
    fn seen(&self, kind: ActionKind, target_id: &str) -> bool {
        self.records.contains(&(kind, target_id.to_string()))
    }

    fn record(&mut self, kind: ActionKind, target_id: &str) {
        self.records.insert((kind, target_id.to_string()));
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}
