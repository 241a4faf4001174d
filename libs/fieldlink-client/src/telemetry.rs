//! Bounded log of API actions.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Records kept before the oldest is evicted.
pub const MAX_ACTIONS: usize = 100;

/// One recorded action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecord {
    pub id: Uuid,
    pub action: String,
    pub module: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

/// Append-only action log shared by every client of a gateway.
#[derive(Debug, Clone)]
pub struct ActionLog {
    records: Arc<Mutex<VecDeque<ActionRecord>>>,
    capacity: usize,
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::with_capacity(MAX_ACTIONS)
    }
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    fn records(&self) -> MutexGuard<'_, VecDeque<ActionRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a record, evicting the oldest ones past capacity.
    pub fn record(&self, action: &str, module: &str, data: Value) {
        let record = ActionRecord {
            id: Uuid::now_v7(),
            action: action.to_string(),
            module: module.to_string(),
            data,
            timestamp: Utc::now(),
        };

        let mut records = self.records();
        records.push_back(record);
        while records.len() > self.capacity {
            records.pop_front();
        }
    }

    /// Copy of the current records, oldest first.
    pub fn snapshot(&self) -> Vec<ActionRecord> {
        self.records().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    pub fn clear(&self) {
        self.records().clear();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn evicts_oldest_past_capacity() {
        let log = ActionLog::new();
        for i in 0..(MAX_ACTIONS + 5) {
            log.record("api_success", "info", json!({ "seq": i }));
        }

        let records = log.snapshot();
        assert_eq!(records.len(), MAX_ACTIONS);
        assert_eq!(records[0].data["seq"], 5);
        assert_eq!(records[MAX_ACTIONS - 1].data["seq"], MAX_ACTIONS + 4);
    }

    #[test]
    fn clones_share_records() {
        let log = ActionLog::with_capacity(3);
        let other = log.clone();
        other.record("api_error", "login", json!({}));

        assert_eq!(log.len(), 1);
        assert_eq!(log.snapshot()[0].module, "login");

        log.clear();
        assert!(other.is_empty());
    }
}
