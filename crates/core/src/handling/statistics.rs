//! Per-operation failure counters
//!
//! Counts are keyed `"{operation}:{kind}"`. Each key remembers when it was
//! last hit so callers can ask for the keys active within a trailing window.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use sumoguard_common::error::FailureKind;
use sumoguard_common::resilience::{Clock, SystemClock};

use super::ports::HighErrorRate;

/// Count and last occurrence of one statistics key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternCount {
    /// Lifetime count for the key
    pub count: u64,
    /// Wall-clock time of the latest hit
    pub last_occurrence: DateTime<Utc>,
}

#[derive(Debug)]
struct Entry {
    operation: String,
    kind: FailureKind,
    count: u64,
    last_seen: Instant,
    last_occurrence: DateTime<Utc>,
}

/// Thread-safe failure statistics
#[derive(Debug)]
pub struct ErrorStatistics<C: Clock = SystemClock> {
    threshold: u64,
    entries: Mutex<BTreeMap<String, Entry>>,
    clock: C,
}

impl ErrorStatistics<SystemClock> {
    /// Statistics on the system clock signalling at `threshold` hits per key
    pub fn new(threshold: u64) -> Self {
        Self::with_clock(threshold, SystemClock)
    }
}

impl<C: Clock> ErrorStatistics<C> {
    /// Statistics reading time from `clock`; a zero threshold is treated as 1
    pub fn with_clock(threshold: u64, clock: C) -> Self {
        Self { threshold: threshold.max(1), entries: Mutex::new(BTreeMap::new()), clock }
    }

    /// Count at which a key raises a high-error-rate signal
    pub const fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Statistics key for an operation and kind
    pub fn key(operation: &str, kind: FailureKind) -> String {
        format!("{operation}:{kind}")
    }

    /// Count one failure
    ///
    /// Returns a signal only on the call that brings the key's count to the
    /// threshold, so each crossing is reported once.
    pub fn record(&self, operation: &str, kind: FailureKind) -> Option<HighErrorRate> {
        let now = self.clock.now();
        let wall = self.clock.utc_now();
        let mut entries = self.entries.lock();
        let entry = entries.entry(Self::key(operation, kind)).or_insert_with(|| Entry {
            operation: operation.to_string(),
            kind,
            count: 0,
            last_seen: now,
            last_occurrence: wall,
        });
        entry.count += 1;
        entry.last_seen = now;
        entry.last_occurrence = wall;

        (entry.count == self.threshold).then(|| HighErrorRate {
            operation: entry.operation.clone(),
            kind: entry.kind,
            count: entry.count,
            threshold: self.threshold,
        })
    }

    /// Count for one key, zero if never seen
    pub fn count(&self, operation: &str, kind: FailureKind) -> u64 {
        self.entries.lock().get(&Self::key(operation, kind)).map_or(0, |e| e.count)
    }

    /// Lifetime count per key
    pub fn patterns(&self) -> BTreeMap<String, u64> {
        self.entries.lock().iter().map(|(key, e)| (key.clone(), e.count)).collect()
    }

    /// Keys whose last occurrence lies within `window` of now
    pub fn recent(&self, window: Duration) -> BTreeMap<String, PatternCount> {
        let now = self.clock.now();
        self.entries
            .lock()
            .iter()
            .filter(|(_, e)| now.saturating_duration_since(e.last_seen) <= window)
            .map(|(key, e)| {
                (key.clone(), PatternCount { count: e.count, last_occurrence: e.last_occurrence })
            })
            .collect()
    }

    /// Number of distinct keys
    pub fn total_error_types(&self) -> usize {
        self.entries.lock().len()
    }

    /// Sum of all counts
    pub fn total_errors(&self) -> u64 {
        self.entries.lock().values().map(|e| e.count).sum()
    }

    /// Forget every key
    pub fn reset(&self) {
        self.entries.lock().clear();
    }
}
