//! Scoped timing of named training steps.
//!
//! A [`Profiler`] is passed explicitly into every entry point that wants its
//! steps timed. Each `profile(label)` call returns a guard; dropping the guard
//! records the elapsed time under `label` and emits a `trace` event.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Accumulated timings for one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileRecord {
    pub total: Duration,
    pub count: u64,
}

/// Timing context.
#[derive(Debug, Default)]
pub struct Profiler {
    enabled: bool,
    records: Mutex<BTreeMap<&'static str, ProfileRecord>>,
}

impl Profiler {
    /// A profiler that records timings.
    pub fn new() -> Self {
        Self { enabled: true, records: Mutex::default() }
    }

    /// A profiler that records nothing.
    pub fn disabled() -> Self {
        Self { enabled: false, records: Mutex::default() }
    }

    /// Whether timings are recorded.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Time the scope until the returned guard is dropped.
    #[must_use = "the step is timed until the guard is dropped"]
    pub fn profile(&self, label: &'static str) -> ProfileGuard<'_> {
        ProfileGuard {
            profiler: self,
            label,
            start: self.enabled.then(Instant::now),
        }
    }

    /// Snapshot of all records, ordered by label.
    pub fn report(&self) -> Vec<(&'static str, ProfileRecord)> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.iter().map(|(&label, &record)| (label, record)).collect()
    }

    fn record(&self, label: &'static str, elapsed: Duration) {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let entry = records.entry(label).or_default();
        entry.total += elapsed;
        entry.count += 1;
    }
}

/// Guard returned by [`Profiler::profile`].
#[derive(Debug)]
pub struct ProfileGuard<'a> {
    profiler: &'a Profiler,
    label: &'static str,
    start: Option<Instant>,
}

impl Drop for ProfileGuard<'_> {
    fn drop(&mut self) {
        if let Some(start) = self.start {
            let elapsed = start.elapsed();
            tracing::trace!(step = self.label, elapsed_us = elapsed.as_micros() as u64, "profiled step");
            self.profiler.record(self.label, elapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_each_scope() {
        let profiler = Profiler::new();
        for _ in 0..3 {
            let _guard = profiler.profile("make pairs");
        }
        {
            let _guard = profiler.profile("filter");
        }
        let report = profiler.report();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].0, "filter");
        assert_eq!(report[0].1.count, 1);
        assert_eq!(report[1].0, "make pairs");
        assert_eq!(report[1].1.count, 3);
    }

    #[test]
    fn disabled_records_nothing() {
        let profiler = Profiler::disabled();
        {
            let _guard = profiler.profile("make pairs");
        }
        assert!(profiler.report().is_empty());
        assert!(!profiler.is_enabled());
    }
}
