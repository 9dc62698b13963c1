//! Stage timing for render pipelines.
//!
//! A [`PerformanceRecorder`] is created by the caller and handed to the
//! scheduler and exporter that should report into it. Separate pipelines
//! use separate recorders, so their measurements never interleave.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;

/// One timed stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sample {
    pub label: String,
    pub duration: Duration,
}

/// Aggregate timings for one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSummary {
    pub label: String,
    pub count: usize,
    pub total: Duration,
    pub max: Duration,
}

/// Collects `(label, duration)` samples.
#[derive(Debug, Default)]
pub struct PerformanceRecorder {
    samples: Mutex<Vec<Sample>>,
}

impl PerformanceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Sample>> {
        self.samples.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a finished stage.
    pub fn record(&self, label: impl Into<String>, duration: Duration) {
        self.lock().push(Sample {
            label: label.into(),
            duration,
        });
    }

    /// Run `f` and record how long it took under `label`.
    pub fn measure<T>(&self, label: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        self.record(label, start.elapsed());
        result
    }

    /// All samples in recording order.
    pub fn samples(&self) -> Vec<Sample> {
        self.lock().clone()
    }

    /// Per-label totals, sorted by label.
    pub fn summary(&self) -> Vec<StageSummary> {
        let mut by_label: BTreeMap<String, StageSummary> = BTreeMap::new();
        for sample in self.lock().iter() {
            let entry = by_label
                .entry(sample.label.clone())
                .or_insert_with(|| StageSummary {
                    label: sample.label.clone(),
                    count: 0,
                    total: Duration::ZERO,
                    max: Duration::ZERO,
                });
            entry.count += 1;
            entry.total += sample.duration;
            entry.max = entry.max.max(sample.duration);
        }
        by_label.into_values().collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

/// Measure through an optional recorder.
pub(crate) fn measure<T>(
    recorder: Option<&PerformanceRecorder>,
    label: &str,
    f: impl FnOnce() -> T,
) -> T {
    match recorder {
        Some(recorder) => recorder.measure(label, f),
        None => f(),
    }
}
