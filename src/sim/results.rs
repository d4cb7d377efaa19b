use std::sync::{Mutex, MutexGuard};

/// Migrated field values of one sample, aligned with the mesh cells.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleResult {
    pub sample: usize,
    pub values: Vec<f64>,
}

impl SampleResult {
    pub fn min(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Arithmetic mean of the values (0 for an empty result).
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }
}

/// A sample that did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleFailure {
    pub sample: usize,
    pub reason: String,
}

/// Collects per-sample results from any number of workers.
///
/// Appending is safe from concurrent workers. Reading returns results
/// ordered by sample index regardless of completion order; entries with the
/// same index keep their insertion order. Duplicate indices are not merged.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    results: Mutex<Vec<SampleResult>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the values computed for `sample`.
    pub fn append(&self, sample: usize, values: Vec<f64>) {
        self.lock().push(SampleResult { sample, values });
    }

    /// Returns a copy of all results ordered by sample index.
    pub fn ordered(&self) -> Vec<SampleResult> {
        let mut results = self.lock().clone();
        results.sort_by_key(|r| r.sample);
        results
    }

    /// Consumes the aggregator and returns results ordered by sample index.
    pub fn into_ordered(self) -> Vec<SampleResult> {
        let mut results = self
            .results
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        results.sort_by_key(|r| r.sample);
        results
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SampleResult>> {
        // A panicking worker cannot leave the vector half-updated
        self.results
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
