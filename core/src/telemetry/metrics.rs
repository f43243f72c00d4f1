use std::sync::Mutex;

/// Counters accumulated over one batch run.
pub struct BatchMetrics {
    inner: Mutex<Counters>,
}

struct Counters {
    analyzed: usize,
    skipped: usize,
    segments: usize,
}

impl BatchMetrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Counters {
                analyzed: 0,
                skipped: 0,
                segments: 0,
            }),
        }
    }

    pub fn record_analyzed(&self, segment_count: usize) {
        if let Ok(mut counters) = self.inner.lock() {
            counters.analyzed += 1;
            counters.segments += segment_count;
        }
    }

    pub fn record_skipped(&self) {
        if let Ok(mut counters) = self.inner.lock() {
            counters.skipped += 1;
        }
    }

    /// (analyzed, skipped, total segments)
    pub fn snapshot(&self) -> (usize, usize, usize) {
        if let Ok(counters) = self.inner.lock() {
            (counters.analyzed, counters.skipped, counters.segments)
        } else {
            (0, 0, 0)
        }
    }
}

impl Default for BatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_accumulate_counts() {
        let metrics = BatchMetrics::new();
        metrics.record_analyzed(3);
        metrics.record_analyzed(0);
        metrics.record_skipped();
        assert_eq!(metrics.snapshot(), (2, 1, 3));
    }
}
