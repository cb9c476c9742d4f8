use std::collections::VecDeque;

use crate::core::{Band, FrequencyBands, MetricsSnapshot};

/// Samples averaged per metric
pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;

/// Bounded FIFO emitting the mean of its current contents
struct MovingAverage {
    values: VecDeque<f64>,
    capacity: usize,
}

impl MovingAverage {
    fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, value: f64) -> f64 {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
        self.mean()
    }

    fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

/// Smoothed view of one snapshot: each value is the equal-weight mean of the
/// last few raw values
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedMetrics {
    pub coherence: f64,
    pub entropy: f64,
    pub plv: f64,
    pub bands: FrequencyBands,
}

/// Moving-average smoothing over per-window metrics.
///
/// One FIFO per scalar and per band. The buffers belong to exactly one
/// signal source at a time: [`MetricSmoother::reset`] must run on every mode
/// switch, session change, and playlist advance, otherwise the output blends
/// windows from unrelated signals.
pub struct MetricSmoother {
    coherence: MovingAverage,
    entropy: MovingAverage,
    plv: MovingAverage,
    bands: [MovingAverage; 5],
}

impl MetricSmoother {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_SMOOTHING_WINDOW)
    }

    pub fn with_window(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            coherence: MovingAverage::new(capacity),
            entropy: MovingAverage::new(capacity),
            plv: MovingAverage::new(capacity),
            bands: std::array::from_fn(|_| MovingAverage::new(capacity)),
        }
    }

    /// Fold one raw snapshot in and return the smoothed values
    pub fn push(&mut self, snapshot: &MetricsSnapshot) -> SmoothedMetrics {
        let coherence = self.coherence.push(snapshot.coherence);
        let entropy = self.entropy.push(snapshot.entropy);
        let plv = self.plv.push(snapshot.plv);
        let bands = FrequencyBands::from_fn(|band| {
            self.bands[band.index()].push(snapshot.bands.get(band))
        });

        SmoothedMetrics {
            coherence,
            entropy,
            plv,
            bands,
        }
    }

    /// Drop all history. Required whenever the active signal source changes.
    pub fn reset(&mut self) {
        self.coherence.clear();
        self.entropy.clear();
        self.plv.clear();
        for fifo in &mut self.bands {
            fifo.clear();
        }
    }
}

impl Default for MetricSmoother {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with(coherence: f64, alpha: f64) -> MetricsSnapshot {
        let mut snapshot = MetricsSnapshot::neutral();
        snapshot.coherence = coherence;
        snapshot.bands.set(Band::Alpha, alpha);
        snapshot
    }

    #[test]
    fn test_first_push_is_identity() {
        let mut smoother = MetricSmoother::new();
        let smoothed = smoother.push(&snapshot_with(0.9, 0.4));
        assert!((smoothed.coherence - 0.9).abs() < 1e-12);
        assert!((smoothed.bands.alpha - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_mean_over_window() {
        let mut smoother = MetricSmoother::new();
        for c in [0.0, 0.2, 0.4, 0.6, 0.8] {
            smoother.push(&snapshot_with(c, 0.2));
        }
        let smoothed = smoother.push(&snapshot_with(1.0, 0.2));
        // Oldest (0.0) evicted: mean of 0.2..=1.0
        assert!((smoothed.coherence - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_bands_smoothed_independently() {
        let mut smoother = MetricSmoother::new();
        smoother.push(&snapshot_with(0.5, 0.1));
        let smoothed = smoother.push(&snapshot_with(0.5, 0.5));
        assert!((smoothed.bands.alpha - 0.3).abs() < 1e-12);
        // Untouched bands stay at the neutral 0.2
        assert!((smoothed.bands.delta - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut smoother = MetricSmoother::new();
        for _ in 0..5 {
            smoother.push(&snapshot_with(1.0, 0.2));
        }
        smoother.reset();
        let smoothed = smoother.push(&snapshot_with(0.0, 0.2));
        assert_eq!(smoothed.coherence, 0.0);
    }

    #[test]
    fn test_custom_window() {
        let mut smoother = MetricSmoother::with_window(2);
        smoother.push(&snapshot_with(0.0, 0.2));
        smoother.push(&snapshot_with(0.4, 0.2));
        let smoothed = smoother.push(&snapshot_with(0.8, 0.2));
        assert!((smoothed.coherence - 0.6).abs() < 1e-12);
    }
}
