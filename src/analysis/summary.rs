use crate::core::bands::FrequencyBands;
use crate::core::metrics::{MentalState, MetricsSnapshot};

use super::coherence::{compute_coherence, compute_phase_locking_value, NEUTRAL_SYNC};
use super::entropy::{compute_spectral_entropy, entropy_from_variance, NEUTRAL_ENTROPY};
use super::spectral::{
    compute_frequency_bands, display_correction, get_dominant_frequency, get_state_from_bands,
    ANALYSIS_RANGE_HZ, FALLBACK_DOMINANT_HZ,
};

/// Borrowed input for one full metrics pass. Every part is optional; the
/// fallback chain fills whatever is missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisView<'a> {
    /// Main signal (single channel or all-channel mean)
    pub signal: Option<&'a [f64]>,
    /// Left-hemisphere channel mean
    pub left_hemisphere: Option<&'a [f64]>,
    /// Right-hemisphere channel mean
    pub right_hemisphere: Option<&'a [f64]>,
    /// Latent-space variance, used when signals are unavailable
    pub fallback_variance: Option<f64>,
}

impl<'a> AnalysisView<'a> {
    pub fn signal_only(signal: &'a [f64]) -> Self {
        Self {
            signal: Some(signal),
            ..Default::default()
        }
    }

    pub fn with_hemispheres(mut self, left: &'a [f64], right: &'a [f64]) -> Self {
        self.left_hemisphere = Some(left);
        self.right_hemisphere = Some(right);
        self
    }

    pub fn with_variance(mut self, variance: f64) -> Self {
        self.fallback_variance = Some(variance);
        self
    }
}

/// Run every analyzer over one view and collect the results.
///
/// Fallback chain:
/// - no (non-empty) main signal: uniform bands, 10 Hz dominant, state
///   `neutral`, entropy from variance when available
/// - no hemisphere pair: coherence from variance (`1/(1+v)`) when available,
///   else neutral 0.5; PLV mirrors coherence
///
/// Every field of the returned snapshot is finite.
pub fn compute_all(view: &AnalysisView<'_>, fs: f64) -> MetricsSnapshot {
    let signal = view.signal.filter(|s| !s.is_empty());

    let (bands, bands_display, dominant_frequency, state) = match signal {
        Some(s) => {
            let bands = compute_frequency_bands(s, fs);
            let display = display_correction(&bands);
            let freq = get_dominant_frequency(s, fs);
            let state = get_state_from_bands(&bands);
            (bands, display, freq, state)
        }
        None => (
            FrequencyBands::uniform(),
            FrequencyBands::uniform(),
            FALLBACK_DOMINANT_HZ,
            MentalState::Neutral,
        ),
    };

    let (coherence, plv) = match (view.left_hemisphere, view.right_hemisphere) {
        (Some(left), Some(right)) => {
            let coherence = compute_coherence(left, right, fs);
            let plv = compute_phase_locking_value(left, right, fs);
            let plv = if plv.is_finite() { plv } else { coherence };
            (coherence, plv)
        }
        _ => {
            let coherence = match view.fallback_variance {
                Some(v) if v.is_finite() => 1.0 / (1.0 + v.max(0.0)),
                _ => NEUTRAL_SYNC,
            };
            (coherence, coherence)
        }
    };

    let entropy = match signal {
        Some(s) => compute_spectral_entropy(s, fs),
        None => match view.fallback_variance {
            Some(v) => entropy_from_variance(v),
            None => NEUTRAL_ENTROPY,
        },
    };

    MetricsSnapshot {
        bands,
        bands_display,
        coherence,
        entropy,
        plv,
        dominant_frequency,
        state,
    }
}

/// Range checks over a finished snapshot: coherence and entropy in [0, 1],
/// band shares summing to ~1, dominant frequency in the physiological range.
pub fn validate(snapshot: &MetricsSnapshot) -> bool {
    if !(0.0..=1.0).contains(&snapshot.coherence) {
        return false;
    }
    if !(0.0..=1.0).contains(&snapshot.entropy) {
        return false;
    }
    let total = snapshot.bands.sum();
    if !(0.9..=1.1).contains(&total) {
        return false;
    }
    let (lo, hi) = ANALYSIS_RANGE_HZ;
    if !(lo..=hi).contains(&snapshot.dominant_frequency) {
        return false;
    }
    true
}
