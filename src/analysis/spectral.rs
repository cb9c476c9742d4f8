use rustfft::{num_complex::Complex, FftPlanner};
use std::f64::consts::PI;

use crate::core::bands::{Band, FrequencyBands, SmoothedThresholds, StateThresholds};
use crate::core::metrics::MentalState;

/// Signals shorter than this cannot support a meaningful band estimate
pub const MIN_SPECTRAL_SAMPLES: usize = 64;

/// Frequency range considered physiological for EEG analysis
pub const ANALYSIS_RANGE_HZ: (f64, f64) = (0.5, 50.0);

/// Dominant-frequency fallback when the spectrum is empty (alpha center)
pub const FALLBACK_DOMINANT_HZ: f64 = 10.0;

pub(crate) fn hann_window(size: usize) -> Vec<f64> {
    if size <= 1 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| 0.5 * (1.0 - ((2.0 * PI * i as f64) / (size - 1) as f64).cos()))
        .collect()
}

/// Welch power-spectral-density estimate.
///
/// Segment length is `min(256, len)` with 50% overlap, Hann window,
/// per-segment mean removal and density scaling. Returns `(freqs, psd)`
/// with `len/2 + 1` one-sided bins.
pub fn welch_psd(signal: &[f64], fs: f64) -> (Vec<f64>, Vec<f64>) {
    let len = signal.len();
    if len == 0 || fs <= 0.0 {
        return (Vec::new(), Vec::new());
    }

    let nperseg = len.min(256);
    let step = (nperseg - nperseg / 2).max(1);
    let n_bins = nperseg / 2 + 1;

    let window = hann_window(nperseg);
    let win_power: f64 = window.iter().map(|w| w * w).sum();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(nperseg);

    let mut acc = vec![0.0f64; n_bins];
    let mut n_segments = 0usize;
    let mut buf: Vec<Complex<f64>> = vec![Complex::new(0.0, 0.0); nperseg];

    let mut start = 0usize;
    while start + nperseg <= len {
        let segment = &signal[start..start + nperseg];
        let mean = segment.iter().sum::<f64>() / nperseg as f64;

        for (slot, (&s, &w)) in buf.iter_mut().zip(segment.iter().zip(window.iter())) {
            *slot = Complex::new((s - mean) * w, 0.0);
        }
        fft.process(&mut buf);

        for (k, slot) in buf.iter().take(n_bins).enumerate() {
            let mut p = slot.norm_sqr() / (fs * win_power);
            // One-sided spectrum: double everything except DC and Nyquist
            let is_nyquist = nperseg % 2 == 0 && k == n_bins - 1;
            if k > 0 && !is_nyquist {
                p *= 2.0;
            }
            acc[k] += p;
        }

        n_segments += 1;
        start += step;
    }

    if n_segments == 0 {
        return (Vec::new(), Vec::new());
    }

    let freqs: Vec<f64> = (0..n_bins).map(|k| k as f64 * fs / nperseg as f64).collect();
    let psd: Vec<f64> = acc.iter().map(|p| p / n_segments as f64).collect();
    (freqs, psd)
}

/// Relative power in the five standard bands, normalized to sum 1.0.
///
/// Signals shorter than 64 samples or with zero total power return the
/// uniform 0.2 fallback. Output is always finite.
pub fn compute_frequency_bands(signal: &[f64], fs: f64) -> FrequencyBands {
    if signal.len() < MIN_SPECTRAL_SAMPLES {
        return FrequencyBands::uniform();
    }

    let (freqs, psd) = welch_psd(signal, fs);
    let powers = FrequencyBands::from_fn(|band| {
        let (low, high) = band.range_hz();
        band_mean(&freqs, &psd, low, high).unwrap_or(0.0)
    });

    if !powers.is_finite() {
        return FrequencyBands::uniform();
    }
    powers.normalized()
}

/// Rescale raw bands by `center / bandwidth` and renormalize.
///
/// EEG follows an approximate 1/f spectrum, so delta dominates any raw-power
/// view. The center/bandwidth correction compensates both the spectral
/// falloff and the unequal band widths. A plain `f^1.5` boost is wrong here:
/// it amplifies gamma roughly 75x relative to delta and turns a negligible
/// gamma share into a dominant one.
pub fn display_correction(raw: &FrequencyBands) -> FrequencyBands {
    let corrected = FrequencyBands::from_fn(|b| raw.get(b) * b.center_hz() / b.bandwidth_hz());
    corrected.normalized()
}

/// Band powers corrected for visualization. See `display_correction`.
pub fn compute_frequency_bands_display(signal: &[f64], fs: f64) -> FrequencyBands {
    display_correction(&compute_frequency_bands(signal, fs))
}

/// Frequency bin with the highest PSD value inside the physiological range
pub fn get_dominant_frequency(signal: &[f64], fs: f64) -> f64 {
    let (freqs, psd) = welch_psd(signal, fs);
    let (lo, hi) = ANALYSIS_RANGE_HZ;

    let mut best: Option<(f64, f64)> = None;
    for (&f, &p) in freqs.iter().zip(psd.iter()) {
        if f < lo || f > hi || !p.is_finite() {
            continue;
        }
        if best.map(|(_, bp)| p > bp).unwrap_or(true) {
            best = Some((f, p));
        }
    }
    best.map(|(f, _)| f).unwrap_or(FALLBACK_DOMINANT_HZ)
}

/// Ordered decision list over raw per-window bands, first match wins
pub fn classify_bands(bands: &FrequencyBands, t: &StateThresholds) -> MentalState {
    if bands.delta > t.deep_delta {
        MentalState::DeepRelaxation
    } else if bands.alpha > t.meditation_alpha {
        MentalState::Meditation
    } else if bands.alpha > t.deep_meditation_alpha && bands.theta > t.deep_meditation_theta {
        MentalState::DeepMeditation
    } else if bands.theta > t.relaxed_theta {
        MentalState::Relaxed
    } else if bands.alpha > t.relaxed_alpha {
        MentalState::Relaxed
    } else if bands.beta > t.focused_beta || bands.gamma > t.focused_gamma {
        MentalState::Focused
    } else if bands.delta > t.fallback_delta {
        MentalState::DeepRelaxation
    } else {
        MentalState::Transitioning
    }
}

/// Classification with the default threshold table
pub fn get_state_from_bands(bands: &FrequencyBands) -> MentalState {
    classify_bands(bands, &StateThresholds::default())
}

/// Decision list applied to smoothed bands, producing the stable
/// externally-visible label
pub fn classify_smoothed(bands: &FrequencyBands, t: &SmoothedThresholds) -> MentalState {
    if bands.alpha > t.meditation_alpha {
        MentalState::Meditation
    } else if bands.beta + bands.gamma > t.focused_beta_gamma {
        MentalState::Focused
    } else if bands.theta > t.relaxed_theta {
        MentalState::Relaxed
    } else if bands.gamma > t.insight_gamma {
        MentalState::Insight
    } else if bands.delta > t.deep_delta {
        MentalState::DeepRelaxation
    } else {
        MentalState::Transitioning
    }
}

/// Mean PSD over bins with `low <= f <= high`; None when no bin falls inside
fn band_mean(freqs: &[f64], psd: &[f64], low: f64, high: f64) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for (&f, &p) in freqs.iter().zip(psd.iter()) {
        if f >= low && f <= high {
            sum += p;
            count += 1;
        }
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
