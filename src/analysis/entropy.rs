use super::spectral::{welch_psd, ANALYSIS_RANGE_HZ};

/// Neutral entropy when no estimate is possible
pub const NEUTRAL_ENTROPY: f64 = 0.5;

/// Shannon entropy of the power spectrum, normalized to [0, 1].
///
/// The PSD is restricted to the physiological range (0.5-50 Hz) and
/// normalized to a probability distribution; the Shannon entropy of that
/// distribution is divided by `ln(n_bins)` so a flat spectrum maps to 1.0
/// and a single dominant line maps toward 0.0. Zero power, an empty
/// spectrum, or fewer than two usable bins return the neutral 0.5.
pub fn compute_spectral_entropy(signal: &[f64], fs: f64) -> f64 {
    let (freqs, psd) = welch_psd(signal, fs);
    let (lo, hi) = ANALYSIS_RANGE_HZ;

    let mut valid = Vec::with_capacity(psd.len());
    for (&f, &p) in freqs.iter().zip(psd.iter()) {
        if f >= lo && f <= hi && p.is_finite() && p >= 0.0 {
            valid.push(p);
        }
    }

    if valid.len() < 2 {
        return NEUTRAL_ENTROPY;
    }
    let total: f64 = valid.iter().sum();
    if total <= 0.0 {
        return NEUTRAL_ENTROPY;
    }

    let mut h = 0.0;
    for &p in &valid {
        let prob = p / total;
        if prob > 0.0 {
            h -= prob * prob.ln();
        }
    }

    let max_entropy = (valid.len() as f64).ln();
    let normalized = h / max_entropy;
    if !normalized.is_finite() {
        return NEUTRAL_ENTROPY;
    }
    normalized.max(0.0).min(1.0)
}

/// Fast entropy estimate from latent-space variance: `1 - 1/(1+v)`.
///
/// Used when no raw signal is available, only the encoder's variance
/// summary. High variance maps toward 1, zero variance to 0.
pub fn entropy_from_variance(variance: f64) -> f64 {
    if !variance.is_finite() {
        return NEUTRAL_ENTROPY;
    }
    let entropy = 1.0 - 1.0 / (1.0 + variance.max(0.0));
    entropy.max(0.0).min(1.0)
}
