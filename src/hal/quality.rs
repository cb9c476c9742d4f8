use std::collections::HashMap;

/// Below this peak amplitude the electrode has effectively no contact (uV)
pub const MIN_AMPLITUDE_UV: f64 = 5.0;

/// Above this peak amplitude the window is dominated by artifact (uV)
pub const MAX_AMPLITUDE_UV: f64 = 200.0;

/// Standard deviation ceiling before the signal counts as pure noise (uV)
pub const MAX_STD_UV: f64 = 100.0;

/// Contact-quality score in [0, 1] for one channel.
///
/// Thresholds are tuned for a Muse 2 headband. The ladder, in order: no
/// samples 0.0; flat signal (bad contact) 0.2; saturated (motion artifact)
/// 0.3; excessive noise 0.5; then a stability score peaking at 1.0 for a
/// standard deviation between 10 and 50 uV.
pub fn compute_quality_score(signal: &[f64]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }

    let amplitude = signal.iter().fold(0.0f64, |m, &v| m.max(v.abs()));
    let mean = signal.iter().sum::<f64>() / signal.len() as f64;
    let variance = signal.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / signal.len() as f64;
    let std = variance.sqrt();

    if !amplitude.is_finite() || !std.is_finite() {
        return 0.0;
    }

    if amplitude < MIN_AMPLITUDE_UV {
        return 0.2;
    }
    if amplitude > MAX_AMPLITUDE_UV {
        return 0.3;
    }
    if std > MAX_STD_UV {
        return 0.5;
    }

    if (10.0..=50.0).contains(&std) {
        1.0
    } else if std < 10.0 {
        0.7 + (std / 10.0) * 0.3
    } else {
        1.0 - ((std - 50.0) / (MAX_STD_UV - 50.0)) * 0.5
    }
}

/// Mean score over all channels; 0.0 when the map is empty
pub fn average_quality(scores: &HashMap<String, f64>) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.values().sum::<f64>() / scores.len() as f64
}
