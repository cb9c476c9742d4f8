use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

use syntergia::analysis::{
    compute_all, compute_coherence, compute_phase_locking_value, compute_spectral_entropy,
    entropy_from_variance, validate, AnalysisView,
};
use syntergia::core::MentalState;

const FS: f64 = 256.0;

fn sine(freq_hz: f64, phase: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| (2.0 * PI * freq_hz * i as f64 / FS + phase).sin())
        .collect()
}

fn noise(seed: u64, n: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

#[test]
fn test_identical_signals_fully_synchronized() {
    let signal = sine(10.0, 0.0, 1024);
    assert!(compute_coherence(&signal, &signal, FS) >= 0.95);
    assert!(compute_phase_locking_value(&signal, &signal, FS) >= 0.95);
}

#[test]
fn test_constant_phase_offset_keeps_plv_high() {
    let a = sine(10.0, 0.0, 1024);
    let b = sine(10.0, PI / 4.0, 1024);
    assert!(compute_phase_locking_value(&a, &b, FS) >= 0.95);
}

#[test]
fn test_independent_noise_scores_low() {
    let a = noise(11, 1024);
    let b = noise(97, 1024);
    let coherence = compute_coherence(&a, &b, FS);
    let plv = compute_phase_locking_value(&a, &b, FS);
    assert!(coherence < 0.4, "coherence was {coherence}");
    assert!(plv < 0.5, "plv was {plv}");
}

#[test]
fn test_short_inputs_return_neutral_sync() {
    let a = sine(10.0, 0.0, 32);
    let b = sine(10.0, 0.0, 32);
    assert_eq!(compute_coherence(&a, &b, FS), 0.5);
    assert_eq!(compute_phase_locking_value(&a, &b, FS), 0.5);
}

#[test]
fn test_sync_metrics_bounded() {
    let a = noise(3, 2048);
    let b = sine(10.0, 0.3, 2048);
    for value in [
        compute_coherence(&a, &b, FS),
        compute_phase_locking_value(&a, &b, FS),
    ] {
        assert!((0.0..=1.0).contains(&value), "out of range: {value}");
    }
}

#[test]
fn test_entropy_separates_tone_from_noise() {
    let tone_entropy = compute_spectral_entropy(&sine(10.0, 0.0, 1024), FS);
    let noise_entropy = compute_spectral_entropy(&noise(5, 1024), FS);
    assert!((0.0..=1.0).contains(&tone_entropy));
    assert!((0.0..=1.0).contains(&noise_entropy));
    assert!(
        tone_entropy < noise_entropy,
        "tone {tone_entropy} vs noise {noise_entropy}"
    );
    assert!(noise_entropy > 0.8, "white noise should be near-maximal");
}

#[test]
fn test_entropy_from_variance_monotonic() {
    assert_eq!(entropy_from_variance(0.0), 0.0);
    let low = entropy_from_variance(0.5);
    let high = entropy_from_variance(5.0);
    assert!(low < high);
    assert!((0.0..=1.0).contains(&high));
}

#[test]
fn test_compute_all_full_view() {
    let signal: Vec<f64> = sine(10.0, 0.0, 1024).iter().map(|v| v * 40.0).collect();
    let left = sine(10.0, 0.0, 1024);
    let right = sine(10.0, 0.1, 1024);
    let view = AnalysisView::signal_only(&signal).with_hemispheres(&left, &right);

    let snapshot = compute_all(&view, FS);
    assert!(validate(&snapshot));
    assert_eq!(snapshot.state, MentalState::Meditation);
    assert!(snapshot.coherence >= 0.9);
    assert!(snapshot.plv >= 0.9);
    assert!(snapshot.entropy < 0.5);
    assert!((snapshot.dominant_frequency - 10.0).abs() <= 1.0);
}

#[test]
fn test_compute_all_variance_fallback() {
    // no signals at all: coherence and entropy both derive from the latent
    // variance, bands stay uniform
    let view = AnalysisView::default().with_variance(3.0);
    let snapshot = compute_all(&view, FS);
    assert!((snapshot.coherence - 0.25).abs() < 1e-9);
    assert!((snapshot.entropy - 0.75).abs() < 1e-9);
    assert_eq!(snapshot.plv, snapshot.coherence);
    assert_eq!(snapshot.state, MentalState::Neutral);
}

#[test]
fn test_compute_all_signal_without_hemispheres() {
    let signal = sine(10.0, 0.0, 1024);
    let snapshot = compute_all(&AnalysisView::signal_only(&signal), FS);
    // bands still computed, sync falls back to neutral
    assert!(snapshot.bands.alpha > 0.5);
    assert_eq!(snapshot.coherence, 0.5);
    assert_eq!(snapshot.plv, 0.5);
}
