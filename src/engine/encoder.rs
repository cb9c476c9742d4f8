use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

use crate::core::{FocalPoint, Window};

/// Fixed input geometry the projection was trained on
pub const ENCODER_CHANNELS: usize = 64;
pub const ENCODER_SAMPLES: usize = 161;
pub const ENCODER_INPUT: usize = ENCODER_CHANNELS * ENCODER_SAMPLES;
pub const ENCODER_HIDDEN: usize = 512;
pub const ENCODER_LATENT: usize = 64;
pub const ENCODER_FS: u64 = 160;

const FALLBACK_SEED: u64 = 42;

/// Dense layer, weights stored row-major `rows x cols`
struct Affine {
    weights: Vec<f64>,
    bias: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Affine {
    fn seeded(rows: usize, cols: usize, rng: &mut StdRng) -> Self {
        let scale = (1.0 / cols as f64).sqrt();
        let weights = (0..rows * cols)
            .map(|_| rng.gen_range(-scale..scale))
            .collect();
        let bias = vec![0.0; rows];
        Self {
            weights,
            bias,
            rows,
            cols,
        }
    }

    fn from_nested(rows: usize, cols: usize, weights: &[Vec<f64>], bias: &[f64]) -> Result<Self> {
        if weights.len() != rows || bias.len() != rows {
            bail!("weight matrix is {}x_, expected {rows} rows", weights.len());
        }
        let mut flat = Vec::with_capacity(rows * cols);
        for row in weights {
            if row.len() != cols {
                bail!("weight row has {} columns, expected {cols}", row.len());
            }
            flat.extend_from_slice(row);
        }
        Ok(Self {
            weights: flat,
            bias: bias.to_vec(),
            rows,
            cols,
        })
    }

    /// Shorter inputs act as zero-padded, longer ones as truncated
    fn forward(&self, input: &[f64]) -> Vec<f64> {
        (0..self.rows)
            .map(|r| {
                let row = &self.weights[r * self.cols..(r + 1) * self.cols];
                let dot: f64 = row.iter().zip(input.iter()).map(|(w, x)| w * x).sum();
                dot + self.bias[r]
            })
            .collect()
    }
}

/// Serialized weight dump, matrices nested row-major
#[derive(Debug, Deserialize)]
struct WeightsFile {
    hidden_weight: Vec<Vec<f64>>,
    hidden_bias: Vec<f64>,
    mean_weight: Vec<Vec<f64>>,
    mean_bias: Vec<f64>,
    logvar_weight: Vec<Vec<f64>>,
    logvar_bias: Vec<f64>,
}

/// Two-layer affine projection from a flattened `64x161` window to a latent
/// mean and log-variance.
///
/// Trained weights load from a JSON dump when available. Without one the
/// encoder falls back to a seeded random projection: the latent point is
/// then arbitrary but stable, which keeps every downstream consumer
/// functional.
pub struct LatentEncoder {
    hidden: Affine,
    mean_head: Affine,
    logvar_head: Affine,
}

impl LatentEncoder {
    pub fn seeded(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self {
            hidden: Affine::seeded(ENCODER_HIDDEN, ENCODER_INPUT, &mut rng),
            mean_head: Affine::seeded(ENCODER_LATENT, ENCODER_HIDDEN, &mut rng),
            logvar_head: Affine::seeded(ENCODER_LATENT, ENCODER_HIDDEN, &mut rng),
        }
    }

    /// Load weights, degrading to the seeded fallback on any failure
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(encoder) => {
                info!(path = %path.display(), "encoder weights loaded");
                encoder
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "encoder weights unavailable, using random projection"
                );
                Self::seeded(FALLBACK_SEED)
            }
        }
    }

    fn try_load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let file: WeightsFile = serde_json::from_str(&raw)?;
        Ok(Self {
            hidden: Affine::from_nested(
                ENCODER_HIDDEN,
                ENCODER_INPUT,
                &file.hidden_weight,
                &file.hidden_bias,
            )?,
            mean_head: Affine::from_nested(
                ENCODER_LATENT,
                ENCODER_HIDDEN,
                &file.mean_weight,
                &file.mean_bias,
            )?,
            logvar_head: Affine::from_nested(
                ENCODER_LATENT,
                ENCODER_HIDDEN,
                &file.logvar_weight,
                &file.logvar_bias,
            )?,
        })
    }

    pub fn encode(&self, input: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let hidden = self.hidden.forward(input);
        let mean = self.mean_head.forward(&hidden);
        let logvar = self.logvar_head.forward(&hidden);
        (mean, logvar)
    }

    /// Latent summary for the state record: a coherence proxy shrinking as
    /// latent variance grows, and the focal point from the first three means
    pub fn syntergic_state(&self, input: &[f64]) -> (f64, FocalPoint) {
        let (mean, logvar) = self.encode(input);
        let avg_variance =
            logvar.iter().map(|v| v.exp()).sum::<f64>() / logvar.len().max(1) as f64;
        let mut coherence = 1.0 / (1.0 + avg_variance);
        if !coherence.is_finite() {
            coherence = 0.5;
        }
        (coherence, FocalPoint::from_latent(&mean))
    }
}

impl Default for LatentEncoder {
    fn default() -> Self {
        Self::seeded(FALLBACK_SEED)
    }
}

/// Reshape an arbitrary window into the encoder's fixed geometry: channels
/// truncated or zero-padded to 64, each channel resampled to 160 Hz, then
/// cropped or zero-padded to 161 samples, flattened channel-major.
pub fn prepare_window(window: &Window) -> Vec<f64> {
    let mut flat = Vec::with_capacity(ENCODER_INPUT);
    for ch in 0..ENCODER_CHANNELS {
        match window.channel(ch) {
            Some(samples) => {
                let resampled;
                let source: &[f64] = if window.fs == ENCODER_FS || window.fs == 0 {
                    samples
                } else {
                    let n_out = (samples.len() as f64 * ENCODER_FS as f64
                        / window.fs as f64)
                        .round() as usize;
                    resampled = fourier_resample(samples, n_out);
                    &resampled
                };
                for i in 0..ENCODER_SAMPLES {
                    flat.push(source.get(i).copied().unwrap_or(0.0));
                }
            }
            None => flat.extend(std::iter::repeat(0.0).take(ENCODER_SAMPLES)),
        }
    }
    flat
}

/// Resample by spectrum truncation/extension (the FFT method): band-limited
/// interpolation that keeps tone frequencies exact for periodic content.
pub(crate) fn fourier_resample(signal: &[f64], n_out: usize) -> Vec<f64> {
    let n_in = signal.len();
    if n_in == 0 || n_out == 0 {
        return vec![0.0; n_out];
    }
    if n_in == n_out {
        return signal.to_vec();
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n_in);
    let mut spectrum: Vec<Complex<f64>> =
        signal.iter().map(|&v| Complex::new(v, 0.0)).collect();
    fft.process(&mut spectrum);

    let mut resized = vec![Complex::new(0.0, 0.0); n_out];
    let n_min = n_in.min(n_out);
    let nyq = n_min / 2 + 1;
    resized[..nyq].copy_from_slice(&spectrum[..nyq]);
    for k in 1..n_min - nyq + 1 {
        resized[n_out - k] = spectrum[n_in - k];
    }
    // Shared Nyquist bin: fold when shrinking, split when growing
    if n_min % 2 == 0 {
        let half = n_min / 2;
        if n_out < n_in {
            resized[half] += spectrum[n_in - half];
        } else {
            resized[half] *= 0.5;
            resized[n_out - half] = resized[half];
        }
    }

    let ifft = planner.plan_fft_inverse(n_out);
    ifft.process(&mut resized);
    let scale = 1.0 / n_in as f64;
    resized.into_iter().map(|c| c.re * scale).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq: f64, fs: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn test_encode_dimensions() {
        let encoder = LatentEncoder::seeded(1);
        let input = vec![0.1; ENCODER_INPUT];
        let (mean, logvar) = encoder.encode(&input);
        assert_eq!(mean.len(), ENCODER_LATENT);
        assert_eq!(logvar.len(), ENCODER_LATENT);
    }

    #[test]
    fn test_seeded_encoder_is_deterministic() {
        let a = LatentEncoder::seeded(9);
        let b = LatentEncoder::seeded(9);
        let input = vec![0.5; ENCODER_INPUT];
        assert_eq!(a.encode(&input).0, b.encode(&input).0);
    }

    #[test]
    fn test_syntergic_state_is_finite() {
        let encoder = LatentEncoder::seeded(3);
        let input = vec![1.0; ENCODER_INPUT];
        let (coherence, focal) = encoder.syntergic_state(&input);
        assert!(coherence > 0.0 && coherence <= 1.0);
        assert!(focal.x.is_finite() && focal.y.is_finite() && focal.z.is_finite());
    }

    #[test]
    fn test_missing_weights_fall_back() {
        let encoder = LatentEncoder::from_file("/nonexistent/weights.json");
        let (mean, _) = encoder.encode(&vec![0.0; ENCODER_INPUT]);
        assert_eq!(mean.len(), ENCODER_LATENT);
    }

    #[test]
    fn test_malformed_weights_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.json");
        std::fs::write(&path, "{\"hidden_weight\": [[1.0]]}").unwrap();
        let encoder = LatentEncoder::from_file(&path);
        let (mean, _) = encoder.encode(&vec![0.0; ENCODER_INPUT]);
        assert_eq!(mean.len(), ENCODER_LATENT);
    }

    #[test]
    fn test_resample_preserves_tone() {
        // 20 whole cycles, so the tone sits exactly on a bin
        let original = sine(10.0, 256.0, 512);
        let resampled = fourier_resample(&original, 320);
        assert_eq!(resampled.len(), 320);
        for (i, &v) in resampled.iter().enumerate() {
            let expected = (2.0 * PI * 10.0 * i as f64 / 160.0).sin();
            assert!((v - expected).abs() < 1e-6, "sample {i}: {v} vs {expected}");
        }
    }

    #[test]
    fn test_resample_upsamples() {
        let original = sine(5.0, 160.0, 160);
        let resampled = fourier_resample(&original, 320);
        for (i, &v) in resampled.iter().enumerate() {
            let expected = (2.0 * PI * 5.0 * i as f64 / 320.0).sin();
            assert!((v - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_prepare_window_geometry() {
        let data = vec![vec![1.0; 512]; 4];
        let names = (0..4).map(|i| format!("CH{i}")).collect();
        let window = Window::new(data, 256, 0.0, names);

        let flat = prepare_window(&window);
        assert_eq!(flat.len(), ENCODER_INPUT);
        // Channels beyond the fourth are zero padding
        assert!(flat[4 * ENCODER_SAMPLES..5 * ENCODER_SAMPLES]
            .iter()
            .all(|&v| v == 0.0));
    }

    #[test]
    fn test_prepare_window_crops_native_rate() {
        let data = vec![(0..200).map(|i| i as f64).collect::<Vec<f64>>()];
        let window = Window::new(data, ENCODER_FS, 0.0, vec!["CH0".to_string()]);

        let flat = prepare_window(&window);
        assert_eq!(flat[0], 0.0);
        assert_eq!(flat[ENCODER_SAMPLES - 1], 160.0);
        // Second channel slot is padding
        assert_eq!(flat[ENCODER_SAMPLES], 0.0);
    }
}
