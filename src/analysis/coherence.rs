use rustfft::{num_complex::Complex, FftPlanner};
use std::f64::consts::PI;

use super::spectral::{hann_window, MIN_SPECTRAL_SAMPLES};

/// Alpha band, the default range for inter-hemispheric synchrony metrics
pub const DEFAULT_SYNC_BAND_HZ: (f64, f64) = (8.0, 13.0);

/// Neutral value returned when a synchrony metric cannot be estimated
pub const NEUTRAL_SYNC: f64 = 0.5;

/// Magnitude-squared coherence between two signals, averaged over the
/// alpha band. See `compute_coherence_in_band`.
pub fn compute_coherence(a: &[f64], b: &[f64], fs: f64) -> f64 {
    compute_coherence_in_band(a, b, fs, DEFAULT_SYNC_BAND_HZ)
}

/// Welch magnitude-squared coherence `|Pxy|^2 / (Pxx * Pyy)` averaged over
/// `band` (inclusive edges).
///
/// Inputs are truncated to their common length. Fewer than 64 common
/// samples, an empty band, or a non-finite estimate all return the neutral
/// 0.5. Output is clipped to [0, 1].
///
/// With a single Welch segment the estimate degenerates to 1.0 at every bin;
/// callers that care should hand in at least a few segment lengths of data.
pub fn compute_coherence_in_band(a: &[f64], b: &[f64], fs: f64, band: (f64, f64)) -> f64 {
    let len = a.len().min(b.len());
    if len < MIN_SPECTRAL_SAMPLES || fs <= 0.0 {
        return NEUTRAL_SYNC;
    }

    let (freqs, pxx, pyy, pxy) = welch_cross(&a[..len], &b[..len], fs);
    let (low, high) = band;

    let mut sum = 0.0;
    let mut count = 0usize;
    for (k, &f) in freqs.iter().enumerate() {
        if f < low || f > high {
            continue;
        }
        let denom = pxx[k] * pyy[k];
        if denom <= 0.0 {
            continue;
        }
        let c = pxy[k].norm_sqr() / denom;
        if c.is_finite() {
            sum += c;
            count += 1;
        }
    }

    if count == 0 {
        return NEUTRAL_SYNC;
    }
    let mean = sum / count as f64;
    if !mean.is_finite() {
        return NEUTRAL_SYNC;
    }
    mean.max(0.0).min(1.0)
}

/// Phase locking value between two signals in the alpha band. See
/// `compute_plv_in_band`.
pub fn compute_phase_locking_value(a: &[f64], b: &[f64], fs: f64) -> f64 {
    compute_plv_in_band(a, b, fs, DEFAULT_SYNC_BAND_HZ)
}

/// Phase locking value: band-pass both signals (4th-order, two cascaded
/// band-pass biquads), extract instantaneous phase with a Hilbert transform,
/// then `PLV = |mean(exp(i * delta_phi))|`.
///
/// More sensitive than MSC for momentary synchrony since it discards
/// amplitude entirely. Degenerate input returns the neutral 0.5.
pub fn compute_plv_in_band(a: &[f64], b: &[f64], fs: f64, band: (f64, f64)) -> f64 {
    let len = a.len().min(b.len());
    if len < MIN_SPECTRAL_SAMPLES || fs <= 0.0 {
        return NEUTRAL_SYNC;
    }

    let filtered_a = bandpass_filter(&a[..len], fs, band);
    let filtered_b = bandpass_filter(&b[..len], fs, band);

    let phase_a = hilbert_phase(&filtered_a);
    let phase_b = hilbert_phase(&filtered_b);

    // |mean(exp(i*d))| without building complex intermediates
    let mut sum_cos = 0.0;
    let mut sum_sin = 0.0;
    for (&pa, &pb) in phase_a.iter().zip(phase_b.iter()) {
        let d = pa - pb;
        sum_cos += d.cos();
        sum_sin += d.sin();
    }
    let n = phase_a.len().min(phase_b.len());
    if n == 0 {
        return NEUTRAL_SYNC;
    }
    let plv = ((sum_cos / n as f64).powi(2) + (sum_sin / n as f64).powi(2)).sqrt();
    if !plv.is_finite() {
        return NEUTRAL_SYNC;
    }
    plv.max(0.0).min(1.0)
}

/// Welch auto- and cross-spectra over identical segmentation: Hann window,
/// `nperseg = min(256, len)`, 50% overlap, per-segment mean removal.
/// Constant scale factors cancel in the coherence ratio, so none are applied.
fn welch_cross(a: &[f64], b: &[f64], fs: f64) -> (Vec<f64>, Vec<f64>, Vec<f64>, Vec<Complex<f64>>) {
    let len = a.len();
    let nperseg = len.min(256);
    let step = (nperseg - nperseg / 2).max(1);
    let n_bins = nperseg / 2 + 1;

    let window = hann_window(nperseg);
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(nperseg);

    let mut pxx = vec![0.0f64; n_bins];
    let mut pyy = vec![0.0f64; n_bins];
    let mut pxy = vec![Complex::new(0.0, 0.0); n_bins];
    let mut buf_a: Vec<Complex<f64>> = vec![Complex::new(0.0, 0.0); nperseg];
    let mut buf_b: Vec<Complex<f64>> = vec![Complex::new(0.0, 0.0); nperseg];
    let mut n_segments = 0usize;

    let mut start = 0usize;
    while start + nperseg <= len {
        let seg_a = &a[start..start + nperseg];
        let seg_b = &b[start..start + nperseg];
        let mean_a = seg_a.iter().sum::<f64>() / nperseg as f64;
        let mean_b = seg_b.iter().sum::<f64>() / nperseg as f64;

        for i in 0..nperseg {
            buf_a[i] = Complex::new((seg_a[i] - mean_a) * window[i], 0.0);
            buf_b[i] = Complex::new((seg_b[i] - mean_b) * window[i], 0.0);
        }
        fft.process(&mut buf_a);
        fft.process(&mut buf_b);

        for k in 0..n_bins {
            pxx[k] += buf_a[k].norm_sqr();
            pyy[k] += buf_b[k].norm_sqr();
            pxy[k] += buf_a[k].conj() * buf_b[k];
        }
        n_segments += 1;
        start += step;
    }

    let freqs: Vec<f64> = (0..n_bins).map(|k| k as f64 * fs / nperseg as f64).collect();
    if n_segments > 1 {
        let scale = 1.0 / n_segments as f64;
        for k in 0..n_bins {
            pxx[k] *= scale;
            pyy[k] *= scale;
            pxy[k] *= scale;
        }
    }
    (freqs, pxx, pyy, pxy)
}

/// One RBJ cookbook band-pass section (constant skirt gain), pre-normalized
/// by `a0`, run in Direct Form I.
#[derive(Debug, Clone, Copy)]
struct BandpassBiquad {
    b0: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BandpassBiquad {
    fn design(fs: f64, center_hz: f64, q: f64) -> Self {
        let w0 = 2.0 * PI * (center_hz / fs).min(0.499);
        let (sinw0, cosw0) = w0.sin_cos();
        let alpha = sinw0 / (2.0 * q.max(1e-6));
        let a0 = 1.0 + alpha;
        Self {
            b0: alpha / a0,
            b2: -alpha / a0,
            a1: -2.0 * cosw0 / a0,
            a2: (1.0 - alpha) / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    fn step(&mut self, x0: f64) -> f64 {
        // b1 is zero for the band-pass form
        let y0 = self.b0 * x0 + self.b2 * self.x2 - self.a1 * self.y1 - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x0;
        self.y2 = self.y1;
        self.y1 = y0;
        y0
    }
}

/// Causal 4th-order band-pass: two identical RBJ sections cascaded, centered
/// on the geometric mean of the band with Q = center / bandwidth. Both PLV
/// inputs go through the same filter, so the shared group delay cancels out
/// of the phase difference.
pub(crate) fn bandpass_filter(signal: &[f64], fs: f64, band: (f64, f64)) -> Vec<f64> {
    let (low, high) = band;
    if fs <= 0.0 || low <= 0.0 || high <= low {
        return signal.to_vec();
    }
    let center = (low * high).sqrt();
    let q = center / (high - low);
    let mut s1 = BandpassBiquad::design(fs, center, q);
    let mut s2 = BandpassBiquad::design(fs, center, q);

    signal.iter().map(|&x| s2.step(s1.step(x))).collect()
}

/// Instantaneous phase via the analytic signal: FFT, zero the negative
/// frequencies (doubling the positive ones), inverse FFT, `atan2(im, re)`.
pub(crate) fn hilbert_phase(signal: &[f64]) -> Vec<f64> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    let ifft = planner.plan_fft_inverse(n);

    let mut buf: Vec<Complex<f64>> = signal.iter().map(|&s| Complex::new(s, 0.0)).collect();
    fft.process(&mut buf);

    // Analytic-signal weights: keep DC and Nyquist, double positive bins,
    // zero negative bins
    let half = n / 2;
    for (k, slot) in buf.iter_mut().enumerate() {
        if k == 0 || (n % 2 == 0 && k == half) {
            continue;
        } else if k < half || (n % 2 == 1 && k == half) {
            *slot *= 2.0;
        } else {
            *slot = Complex::new(0.0, 0.0);
        }
    }
    ifft.process(&mut buf);

    let scale = 1.0 / n as f64;
    buf.iter().map(|c| (c.im * scale).atan2(c.re * scale)).collect()
}
