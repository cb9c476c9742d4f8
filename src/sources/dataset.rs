use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use tracing::info;

use crate::core::Window;

use super::SignalSource;

/// Sampling rate of the synthetic motor-imagery-style epochs
pub const DATASET_FS: u64 = 160;

/// Channels per epoch, matching a 64-electrode 10-20 montage
pub const DATASET_CHANNELS: usize = 64;

/// Samples per epoch: one second inclusive of both endpoints at 160 Hz
pub const EPOCH_SAMPLES: usize = 161;

/// Spectral character of the generated epochs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    /// Eyes-closed resting profile, alpha-dominant
    Relax,
    /// Motor-imagery profile, beta/gamma-dominant
    Focus,
}

impl DatasetKind {
    pub fn name(&self) -> &str {
        match self {
            Self::Relax => "relax",
            Self::Focus => "focus",
        }
    }

    /// Band mix as (frequency_hz, amplitude) pairs; amplitudes are relative
    /// since every channel is z-scored afterwards
    fn tone_mix(&self) -> &'static [(f64, f64)] {
        match self {
            // Strong alpha with a theta undertone
            Self::Relax => &[(10.0, 1.0), (6.0, 0.4), (20.0, 0.15)],
            // Beta/gamma riding over a weak alpha rest
            Self::Focus => &[(20.0, 0.9), (35.0, 0.55), (10.0, 0.3)],
        }
    }

    fn noise_level(&self) -> f64 {
        match self {
            Self::Relax => 0.3,
            Self::Focus => 0.45,
        }
    }
}

/// Pre-segmented synthetic EEG epochs cycled as an infinite sequence.
///
/// Each epoch is `64 x 161` samples at 160 Hz, z-scored per channel the way
/// a preprocessed motor-imagery corpus would be. Exhausting the sequence
/// transparently restarts it from the beginning.
pub struct EpochDataset {
    kind: DatasetKind,
    epochs: Vec<Vec<Vec<f64>>>,
    channel_names: Vec<String>,
    position: usize,
}

impl EpochDataset {
    pub fn new(kind: DatasetKind, n_epochs: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let epochs = (0..n_epochs.max(1))
            .map(|_| synth_epoch(kind, &mut rng))
            .collect();
        let channel_names = (0..DATASET_CHANNELS).map(|i| format!("CH{i:02}")).collect();

        info!(kind = kind.name(), n_epochs, "synthetic dataset ready");
        Self {
            kind,
            epochs,
            channel_names,
            position: 0,
        }
    }

    /// Eyes-closed resting dataset
    pub fn relax() -> Self {
        Self::new(DatasetKind::Relax, 60, 7)
    }

    /// Motor-imagery dataset
    pub fn focus() -> Self {
        Self::new(DatasetKind::Focus, 60, 13)
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    /// Next epoch in sequence, restarting after the last one
    pub fn next_epoch(&mut self) -> Window {
        if self.position >= self.epochs.len() {
            self.position = 0;
        }
        let index = self.position;
        self.position += 1;

        Window::new(
            self.epochs[index].clone(),
            DATASET_FS,
            index as f64 * EPOCH_SAMPLES as f64 / DATASET_FS as f64,
            self.channel_names.clone(),
        )
    }
}

impl SignalSource for EpochDataset {
    /// Epochs are fixed-length; the requested duration is advisory here
    fn get_window(&mut self, _duration: f64) -> Option<Window> {
        Some(self.next_epoch())
    }

    fn fs(&self) -> u64 {
        DATASET_FS
    }

    fn n_channels(&self) -> usize {
        DATASET_CHANNELS
    }

    fn channel_names(&self) -> &[String] {
        &self.channel_names
    }
}

/// One epoch: band tones plus per-channel white noise, z-scored per channel.
/// Tone phases are drawn once per epoch and shared across channels; scalp
/// electrodes see the same underlying oscillation at different gains.
fn synth_epoch(kind: DatasetKind, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mix = kind.tone_mix();
    let noise = kind.noise_level();
    let fs = DATASET_FS as f64;
    let phases: Vec<f64> = mix.iter().map(|_| rng.gen_range(0.0..2.0 * PI)).collect();

    (0..DATASET_CHANNELS)
        .map(|_| {
            let gain = rng.gen_range(0.8..1.2);

            let mut row: Vec<f64> = (0..EPOCH_SAMPLES)
                .map(|i| {
                    let t = i as f64 / fs;
                    let tones: f64 = mix
                        .iter()
                        .zip(phases.iter())
                        .map(|(&(freq, amp), &phase)| amp * (2.0 * PI * freq * t + phase).sin())
                        .sum();
                    gain * tones + rng.gen_range(-noise..noise)
                })
                .collect();

            zscore(&mut row);
            row
        })
        .collect()
}

/// In-place z-score; a flat channel is left as zeros
fn zscore(row: &mut [f64]) {
    let n = row.len() as f64;
    let mean = row.iter().sum::<f64>() / n;
    let var = row.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / n;
    let std = var.sqrt();
    if std > 0.0 {
        for v in row.iter_mut() {
            *v = (*v - mean) / std;
        }
    } else {
        for v in row.iter_mut() {
            *v = 0.0;
        }
    }
}
