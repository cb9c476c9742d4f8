use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::bands::FrequencyBands;

/// Mental-state label produced by the band classifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentalState {
    DeepRelaxation,
    Meditation,
    DeepMeditation,
    Relaxed,
    Focused,
    Insight,
    Transitioning,
    Neutral,
    WaitingData,
}

impl MentalState {
    pub fn name(&self) -> &str {
        match self {
            Self::DeepRelaxation => "deep_relaxation",
            Self::Meditation => "meditation",
            Self::DeepMeditation => "deep_meditation",
            Self::Relaxed => "relaxed",
            Self::Focused => "focused",
            Self::Insight => "insight",
            Self::Transitioning => "transitioning",
            Self::Neutral => "neutral",
            Self::WaitingData => "waiting_data",
        }
    }

    /// Inverse of [`MentalState::name`], for labels read back from recorded
    /// sessions; unrecognized labels map to `Transitioning`
    pub fn from_name(name: &str) -> Self {
        match name {
            "deep_relaxation" => Self::DeepRelaxation,
            "meditation" => Self::Meditation,
            "deep_meditation" => Self::DeepMeditation,
            "relaxed" => Self::Relaxed,
            "focused" => Self::Focused,
            "insight" => Self::Insight,
            "neutral" => Self::Neutral,
            "waiting_data" => Self::WaitingData,
            _ => Self::Transitioning,
        }
    }
}

impl Default for MentalState {
    fn default() -> Self {
        Self::Transitioning
    }
}

/// 3-D projection of the latent brain state, used purely for visualization
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FocalPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl FocalPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// First three latent means scaled to [-1.5, 1.5]
    pub fn from_latent(mean: &[f64]) -> Self {
        let at = |i: usize| mean.get(i).copied().unwrap_or(0.0) * 1.5;
        Self::new(at(0), at(1), at(2))
    }

    /// Synthesized from smoothed band balance when no latent encoding is
    /// available (live hardware with an incompatible channel count)
    pub fn from_band_balance(bands: &FrequencyBands) -> Self {
        Self::new(
            (bands.beta - bands.theta) * 2.0,
            (bands.gamma - bands.delta) * 2.0,
            (bands.alpha - 0.2) * 2.0,
        )
        .clamped()
    }

    /// Synthesized from recorded bands when a replayed snapshot carries no
    /// saved focal point
    pub fn from_band_offsets(bands: &FrequencyBands) -> Self {
        Self::new(
            (bands.alpha - 0.2) * 2.0,
            (bands.theta - 0.2) * 2.0,
            (bands.beta - 0.2) * 2.0,
        )
        .clamped()
    }

    pub fn clamped(self) -> Self {
        let clamp = |v: f64| {
            if !v.is_finite() {
                0.0
            } else {
                v.max(-1.0).min(1.0)
            }
        };
        Self::new(clamp(self.x), clamp(self.y), clamp(self.z))
    }

    /// Replace non-finite coordinates with the origin
    pub fn sanitized(self) -> Self {
        let fix = |v: f64| if v.is_finite() { v } else { 0.0 };
        Self::new(fix(self.x), fix(self.y), fix(self.z))
    }
}

/// Per-window analysis output, produced once per window and consumed
/// immediately by the smoothing stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub bands: FrequencyBands,
    pub bands_display: FrequencyBands,
    pub coherence: f64,
    pub entropy: f64,
    pub plv: f64,
    pub dominant_frequency: f64,
    pub state: MentalState,
}

impl MetricsSnapshot {
    /// Neutral snapshot used when no signal is available
    pub fn neutral() -> Self {
        Self {
            bands: FrequencyBands::uniform(),
            bands_display: FrequencyBands::uniform(),
            coherence: 0.5,
            entropy: 0.5,
            plv: 0.5,
            dominant_frequency: 10.0,
            state: MentalState::Neutral,
        }
    }
}

/// Provenance of a session window's metrics: replayed verbatim from the
/// recording, or recomputed from the raw samples. Recorded snapshots never
/// touch the smoother.
#[derive(Debug, Clone)]
pub enum WindowMetrics {
    Recorded(MetricsSnapshot),
    Computed(MetricsSnapshot),
}

/// Which backend produced a state record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateSource {
    Dataset,
    Session,
    Recorded,
    Live,
}

impl StateSource {
    pub fn name(&self) -> &str {
        match self {
            Self::Dataset => "dataset",
            Self::Session => "session",
            Self::Recorded => "recorded",
            Self::Live => "live",
        }
    }
}

/// Occupancy summary of a live acquisition buffer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BufferStatus {
    pub samples: usize,
    pub capacity: usize,
    /// Fill level in percent, 0-100
    pub fill_percent: f64,
    /// Seconds of signal currently buffered
    pub duration_available: f64,
}

impl BufferStatus {
    pub fn new(samples: usize, capacity: usize, fs: u64) -> Self {
        let fill = if capacity > 0 {
            samples as f64 / capacity as f64 * 100.0
        } else {
            0.0
        };
        let duration = if fs > 0 { samples as f64 / fs as f64 } else { 0.0 };
        Self {
            samples,
            capacity,
            fill_percent: fill,
            duration_available: duration,
        }
    }
}

/// The outward per-tick record: smoothed metrics, the stable state label,
/// and whatever provenance extras the active source provides.
///
/// `state` is classified from smoothed bands; `raw_state` is the per-window
/// label before smoothing, kept so divergence between the two is visible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateRecord {
    /// Seconds since the engine loop started
    pub timestamp: f64,
    pub coherence: f64,
    pub entropy: f64,
    pub focal_point: FocalPoint,
    /// Dominant frequency in Hz
    pub frequency: f64,
    pub bands: FrequencyBands,
    pub bands_display: FrequencyBands,
    pub state: MentalState,
    pub raw_state: MentalState,
    pub plv: f64,
    pub source: StateSource,
    /// Position within the recording, session replay only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_timestamp: Option<f64>,
    /// Fraction of the recording consumed, 0-1, session replay only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_progress: Option<f64>,
    /// Per-channel contact quality, live hardware only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_quality: Option<HashMap<String, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_quality: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_status: Option<BufferStatus>,
}

impl StateRecord {
    /// Replace every non-finite number with its documented neutral default
    /// so serialized records never carry NaN or infinities.
    pub fn sanitized(mut self) -> Self {
        let fix = |v: &mut f64, default: f64| {
            if !v.is_finite() {
                *v = default;
            }
        };
        fix(&mut self.timestamp, 0.0);
        fix(&mut self.coherence, 0.5);
        fix(&mut self.entropy, 0.5);
        fix(&mut self.plv, 0.5);
        fix(&mut self.frequency, 10.0);
        self.focal_point = self.focal_point.sanitized();
        if !self.bands.is_finite() {
            self.bands = FrequencyBands::uniform();
        }
        if !self.bands_display.is_finite() {
            self.bands_display = FrequencyBands::uniform();
        }
        self.session_timestamp = self.session_timestamp.filter(|v| v.is_finite());
        self.session_progress = self.session_progress.filter(|v| v.is_finite());
        self.avg_quality = self.avg_quality.filter(|v| v.is_finite());
        if let Some(quality) = &mut self.signal_quality {
            for score in quality.values_mut() {
                if !score.is_finite() {
                    *score = 0.0;
                }
            }
        }
        self
    }
}
