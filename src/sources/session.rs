use anyhow::{anyhow, bail, Result};
use memmap2::{Mmap, MmapMut};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::info;

use crate::core::{FocalPoint, FrequencyBands, Window};
use crate::hal::ChannelLayout;

/// Fallback rate when a file carries neither a rate nor usable timestamps
pub const DEFAULT_SESSION_FS: u64 = 256;

/// Maximum distance between a playback position and a recorded metric
/// before the metric is considered stale
pub const METRIC_MATCH_TOLERANCE_SECS: f64 = 1.0;

const BINARY_MAGIC: &[u8; 8] = b"SYNTEEG1";
const BINARY_VERSION: u32 = 1;
const BINARY_HEADER_SIZE: usize = 28;

/// One analysis result captured while the session was recorded.
///
/// Replay surfaces these verbatim instead of re-deriving state from the
/// raw signal, so a reviewed session shows exactly what the wearer saw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedMetric {
    /// Seconds from session start
    pub timestamp: f64,
    pub state: String,
    #[serde(default = "default_midline")]
    pub coherence: f64,
    #[serde(default = "default_midline")]
    pub entropy: f64,
    #[serde(default = "default_frequency")]
    pub frequency: f64,
    #[serde(default = "FrequencyBands::uniform")]
    pub bands: FrequencyBands,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focal_point: Option<FocalPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plv: Option<f64>,
}

fn default_midline() -> f64 {
    0.5
}

fn default_frequency() -> f64 {
    10.0
}

/// On-disk shape of a recorded session
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    fs: Option<u64>,
    #[serde(default)]
    channel_names: Option<Vec<String>>,
    /// Channel-major samples in microvolts
    data: Vec<Vec<f64>>,
    #[serde(default)]
    timestamps: Vec<f64>,
    #[serde(default)]
    metrics: Vec<RecordedMetric>,
}

/// A fully loaded recorded session: raw channels plus the metric trail
/// captured alongside them. Playback position lives in the player, not here.
#[derive(Debug, Clone)]
pub struct SessionRecording {
    pub name: String,
    /// Channel-major samples in microvolts
    pub data: Vec<Vec<f64>>,
    pub fs: u64,
    pub channel_names: Vec<String>,
    pub metrics: Vec<RecordedMetric>,
}

impl SessionRecording {
    /// Load a session, dispatching on extension: `.json` for the text
    /// format, anything else is treated as the binary format.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(path),
            _ => Self::from_binary(path),
        }
    }

    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read session {}: {}", path.display(), e))?;
        let file: SessionFile = serde_json::from_str(&raw)
            .map_err(|e| anyhow!("failed to parse session {}: {}", path.display(), e))?;

        if file.data.is_empty() {
            bail!("session {} has no channels", path.display());
        }
        let n_samples = file.data[0].len();
        if file.data.iter().any(|ch| ch.len() != n_samples) {
            bail!("session {} has ragged channel lengths", path.display());
        }

        let fs = file
            .fs
            .unwrap_or_else(|| infer_fs(&file.timestamps));
        let n_channels = file.data.len();
        let channel_names = file
            .channel_names
            .filter(|names| names.len() == n_channels)
            .unwrap_or_else(|| default_channel_names(n_channels));
        let name = file
            .name
            .unwrap_or_else(|| stem_name(path));

        let recording = Self {
            name,
            data: file.data,
            fs,
            channel_names,
            metrics: file.metrics,
        };
        info!(
            name = %recording.name,
            channels = recording.n_channels(),
            duration = recording.total_duration(),
            metrics = recording.metrics.len(),
            "loaded json session"
        );
        Ok(recording)
    }

    /// Binary layout: 8-byte magic, u32 version, u32 channel count, u32
    /// sample rate, u64 sample count, then f32 LE samples channel-major.
    pub fn from_binary(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|e| anyhow!("failed to open session {}: {}", path.display(), e))?;
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < BINARY_HEADER_SIZE {
            bail!("session {} is too short for a header", path.display());
        }
        if &mmap[0..8] != BINARY_MAGIC {
            bail!("session {} has an unrecognized magic", path.display());
        }
        let version = u32::from_le_bytes(mmap[8..12].try_into()?);
        if version != BINARY_VERSION {
            bail!("session {} has unsupported version {}", path.display(), version);
        }
        let n_channels = u32::from_le_bytes(mmap[12..16].try_into()?) as usize;
        let fs = u32::from_le_bytes(mmap[16..20].try_into()?) as u64;
        let n_samples = u64::from_le_bytes(mmap[20..28].try_into()?) as usize;

        if n_channels == 0 || fs == 0 {
            bail!("session {} header is degenerate", path.display());
        }
        let expected = BINARY_HEADER_SIZE + n_channels * n_samples * 4;
        if mmap.len() < expected {
            bail!(
                "session {} truncated: {} bytes, expected {}",
                path.display(),
                mmap.len(),
                expected
            );
        }

        let mut data = Vec::with_capacity(n_channels);
        let mut offset = BINARY_HEADER_SIZE;
        for _ in 0..n_channels {
            let mut row = Vec::with_capacity(n_samples);
            for _ in 0..n_samples {
                let bytes: [u8; 4] = mmap[offset..offset + 4].try_into()?;
                row.push(f32::from_le_bytes(bytes) as f64);
                offset += 4;
            }
            data.push(row);
        }

        let recording = Self {
            name: stem_name(path),
            data,
            fs,
            channel_names: default_channel_names(n_channels),
            metrics: Vec::new(),
        };
        info!(
            name = %recording.name,
            channels = n_channels,
            duration = recording.total_duration(),
            "loaded binary session"
        );
        Ok(recording)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = SessionFile {
            name: Some(self.name.clone()),
            fs: Some(self.fs),
            channel_names: Some(self.channel_names.clone()),
            data: self.data.clone(),
            timestamps: Vec::new(),
            metrics: self.metrics.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Write the binary format. Metrics are not part of the binary layout
    /// and are dropped.
    pub fn save_binary(&self, path: impl AsRef<Path>) -> Result<()> {
        let n_channels = self.n_channels();
        let n_samples = self.n_samples();
        let total = BINARY_HEADER_SIZE + n_channels * n_samples * 4;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(total as u64)?;
        let mut mmap = unsafe { MmapMut::map_mut(&file)? };

        mmap[0..8].copy_from_slice(BINARY_MAGIC);
        mmap[8..12].copy_from_slice(&BINARY_VERSION.to_le_bytes());
        mmap[12..16].copy_from_slice(&(n_channels as u32).to_le_bytes());
        mmap[16..20].copy_from_slice(&(self.fs as u32).to_le_bytes());
        mmap[20..28].copy_from_slice(&(n_samples as u64).to_le_bytes());

        let mut offset = BINARY_HEADER_SIZE;
        for row in &self.data {
            for &v in row {
                mmap[offset..offset + 4].copy_from_slice(&(v as f32).to_le_bytes());
                offset += 4;
            }
        }
        mmap.flush()?;
        Ok(())
    }

    /// A steady sine session, useful for exercising the playback path
    /// without a recorded file on disk.
    pub fn synthetic(duration_secs: f64, freq_hz: f64, amplitude_uv: f64) -> Self {
        let layout = ChannelLayout::muse();
        let fs = layout.fs;
        let n_samples = (duration_secs * fs as f64).round() as usize;
        let data = (0..layout.channel_names.len())
            .map(|_| {
                (0..n_samples)
                    .map(|i| amplitude_uv * (2.0 * PI * freq_hz * i as f64 / fs as f64).sin())
                    .collect()
            })
            .collect();

        Self {
            name: "synthetic".to_string(),
            data,
            fs,
            channel_names: layout.channel_names,
            metrics: Vec::new(),
        }
    }

    pub fn n_channels(&self) -> usize {
        self.data.len()
    }

    pub fn n_samples(&self) -> usize {
        self.data.first().map(|ch| ch.len()).unwrap_or(0)
    }

    pub fn total_duration(&self) -> f64 {
        if self.fs == 0 {
            return 0.0;
        }
        self.n_samples() as f64 / self.fs as f64
    }

    /// Window of `duration` seconds starting at `position` seconds into the
    /// session, or `None` when the slice would run past either end.
    pub fn slice_window(&self, position: f64, duration: f64) -> Option<Window> {
        if position < 0.0 || duration <= 0.0 {
            return None;
        }
        if position > self.total_duration() - duration {
            return None;
        }
        let start = (position * self.fs as f64).round() as usize;
        let needed = (duration * self.fs as f64).round() as usize;
        let end = (start + needed).min(self.n_samples());
        if end <= start {
            return None;
        }

        let data = self
            .data
            .iter()
            .map(|ch| ch[start..end].to_vec())
            .collect();
        Some(Window::new(
            data,
            self.fs,
            position,
            self.channel_names.clone(),
        ))
    }

    /// Recorded metric closest to `timestamp`, if one landed within
    /// [`METRIC_MATCH_TOLERANCE_SECS`] of it.
    pub fn nearest_metric(&self, timestamp: f64) -> Option<&RecordedMetric> {
        let mut best: Option<(&RecordedMetric, f64)> = None;
        for metric in &self.metrics {
            let dist = (metric.timestamp - timestamp).abs();
            if best.map(|(_, d)| dist < d).unwrap_or(true) {
                best = Some((metric, dist));
            }
        }
        best.and_then(|(metric, dist)| {
            if dist <= METRIC_MATCH_TOLERANCE_SECS {
                Some(metric)
            } else {
                None
            }
        })
    }
}

fn stem_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("session")
        .to_string()
}

fn default_channel_names(n_channels: usize) -> Vec<String> {
    let muse = ChannelLayout::muse();
    if n_channels == muse.channel_names.len() {
        muse.channel_names
    } else {
        (0..n_channels).map(|i| format!("CH{i:02}")).collect()
    }
}

/// Sample rate from the median timestamp spacing. Anything outside a
/// plausible EEG range falls back to [`DEFAULT_SESSION_FS`].
fn infer_fs(timestamps: &[f64]) -> u64 {
    if timestamps.len() < 2 {
        return DEFAULT_SESSION_FS;
    }
    let mut diffs: Vec<f64> = timestamps
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .filter(|&d| d > 0.0)
        .collect();
    if diffs.is_empty() {
        return DEFAULT_SESSION_FS;
    }
    diffs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = diffs[diffs.len() / 2];
    let fs = (1.0 / median).round();
    if (50.0..=1000.0).contains(&fs) {
        fs as u64
    } else {
        DEFAULT_SESSION_FS
    }
}
