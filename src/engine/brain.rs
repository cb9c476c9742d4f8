use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::analysis::{classify_bands, classify_smoothed, compute_all, display_correction, AnalysisView};
use crate::core::{
    FocalPoint, FrequencyBands, MentalState, MetricsSnapshot, SmoothedThresholds, StateRecord,
    StateSource, StateThresholds, Window, WindowMetrics,
};
use crate::hal::{average_quality, ChannelRing, EegDevice};
use crate::playback::{
    PlaybackFrame, PlaybackStatus, Playlist, PlaylistEntry, PlaylistInfo, SessionPlayer,
    SourceType,
};
use crate::sources::{
    DatasetKind, EpochDataset, LiveBuffer, SessionRecording, SignalSource, DATASET_FS,
};

use super::encoder::{prepare_window, LatentEncoder};
use super::mode::{BrainMode, DatasetVariant};
use super::smoothing::MetricSmoother;

/// Engine tuning; JSON-loadable so deployments can reshape thresholds and
/// cadence without a rebuild
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainConfig {
    /// Analysis window per tick, seconds
    pub window_seconds: f64,
    /// Polling cadence of the engine loop
    pub tick_interval_ms: u64,
    pub smoothing_window: usize,
    pub raw_thresholds: StateThresholds,
    pub smoothed_thresholds: SmoothedThresholds,
    /// Encoder weight dump; absent means seeded random projection
    pub weights_path: Option<PathBuf>,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            window_seconds: 2.0,
            tick_interval_ms: 200,
            smoothing_window: 5,
            raw_thresholds: StateThresholds::default(),
            smoothed_thresholds: SmoothedThresholds::default(),
            weights_path: None,
        }
    }
}

impl BrainConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// The orchestrator: owns the active source, routes its windows through the
/// analysis engine and smoother, and emits one [`StateRecord`] per tick.
///
/// All mutation is serialized behind `&mut self`; one polling loop drives
/// `next_state()` while control methods run between ticks.
pub struct Brain {
    config: BrainConfig,
    mode: BrainMode,
    smoother: MetricSmoother,
    encoder: LatentEncoder,
    relax_dataset: EpochDataset,
    focus_dataset: EpochDataset,
    player: SessionPlayer,
    playlist: Playlist,
    live: Option<LiveBuffer>,
    epoch: Instant,
}

impl Brain {
    pub fn new(config: BrainConfig) -> Self {
        let encoder = match &config.weights_path {
            Some(path) => LatentEncoder::from_file(path),
            None => LatentEncoder::default(),
        };
        let playlist = default_playlist();
        let player = {
            let recording = playlist
                .current()
                .and_then(|entry| resolve_entry(entry).ok())
                .unwrap_or_else(|| SessionRecording::synthetic(120.0, 10.0, 50.0));
            SessionPlayer::new(recording).with_window_duration(config.window_seconds)
        };

        Self {
            smoother: MetricSmoother::with_window(config.smoothing_window),
            encoder,
            relax_dataset: EpochDataset::relax(),
            focus_dataset: EpochDataset::focus(),
            player,
            playlist,
            live: None,
            epoch: Instant::now(),
            mode: BrainMode::default(),
            config,
        }
    }

    pub fn mode(&self) -> BrainMode {
        self.mode
    }

    pub fn config(&self) -> &BrainConfig {
        &self.config
    }

    /// Wire up a live source. Refused unless the device is actually
    /// streaming, so live mode never reads a dead ring.
    pub fn attach_live(&mut self, device: &dyn EegDevice, ring: Arc<ChannelRing>) -> bool {
        if !device.is_streaming() {
            warn!(device = %device.info().name, "device is not streaming, live source rejected");
            return false;
        }
        info!(device = %device.info().name, "live source attached");
        self.live = Some(LiveBuffer::new(ring));
        true
    }

    /// Drop the live source; live mode falls back to the default dataset
    pub fn detach_live(&mut self) {
        self.live = None;
        if self.mode == BrainMode::LiveHardware {
            self.mode = BrainMode::default();
            self.smoother.reset();
        }
    }

    /// Switch the active source. Smoothing history never crosses a mode
    /// switch. Returns `false` (untouched state) when live mode is requested
    /// with no live source attached.
    pub fn set_mode(&mut self, mode: BrainMode) -> bool {
        if mode == BrainMode::LiveHardware && self.live.is_none() {
            warn!("live mode requested with no live source attached");
            return false;
        }
        self.smoother.reset();
        self.mode = mode;
        if mode == BrainMode::Session {
            self.load_current_entry();
            self.player.play();
        }
        info!(mode = mode.name(), "mode set");
        true
    }

    /// One engine tick: poll the active source, analyze, smooth, classify.
    /// Always yields a well-formed, finite record.
    pub fn next_state(&mut self) -> StateRecord {
        let record = match self.mode {
            BrainMode::LiveHardware => self.next_live_state(),
            BrainMode::Session => self.next_session_state(),
            BrainMode::Dataset(variant) => self.next_dataset_state(variant),
        };
        record.sanitized()
    }

    // Session/playlist control passthroughs.

    pub fn play(&mut self) {
        self.player.play();
    }

    pub fn pause(&mut self) {
        self.player.pause();
    }

    pub fn restart(&mut self) {
        self.player.restart();
        self.smoother.reset();
    }

    pub fn seek(&mut self, position: f64) -> bool {
        self.player.seek(position)
    }

    pub fn set_speed(&mut self, speed: f64) -> f64 {
        self.player.set_speed(speed)
    }

    pub fn playback_status(&self) -> PlaybackStatus {
        self.player.get_status()
    }

    pub fn playlist_entries(&self) -> &[PlaylistEntry] {
        self.playlist.entries()
    }

    pub fn current_session_info(&self) -> Option<PlaylistInfo> {
        self.playlist.current_info()
    }

    pub fn add_session_entry(&mut self, entry: PlaylistEntry) {
        self.playlist.add_entry(entry);
    }

    pub fn next_session(&mut self) -> Option<PlaylistInfo> {
        self.playlist.next()?;
        self.load_current_entry();
        self.player.play();
        self.playlist.current_info()
    }

    pub fn previous_session(&mut self) -> Option<PlaylistInfo> {
        self.playlist.previous()?;
        self.load_current_entry();
        self.player.play();
        self.playlist.current_info()
    }

    pub fn select_session(&mut self, index: usize) -> bool {
        if !self.playlist.select(index) {
            return false;
        }
        self.load_current_entry();
        self.player.play();
        true
    }

    /// Poll-and-broadcast loop at the configured cadence. Runs until the
    /// shutdown signal or forever if the sender outlives all receivers.
    pub async fn run_loop(
        mut self,
        records_tx: broadcast::Sender<StateRecord>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_millis(self.config.tick_interval_ms));
        info!(
            interval_ms = self.config.tick_interval_ms,
            mode = self.mode.name(),
            "engine loop started"
        );
        loop {
            if shutdown_rx.try_recv().is_ok() {
                info!("engine loop shutting down");
                break;
            }
            ticker.tick().await;
            let record = self.next_state();
            // Send only fails with zero subscribers; that is not fatal
            let _ = records_tx.send(record);
        }
    }

    fn elapsed(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Load the playlist's current entry into the player, wiping smoothing
    /// history with it
    fn load_current_entry(&mut self) {
        if let Some(entry) = self.playlist.current().cloned() {
            match resolve_entry(&entry) {
                Ok(recording) => self.player.load(recording),
                Err(e) => {
                    warn!(entry = %entry.display_name, error = %e, "failed to load playlist entry");
                }
            }
        }
        self.smoother.reset();
    }

    fn next_dataset_state(&mut self, variant: DatasetVariant) -> StateRecord {
        let window = match variant {
            DatasetVariant::Relax => self.relax_dataset.next_epoch(),
            DatasetVariant::Focus => self.focus_dataset.next_epoch(),
        };
        let (snapshot, focal) = self.encode_and_analyze(&window);
        self.finish_record(&snapshot, Some(focal), StateSource::Dataset)
    }

    fn next_session_state(&mut self) -> StateRecord {
        if self.player.should_auto_advance() {
            self.advance_playlist();
        }
        let frame = match self.player.next_window() {
            Some(frame) => frame,
            None => {
                // Recording cannot serve a full window right now; keep the
                // stream alive from the default dataset
                debug!("session window unavailable, serving dataset output");
                return self.next_dataset_state(DatasetVariant::Relax);
            }
        };

        let mut record = match self.session_metrics(&frame) {
            (WindowMetrics::Recorded(snapshot), focal) => self.replayed_record(&snapshot, focal),
            (WindowMetrics::Computed(snapshot), focal) => {
                self.finish_record(&snapshot, focal, StateSource::Session)
            }
        };
        record.session_timestamp = Some(frame.position);
        record.session_progress = Some(frame.progress);
        record
    }

    /// Resolve a playback frame into tagged per-window metrics: snapshots
    /// captured at recording time replay verbatim, raw windows go through
    /// the encoder and analysis pipeline.
    fn session_metrics(&mut self, frame: &PlaybackFrame) -> (WindowMetrics, Option<FocalPoint>) {
        match &frame.recorded {
            Some(recorded) => {
                let snapshot = MetricsSnapshot {
                    bands: recorded.bands,
                    bands_display: display_correction(&recorded.bands),
                    coherence: recorded.coherence,
                    entropy: recorded.entropy,
                    plv: recorded.plv.unwrap_or(0.5),
                    dominant_frequency: recorded.frequency,
                    state: MentalState::from_name(&recorded.state),
                };
                (WindowMetrics::Recorded(snapshot), recorded.focal_point)
            }
            None => {
                let (snapshot, focal) = self.encode_and_analyze(&frame.window);
                (WindowMetrics::Computed(snapshot), Some(focal))
            }
        }
    }

    fn next_live_state(&mut self) -> StateRecord {
        let window_seconds = self.config.window_seconds;
        let polled = self.live.as_mut().map(|live| {
            (
                live.get_window(window_seconds),
                live.signal_quality(),
                live.buffer_status(),
                live.ring().layout().left.clone(),
                live.ring().layout().right.clone(),
            )
        });
        let Some((window, quality, status, left_idx, right_idx)) = polled else {
            return self.waiting_record();
        };
        let Some(window) = window else {
            let mut record = self.waiting_record();
            record.buffer_status = Some(status);
            return record;
        };

        let signal = window.mean_across_channels();
        let left = window.channel_group_mean(&left_idx);
        let right = window.channel_group_mean(&right_idx);
        let view = AnalysisView::signal_only(&signal)
            .with_hemispheres(&left, &right)
            .with_variance(window.variance());
        let snapshot = compute_all(&view, window.fs as f64);

        let mut record = self.finish_record(&snapshot, None, StateSource::Live);
        record.avg_quality = Some(average_quality(&quality));
        record.signal_quality = Some(quality);
        record.buffer_status = Some(status);
        record
    }

    /// Dataset epochs and raw session windows share this path: encode for
    /// the focal point, analyze channel-aware reductions of the raw window.
    ///
    /// Spectral metrics come from the all-channel mean and from channel-group
    /// means for the hemisphere pair, never from channels concatenated into
    /// one series, which would put channel-boundary artifacts into the
    /// spectrum.
    fn encode_and_analyze(&mut self, window: &Window) -> (MetricsSnapshot, FocalPoint) {
        let input = prepare_window(window);
        let (mean, logvar) = self.encoder.encode(&input);
        let focal = FocalPoint::from_latent(&mean);
        let latent_variance =
            logvar.iter().map(|v| v.exp()).sum::<f64>() / logvar.len().max(1) as f64;

        let n = window.n_channels();
        let signal = window.mean_across_channels();
        let left_idx: Vec<usize> = (0..n / 2).collect();
        let right_idx: Vec<usize> = (n / 2..n).collect();
        let left = window.channel_group_mean(&left_idx);
        let right = window.channel_group_mean(&right_idx);
        let view = AnalysisView::signal_only(&signal)
            .with_hemispheres(&left, &right)
            .with_variance(latent_variance);
        (compute_all(&view, window.fs as f64), focal)
    }

    /// Smooth, classify on both tables, and assemble the outward record
    fn finish_record(
        &mut self,
        snapshot: &MetricsSnapshot,
        focal: Option<FocalPoint>,
        source: StateSource,
    ) -> StateRecord {
        let raw_state = classify_bands(&snapshot.bands, &self.config.raw_thresholds);
        let smoothed = self.smoother.push(snapshot);
        let state = classify_smoothed(&smoothed.bands, &self.config.smoothed_thresholds);
        let focal_point =
            focal.unwrap_or_else(|| FocalPoint::from_band_balance(&smoothed.bands));

        StateRecord {
            timestamp: self.elapsed(),
            coherence: smoothed.coherence,
            entropy: smoothed.entropy,
            focal_point,
            frequency: snapshot.dominant_frequency,
            bands: smoothed.bands,
            bands_display: display_correction(&smoothed.bands),
            state,
            raw_state,
            plv: smoothed.plv,
            source,
            session_timestamp: None,
            session_progress: None,
            signal_quality: None,
            avg_quality: None,
            buffer_status: None,
        }
    }

    /// Replay a snapshot captured during the original recording, untouched
    /// by the smoother: the viewer sees exactly what the wearer saw.
    fn replayed_record(&self, snapshot: &MetricsSnapshot, focal: Option<FocalPoint>) -> StateRecord {
        let focal_point =
            focal.unwrap_or_else(|| FocalPoint::from_band_offsets(&snapshot.bands));

        StateRecord {
            timestamp: self.elapsed(),
            coherence: snapshot.coherence,
            entropy: snapshot.entropy,
            focal_point,
            frequency: snapshot.dominant_frequency,
            bands: snapshot.bands,
            bands_display: snapshot.bands_display,
            state: snapshot.state,
            raw_state: snapshot.state,
            plv: snapshot.plv,
            source: StateSource::Recorded,
            session_timestamp: None,
            session_progress: None,
            signal_quality: None,
            avg_quality: None,
            buffer_status: None,
        }
    }

    fn waiting_record(&self) -> StateRecord {
        StateRecord {
            timestamp: self.elapsed(),
            coherence: 0.5,
            entropy: 0.5,
            focal_point: FocalPoint::default(),
            frequency: 10.0,
            bands: FrequencyBands::uniform(),
            bands_display: FrequencyBands::uniform(),
            state: MentalState::WaitingData,
            raw_state: MentalState::WaitingData,
            plv: 0.5,
            source: StateSource::Live,
            session_timestamp: None,
            session_progress: None,
            signal_quality: None,
            avg_quality: None,
            buffer_status: None,
        }
    }

    fn advance_playlist(&mut self) {
        if self.playlist.next().is_some() {
            info!(
                entry = self.playlist.current().map(|e| e.display_name.as_str()).unwrap_or("?"),
                "auto-advancing playlist"
            );
            self.load_current_entry();
            self.player.play();
        } else {
            // Non-looping playlist at its end: stay on the final session
            self.player.restart();
        }
    }
}

impl Default for Brain {
    fn default() -> Self {
        Self::new(BrainConfig::default())
    }
}

/// Built-in program: synthetic sessions spanning the band spectrum
fn default_playlist() -> Playlist {
    Playlist::new(vec![
        PlaylistEntry::synthetic("Alpha Drift", "alpha", "relaxation"),
        PlaylistEntry::synthetic("Theta Descent", "theta", "meditation"),
        PlaylistEntry::synthetic("Beta Run", "beta", "focus"),
    ])
}

/// Turn a playlist entry into a loaded recording
fn resolve_entry(entry: &PlaylistEntry) -> Result<SessionRecording> {
    match entry.source_type {
        SourceType::Session => SessionRecording::load(&entry.source_locator),
        SourceType::Synthetic => {
            let freq = match entry.source_locator.as_str() {
                "theta" => 6.0,
                "beta" => 20.0,
                "gamma" => 40.0,
                _ => 10.0,
            };
            let mut recording = SessionRecording::synthetic(120.0, freq, 50.0);
            recording.name = entry.display_name.clone();
            Ok(recording)
        }
        SourceType::Dataset => {
            let kind = match entry.source_locator.as_str() {
                "focus" => DatasetKind::Focus,
                "relax" => DatasetKind::Relax,
                other => bail!("unknown dataset variant {other}"),
            };
            Ok(stitched_dataset_recording(kind, &entry.display_name))
        }
    }
}

/// Concatenate dataset epochs into one continuous recording so dataset
/// material can sit in a playlist next to real sessions
fn stitched_dataset_recording(kind: DatasetKind, name: &str) -> SessionRecording {
    let mut dataset = EpochDataset::new(kind, 30, 17);
    let mut data: Vec<Vec<f64>> = vec![Vec::new(); dataset.n_channels()];
    for _ in 0..dataset.len() {
        let window = dataset.next_epoch();
        for (channel, row) in data.iter_mut().zip(window.data.iter()) {
            channel.extend_from_slice(row);
        }
    }

    SessionRecording {
        name: name.to_string(),
        data,
        fs: DATASET_FS,
        channel_names: dataset.channel_names().to_vec(),
        metrics: Vec::new(),
    }
}
