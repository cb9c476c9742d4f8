use anyhow::{bail, Result};
use async_trait::async_trait;
use crossbeam_channel::Sender;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::info;

use super::traits::EegDevice;
use super::types::{ChannelLayout, DeviceInfo, DeviceStatus, SampleBatch};

/// Samples per emitted batch (125 ms at 256 Hz)
const BATCH_SAMPLES: usize = 32;

/// Simulated Muse-style headband producing a steady alpha tone plus
/// per-channel noise. Useful for demos and for exercising the live path
/// without hardware.
///
/// `burst_seconds` of signal are emitted immediately when streaming starts,
/// so tests can fill an analysis window without waiting in real time; after
/// the burst the generator paces itself at the hardware rate.
pub struct MockHeadband {
    status: DeviceStatus,
    layout: ChannelLayout,
    tone_hz: f64,
    amplitude_uv: f64,
    noise_uv: f64,
    burst_seconds: f64,
    seed: u64,
    fail_connect: bool,
    stop: Option<Arc<AtomicBool>>,
    thread: Option<JoinHandle<()>>,
}

impl MockHeadband {
    pub fn new() -> Self {
        Self {
            status: DeviceStatus::Disconnected,
            layout: ChannelLayout::muse(),
            tone_hz: 10.0,
            amplitude_uv: 40.0,
            noise_uv: 5.0,
            burst_seconds: 0.0,
            seed: 42,
            fail_connect: false,
            stop: None,
            thread: None,
        }
    }

    /// Dominant tone of the synthetic signal
    pub fn with_tone(mut self, tone_hz: f64, amplitude_uv: f64) -> Self {
        self.tone_hz = tone_hz;
        self.amplitude_uv = amplitude_uv;
        self
    }

    pub fn with_noise(mut self, noise_uv: f64) -> Self {
        self.noise_uv = noise_uv;
        self
    }

    /// Emit this much signal instantly on stream start
    pub fn with_burst(mut self, seconds: f64) -> Self {
        self.burst_seconds = seconds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Make the next connect attempt fail, for error-path tests
    pub fn with_connect_failure(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    fn join_generator(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop.store(true, Ordering::Relaxed);
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Default for MockHeadband {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MockHeadband {
    fn drop(&mut self) {
        if let Some(stop) = &self.stop {
            stop.store(true, Ordering::Relaxed);
        }
    }
}

#[async_trait]
impl EegDevice for MockHeadband {
    async fn connect(&mut self) -> Result<()> {
        if !self.status.can_transition_to(&DeviceStatus::Connecting) {
            bail!("cannot connect from state {:?}", self.status);
        }
        self.status = DeviceStatus::Connecting;

        if self.fail_connect {
            self.fail_connect = false;
            self.status = DeviceStatus::Error;
            bail!("simulated connection failure");
        }

        self.status = DeviceStatus::Connected;
        info!(device = %self.info().name, "connected");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.status == DeviceStatus::Streaming {
            self.stop_stream().await?;
        }
        self.join_generator();
        self.status = DeviceStatus::Disconnected;
        Ok(())
    }

    async fn start_stream(&mut self, tx: Sender<SampleBatch>) -> Result<()> {
        if !self.status.can_transition_to(&DeviceStatus::Streaming) {
            bail!("cannot start stream from state {:?}", self.status);
        }

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let n_channels = self.layout.n_channels();
        let fs = self.layout.fs as f64;
        let tone_hz = self.tone_hz;
        let amplitude = self.amplitude_uv;
        let noise = self.noise_uv.max(0.0);
        let burst = (self.burst_seconds * fs) as usize;
        let seed = self.seed;

        let thread = std::thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut sample_index: u64 = 0;
            let delta_phase = 2.0 * PI * tone_hz / fs;
            let mut phase = 0.0f64;

            let mut emit = |n: usize, phase: &mut f64, rng: &mut StdRng, index: &mut u64| {
                let mut data = vec![Vec::with_capacity(n); n_channels];
                let mut timestamps = Vec::with_capacity(n);
                for _ in 0..n {
                    let base = amplitude * phase.sin();
                    for row in data.iter_mut() {
                        let jitter = if noise > 0.0 {
                            rng.gen_range(-noise..noise)
                        } else {
                            0.0
                        };
                        row.push(base + jitter);
                    }
                    timestamps.push(*index as f64 / fs);
                    *index += 1;
                    *phase += delta_phase;
                    if *phase > 2.0 * PI {
                        *phase -= 2.0 * PI;
                    }
                }
                SampleBatch::new(data, timestamps)
            };

            if burst > 0 {
                let batch = emit(burst, &mut phase, &mut rng, &mut sample_index);
                if tx.send(batch).is_err() {
                    return;
                }
            }

            while !stop_flag.load(Ordering::Relaxed) {
                let batch = emit(BATCH_SAMPLES, &mut phase, &mut rng, &mut sample_index);
                if tx.send(batch).is_err() {
                    break;
                }
                std::thread::sleep(Duration::from_millis(
                    (BATCH_SAMPLES as f64 / fs * 1000.0) as u64,
                ));
            }
        });

        self.stop = Some(stop);
        self.thread = Some(thread);
        self.status = DeviceStatus::Streaming;
        info!(tone_hz, "mock stream started");
        Ok(())
    }

    async fn stop_stream(&mut self) -> Result<()> {
        if self.status != DeviceStatus::Streaming {
            return Ok(());
        }
        self.join_generator();
        self.status = DeviceStatus::Connected;
        Ok(())
    }

    fn status(&self) -> DeviceStatus {
        self.status
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            name: "Mock Muse 2".to_string(),
            address: "mock://headband".to_string(),
            device_type: "mock".to_string(),
            rssi: Some(-40),
        }
    }

    fn layout(&self) -> ChannelLayout {
        self.layout.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[tokio::test]
    async fn test_connect_then_stream_states() {
        let mut device = MockHeadband::new();
        assert_eq!(device.status(), DeviceStatus::Disconnected);

        device.connect().await.unwrap();
        assert_eq!(device.status(), DeviceStatus::Connected);

        let (tx, _rx) = unbounded();
        device.start_stream(tx).await.unwrap();
        assert!(device.is_streaming());

        device.stop_stream().await.unwrap();
        assert_eq!(device.status(), DeviceStatus::Connected);

        device.disconnect().await.unwrap();
        assert_eq!(device.status(), DeviceStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_stream_requires_connection() {
        let mut device = MockHeadband::new();
        let (tx, _rx) = unbounded();
        assert!(device.start_stream(tx).await.is_err());
    }

    #[tokio::test]
    async fn test_connect_failure_sets_error_state() {
        let mut device = MockHeadband::new().with_connect_failure();
        assert!(device.connect().await.is_err());
        assert_eq!(device.status(), DeviceStatus::Error);
        // Error is recoverable through a fresh connect
        device.connect().await.unwrap();
        assert_eq!(device.status(), DeviceStatus::Connected);
    }

    #[tokio::test]
    async fn test_burst_delivers_samples_immediately() {
        let mut device = MockHeadband::new().with_burst(2.0);
        device.connect().await.unwrap();

        let (tx, rx) = unbounded();
        device.start_stream(tx).await.unwrap();

        let batch = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(batch.n_channels(), 4);
        assert_eq!(batch.n_samples(), 512);
        assert!(batch.is_consistent());
        // Microvolt-scale alpha tone
        let peak = batch.data[0].iter().fold(0.0f64, |m, &v| m.max(v.abs()));
        assert!(peak > 20.0 && peak < 60.0, "peak was {peak}");

        device.disconnect().await.unwrap();
    }
}
