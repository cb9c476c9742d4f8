use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::{BufferStatus, Window};

use super::quality::compute_quality_score;
use super::types::{ChannelLayout, SampleBatch};

/// Default retention of the live buffer in seconds
pub const DEFAULT_BUFFER_SECONDS: f64 = 10.0;

/// Quality scoring looks at the trailing second of signal
const QUALITY_WINDOW_SECONDS: f64 = 1.0;

/// How long the ingest thread sleeps on an idle channel before rechecking
/// its stop flag
const INGEST_POLL: Duration = Duration::from_millis(250);

/// Bounded circular buffer holding the most recent samples of every
/// channel, plus a parallel timestamp ring.
///
/// One ingest writer appends batches from a crossbeam channel; readers take
/// a snapshot under the mutex. Lock hold times are bounded by the window
/// size, so readers never stall the writer for long.
pub struct ChannelRing {
    layout: ChannelLayout,
    capacity: usize,
    inner: Mutex<RingInner>,
}

struct RingInner {
    channels: Vec<VecDeque<f64>>,
    timestamps: VecDeque<f64>,
}

impl ChannelRing {
    pub fn new(layout: ChannelLayout, buffer_seconds: f64) -> Self {
        let capacity = ((layout.fs as f64 * buffer_seconds) as usize).max(1);
        let channels = (0..layout.n_channels())
            .map(|_| VecDeque::with_capacity(capacity))
            .collect();
        Self {
            layout,
            capacity,
            inner: Mutex::new(RingInner {
                channels,
                timestamps: VecDeque::with_capacity(capacity),
            }),
        }
    }

    pub fn with_default_retention(layout: ChannelLayout) -> Self {
        Self::new(layout, DEFAULT_BUFFER_SECONDS)
    }

    pub fn layout(&self) -> &ChannelLayout {
        &self.layout
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append one batch, evicting the oldest samples once full. Batches
    /// whose shape disagrees with the layout are dropped with a warning.
    pub fn append_batch(&self, batch: &SampleBatch) {
        if !batch.is_consistent() || batch.n_channels() != self.layout.n_channels() {
            warn!(
                channels = batch.n_channels(),
                samples = batch.n_samples(),
                "dropping malformed sample batch"
            );
            return;
        }

        let mut inner = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        for col in 0..batch.n_samples() {
            for (ring, row) in inner.channels.iter_mut().zip(batch.data.iter()) {
                if ring.len() == self.capacity {
                    ring.pop_front();
                }
                ring.push_back(row[col]);
            }
            if inner.timestamps.len() == self.capacity {
                inner.timestamps.pop_front();
            }
            inner.timestamps.push_back(batch.timestamps[col]);
        }
    }

    /// Number of buffered samples per channel
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        inner.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        for ring in &mut inner.channels {
            ring.clear();
        }
        inner.timestamps.clear();
    }

    /// Snapshot of the most recent `duration` seconds as a `Window`.
    ///
    /// Returns `None` until `fs * duration` samples are buffered. The window
    /// timestamp is the acquisition time of the oldest returned sample.
    pub fn get_window(&self, duration: f64) -> Option<Window> {
        let n_needed = (self.layout.fs as f64 * duration) as usize;
        if n_needed == 0 {
            return None;
        }

        let inner = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let have = inner.timestamps.len();
        if have < n_needed {
            return None;
        }

        let data: Vec<Vec<f64>> = inner
            .channels
            .iter()
            .map(|ring| ring.iter().skip(have - n_needed).copied().collect())
            .collect();
        let start_timestamp = inner.timestamps[have - n_needed];

        Some(Window::new(
            data,
            self.layout.fs,
            start_timestamp,
            self.layout.channel_names.clone(),
        ))
    }

    /// Per-channel contact quality over the trailing second. All channels
    /// score 0.0 until a full second is buffered.
    pub fn signal_quality(&self) -> HashMap<String, f64> {
        match self.get_window(QUALITY_WINDOW_SECONDS) {
            Some(window) => self
                .layout
                .channel_names
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let score = window.channel(i).map(compute_quality_score).unwrap_or(0.0);
                    (name.clone(), score)
                })
                .collect(),
            None => self
                .layout
                .channel_names
                .iter()
                .map(|name| (name.clone(), 0.0))
                .collect(),
        }
    }

    pub fn status(&self) -> BufferStatus {
        BufferStatus::new(self.len(), self.capacity, self.layout.fs)
    }

    /// Spawn the single ingest writer: a thread draining `rx` into the ring
    /// until the handle is stopped or every sender is dropped.
    pub fn start_ingest(self: &Arc<Self>, rx: Receiver<SampleBatch>) -> IngestHandle {
        let ring = Arc::clone(self);
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let thread = std::thread::spawn(move || {
            loop {
                match rx.recv_timeout(INGEST_POLL) {
                    Ok(batch) => ring.append_batch(&batch),
                    Err(RecvTimeoutError::Timeout) => {
                        if stop_flag.load(Ordering::Relaxed) {
                            break;
                        }
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            debug!("ingest thread exited");
        });

        IngestHandle {
            stop,
            thread: Some(thread),
        }
    }
}

/// Owner handle for the ingest thread. `stop` joins; dropping only signals.
pub struct IngestHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl IngestHandle {
    /// Signal the thread and wait for it to finish draining
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for IngestHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
