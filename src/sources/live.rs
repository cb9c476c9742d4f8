use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{BufferStatus, Window};
use crate::hal::ChannelRing;

use super::SignalSource;

/// Live hardware adapter: reads windows out of the shared ingest ring.
///
/// The ring is filled by the device ingest thread; this wrapper only ever
/// reads, so any number of consumers can hold their own `LiveBuffer` over
/// the same ring.
pub struct LiveBuffer {
    ring: Arc<ChannelRing>,
    channel_names: Vec<String>,
}

impl LiveBuffer {
    pub fn new(ring: Arc<ChannelRing>) -> Self {
        let channel_names = ring.layout().channel_names.clone();
        Self {
            ring,
            channel_names,
        }
    }

    pub fn ring(&self) -> &Arc<ChannelRing> {
        &self.ring
    }

    /// Per-channel quality over the trailing second
    pub fn signal_quality(&self) -> HashMap<String, f64> {
        self.ring.signal_quality()
    }

    pub fn buffer_status(&self) -> BufferStatus {
        self.ring.status()
    }
}

impl SignalSource for LiveBuffer {
    fn get_window(&mut self, duration: f64) -> Option<Window> {
        self.ring.get_window(duration)
    }

    fn fs(&self) -> u64 {
        self.ring.layout().fs
    }

    fn n_channels(&self) -> usize {
        self.channel_names.len()
    }

    fn channel_names(&self) -> &[String] {
        &self.channel_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{ChannelLayout, SampleBatch};

    fn filled_ring(seconds: f64) -> Arc<ChannelRing> {
        let layout = ChannelLayout::muse();
        let fs = layout.fs;
        let ring = Arc::new(ChannelRing::with_default_retention(layout));
        let n = (seconds * fs as f64) as usize;
        let data = vec![vec![10.0; n]; 4];
        let timestamps = (0..n).map(|i| i as f64 / fs as f64).collect();
        ring.append_batch(&SampleBatch::new(data, timestamps));
        ring
    }

    #[test]
    fn test_window_passthrough() {
        let mut buffer = LiveBuffer::new(filled_ring(3.0));
        let window = buffer.get_window(2.0).unwrap();
        assert_eq!(window.n_samples(), 512);
        assert_eq!(window.n_channels(), 4);
    }

    #[test]
    fn test_insufficient_data_is_none() {
        let mut buffer = LiveBuffer::new(filled_ring(1.0));
        assert!(buffer.get_window(2.0).is_none());
    }

    #[test]
    fn test_metadata_mirrors_layout() {
        let buffer = LiveBuffer::new(filled_ring(1.0));
        assert_eq!(buffer.fs(), 256);
        assert_eq!(buffer.channel_names()[0], "TP9");
        assert!(buffer.buffer_status().samples > 0);
    }
}
