use serde::{Deserialize, Serialize};

/// EEG device lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Disconnected,
    Connecting,
    Connected,
    Streaming,
    Error,
}

impl DeviceStatus {
    /// Check if transition from current status to target status is valid
    pub fn can_transition_to(&self, target: &DeviceStatus) -> bool {
        use DeviceStatus::*;

        matches!(
            (self, target),
            // From Disconnected
            (Disconnected, Connecting) |

            // From Connecting
            (Connecting, Connected) |
            (Connecting, Error) |
            (Connecting, Disconnected) |

            // From Connected
            (Connected, Streaming) |
            (Connected, Disconnected) |
            (Connected, Error) |

            // From Streaming
            (Streaming, Connected) |
            (Streaming, Disconnected) |
            (Streaming, Error) |

            // From Error
            (Error, Disconnected) |
            (Error, Connecting)
        )
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Streaming => "streaming",
            Self::Error => "error",
        }
    }
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self::Disconnected
    }
}

/// Device discovery information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    pub address: String,
    /// Device family, e.g. "muse2"
    pub device_type: String,
    /// Bluetooth signal strength when known
    pub rssi: Option<i32>,
}

/// Electrode montage: channel names in acquisition order plus the index
/// groups used for hemisphere averaging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelLayout {
    pub channel_names: Vec<String>,
    pub fs: u64,
    /// Indices of left-hemisphere channels
    pub left: Vec<usize>,
    /// Indices of right-hemisphere channels
    pub right: Vec<usize>,
}

impl ChannelLayout {
    /// Muse-style four-electrode headband at 256 Hz.
    /// TP9/AF7 sit over the left hemisphere, AF8/TP10 over the right.
    pub fn muse() -> Self {
        Self {
            channel_names: vec!["TP9".into(), "AF7".into(), "AF8".into(), "TP10".into()],
            fs: 256,
            left: vec![0, 1],
            right: vec![2, 3],
        }
    }

    pub fn n_channels(&self) -> usize {
        self.channel_names.len()
    }
}

impl Default for ChannelLayout {
    fn default() -> Self {
        Self::muse()
    }
}

/// One chunk of streamed samples: a row per channel plus one timestamp per
/// sample column, in seconds.
#[derive(Debug, Clone)]
pub struct SampleBatch {
    /// Per-channel rows, `n_channels x n_samples`, microvolts
    pub data: Vec<Vec<f64>>,
    /// Acquisition time of each sample column
    pub timestamps: Vec<f64>,
}

impl SampleBatch {
    pub fn new(data: Vec<Vec<f64>>, timestamps: Vec<f64>) -> Self {
        Self { data, timestamps }
    }

    pub fn n_channels(&self) -> usize {
        self.data.len()
    }

    pub fn n_samples(&self) -> usize {
        self.timestamps.len()
    }

    /// Rows must agree with the timestamp count for the batch to be usable
    pub fn is_consistent(&self) -> bool {
        let n = self.n_samples();
        self.data.iter().all(|row| row.len() == n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_status_transitions() {
        use DeviceStatus::*;
        assert!(Disconnected.can_transition_to(&Connecting));
        assert!(Connecting.can_transition_to(&Connected));
        assert!(Connected.can_transition_to(&Streaming));
        assert!(Streaming.can_transition_to(&Connected));
        assert!(Error.can_transition_to(&Disconnected));
    }

    #[test]
    fn test_invalid_status_transitions() {
        use DeviceStatus::*;
        assert!(!Disconnected.can_transition_to(&Streaming));
        assert!(!Disconnected.can_transition_to(&Connected));
        assert!(!Streaming.can_transition_to(&Connecting));
        assert!(!Connected.can_transition_to(&Connecting));
    }

    #[test]
    fn test_muse_layout() {
        let layout = ChannelLayout::muse();
        assert_eq!(layout.n_channels(), 4);
        assert_eq!(layout.fs, 256);
        assert_eq!(layout.channel_names[0], "TP9");
        assert_eq!(layout.left, vec![0, 1]);
        assert_eq!(layout.right, vec![2, 3]);
    }

    #[test]
    fn test_batch_consistency() {
        let good = SampleBatch::new(vec![vec![1.0, 2.0]; 4], vec![0.0, 0.004]);
        assert!(good.is_consistent());
        assert_eq!(good.n_channels(), 4);
        assert_eq!(good.n_samples(), 2);

        let bad = SampleBatch::new(vec![vec![1.0], vec![1.0, 2.0]], vec![0.0]);
        assert!(!bad.is_consistent());
    }
}
