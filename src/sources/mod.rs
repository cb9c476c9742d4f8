pub mod dataset;
pub mod live;
pub mod session;

pub use dataset::{DatasetKind, EpochDataset, DATASET_FS};
pub use live::LiveBuffer;
pub use session::{RecordedMetric, SessionRecording, DEFAULT_SESSION_FS};

use crate::core::Window;

/// Uniform windowing contract over heterogeneous signal backends.
///
/// Missing or insufficient data is a normal condition signalled by `None`;
/// callers retry on the next poll tick. Implementations never block.
pub trait SignalSource: Send {
    /// The most recent / next window of roughly `duration` seconds, or
    /// `None` when not enough signal is available yet
    fn get_window(&mut self, duration: f64) -> Option<Window>;

    /// Sampling rate of produced windows in Hz
    fn fs(&self) -> u64;

    fn n_channels(&self) -> usize;

    fn channel_names(&self) -> &[String];
}
