//! State aggregation and orchestration.
//!
//! [`Brain`] routes windows from the active source through the analysis
//! engine, smooths the per-window metrics, classifies the smoothed bands,
//! and emits one [`crate::core::StateRecord`] per tick.

pub mod brain;
pub mod encoder;
pub mod mode;
pub mod smoothing;

pub use brain::{Brain, BrainConfig};
pub use encoder::{prepare_window, LatentEncoder, ENCODER_CHANNELS, ENCODER_FS, ENCODER_SAMPLES};
pub use mode::{BrainMode, DatasetVariant};
pub use smoothing::{MetricSmoother, SmoothedMetrics, DEFAULT_SMOOTHING_WINDOW};
