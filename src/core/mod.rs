pub mod bands;
pub mod metrics;
pub mod window;

pub use bands::{Band, FrequencyBands, SmoothedThresholds, StateThresholds};
pub use metrics::{
    BufferStatus, FocalPoint, MentalState, MetricsSnapshot, StateRecord, StateSource,
    WindowMetrics,
};
pub use window::Window;
