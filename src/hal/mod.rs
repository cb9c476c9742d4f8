pub mod mock;
pub mod quality;
pub mod ring;
pub mod traits;
pub mod types;

pub use mock::MockHeadband;
pub use quality::{average_quality, compute_quality_score};
pub use ring::{ChannelRing, IngestHandle, DEFAULT_BUFFER_SECONDS};
pub use traits::EegDevice;
pub use types::{ChannelLayout, DeviceInfo, DeviceStatus, SampleBatch};
