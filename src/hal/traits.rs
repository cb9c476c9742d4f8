use anyhow::Result;
use async_trait::async_trait;
use crossbeam_channel::Sender;

use super::types::{ChannelLayout, DeviceInfo, DeviceStatus, SampleBatch};

/// Trait implemented by EEG acquisition devices.
///
/// Streaming is push-based: `start_stream` hands the device a channel and
/// the device delivers `SampleBatch` chunks until `stop_stream`. Status
/// moves through the `DeviceStatus` machine; implementations must refuse
/// calls that would make an illegal transition.
#[async_trait]
pub trait EegDevice: Send {
    /// Establish a connection (async for Bluetooth/LSL discovery)
    async fn connect(&mut self) -> Result<()>;

    /// Tear down the connection, stopping any active stream first
    async fn disconnect(&mut self) -> Result<()>;

    /// Begin streaming samples into `tx`
    async fn start_stream(&mut self, tx: Sender<SampleBatch>) -> Result<()>;

    /// Stop streaming, keeping the connection open
    async fn stop_stream(&mut self) -> Result<()>;

    fn status(&self) -> DeviceStatus;

    fn info(&self) -> DeviceInfo;

    /// Electrode montage and sample rate of the delivered batches
    fn layout(&self) -> ChannelLayout;

    fn is_streaming(&self) -> bool {
        self.status() == DeviceStatus::Streaming
    }
}
