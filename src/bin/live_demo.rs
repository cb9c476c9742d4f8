use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use syntergia::engine::{Brain, BrainConfig, BrainMode};
use syntergia::hal::{ChannelRing, EegDevice, MockHeadband};
use tracing_subscriber::EnvFilter;

/// End-to-end live path against the mock headband: device stream -> ingest
/// ring -> brain -> state records.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("live headband demo (mock device)");
    println!("================================\n");

    // Alpha-band tone with realistic noise, pre-filled so the first windows
    // are available immediately
    let mut device = MockHeadband::new()
        .with_tone(10.0, 40.0)
        .with_noise(2.0)
        .with_burst(3.0);
    device.connect().await?;

    let (batch_tx, batch_rx) = crossbeam_channel::bounded(64);
    device.start_stream(batch_tx).await?;

    let ring = Arc::new(ChannelRing::with_default_retention(device.layout()));
    let ingest = ring.start_ingest(batch_rx);

    let mut brain = Brain::new(BrainConfig::default());
    if !brain.attach_live(&device, Arc::clone(&ring)) {
        anyhow::bail!("device refused to stream");
    }
    if !brain.set_mode(BrainMode::LiveHardware) {
        anyhow::bail!("live mode unavailable");
    }

    for _ in 0..20 {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let record = brain.next_state();
        let quality = record
            .avg_quality
            .map(|q| format!("{q:.2}"))
            .unwrap_or_else(|| "-".to_string());
        let fill = record
            .buffer_status
            .map(|b| format!("{:.0}%", b.fill_percent))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "state={:<14} alpha={:.2} coherence={:.2} quality={} buffer={}",
            record.state.name(),
            record.bands.alpha,
            record.coherence,
            quality,
            fill,
        );
    }

    device.stop_stream().await?;
    device.disconnect().await?;
    ingest.stop();
    println!("\nDemo complete.");
    Ok(())
}
