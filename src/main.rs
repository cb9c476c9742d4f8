use syntergia::core::StateRecord;
use syntergia::engine::{Brain, BrainConfig, BrainMode};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

fn print_record(record: &StateRecord) {
    let session = record
        .session_progress
        .map(|p| format!(" session={:5.1}%", p * 100.0))
        .unwrap_or_default();
    println!(
        "[{:7.2}s] {:<16} alpha={:.2} beta={:.2} theta={:.2} coherence={:.2} entropy={:.2} dominant={:4.1}Hz{}",
        record.timestamp,
        record.state.name(),
        record.bands.alpha,
        record.bands.beta,
        record.bands.theta,
        record.coherence,
        record.entropy,
        record.frequency,
        session,
    );
}

async fn run_phase(brain: Brain, ticks: usize) -> anyhow::Result<()> {
    let (records_tx, mut records_rx) = broadcast::channel(64);
    let (shutdown_tx, _) = broadcast::channel(1);
    let shutdown_rx = shutdown_tx.subscribe();
    let handle = tokio::spawn(brain.run_loop(records_tx, shutdown_rx));

    for _ in 0..ticks {
        let record = records_rx.recv().await?;
        print_record(&record);
    }

    let _ = shutdown_tx.send(());
    handle.await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("syntergia engine demo");
    println!("=====================\n");

    println!("--- Dataset mode (relax epochs) ---");
    let brain = Brain::new(BrainConfig::default());
    run_phase(brain, 10).await?;

    println!("\n--- Session playback mode ---");
    let mut brain = Brain::new(BrainConfig::default());
    brain.set_mode(BrainMode::Session);
    run_phase(brain, 10).await?;

    println!("\nDemo complete.");
    Ok(())
}
