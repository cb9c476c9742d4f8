use std::sync::Arc;

use syntergia::hal::{average_quality, ChannelLayout, ChannelRing, SampleBatch};

/// Batch where every channel carries the same ramp, offset per channel so
/// mixed-up channel ordering would show immediately
fn ramp_batch(layout: &ChannelLayout, start: usize, n: usize) -> SampleBatch {
    let fs = layout.fs as f64;
    let data: Vec<Vec<f64>> = (0..layout.n_channels())
        .map(|ch| {
            (start..start + n)
                .map(|i| i as f64 + ch as f64 * 10_000.0)
                .collect()
        })
        .collect();
    let timestamps = (start..start + n).map(|i| i as f64 / fs).collect();
    SampleBatch::new(data, timestamps)
}

#[test]
fn test_window_unavailable_until_filled() {
    let ring = ChannelRing::new(ChannelLayout::muse(), 2.0);
    assert!(ring.get_window(1.0).is_none());

    ring.append_batch(&ramp_batch(ring.layout(), 0, 128));
    assert!(ring.get_window(1.0).is_none(), "128 of 256 samples buffered");

    ring.append_batch(&ramp_batch(ring.layout(), 128, 128));
    assert!(ring.get_window(1.0).is_some());
}

#[test]
fn test_window_returns_most_recent_samples() {
    let layout = ChannelLayout::muse();
    let ring = ChannelRing::new(layout.clone(), 4.0);
    ring.append_batch(&ramp_batch(&layout, 0, 768));

    let window = ring.get_window(1.0).unwrap();
    assert_eq!(window.n_samples(), 256);
    assert_eq!(window.fs, 256);
    // trailing second of the ramp is 512..768
    let ch0 = window.channel(0).unwrap();
    assert_eq!(ch0[0], 512.0);
    assert_eq!(ch0[255], 767.0);
    assert!((window.start_timestamp - 2.0).abs() < 1e-9);
}

#[test]
fn test_eviction_splices_across_wrap() {
    let layout = ChannelLayout::muse();
    // 2 s retention = 512 samples; 3 x 256 appended forces one full wrap
    let ring = ChannelRing::new(layout.clone(), 2.0);
    assert_eq!(ring.capacity(), 512);

    for start in [0usize, 256, 512] {
        ring.append_batch(&ramp_batch(&layout, start, 256));
    }
    assert_eq!(ring.len(), 512);

    let window = ring.get_window(2.0).unwrap();
    for ch in 0..layout.n_channels() {
        let samples = window.channel(ch).unwrap();
        let offset = ch as f64 * 10_000.0;
        assert_eq!(samples[0], 256.0 + offset);
        assert_eq!(samples[511], 767.0 + offset);
        // strictly increasing across the wrap point, no stale run
        for pair in samples.windows(2) {
            assert!(pair[1] > pair[0], "splice out of order: {pair:?}");
        }
    }
    assert!((window.start_timestamp - 1.0).abs() < 1e-9);
}

#[test]
fn test_malformed_batch_dropped() {
    let ring = ChannelRing::new(ChannelLayout::muse(), 2.0);
    // two channels instead of four
    let bad = SampleBatch::new(vec![vec![1.0; 8]; 2], (0..8).map(|i| i as f64).collect());
    ring.append_batch(&bad);
    assert!(ring.is_empty());

    // ragged rows
    let ragged = SampleBatch::new(
        vec![vec![1.0; 8], vec![1.0; 7], vec![1.0; 8], vec![1.0; 8]],
        (0..8).map(|i| i as f64).collect(),
    );
    ring.append_batch(&ragged);
    assert!(ring.is_empty());
}

#[test]
fn test_status_reports_fill() {
    let layout = ChannelLayout::muse();
    let ring = ChannelRing::new(layout.clone(), 2.0);
    ring.append_batch(&ramp_batch(&layout, 0, 256));

    let status = ring.status();
    assert_eq!(status.samples, 256);
    assert_eq!(status.capacity, 512);
    assert!((status.fill_percent - 50.0).abs() < 1e-9);
    assert!((status.duration_available - 1.0).abs() < 1e-9);
}

#[test]
fn test_quality_zero_until_one_second_buffered() {
    let layout = ChannelLayout::muse();
    let ring = ChannelRing::new(layout.clone(), 2.0);
    ring.append_batch(&ramp_batch(&layout, 0, 64));

    let scores = ring.signal_quality();
    assert_eq!(scores.len(), 4);
    assert!(scores.values().all(|&s| s == 0.0));
    assert_eq!(average_quality(&scores), 0.0);
}

#[test]
fn test_clear_empties_every_channel() {
    let layout = ChannelLayout::muse();
    let ring = ChannelRing::new(layout.clone(), 2.0);
    ring.append_batch(&ramp_batch(&layout, 0, 256));
    assert_eq!(ring.len(), 256);

    ring.clear();
    assert!(ring.is_empty());
    assert!(ring.get_window(0.5).is_none());
}

#[test]
fn test_ingest_thread_drains_channel() {
    let layout = ChannelLayout::muse();
    let ring = Arc::new(ChannelRing::new(layout.clone(), 4.0));
    let (tx, rx) = crossbeam_channel::bounded(16);
    let ingest = ring.start_ingest(rx);

    for start in [0usize, 256, 512] {
        tx.send(ramp_batch(&layout, start, 256)).unwrap();
    }
    drop(tx);
    // sender dropped: the thread drains what is queued and exits
    ingest.stop();

    assert_eq!(ring.len(), 768);
    let window = ring.get_window(1.0).unwrap();
    assert_eq!(window.channel(0).unwrap()[0], 512.0);
}
