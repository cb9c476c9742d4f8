use tempfile::tempdir;

use syntergia::core::FrequencyBands;
use syntergia::sources::{RecordedMetric, SessionRecording, DEFAULT_SESSION_FS};

fn session_with_metrics() -> SessionRecording {
    let mut session = SessionRecording::synthetic(20.0, 10.0, 50.0);
    session.name = "morning_sit".to_string();
    session.metrics = vec![
        RecordedMetric {
            timestamp: 2.0,
            state: "relaxed".to_string(),
            coherence: 0.55,
            entropy: 0.45,
            frequency: 9.5,
            bands: FrequencyBands::uniform(),
            focal_point: None,
            plv: Some(0.6),
        },
        RecordedMetric {
            timestamp: 10.0,
            state: "meditation".to_string(),
            coherence: 0.8,
            entropy: 0.3,
            frequency: 10.2,
            bands: FrequencyBands {
                delta: 0.1,
                theta: 0.15,
                alpha: 0.55,
                beta: 0.12,
                gamma: 0.08,
            },
            focal_point: None,
            plv: Some(0.85),
        },
    ];
    session
}

#[test]
fn test_json_round_trip_preserves_metrics() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("morning_sit.json");

    let original = session_with_metrics();
    original.save_json(&path).unwrap();

    let loaded = SessionRecording::load(&path).unwrap();
    assert_eq!(loaded.name, "morning_sit");
    assert_eq!(loaded.fs, 256);
    assert_eq!(loaded.n_channels(), 4);
    assert_eq!(loaded.n_samples(), original.n_samples());
    assert_eq!(loaded.channel_names, original.channel_names);
    assert_eq!(loaded.metrics, original.metrics);
    assert_eq!(loaded.data[0], original.data[0]);
}

#[test]
fn test_binary_round_trip_drops_metrics() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("evening_sit.eeg");

    let original = session_with_metrics();
    original.save_binary(&path).unwrap();

    let loaded = SessionRecording::load(&path).unwrap();
    // name comes from the file stem in the binary format
    assert_eq!(loaded.name, "evening_sit");
    assert_eq!(loaded.fs, original.fs);
    assert_eq!(loaded.n_channels(), original.n_channels());
    assert_eq!(loaded.n_samples(), original.n_samples());
    assert!(loaded.metrics.is_empty());

    // samples pass through an f32 narrowing
    for (a, b) in loaded.data[0].iter().zip(original.data[0].iter()) {
        assert!((a - b).abs() < 1e-3);
    }
}

#[test]
fn test_binary_rejects_foreign_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("not_a_session.eeg");
    std::fs::write(&path, b"RIFF....WAVEfmt code that is not ours").unwrap();
    assert!(SessionRecording::load(&path).is_err());
}

#[test]
fn test_binary_rejects_truncation() {
    let dir = tempdir().unwrap();
    let full = dir.path().join("full.eeg");
    let cut = dir.path().join("cut.eeg");

    session_with_metrics().save_binary(&full).unwrap();
    let bytes = std::fs::read(&full).unwrap();
    std::fs::write(&cut, &bytes[..bytes.len() / 2]).unwrap();
    assert!(SessionRecording::from_binary(&cut).is_err());
}

#[test]
fn test_minimal_json_gets_defaults() {
    // files written by older recorders carry nothing but data and sparse
    // metric rows; every omitted field must default sensibly
    let dir = tempdir().unwrap();
    let path = dir.path().join("legacy.json");
    std::fs::write(
        &path,
        r#"{
            "data": [[0.0, 1.0, 2.0, 3.0], [4.0, 5.0, 6.0, 7.0]],
            "metrics": [{"timestamp": 0.5, "state": "meditation"}]
        }"#,
    )
    .unwrap();

    let loaded = SessionRecording::from_json(&path).unwrap();
    assert_eq!(loaded.name, "legacy");
    assert_eq!(loaded.fs, DEFAULT_SESSION_FS);
    assert_eq!(loaded.channel_names, vec!["CH00", "CH01"]);

    let metric = &loaded.metrics[0];
    assert_eq!(metric.state, "meditation");
    assert_eq!(metric.coherence, 0.5);
    assert_eq!(metric.entropy, 0.5);
    assert_eq!(metric.frequency, 10.0);
    assert_eq!(metric.bands, FrequencyBands::uniform());
    assert!(metric.focal_point.is_none());
    assert!(metric.plv.is_none());
}

#[test]
fn test_fs_inferred_from_timestamps() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("timestamped.json");
    let timestamps: Vec<f64> = (0..8).map(|i| i as f64 / 128.0).collect();
    let json = serde_json::json!({
        "data": [vec![0.0; 8]],
        "timestamps": timestamps,
    });
    std::fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();

    let loaded = SessionRecording::from_json(&path).unwrap();
    assert_eq!(loaded.fs, 128);
}

#[test]
fn test_ragged_channels_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ragged.json");
    std::fs::write(&path, r#"{"data": [[1.0, 2.0], [1.0]]}"#).unwrap();
    assert!(SessionRecording::from_json(&path).is_err());
}

#[test]
fn test_nearest_metric_tolerance() {
    let session = session_with_metrics();

    // 2.6 s sits 0.6 s from the first metric, well inside tolerance
    let metric = session.nearest_metric(2.6).unwrap();
    assert_eq!(metric.state, "relaxed");

    // midpoint resolves to the closer of the two
    let metric = session.nearest_metric(9.2).unwrap();
    assert_eq!(metric.state, "meditation");

    // 5.0 s is 3 s from either metric
    assert!(session.nearest_metric(5.0).is_none());

    let empty = SessionRecording::synthetic(5.0, 10.0, 40.0);
    assert!(empty.nearest_metric(1.0).is_none());
}
