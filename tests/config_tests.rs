//! Meter configuration loading tests

use segment_meter::constants::{DEFAULT_DECAY_MS, MAX_DECAY_MS, MIN_REFRESH_RATE_HZ};
use segment_meter::{LevelEngine, ManualClock, MeterError, MeterOptions, SegmentOptions};

#[test]
fn test_partial_json_keeps_defaults() {
    let options = MeterOptions::from_json(r#"{ "decay_time_ms": 2500.0, "value_enabled": true }"#)
        .expect("valid json");

    assert_eq!(options.decay_time_ms, 2500.0);
    assert!(options.value_enabled);
    assert_eq!(
        MeterOptions {
            decay_time_ms: DEFAULT_DECAY_MS,
            value_enabled: false,
            ..options.clone()
        },
        MeterOptions::default()
    );
}

#[test]
fn test_malformed_json_is_a_config_error() {
    let result = MeterOptions::from_json(r#"{ "decay_time_ms": "slow" }"#);
    assert!(matches!(result, Err(MeterError::Config(_))));
}

#[test]
fn test_options_survive_json() {
    let options = MeterOptions {
        peak_decay_time_ms: 500.0,
        show_clip_indicator: false,
        tick_marks: vec![0.0, -6.0, -12.0],
        ..MeterOptions::default()
    };
    let json = options.to_json().expect("serializable");
    assert_eq!(MeterOptions::from_json(&json).expect("valid json"), options);
}

#[test]
fn test_out_of_range_timing_is_clamped_by_the_engine() {
    let options =
        MeterOptions::from_json(r#"{ "decay_time_ms": 60000.0, "refresh_rate_hz": -5.0 }"#)
            .expect("valid json");
    let engine = LevelEngine::with_clock(&options, ManualClock::new());

    assert_eq!(engine.options().decay_time_ms, MAX_DECAY_MS);
    assert_eq!(engine.options().refresh_rate_hz, MIN_REFRESH_RATE_HZ);
}

#[test]
fn test_segments_from_json() {
    let segments: Vec<SegmentOptions> = serde_json::from_str(
        r#"[
            { "level_range": { "start": -40.0, "end": -10.0 }, "meter_range": { "start": 0.0, "end": 0.6 } },
            { "level_range": { "start": -10.0, "end": 0.0 }, "meter_range": { "start": 0.6, "end": 1.0 }, "colour": 4294901760 }
        ]"#,
    )
    .expect("valid json");

    let mut engine = LevelEngine::with_clock(&MeterOptions::default(), ManualClock::new());
    engine.set_meter_segments(&segments).expect("valid segments");

    assert_eq!(engine.scale().start, -40.0);
    assert_eq!(engine.scale().end, 0.0);
    assert_eq!(engine.segments().get(1).map(|s| s.colours().0 .0), Some(0xffff_0000));
}
