//! Property-based tests for the level engine
//!
//! Random input and timing sequences must never break the meter's ballistics.

use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;
use segment_meter::constants::db_to_gain;
use segment_meter::{create_level_channel, scales, LevelEngine, ManualClock, MeterOptions};

fn proptest_config() -> ProptestConfig {
    ProptestConfig {
        cases: 512,
        ..ProptestConfig::default()
    }
}

/// Linear amplitudes including silence, sub-scale values and overs
fn amplitude() -> impl Strategy<Value = f32> {
    prop_oneof![
        Just(0.0f32),
        (-90.0f32..=0.0).prop_map(db_to_gain),
        (0.0f32..=4.0),
    ]
}

fn tick_ms() -> impl Strategy<Value = u64> {
    0u64..250
}

fn engine() -> (LevelEngine<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let mut engine = LevelEngine::with_clock(&MeterOptions::default(), clock.clone());
    engine
        .set_meter_segments(&scales::default_scale())
        .expect("default scale is valid");
    (engine, clock)
}

/// Property: between two refreshes the level never falls faster than the decay
/// rate allows, and never lands below the new input.
#[test]
fn test_decay_is_bounded_by_rate_and_input() {
    proptest!(proptest_config(), |(steps in prop::collection::vec((amplitude(), tick_ms()), 1..60))| {
        let (mut engine, clock) = engine();
        let rate = engine.decay_rate_per_ms();
        let scale = engine.scale();

        for (amplitude, dt) in steps {
            let previous = engine.meter_level_db();
            clock.advance_ms(dt);
            engine.set_input_level(amplitude);
            engine.refresh_meter_level();

            let level = engine.meter_level_db();
            prop_assert!(level >= scale.start && level <= scale.end);
            prop_assert!(
                level >= previous - rate * dt as f32 - 1e-3,
                "fell too fast: {} -> {} in {} ms", previous, level, dt
            );
        }
    });
}

/// Property: the peak hold never sits below the displayed level.
#[test]
fn test_peak_hold_never_below_level() {
    proptest!(proptest_config(), |(steps in prop::collection::vec((amplitude(), tick_ms()), 1..60))| {
        let (mut engine, clock) = engine();
        for (amplitude, dt) in steps {
            clock.advance_ms(dt);
            engine.set_input_level(amplitude);
            engine.refresh_meter_level();
            prop_assert!(engine.peak_hold_level() >= engine.meter_level_db());
            engine.decay_peak_hold();
        }
    });
}

/// Property: the clip latch only ever turns on while refreshing.
#[test]
fn test_clip_latch_never_clears_itself() {
    proptest!(proptest_config(), |(steps in prop::collection::vec((amplitude(), tick_ms()), 1..60))| {
        let (mut engine, clock) = engine();
        let mut clipped = false;
        for (amplitude, dt) in steps {
            clock.advance_ms(dt);
            engine.set_input_level(amplitude);
            engine.refresh_meter_level();
            engine.decay_peak_hold();

            prop_assert!(!clipped || engine.is_clipped());
            clipped = engine.is_clipped();
        }
    });
}

/// Property: unread writes collapse to their maximum.
#[test]
fn test_exchange_keeps_the_loudest_unread_value() {
    proptest!(proptest_config(), |(writes in prop::collection::vec(0.0f32..=2.0, 1..32))| {
        let (producer, input) = create_level_channel();
        for &amplitude in &writes {
            producer.set_input_level(amplitude);
        }
        let loudest = writes.iter().copied().fold(0.0f32, f32::max);
        prop_assert_eq!(input.take(), loudest);
    });
}

/// Property: at most one segment shows the peak hold marker.
#[test]
fn test_single_peak_marker() {
    proptest!(proptest_config(), |(amplitude in amplitude())| {
        let (mut engine, _) = engine();
        engine.set_input_level(amplitude);
        engine.refresh_meter_level();

        let markers = engine
            .segments()
            .iter()
            .filter(|segment| segment.peak_hold_ratio().is_some())
            .count();
        prop_assert!(markers <= 1);
    });
}
