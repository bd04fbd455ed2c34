use crate::error::Result;
use crate::meter::clock::{elapsed_ms, Clock, MonotonicClock};
use crate::meter::constants::{
    gain_to_db, CLIP_AREA_HEIGHT, CLIP_INDICATOR_HEIGHT, CLIP_LEVEL_DB, VALUE_AREA_HEIGHT,
};
use crate::meter::geometry::{RangeDb, Rect};
use crate::meter::level_input::{LevelInput, LevelProducer};
use crate::meter::options::{clamp_decay_time, clamp_refresh_rate, MeterOptions, SegmentOptions};
use crate::meter::segment::SegmentSet;
use log::debug;
use std::time::Duration;

/// Per-channel level engine: turns the amplitude coming from the audio thread
/// into a decayed, peak-held dB level and keeps the segments and clip latch in
/// step with it.
///
/// Everything except [`set_input_level`](Self::set_input_level) runs on the
/// consumer (UI/timer) side and takes `&mut self`.
pub struct LevelEngine<C: Clock = MonotonicClock> {
    /// Raw amplitude from the audio thread
    input: LevelInput,
    clock: C,

    /// Options with timing values already clamped
    options: MeterOptions,
    segments: SegmentSet,
    scale: RangeDb,
    is_label_strip: bool,

    /// Derived from the decay time and scale length
    decay_rate_per_ms: f32,
    refresh_period: Duration,

    meter_level_db: f32,
    peak_hold_db: f32,
    clipped: bool,

    previous_refresh: Option<Duration>,
    previous_peak_hold_check: Option<Duration>,
    peak_hold_elapsed_ms: f32,

    peak_hold_dirty: bool,
    clip_dirty: bool,

    meter_bounds: Rect,
    level_bounds: Rect,
    value_bounds: Rect,
    clip_bounds: Rect,
}

impl LevelEngine {
    /// Engine with a single full-range segment, timed by the wall clock
    pub fn new(options: &MeterOptions) -> Self {
        Self::with_clock(options, MonotonicClock::new())
    }

    /// Engine with the given segments, timed by the wall clock
    pub fn with_segments(options: &MeterOptions, segment_options: &[SegmentOptions]) -> Result<Self> {
        let mut engine = Self::new(options);
        engine.set_meter_segments(segment_options)?;
        Ok(engine)
    }
}

impl<C: Clock> LevelEngine<C> {
    pub fn with_clock(options: &MeterOptions, clock: C) -> Self {
        let options = options.clamped();
        let segments = SegmentSet::full_range(&options);
        let scale = segments.scale();

        let mut engine = Self {
            input: LevelInput::new(),
            clock,
            options,
            segments,
            scale,
            is_label_strip: false,
            decay_rate_per_ms: 0.0,
            refresh_period: Duration::ZERO,
            meter_level_db: scale.start,
            peak_hold_db: scale.start,
            clipped: false,
            previous_refresh: None,
            previous_peak_hold_check: None,
            peak_hold_elapsed_ms: 0.0,
            peak_hold_dirty: true,
            clip_dirty: true,
            meter_bounds: Rect::EMPTY,
            level_bounds: Rect::EMPTY,
            value_bounds: Rect::EMPTY,
            clip_bounds: Rect::EMPTY,
        };
        engine.update_timing();
        engine
    }

    // === PRODUCER SIDE ===

    /// Push a new linear amplitude. Lock-free and allocation-free.
    #[inline]
    pub fn set_input_level(&self, amplitude: f32) {
        self.input.set_input_level(amplitude);
    }

    /// Handle the audio thread can own
    pub fn producer(&self) -> LevelProducer {
        self.input.producer()
    }

    // === CONSUMER SIDE ===

    /// Read the pending input as dB, clamped to the meter scale.
    ///
    /// Marks the input slot consumed, so the next write from the audio
    /// thread replaces the value instead of merging with it.
    pub fn get_input_level(&mut self) -> f32 {
        let amplitude = self.input.take();
        self.scale.clip_value(gain_to_db(amplitude, self.scale.start))
    }

    /// Update the meter level from the latest input (call once per refresh tick)
    pub fn refresh_meter_level(&mut self) {
        self.update_clip_latch();

        let input_db = self.get_input_level();
        self.meter_level_db = self.linear_decayed_level(input_db);

        if self.meter_level_db > self.peak_hold_db {
            self.peak_hold_db = self.meter_level_db;
            self.peak_hold_dirty = true;
        }

        self.segments.set_level(self.meter_level_db);

        // Latch as soon as the new peak has landed
        self.update_clip_latch();
    }

    /// Instant attack, linear fall at a fixed dB/ms rate
    fn linear_decayed_level(&mut self, input_db: f32) -> f32 {
        let now = self.clock.now();
        let elapsed = elapsed_ms(self.previous_refresh, now);
        self.previous_refresh = Some(now);

        if input_db >= self.meter_level_db {
            return input_db;
        }

        input_db.max(self.meter_level_db - elapsed * self.decay_rate_per_ms)
    }

    /// Run the peak hold timer (call once per draw/refresh cycle).
    ///
    /// The held peak is cleared every peak decay time, counted from the last
    /// clear. New peaks do not extend it.
    pub fn decay_peak_hold(&mut self) {
        let now = self.clock.now();
        self.peak_hold_elapsed_ms += elapsed_ms(self.previous_peak_hold_check, now);
        self.previous_peak_hold_check = Some(now);

        if self.peak_hold_elapsed_ms >= self.options.peak_decay_time_ms {
            self.peak_hold_elapsed_ms = 0.0;
            self.reset_peak_hold();
        }
    }

    fn update_clip_latch(&mut self) {
        if self.peak_hold_db >= CLIP_LEVEL_DB && !self.clipped {
            self.clipped = true;
            self.clip_dirty = true;
        }
    }

    /// Drop input and level back to silence. Peak hold and clip are kept.
    pub fn reset(&mut self) {
        self.input.clear();
        self.meter_level_db = self.scale.start;
        self.previous_refresh = None;
        self.segments.set_level(self.meter_level_db);
    }

    /// Clear the held peak. The level is kept.
    pub fn reset_peak_hold(&mut self) {
        self.peak_hold_db = self.scale.start;
        self.segments.reset_peak_hold();
        self.peak_hold_dirty = true;
    }

    /// Clear the clip latch. Nothing else changes.
    pub fn reset_clip_indicator(&mut self) {
        self.clipped = false;
        self.clip_dirty = true;
    }

    // === CONFIGURATION ===

    pub fn set_options(&mut self, options: &MeterOptions) {
        let relayout = options.value_enabled != self.options.value_enabled
            || options.show_clip_indicator != self.options.show_clip_indicator;

        self.options = options.clamped();
        self.update_timing();
        self.synchronize_options();

        if relayout {
            self.layout();
        }
        debug!(
            "meter options applied: decay {} ms, peak decay {} ms, refresh {} Hz",
            self.options.decay_time_ms, self.options.peak_decay_time_ms, self.options.refresh_rate_hz
        );
    }

    pub fn set_decay(&mut self, decay_ms: f32) {
        self.options.decay_time_ms = clamp_decay_time(decay_ms);
        self.update_timing();
        self.synchronize_options();
    }

    pub fn set_refresh_rate(&mut self, refresh_rate_hz: f32) {
        self.options.refresh_rate_hz = clamp_refresh_rate(refresh_rate_hz);
        self.update_timing();
        self.synchronize_options();
    }

    /// Replace the segments. The scale becomes the union of their level ranges.
    ///
    /// An invalid definition is rejected and the current segments stay in place.
    pub fn set_meter_segments(&mut self, segment_options: &[SegmentOptions]) -> Result<()> {
        let mut segments = SegmentSet::new(&self.options, segment_options)?;
        let scale = segments.scale();

        self.meter_level_db = scale.clip_value(self.meter_level_db);
        self.peak_hold_db = scale.clip_value(self.peak_hold_db);

        segments.set_is_label_strip(self.is_label_strip);
        segments.set_meter_bounds(self.level_bounds);
        segments.set_level(self.meter_level_db);
        segments.set_peak_hold(self.peak_hold_db);

        self.segments = segments;
        self.scale = scale;
        self.update_timing();
        self.peak_hold_dirty = true;

        debug!(
            "meter segments replaced: {} segments covering {} dB to {} dB",
            self.segments.len(),
            scale.start,
            scale.end
        );
        Ok(())
    }

    /// Label strips show tick marks instead of levels and have no clip indicator
    pub fn set_is_label_strip(&mut self, is_label_strip: bool) {
        self.is_label_strip = is_label_strip;
        self.synchronize_options();
        self.layout();
    }

    /// Area the meter occupies, in the presentation layer's coordinates
    pub fn set_bounds(&mut self, bounds: Rect) {
        if bounds == self.meter_bounds {
            return;
        }
        self.meter_bounds = bounds;
        self.layout();
    }

    fn update_timing(&mut self) {
        self.refresh_period = Duration::from_secs_f32(1.0 / self.options.refresh_rate_hz);
        self.decay_rate_per_ms = self.scale.length() / self.options.decay_time_ms;
    }

    fn synchronize_options(&mut self) {
        self.segments.set_meter_options(&self.options);
        self.segments.set_is_label_strip(self.is_label_strip);
        self.peak_hold_dirty = true;
    }

    fn layout(&mut self) {
        let mut level_bounds = self.meter_bounds;

        self.value_bounds = if self.options.value_enabled {
            level_bounds.remove_from_bottom(VALUE_AREA_HEIGHT)
        } else {
            Rect::EMPTY
        };

        self.clip_bounds = if self.options.show_clip_indicator {
            let reserved = level_bounds.remove_from_top(CLIP_AREA_HEIGHT);
            if self.is_label_strip {
                Rect::EMPTY
            } else {
                reserved.with_height(CLIP_INDICATOR_HEIGHT)
            }
        } else {
            Rect::EMPTY
        };

        self.level_bounds = level_bounds;
        self.segments.set_meter_bounds(level_bounds);

        self.peak_hold_dirty = true;
        self.clip_dirty = true;
    }

    // === QUERIES ===

    /// Decayed level currently shown, in dB
    pub fn meter_level_db(&self) -> f32 {
        self.meter_level_db
    }

    /// Held peak in dB; the scale minimum when nothing is held
    pub fn peak_hold_level(&self) -> f32 {
        self.peak_hold_db
    }

    pub fn is_clipped(&self) -> bool {
        self.clipped
    }

    /// Union of all segment level ranges
    pub fn scale(&self) -> RangeDb {
        self.scale
    }

    pub fn decay_rate_per_ms(&self) -> f32 {
        self.decay_rate_per_ms
    }

    /// Interval a host timer should use to call the refresh methods
    pub fn refresh_period(&self) -> Duration {
        self.refresh_period
    }

    pub fn options(&self) -> &MeterOptions {
        &self.options
    }

    pub fn segments(&self) -> &SegmentSet {
        &self.segments
    }

    pub fn is_label_strip(&self) -> bool {
        self.is_label_strip
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn meter_bounds(&self) -> Rect {
        self.meter_bounds
    }

    /// Area shared by the segments
    pub fn level_bounds(&self) -> Rect {
        self.level_bounds
    }

    /// Area for the peak value read-out (empty when disabled)
    pub fn value_bounds(&self) -> Rect {
        self.value_bounds
    }

    /// Area for the clip indicator (empty when disabled or a label strip)
    pub fn clip_indicator_bounds(&self) -> Rect {
        self.clip_bounds
    }

    /// Peak value read-out, or `None` when nothing is held or the read-out is off
    pub fn peak_value_text(&self) -> Option<String> {
        if !self.options.value_enabled || self.peak_hold_db <= self.scale.start {
            return None;
        }
        let precision = if self.peak_hold_db <= -10.0 { 1 } else { 2 };
        Some(format!("{:.*}", precision, self.peak_hold_db))
    }

    /// Collect what needs repainting since the last call.
    ///
    /// Includes every dirty segment, the value area if the peak changed and the
    /// clip area if the latch changed. The peak and clip flags are cleared;
    /// segment flags are cleared by [`mark_drawn`](Self::mark_drawn).
    pub fn take_dirty_bounds(&mut self) -> Rect {
        let mut dirty = self.segments.dirty_bounds();

        if self.peak_hold_dirty {
            dirty = dirty.union(&self.value_bounds);
            self.peak_hold_dirty = false;
        }

        if self.clip_dirty {
            dirty = dirty.union(&self.clip_bounds);
            self.clip_dirty = false;
        }

        dirty
    }

    /// The presentation layer has drawn every segment
    pub fn mark_drawn(&mut self) {
        self.segments.mark_drawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meter::clock::ManualClock;
    use crate::meter::constants::{db_to_gain, MIN_LEVEL_DB};
    use crate::meter::scales;

    fn engine() -> (LevelEngine<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (LevelEngine::with_clock(&MeterOptions::default(), clock.clone()), clock)
    }

    #[test]
    fn test_defaults() {
        let (engine, _) = engine();
        assert_eq!(engine.scale(), RangeDb::new(MIN_LEVEL_DB, 0.0));
        assert_eq!(engine.meter_level_db(), MIN_LEVEL_DB);
        assert_eq!(engine.peak_hold_level(), MIN_LEVEL_DB);
        assert!(!engine.is_clipped());
        assert!((engine.decay_rate_per_ms() - 0.096).abs() < 1e-6);
        assert_eq!(engine.refresh_period(), Duration::from_secs_f32(1.0 / 30.0));
    }

    #[test]
    fn test_get_input_level_clamps_to_scale() {
        let (mut engine, _) = engine();
        engine.set_input_level(4.0);
        assert_eq!(engine.get_input_level(), 0.0);

        engine.set_input_level(0.0);
        assert_eq!(engine.get_input_level(), MIN_LEVEL_DB);

        engine.set_input_level(db_to_gain(-20.0));
        assert!((engine.get_input_level() + 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_attack_is_instant() {
        let (mut engine, _) = engine();
        engine.set_input_level(db_to_gain(-12.0));
        engine.refresh_meter_level();
        assert!((engine.meter_level_db() + 12.0).abs() < 1e-3);
    }

    #[test]
    fn test_decay_is_linear_in_time() {
        let (mut engine, clock) = engine();
        engine.set_input_level(1.0);
        engine.refresh_meter_level();

        clock.advance_ms(100);
        engine.set_input_level(0.0);
        engine.refresh_meter_level();
        assert!((engine.meter_level_db() + 9.6).abs() < 1e-3);

        clock.advance_ms(50);
        engine.refresh_meter_level();
        assert!((engine.meter_level_db() + 14.4).abs() < 1e-3);
    }

    #[test]
    fn test_refresh_in_same_tick_does_not_decay() {
        let (mut engine, clock) = engine();
        engine.set_input_level(1.0);
        engine.refresh_meter_level();
        engine.set_input_level(0.0);
        clock.advance_ms(10);
        engine.refresh_meter_level();
        let level = engine.meter_level_db();
        assert!(level < 0.0);

        engine.refresh_meter_level();
        assert_eq!(engine.meter_level_db(), level);
    }

    #[test]
    fn test_clock_going_backwards_is_ignored() {
        let (mut engine, clock) = engine();
        clock.set(Duration::from_secs(10));
        engine.set_input_level(1.0);
        engine.refresh_meter_level();

        clock.set(Duration::from_secs(5));
        engine.set_input_level(0.0);
        engine.refresh_meter_level();
        assert_eq!(engine.meter_level_db(), 0.0);
    }

    #[test]
    fn test_reset_keeps_peak_hold() {
        let (mut engine, _) = engine();
        engine.set_input_level(db_to_gain(-6.0));
        engine.refresh_meter_level();

        engine.reset();
        assert_eq!(engine.meter_level_db(), MIN_LEVEL_DB);
        assert!((engine.peak_hold_level() + 6.0).abs() < 1e-3);
        assert_eq!(engine.get_input_level(), MIN_LEVEL_DB);
    }

    #[test]
    fn test_reset_peak_hold_keeps_level() {
        let (mut engine, _) = engine();
        engine.set_input_level(db_to_gain(-6.0));
        engine.refresh_meter_level();

        engine.reset_peak_hold();
        assert_eq!(engine.peak_hold_level(), MIN_LEVEL_DB);
        assert!((engine.meter_level_db() + 6.0).abs() < 1e-3);
    }

    #[test]
    fn test_set_decay_recomputes_rate() {
        let (mut engine, _) = engine();
        engine.set_decay(2000.0);
        assert!((engine.decay_rate_per_ms() - 0.048).abs() < 1e-6);

        engine.set_decay(10.0);
        assert_eq!(engine.options().decay_time_ms, 100.0);
        assert!((engine.decay_rate_per_ms() - 0.96).abs() < 1e-5);
    }

    #[test]
    fn test_set_refresh_rate_clamps() {
        let (mut engine, _) = engine();
        engine.set_refresh_rate(0.0);
        assert_eq!(engine.options().refresh_rate_hz, 1.0);
        assert_eq!(engine.refresh_period(), Duration::from_secs(1));
    }

    #[test]
    fn test_segments_change_scale_and_rate() {
        let (mut engine, _) = engine();
        engine
            .set_meter_segments(&scales::default_scale())
            .expect("valid scale");
        assert_eq!(engine.scale(), RangeDb::new(-60.0, 0.0));
        assert!((engine.decay_rate_per_ms() - 0.06).abs() < 1e-6);
        assert_eq!(engine.meter_level_db(), -60.0);
        assert_eq!(engine.peak_hold_level(), -60.0);
    }

    #[test]
    fn test_invalid_segments_keep_previous() {
        let (mut engine, _) = engine();
        engine
            .set_meter_segments(&scales::default_scale())
            .expect("valid scale");

        let mut broken = scales::default_scale();
        broken[1].meter_range.end = 1.5;
        assert!(engine.set_meter_segments(&broken).is_err());
        assert_eq!(engine.segments().len(), 3);
        assert_eq!(engine.scale(), RangeDb::new(-60.0, 0.0));
    }

    #[test]
    fn test_layout_reserves_value_and_clip_areas() {
        let clock = ManualClock::new();
        let options = MeterOptions {
            value_enabled: true,
            ..MeterOptions::default()
        };
        let mut engine = LevelEngine::with_clock(&options, clock);
        engine.set_bounds(Rect::new(0.0, 0.0, 20.0, 200.0));

        assert_eq!(engine.value_bounds(), Rect::new(0.0, 175.0, 20.0, 25.0));
        assert_eq!(engine.clip_indicator_bounds(), Rect::new(0.0, 0.0, 20.0, 6.0));
        assert_eq!(engine.level_bounds(), Rect::new(0.0, 12.0, 20.0, 163.0));

        engine.set_is_label_strip(true);
        assert!(engine.clip_indicator_bounds().is_empty());
        assert_eq!(engine.level_bounds(), Rect::new(0.0, 12.0, 20.0, 163.0));
    }

    #[test]
    fn test_toggling_value_display_relayouts() {
        let (mut engine, _) = engine();
        engine.set_bounds(Rect::new(0.0, 0.0, 20.0, 200.0));
        assert!(engine.value_bounds().is_empty());

        engine.set_options(&MeterOptions {
            value_enabled: true,
            ..MeterOptions::default()
        });
        assert_eq!(engine.value_bounds(), Rect::new(0.0, 175.0, 20.0, 25.0));
    }

    #[test]
    fn test_peak_value_text() {
        let clock = ManualClock::new();
        let options = MeterOptions {
            value_enabled: true,
            ..MeterOptions::default()
        };
        let mut engine = LevelEngine::with_clock(&options, clock);
        assert_eq!(engine.peak_value_text(), None);

        engine.set_input_level(db_to_gain(-20.0));
        engine.refresh_meter_level();
        assert_eq!(engine.peak_value_text().as_deref(), Some("-20.0"));

        engine.set_input_level(db_to_gain(-3.5));
        engine.refresh_meter_level();
        assert_eq!(engine.peak_value_text().as_deref(), Some("-3.50"));
    }

    #[test]
    fn test_dirty_flags_are_consumed() {
        let (mut engine, _) = engine();
        engine.set_bounds(Rect::new(0.0, 0.0, 20.0, 100.0));
        let dirty = engine.take_dirty_bounds();
        assert!(!dirty.is_empty());

        engine.mark_drawn();
        assert!(engine.take_dirty_bounds().is_empty());

        engine.set_input_level(db_to_gain(-48.0));
        engine.refresh_meter_level();
        let dirty = engine.take_dirty_bounds();
        assert_eq!(dirty, engine.level_bounds());
    }
}
