use crate::error::Result;
use crate::meter::clock::{Clock, MonotonicClock};
use crate::meter::geometry::Rect;
use crate::meter::level::LevelEngine;
use crate::meter::level_input::LevelProducer;
use crate::meter::options::{MeterOptions, SegmentOptions};
use log::debug;

/// One meter channel as the presentation layer sees it.
///
/// Owns the channel's [`LevelEngine`] and accumulates the region that needs
/// repainting between two refresh ticks.
pub struct MeterChannel<C: Clock = MonotonicClock> {
    level: LevelEngine<C>,
    name: String,
    bounds: Rect,
    active: bool,
    dirty_region: Rect,
}

impl MeterChannel {
    pub fn new(name: impl Into<String>, options: &MeterOptions, is_label_strip: bool) -> Self {
        Self::with_engine(name, LevelEngine::new(options), is_label_strip)
    }
}

impl<C: Clock> MeterChannel<C> {
    pub fn with_engine(name: impl Into<String>, level: LevelEngine<C>, is_label_strip: bool) -> Self {
        let mut channel = Self {
            level,
            name: name.into(),
            bounds: Rect::EMPTY,
            active: true,
            dirty_region: Rect::EMPTY,
        };
        channel.level.set_is_label_strip(is_label_strip);
        channel
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> &LevelEngine<C> {
        &self.level
    }

    pub fn level_mut(&mut self) -> &mut LevelEngine<C> {
        &mut self.level
    }

    /// Handle for the audio thread
    pub fn producer(&self) -> LevelProducer {
        self.level.producer()
    }

    #[inline]
    pub fn set_input_level(&self, amplitude: f32) {
        self.level.set_input_level(amplitude);
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
        self.level.set_bounds(bounds);
        self.set_dirty(true);
    }

    /// Disabled channels are hidden: they neither refresh nor collect dirty regions.
    pub fn is_enabled(&self) -> bool {
        self.level.options().enabled
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Deactivated channels stop following the input. Switching either way resets the level.
    pub fn set_active(&mut self, active: bool) {
        if self.active == active {
            return;
        }
        self.active = active;
        debug!("meter channel '{}' active: {}", self.name, active);
        self.reset();
    }

    pub fn reset(&mut self) {
        self.level.reset();
        self.set_dirty(true);
    }

    pub fn reset_peak_hold(&mut self) {
        self.level.reset_peak_hold();
    }

    pub fn reset_clip_indicator(&mut self) {
        self.level.reset_clip_indicator();
    }

    pub fn set_options(&mut self, options: &MeterOptions) {
        if options.enabled != self.is_enabled() {
            debug!("meter channel '{}' enabled: {}", self.name, options.enabled);
        }
        self.level.set_options(options);

        if self.is_enabled() {
            self.set_dirty(true);
        } else {
            self.dirty_region = Rect::EMPTY;
        }
    }

    pub fn set_refresh_rate(&mut self, refresh_rate_hz: f32) {
        self.level.set_refresh_rate(refresh_rate_hz);
    }

    pub fn set_decay(&mut self, decay_ms: f32) {
        self.level.set_decay(decay_ms);
    }

    pub fn set_meter_segments(&mut self, segment_options: &[SegmentOptions]) -> Result<()> {
        self.level.set_meter_segments(segment_options)?;
        self.set_dirty(true);
        Ok(())
    }

    /// Whether anything needs repainting. With `within`, only that area counts.
    pub fn is_dirty(&self, within: Option<&Rect>) -> bool {
        match within {
            Some(area) => self.dirty_region.intersects(area),
            None => !self.dirty_region.is_empty(),
        }
    }

    pub fn add_dirty(&mut self, region: &Rect) {
        if !self.is_enabled() {
            return;
        }
        self.dirty_region = self.dirty_region.union(region);
    }

    /// Mark the whole channel dirty, or clear the accumulated region
    pub fn set_dirty(&mut self, dirty: bool) {
        if !self.is_enabled() {
            return;
        }
        self.dirty_region = if dirty { self.bounds } else { Rect::EMPTY };
    }

    pub fn dirty_region(&self) -> Rect {
        self.dirty_region
    }

    /// Advance the meter by one refresh tick.
    ///
    /// Returns the region to repaint and resets the accumulator. With
    /// `force` the whole channel is returned even if nothing changed.
    pub fn refresh(&mut self, force: bool) -> Option<Rect> {
        if !self.is_enabled() || self.bounds.is_empty() {
            return None;
        }

        if self.active {
            self.level.refresh_meter_level();
            self.level.decay_peak_hold();

            let level_dirty = self.level.take_dirty_bounds();
            self.add_dirty(&level_dirty);
        }

        if self.is_dirty(None) {
            let region = self.dirty_region;
            self.set_dirty(false);
            Some(region)
        } else if force {
            Some(self.bounds)
        } else {
            None
        }
    }

    /// The presentation layer has painted the channel
    pub fn mark_drawn(&mut self) {
        self.level.mark_drawn();
    }
}
