use crate::error::{MeterError, Result};
use crate::meter::constants::{
    DEFAULT_DECAY_MS, DEFAULT_PEAK_DECAY_MS, DEFAULT_REFRESH_RATE_HZ, DEFAULT_TICK_MARKS,
    MAX_DECAY_MS, MAX_LEVEL_DB, MIN_DECAY_MS, MIN_LEVEL_DB, MIN_REFRESH_RATE_HZ,
};
use crate::meter::geometry::{Range, RangeDb};
use log::warn;
use serde::{Deserialize, Serialize};

/// Packed `0xAARRGGBB` colour.
///
/// The engine never looks at colours, it only carries them so the
/// presentation layer gets them back alongside the geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Colour(pub u32);

impl Colour {
    pub const GREEN: Colour = Colour(0xff00_8000);
    pub const YELLOW: Colour = Colour(0xffff_ff00);
    pub const RED: Colour = Colour(0xffff_0000);
    pub const CRIMSON: Colour = Colour(0xffdc_143c);
}

/// Definition of one meter segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentOptions {
    /// Slice of the dB scale covered by the segment
    pub level_range: RangeDb,
    /// Slice of the meter's extent the segment occupies (0.0 = bottom, 1.0 = top)
    pub meter_range: Range,
    pub colour: Colour,
    /// Second colour, for gradients towards the top of the segment
    pub next_colour: Colour,
}

impl SegmentOptions {
    pub fn new(level_range: RangeDb, meter_range: Range) -> Self {
        Self {
            level_range,
            meter_range,
            ..Self::default()
        }
    }

    pub fn with_colours(self, colour: Colour, next_colour: Colour) -> Self {
        Self {
            colour,
            next_colour,
            ..self
        }
    }

    /// Check the level range has a positive length and the meter range is a
    /// non-empty part of `0.0..=1.0`.
    pub fn validate(&self) -> Result<()> {
        let level = self.level_range;
        if !level.is_finite() || level.length() <= 0.0 {
            return Err(MeterError::InvalidLevelRange {
                start: level.start,
                end: level.end,
            });
        }

        let meter = self.meter_range;
        if !meter.is_finite() || meter.start < 0.0 || meter.end > 1.0 || meter.length() <= 0.0 {
            return Err(MeterError::InvalidMeterRange {
                start: meter.start,
                end: meter.end,
            });
        }

        Ok(())
    }
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            level_range: Range::new(MIN_LEVEL_DB, MAX_LEVEL_DB),
            meter_range: Range::new(0.0, 1.0),
            colour: Colour::YELLOW,
            next_colour: Colour::YELLOW,
        }
    }
}

/// All meter options for behaviour and appearance.
///
/// A partial JSON document is layered over [`MeterOptions::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterOptions {
    /// Show the meter at all; a disabled channel skips refreshes
    pub enabled: bool,
    /// Reserve room for the peak value read-out
    pub value_enabled: bool,
    /// Time for the level to fall across the whole scale
    pub decay_time_ms: f32,
    /// How long a peak hold marker stays up
    pub peak_decay_time_ms: f32,
    pub refresh_rate_hz: f32,
    pub show_peak_hold_indicator: bool,
    pub show_clip_indicator: bool,
    pub clip_indicator_colour: Colour,
    /// Tick mark positions in dB, used by label strips
    pub tick_marks: Vec<f32>,
}

impl Default for MeterOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            value_enabled: false,
            decay_time_ms: DEFAULT_DECAY_MS,
            peak_decay_time_ms: DEFAULT_PEAK_DECAY_MS,
            refresh_rate_hz: DEFAULT_REFRESH_RATE_HZ,
            show_peak_hold_indicator: true,
            show_clip_indicator: true,
            clip_indicator_colour: Colour::CRIMSON,
            tick_marks: DEFAULT_TICK_MARKS.to_vec(),
        }
    }
}

impl MeterOptions {
    /// Parse options from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Copy of the options with every timing value forced into its legal range.
    pub fn clamped(&self) -> Self {
        Self {
            decay_time_ms: clamp_decay_time(self.decay_time_ms),
            peak_decay_time_ms: clamp_peak_decay_time(self.peak_decay_time_ms),
            refresh_rate_hz: clamp_refresh_rate(self.refresh_rate_hz),
            ..self.clone()
        }
    }
}

pub(crate) fn clamp_decay_time(decay_ms: f32) -> f32 {
    if !decay_ms.is_finite() {
        warn!("decay time {decay_ms} ms is not finite, using {DEFAULT_DECAY_MS} ms");
        return DEFAULT_DECAY_MS;
    }
    let clamped = decay_ms.clamp(MIN_DECAY_MS, MAX_DECAY_MS);
    if clamped != decay_ms {
        warn!("decay time {decay_ms} ms clamped to {clamped} ms");
    }
    clamped
}

pub(crate) fn clamp_refresh_rate(refresh_rate_hz: f32) -> f32 {
    if !refresh_rate_hz.is_finite() {
        warn!("refresh rate {refresh_rate_hz} Hz is not finite, using {DEFAULT_REFRESH_RATE_HZ} Hz");
        return DEFAULT_REFRESH_RATE_HZ;
    }
    let clamped = refresh_rate_hz.max(MIN_REFRESH_RATE_HZ);
    if clamped != refresh_rate_hz {
        warn!("refresh rate {refresh_rate_hz} Hz clamped to {clamped} Hz");
    }
    clamped
}

fn clamp_peak_decay_time(peak_decay_ms: f32) -> f32 {
    if !peak_decay_ms.is_finite() {
        warn!("peak decay time {peak_decay_ms} ms is not finite, using {DEFAULT_PEAK_DECAY_MS} ms");
        return DEFAULT_PEAK_DECAY_MS;
    }
    let clamped = peak_decay_ms.max(0.0);
    if clamped != peak_decay_ms {
        warn!("peak decay time {peak_decay_ms} ms clamped to {clamped} ms");
    }
    clamped
}
