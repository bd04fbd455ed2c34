/// Meter level and timing constants and dB helper functions
/// Shared by the level engine, the segments and the options layer

/// Level range of the full-scale default meter
pub const MAX_LEVEL_DB: f32 = 0.0;
pub const MIN_LEVEL_DB: f32 = -96.0;

/// Level at or above which the clip indicator latches
pub const CLIP_LEVEL_DB: f32 = 0.0;

/// Meter decay time limits (time to fall across the whole scale)
pub const MIN_DECAY_MS: f32 = 100.0;
pub const MAX_DECAY_MS: f32 = 4000.0;
pub const DEFAULT_DECAY_MS: f32 = 1000.0;

/// How long the peak hold marker stays up before it is cleared
pub const DEFAULT_PEAK_DECAY_MS: f32 = 2000.0;

/// Refresh rate used when the host drives the meter from a fixed timer
pub const MIN_REFRESH_RATE_HZ: f32 = 1.0;
pub const DEFAULT_REFRESH_RATE_HZ: f32 = 30.0;

/// Layout sizes, in the presentation layer's units
pub const PEAK_HOLD_HEIGHT: f32 = 2.0;
pub const VALUE_AREA_HEIGHT: f32 = 25.0;
pub const CLIP_AREA_HEIGHT: f32 = 12.0;
pub const CLIP_INDICATOR_HEIGHT: f32 = 6.0;

/// Standard tick marks for the label strip
pub const DEFAULT_TICK_MARKS: &[f32] = &[0.0, -3.0, -6.0, -9.0, -12.0, -18.0, -30.0, -40.0, -50.0];

// === HELPER FUNCTIONS ===

/// Convert a linear amplitude to dB
///
/// Silence, negative and non-finite amplitudes all map to `floor_db`, so the
/// result is always finite as long as the floor is.
pub fn gain_to_db(amplitude: f32, floor_db: f32) -> f32 {
    if amplitude.is_finite() && amplitude > 0.0 {
        (20.0 * libm::log10f(amplitude)).max(floor_db)
    } else {
        floor_db
    }
}

/// Convert dB to linear amplitude
pub fn db_to_gain(db: f32) -> f32 {
    libm::powf(10.0, db / 20.0)
}
