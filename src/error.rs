use thiserror::Error;

/// Errors raised while configuring a meter.
///
/// These only ever come out of configuration calls. Nothing on the refresh or
/// audio path can fail; bad samples and timing glitches are clamped instead.
#[derive(Debug, Error)]
pub enum MeterError {
    #[error("segment level range {start} dB..{end} dB must have a positive length")]
    InvalidLevelRange { start: f32, end: f32 },

    #[error("segment meter range {start}..{end} must lie within 0..1 and have a positive length")]
    InvalidMeterRange { start: f32, end: f32 },

    #[error("a meter needs at least one segment")]
    NoSegments,

    #[error("meter options parse error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T, E = MeterError> = std::result::Result<T, E>;
