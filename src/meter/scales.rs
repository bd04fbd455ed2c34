//! Ready-made segment layouts.

use crate::meter::constants::{MAX_LEVEL_DB, MIN_LEVEL_DB};
use crate::meter::geometry::Range;
use crate::meter::options::{Colour, SegmentOptions};

fn segment(level: (f32, f32), meter: (f32, f32), colour: Colour, next_colour: Colour) -> SegmentOptions {
    SegmentOptions::new(Range::new(level.0, level.1), Range::new(meter.0, meter.1))
        .with_colours(colour, next_colour)
}

/// Single segment spanning the whole default range (−96 dB to 0 dB).
pub fn full_range() -> Vec<SegmentOptions> {
    vec![SegmentOptions::default()]
}

/// Three segments from −60 dB to 0 dB.
pub fn default_scale() -> Vec<SegmentOptions> {
    vec![
        segment((-60.0, -18.0), (0.0, 0.5), Colour::GREEN, Colour::GREEN),
        segment((-18.0, -3.0), (0.5, 0.9), Colour::GREEN, Colour::YELLOW),
        segment((-3.0, MAX_LEVEL_DB), (0.9, 1.0), Colour::YELLOW, Colour::RED),
    ]
}

/// SMPTE style meter, −44 dB to 0 dB.
pub fn smpte_scale() -> Vec<SegmentOptions> {
    vec![
        segment((-44.0, -12.0), (0.0, 0.7273), Colour::GREEN, Colour::YELLOW),
        segment((-12.0, -3.0), (0.7273, 0.9318), Colour::YELLOW, Colour::RED),
        segment((-3.0, MAX_LEVEL_DB), (0.9318, 1.0), Colour::RED, Colour::RED),
    ]
}

/// Yamaha mixer style meter, −60 dB to 0 dB.
pub fn yamaha_60_scale() -> Vec<SegmentOptions> {
    vec![
        segment((-60.0, -30.0), (0.0, 0.2751), Colour::YELLOW, Colour::YELLOW),
        segment((-30.0, -18.0), (0.2751, 0.4521), Colour::YELLOW, Colour::YELLOW),
        segment((-18.0, MAX_LEVEL_DB), (0.4521, 1.0), Colour::RED, Colour::RED),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid_and_contiguous() {
        for scale in [default_scale(), smpte_scale(), yamaha_60_scale(), full_range()] {
            for options in &scale {
                assert!(options.validate().is_ok());
            }
            for pair in scale.windows(2) {
                assert_eq!(pair[0].level_range.end, pair[1].level_range.start);
                assert_eq!(pair[0].meter_range.end, pair[1].meter_range.start);
            }
            assert_eq!(scale.last().map(|s| s.level_range.end), Some(MAX_LEVEL_DB));
        }
        assert_eq!(full_range()[0].level_range.start, MIN_LEVEL_DB);
    }
}
