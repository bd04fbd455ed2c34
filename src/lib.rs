//! Level engine for segmented audio level meters.
//!
//! The audio thread pushes linear amplitudes through a lock-free single-slot
//! exchange ([`LevelProducer`]); the UI thread refreshes a [`LevelEngine`] on
//! its own schedule to get a decayed, peak-held dB level, a sticky clip latch
//! and per-segment fill and peak hold geometry.
//!
//! ```
//! use segment_meter::{scales, LevelEngine, MeterOptions};
//!
//! let mut meter = LevelEngine::with_segments(&MeterOptions::default(), &scales::default_scale())?;
//! let producer = meter.producer();
//!
//! // audio thread
//! producer.set_input_level(0.5);
//!
//! // UI thread, once per refresh tick
//! meter.refresh_meter_level();
//! meter.decay_peak_hold();
//! assert!((meter.meter_level_db() + 6.02).abs() < 0.01);
//! # Ok::<(), segment_meter::MeterError>(())
//! ```

pub mod error;
pub mod meter;

pub use error::{MeterError, Result};
pub use meter::constants;
pub use meter::scales;
pub use meter::{
    create_level_channel, Clock, Colour, LevelEngine, LevelInput, LevelProducer, ManualClock,
    MeterChannel, MeterOptions, MonotonicClock, Range, RangeDb, Rect, Segment, SegmentOptions,
    SegmentSet,
};
