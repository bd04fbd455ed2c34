pub mod channel;
pub mod clock;
pub mod constants;
pub mod geometry;
pub mod level;
pub mod level_input;
pub mod options;
pub mod scales;
pub mod segment;

pub use channel::MeterChannel;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use geometry::{Range, RangeDb, Rect};
pub use level::LevelEngine;
pub use level_input::{create_level_channel, LevelInput, LevelProducer};
pub use options::{Colour, MeterOptions, SegmentOptions};
pub use segment::{Segment, SegmentSet};
