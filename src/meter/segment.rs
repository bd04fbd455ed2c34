use crate::error::{MeterError, Result};
use crate::meter::constants::PEAK_HOLD_HEIGHT;
use crate::meter::geometry::{Range, RangeDb, Rect};
use crate::meter::options::{Colour, MeterOptions, SegmentOptions};

/// One slice of the meter: a dB sub-range mapped onto a part of the meter's extent.
///
/// Tracks how much of the slice is filled by the current level, where the peak
/// hold marker sits (if the held peak falls inside the slice) and whether
/// anything changed since the presentation layer last drew it.
#[derive(Debug, Clone)]
pub struct Segment {
    options: SegmentOptions,
    show_peak_hold: bool,
    is_label_strip: bool,
    /// Top edge belongs to this segment (no other segment takes over there)
    closed_top: bool,

    configured_tick_marks: Vec<f32>,
    tick_marks: Vec<f32>,

    level_db: f32,
    fill_ratio: f32,
    peak_hold_db: f32,
    peak_hold_ratio: Option<f32>,

    meter_bounds: Rect,
    segment_bounds: Rect,
    fill_bounds: Rect,
    peak_hold_bounds: Rect,

    dirty: bool,
}

impl Segment {
    pub fn new(meter_options: &MeterOptions, segment_options: SegmentOptions) -> Result<Self> {
        segment_options.validate()?;
        Ok(Self::from_valid(meter_options, segment_options))
    }

    fn from_valid(meter_options: &MeterOptions, segment_options: SegmentOptions) -> Self {
        let mut segment = Self {
            options: segment_options,
            show_peak_hold: meter_options.show_peak_hold_indicator,
            is_label_strip: false,
            closed_top: true,
            configured_tick_marks: Vec::new(),
            tick_marks: Vec::new(),
            level_db: f32::NEG_INFINITY,
            fill_ratio: 0.0,
            peak_hold_db: f32::NEG_INFINITY,
            peak_hold_ratio: None,
            meter_bounds: Rect::EMPTY,
            segment_bounds: Rect::EMPTY,
            fill_bounds: Rect::EMPTY,
            peak_hold_bounds: Rect::EMPTY,
            dirty: true,
        };
        segment.set_meter_options(meter_options);
        segment
    }

    /// Replace the segment definition, keeping level and peak state.
    ///
    /// On error the segment is left untouched.
    pub fn set_segment_options(&mut self, segment_options: SegmentOptions) -> Result<()> {
        segment_options.validate()?;

        self.options = segment_options;
        self.update_tick_marks();
        self.set_meter_bounds(self.meter_bounds);
        self.fill_ratio = self.options.level_range.proportion_of(self.level_db);
        self.update_fill_bounds();
        self.update_peak_hold();
        self.dirty = true;
        Ok(())
    }

    pub fn set_meter_options(&mut self, meter_options: &MeterOptions) {
        self.show_peak_hold = meter_options.show_peak_hold_indicator;
        self.configured_tick_marks.clone_from(&meter_options.tick_marks);
        self.update_tick_marks();
        self.dirty = true;
    }

    pub fn set_is_label_strip(&mut self, is_label_strip: bool) {
        self.is_label_strip = is_label_strip;
        self.dirty = true;
    }

    pub(crate) fn set_closed_top(&mut self, closed_top: bool) {
        if self.closed_top == closed_top {
            return;
        }
        self.closed_top = closed_top;
        self.update_tick_marks();
        self.update_peak_hold();
    }

    /// Place the segment inside the meter area.
    pub fn set_meter_bounds(&mut self, meter_bounds: Rect) {
        self.meter_bounds = meter_bounds;
        self.segment_bounds = if meter_bounds.is_empty() {
            Rect::EMPTY
        } else {
            meter_bounds.vertical_slice(&self.options.meter_range)
        };
        self.update_fill_bounds();
        self.update_peak_hold_bounds();
        self.dirty = true;
    }

    /// Feed the meter's current level.
    pub fn set_level(&mut self, level_db: f32) {
        if level_db != self.level_db {
            self.level_db = level_db;

            let fill_ratio = self.options.level_range.proportion_of(level_db);
            if fill_ratio != self.fill_ratio {
                self.fill_ratio = fill_ratio;
                self.update_fill_bounds();
                self.dirty = true;
            }
        }

        if level_db > self.peak_hold_db {
            self.peak_hold_db = level_db;
            self.update_peak_hold();
        }
    }

    /// Set the held peak of the whole meter.
    pub fn set_peak_hold(&mut self, peak_hold_db: f32) {
        if peak_hold_db != self.peak_hold_db {
            self.peak_hold_db = peak_hold_db;
            self.update_peak_hold();
        }
    }

    pub fn reset_peak_hold(&mut self) {
        self.peak_hold_db = f32::NEG_INFINITY;
        self.peak_hold_ratio = None;
        self.peak_hold_bounds = Rect::EMPTY;
        self.dirty = true;
    }

    /// Whether `level_db` falls in this segment's slice of the scale.
    ///
    /// The slice is half-open at the top unless no other segment continues
    /// from there, so adjacent segments never both claim their shared edge.
    pub fn holds(&self, level_db: f32) -> bool {
        if self.closed_top {
            self.options.level_range.contains_up_to(level_db)
        } else {
            self.options.level_range.contains(level_db)
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The presentation layer has drawn the current state.
    pub fn mark_drawn(&mut self) {
        self.dirty = false;
    }

    pub fn options(&self) -> &SegmentOptions {
        &self.options
    }

    pub fn level_range(&self) -> RangeDb {
        self.options.level_range
    }

    pub fn meter_range(&self) -> Range {
        self.options.meter_range
    }

    pub fn colours(&self) -> (Colour, Colour) {
        (self.options.colour, self.options.next_colour)
    }

    pub fn is_label_strip(&self) -> bool {
        self.is_label_strip
    }

    /// Filled part of the segment, 0.0 (empty) to 1.0 (full).
    pub fn fill_ratio(&self) -> f32 {
        self.fill_ratio
    }

    /// Held peak, never reported below the bottom of the segment.
    pub fn peak_hold_db(&self) -> f32 {
        self.peak_hold_db.max(self.options.level_range.start)
    }

    /// Position of the peak hold marker inside the segment, if it shows one.
    pub fn peak_hold_ratio(&self) -> Option<f32> {
        if self.show_peak_hold && !self.is_label_strip {
            self.peak_hold_ratio
        } else {
            None
        }
    }

    pub fn segment_bounds(&self) -> Rect {
        self.segment_bounds
    }

    pub fn fill_bounds(&self) -> Rect {
        self.fill_bounds
    }

    pub fn peak_hold_bounds(&self) -> Option<Rect> {
        self.peak_hold_ratio()
            .filter(|_| !self.peak_hold_bounds.is_empty())
            .map(|_| self.peak_hold_bounds)
    }

    /// Tick marks (dB) that fall in this segment.
    pub fn tick_marks(&self) -> &[f32] {
        &self.tick_marks
    }

    /// Tick marks with their vertical position in the segment's bounds.
    pub fn tick_mark_positions(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.tick_marks.iter().map(move |&tick_mark| {
            let ratio = self.options.level_range.proportion_of(tick_mark);
            (
                tick_mark,
                self.segment_bounds.y + self.segment_bounds.height * (1.0 - ratio),
            )
        })
    }

    fn update_tick_marks(&mut self) {
        let tick_marks = self
            .configured_tick_marks
            .iter()
            .copied()
            .filter(|&tick_mark| self.holds(tick_mark))
            .collect();
        self.tick_marks = tick_marks;
    }

    fn update_fill_bounds(&mut self) {
        if self.segment_bounds.is_empty() {
            self.fill_bounds = Rect::EMPTY;
            return;
        }
        let bounds = self.segment_bounds;
        self.fill_bounds = bounds.with_top(bounds.y + bounds.height * (1.0 - self.fill_ratio));
    }

    fn update_peak_hold(&mut self) {
        let ratio = if self.holds(self.peak_hold_db) {
            Some(self.options.level_range.proportion_of(self.peak_hold_db)).filter(|&r| r > 0.0)
        } else {
            None
        };

        if ratio != self.peak_hold_ratio {
            self.peak_hold_ratio = ratio;
            self.dirty = true;
        }
        self.update_peak_hold_bounds();
    }

    fn update_peak_hold_bounds(&mut self) {
        self.peak_hold_bounds = match self.peak_hold_ratio {
            Some(ratio) if !self.segment_bounds.is_empty() => {
                let bounds = self.segment_bounds;
                Rect::new(
                    bounds.x,
                    bounds.y + bounds.height * (1.0 - ratio),
                    bounds.width,
                    PEAK_HOLD_HEIGHT,
                )
            }
            _ => Rect::EMPTY,
        };
    }
}

/// Ordered segments tiling a meter, plus the scale they cover together.
#[derive(Debug, Clone)]
pub struct SegmentSet {
    segments: Vec<Segment>,
    scale: RangeDb,
}

impl SegmentSet {
    /// Build the segments. Every definition is validated before anything is built.
    pub fn new(meter_options: &MeterOptions, segment_options: &[SegmentOptions]) -> Result<Self> {
        let Some(first) = segment_options.first() else {
            return Err(MeterError::NoSegments);
        };
        for options in segment_options {
            options.validate()?;
        }

        let scale = segment_options
            .iter()
            .fold(first.level_range, |scale, options| scale.union(&options.level_range));

        let mut segments: Vec<Segment> = segment_options
            .iter()
            .map(|options| Segment::from_valid(meter_options, *options))
            .collect();

        for index in 0..segments.len() {
            let end = segments[index].level_range().end;
            let continued = segments
                .iter()
                .enumerate()
                .any(|(other, segment)| other != index && segment.level_range().contains(end));
            segments[index].set_closed_top(!continued);
        }

        Ok(Self { segments, scale })
    }

    /// One segment covering the default range across the whole meter.
    pub fn full_range(meter_options: &MeterOptions) -> Self {
        let options = SegmentOptions::default();
        Self {
            segments: vec![Segment::from_valid(meter_options, options)],
            scale: options.level_range,
        }
    }

    /// Union of all segment level ranges.
    pub fn scale(&self) -> RangeDb {
        self.scale
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    pub fn set_level(&mut self, level_db: f32) {
        for segment in &mut self.segments {
            segment.set_level(level_db);
        }
    }

    pub fn set_peak_hold(&mut self, peak_hold_db: f32) {
        for segment in &mut self.segments {
            segment.set_peak_hold(peak_hold_db);
        }
    }

    pub fn reset_peak_hold(&mut self) {
        for segment in &mut self.segments {
            segment.reset_peak_hold();
        }
    }

    pub fn set_meter_options(&mut self, meter_options: &MeterOptions) {
        for segment in &mut self.segments {
            segment.set_meter_options(meter_options);
        }
    }

    pub fn set_is_label_strip(&mut self, is_label_strip: bool) {
        for segment in &mut self.segments {
            segment.set_is_label_strip(is_label_strip);
        }
    }

    pub fn set_meter_bounds(&mut self, meter_bounds: Rect) {
        for segment in &mut self.segments {
            segment.set_meter_bounds(meter_bounds);
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.segments.iter().any(Segment::is_dirty)
    }

    /// Union of the bounds of every segment that needs redrawing.
    pub fn dirty_bounds(&self) -> Rect {
        self.segments
            .iter()
            .filter(|segment| segment.is_dirty())
            .fold(Rect::EMPTY, |dirty, segment| dirty.union(&segment.segment_bounds()))
    }

    pub fn mark_drawn(&mut self) {
        for segment in &mut self.segments {
            segment.mark_drawn();
        }
    }
}

impl<'a> IntoIterator for &'a SegmentSet {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}
