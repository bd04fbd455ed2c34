use serde::{Deserialize, Serialize};

/// Closed interval `[start, end]`.
///
/// Used for decibel ranges (the meter scale and each segment's slice of it)
/// and for fractions of the meter's extent (0.0 = bottom, 1.0 = top).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub start: f32,
    pub end: f32,
}

/// A range of levels in decibels.
pub type RangeDb = Range;

impl Range {
    pub const fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f32 {
        self.end - self.start
    }

    /// `start <= value <= end`
    pub fn contains_up_to(&self, value: f32) -> bool {
        value >= self.start && value <= self.end
    }

    /// `start <= value < end`
    pub fn contains(&self, value: f32) -> bool {
        value >= self.start && value < self.end
    }

    /// Clamp `value` into the range.
    pub fn clip_value(&self, value: f32) -> f32 {
        value.max(self.start).min(self.end)
    }

    /// Position of `value` inside the range, clamped to `0.0..=1.0`.
    pub fn proportion_of(&self, value: f32) -> f32 {
        let length = self.length();
        if length <= 0.0 {
            return 0.0;
        }
        ((value - self.start) / length).clamp(0.0, 1.0)
    }

    /// Smallest range covering both.
    pub fn union(&self, other: &Range) -> Range {
        Range::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.start.is_finite() && self.end.is_finite()
    }
}

/// Axis aligned rectangle in the presentation layer's coordinate space.
///
/// The y axis grows downwards, so the top of the meter has the smallest y.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const EMPTY: Rect = Rect::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Union of both rectangles. Empty rectangles do not contribute.
    pub fn union(&self, other: &Rect) -> Rect {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Same rectangle with the top edge moved to `top`, keeping the bottom edge.
    pub fn with_top(&self, top: f32) -> Rect {
        let top = top.clamp(self.y, self.bottom());
        Rect::new(self.x, top, self.width, self.bottom() - top)
    }

    pub fn with_height(&self, height: f32) -> Rect {
        Rect::new(self.x, self.y, self.width, height.max(0.0))
    }

    /// Slice of this rectangle covering `fraction` of its height,
    /// measured from the bottom (0.0) up to the top (1.0).
    pub fn vertical_slice(&self, fraction: &Range) -> Rect {
        let top = self.y + self.height * (1.0 - fraction.end);
        Rect::new(self.x, top, self.width, self.height * fraction.length())
    }

    /// Split `amount` off the top. Returns the removed part and shrinks `self`.
    pub fn remove_from_top(&mut self, amount: f32) -> Rect {
        let amount = amount.clamp(0.0, self.height.max(0.0));
        let removed = Rect::new(self.x, self.y, self.width, amount);
        self.y += amount;
        self.height -= amount;
        removed
    }

    /// Split `amount` off the bottom. Returns the removed part and shrinks `self`.
    pub fn remove_from_bottom(&mut self, amount: f32) -> Rect {
        let amount = amount.clamp(0.0, self.height.max(0.0));
        self.height -= amount;
        Rect::new(self.x, self.bottom(), self.width, amount)
    }
}
