use atomic_float::AtomicF32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The shared slot: latest (or loudest unread) amplitude plus a flag telling
/// whether the meter has read it yet
struct InputSlot {
    amplitude: AtomicF32,
    consumed: AtomicBool,
}

impl InputSlot {
    fn new() -> Self {
        Self {
            amplitude: AtomicF32::new(0.0),
            consumed: AtomicBool::new(true),
        }
    }

    /// Called from audio thread - must be real-time safe, no allocations or locks
    #[inline]
    fn store(&self, amplitude: f32) {
        // NaN would poison the max() merge below
        let amplitude = if amplitude.is_finite() { amplitude } else { 0.0 };

        let merged = if self.consumed.load(Ordering::Acquire) {
            amplitude
        } else {
            // Meter is behind the audio thread: keep the loudest value so a
            // transient between two refreshes is never lost
            self.amplitude.load(Ordering::Relaxed).max(amplitude)
        };

        self.amplitude.store(merged, Ordering::Relaxed);
        self.consumed.store(false, Ordering::Release);
    }

    fn take(&self) -> f32 {
        // Acquire pairs with the producer's release so the amplitude read
        // below is at least as new as the write that cleared the flag
        self.consumed.swap(true, Ordering::AcqRel);
        self.amplitude.load(Ordering::Relaxed)
    }
}

/// Audio thread side of a meter's input slot.
///
/// Cheap to clone; every clone feeds the same meter.
#[derive(Clone)]
pub struct LevelProducer {
    slot: Arc<InputSlot>,
}

impl LevelProducer {
    /// Push a new linear amplitude (called from audio thread)
    #[inline]
    pub fn set_input_level(&self, amplitude: f32) {
        self.slot.store(amplitude);
    }
}

/// Meter side of the input slot.
///
/// Holds a single value, never a queue: a write either replaces the pending
/// value (when it has been read) or is merged into it with `max`.
pub struct LevelInput {
    slot: Arc<InputSlot>,
}

impl LevelInput {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(InputSlot::new()),
        }
    }

    /// Handle for the audio thread
    pub fn producer(&self) -> LevelProducer {
        LevelProducer {
            slot: self.slot.clone(),
        }
    }

    #[inline]
    pub fn set_input_level(&self, amplitude: f32) {
        self.slot.store(amplitude);
    }

    /// Read the pending amplitude and mark it consumed
    pub fn take(&self) -> f32 {
        self.slot.take()
    }

    /// Whether the audio thread wrote since the last [`take`](Self::take)
    pub fn has_pending(&self) -> bool {
        !self.slot.consumed.load(Ordering::Acquire)
    }

    /// Drop back to silence
    pub fn clear(&self) {
        self.slot.amplitude.store(0.0, Ordering::Release);
    }
}

impl Default for LevelInput {
    fn default() -> Self {
        Self::new()
    }
}

/// Factory function to create a meter input pair
/// Returns (producer for audio thread, input for the meter)
pub fn create_level_channel() -> (LevelProducer, LevelInput) {
    let input = LevelInput::new();
    (input.producer(), input)
}
