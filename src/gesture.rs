//! Pointer gesture classification
//!
//! One interpreter decides what a pointer-down-to-up sequence means:
//! a horizontal swipe shifts the clock style, a short tap exits, anything
//! else is ignored. `PointerTracker` feeds streamed pointer events into
//! the same interpreter so every input path shares one threshold set.

use std::time::Duration;
use tracing::debug;

use crate::constants::gesture;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// What the host should do with a finished gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureIntent {
    /// End the dream session
    Exit,
    /// Move this many styles along the circular order
    ShiftStyle(i32),
    Ignored,
}

/// Thresholds; distances are in whatever unit the sample positions use
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureThresholds {
    pub swipe_threshold: f32,
    pub tap_slop: f32,
    pub tap_timeout: Duration,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            swipe_threshold: gesture::SWIPE_THRESHOLD_DP,
            tap_slop: gesture::TAP_SLOP_DP,
            tap_timeout: Duration::from_millis(gesture::TAP_TIMEOUT_MS),
        }
    }
}

impl GestureThresholds {
    /// Convert density-independent distances to device pixels
    pub fn scaled(self, density: f32) -> Self {
        Self {
            swipe_threshold: self.swipe_threshold * density,
            tap_slop: self.tap_slop * density,
            tap_timeout: self.tap_timeout,
        }
    }
}

/// One complete pointer sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSample {
    pub start: Point,
    pub end: Point,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GestureInterpreter {
    thresholds: GestureThresholds,
}

impl GestureInterpreter {
    pub fn new(thresholds: GestureThresholds) -> Self {
        Self { thresholds }
    }

    pub fn classify(&self, sample: GestureSample) -> GestureIntent {
        let dx = sample.end.x - sample.start.x;
        let dy = sample.end.y - sample.start.y;
        let (abs_dx, abs_dy) = (dx.abs(), dy.abs());
        let t = &self.thresholds;

        let intent = if abs_dx > t.swipe_threshold && abs_dx > abs_dy {
            // Dragging the face right brings in the previous style
            if dx > 0.0 {
                GestureIntent::ShiftStyle(-1)
            } else {
                GestureIntent::ShiftStyle(1)
            }
        } else if abs_dx < t.tap_slop && abs_dy < t.tap_slop && sample.elapsed < t.tap_timeout {
            GestureIntent::Exit
        } else {
            GestureIntent::Ignored
        };

        debug!(dx = dx, dy = dy, elapsed_ms = sample.elapsed.as_millis() as u64, intent = ?intent, "Classified gesture");
        intent
    }
}

/// Tracks a streamed pointer sequence; timestamps are in milliseconds
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    interpreter: GestureInterpreter,
    down: Option<(Point, u64)>,
    last: Option<Point>,
}

impl PointerTracker {
    pub fn new(interpreter: GestureInterpreter) -> Self {
        Self {
            interpreter,
            down: None,
            last: None,
        }
    }

    pub fn down(&mut self, at: Point, time_ms: u64) {
        self.down = Some((at, time_ms));
        self.last = Some(at);
    }

    pub fn moved(&mut self, to: Point) {
        if self.down.is_some() {
            self.last = Some(to);
        }
    }

    /// Finish the sequence and classify it. An `up` without a `down` is ignored.
    pub fn up(&mut self, at: Point, time_ms: u64) -> GestureIntent {
        self.last = None;
        match self.down.take() {
            Some((start, down_ms)) => self.interpreter.classify(GestureSample {
                start,
                end: at,
                elapsed: Duration::from_millis(time_ms.saturating_sub(down_ms)),
            }),
            None => GestureIntent::Ignored,
        }
    }

    /// Horizontal travel so far, for hosts that drag the face along with the finger
    pub fn drag_x(&self) -> f32 {
        match (self.down, self.last) {
            (Some((start, _)), Some(last)) => last.x - start.x,
            _ => 0.0,
        }
    }

    pub fn cancel(&mut self) {
        self.down = None;
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(x0: f32, y0: f32, x1: f32, y1: f32, ms: u64) -> GestureSample {
        GestureSample {
            start: Point::new(x0, y0),
            end: Point::new(x1, y1),
            elapsed: Duration::from_millis(ms),
        }
    }

    #[test]
    fn test_short_horizontal_drag_is_swipe_not_exit() {
        let interpreter = GestureInterpreter::default();
        let intent = interpreter.classify(sample(0.0, 0.0, 40.0, 2.0, 100));
        assert_eq!(intent, GestureIntent::ShiftStyle(-1));
        assert_ne!(intent, GestureIntent::Exit);
    }

    #[test]
    fn test_leftward_swipe_shifts_forward() {
        let interpreter = GestureInterpreter::default();
        assert_eq!(
            interpreter.classify(sample(100.0, 50.0, 20.0, 60.0, 250)),
            GestureIntent::ShiftStyle(1)
        );
    }

    #[test]
    fn test_small_quick_touch_is_exit() {
        let interpreter = GestureInterpreter::default();
        assert_eq!(interpreter.classify(sample(0.0, 0.0, 3.0, 2.0, 120)), GestureIntent::Exit);
    }

    #[test]
    fn test_slow_diagonal_is_ignored() {
        let interpreter = GestureInterpreter::default();
        assert_eq!(interpreter.classify(sample(0.0, 0.0, 10.0, 10.0, 500)), GestureIntent::Ignored);
    }

    #[test]
    fn test_vertical_swipe_is_ignored() {
        let interpreter = GestureInterpreter::default();
        assert_eq!(interpreter.classify(sample(0.0, 0.0, 40.0, 90.0, 100)), GestureIntent::Ignored);
    }

    #[test]
    fn test_threshold_boundaries_are_strict() {
        let interpreter = GestureInterpreter::default();
        // Exactly at the swipe threshold is not a swipe
        assert_eq!(interpreter.classify(sample(0.0, 0.0, 32.0, 0.0, 100)), GestureIntent::Ignored);
        // Exactly at the tap timeout is not a tap
        assert_eq!(interpreter.classify(sample(0.0, 0.0, 1.0, 1.0, 300)), GestureIntent::Ignored);
        // Exactly at the slop is not a tap
        assert_eq!(interpreter.classify(sample(0.0, 0.0, 12.0, 0.0, 100)), GestureIntent::Ignored);
    }

    #[test]
    fn test_density_scaling() {
        let interpreter = GestureInterpreter::new(GestureThresholds::default().scaled(2.0));
        // 40px on a 2x screen is only 20dp
        assert_eq!(interpreter.classify(sample(0.0, 0.0, 40.0, 2.0, 100)), GestureIntent::Ignored);
        assert_eq!(interpreter.classify(sample(0.0, 0.0, 20.0, 2.0, 100)), GestureIntent::Exit);
        assert_eq!(interpreter.classify(sample(0.0, 0.0, 70.0, 2.0, 100)), GestureIntent::ShiftStyle(-1));
    }

    #[test]
    fn test_tracker_uses_release_point() {
        let mut tracker = PointerTracker::default();
        tracker.down(Point::new(200.0, 300.0), 1_000);
        tracker.moved(Point::new(180.0, 302.0));
        tracker.moved(Point::new(120.0, 305.0));
        assert_eq!(tracker.drag_x(), -80.0);
        assert_eq!(tracker.up(Point::new(110.0, 305.0), 1_200), GestureIntent::ShiftStyle(1));
        assert_eq!(tracker.drag_x(), 0.0);
    }

    #[test]
    fn test_tracker_tap_and_cancel() {
        let mut tracker = PointerTracker::default();
        tracker.down(Point::new(5.0, 5.0), 0);
        assert_eq!(tracker.up(Point::new(6.0, 4.0), 90), GestureIntent::Exit);

        tracker.down(Point::new(5.0, 5.0), 0);
        tracker.moved(Point::new(90.0, 5.0));
        tracker.cancel();
        assert_eq!(tracker.up(Point::new(90.0, 5.0), 100), GestureIntent::Ignored);
    }
}
