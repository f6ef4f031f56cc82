//! Gesture input: turns continuous pinch samples into session events and
//! detects the long press that splits a row.
//!
//! Neither recognizer claims the pointer exclusively. Row selection and
//! scrolling keep receiving the same input while no merge is underway.

use crate::geometry::Point;
use crate::session::MergeEvent;
use std::time::{Duration, Instant};
use tracing::debug;

/// Everything the controller can be asked to do by gesture input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    Merge(MergeEvent),
    Split { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinchPhase {
    Began,
    Changed,
    Ended,
    Cancelled,
}

/// One raw sample from the host's pinch recognizer. `touches` holds only
/// the fingers currently down.
#[derive(Debug, Clone, PartialEq)]
pub struct PinchSample {
    pub phase: PinchPhase,
    pub touches: Vec<Point>,
    pub scale: f64,
    pub velocity: f64,
}

#[derive(Debug, Default)]
pub struct PinchAdapter {
    active: bool,
}

impl PinchAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always true: this recognizer runs alongside any sibling on the same surface.
    pub const fn recognizes_simultaneously(&self) -> bool {
        true
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn process(&mut self, sample: &PinchSample) -> Option<MergeEvent> {
        match sample.phase {
            PinchPhase::Began => {
                if let &[a, b] = sample.touches.as_slice() {
                    self.active = true;
                    Some(MergeEvent::Start { touches: [a, b] })
                } else {
                    debug!(touches = sample.touches.len(), "pinch began without two touches");
                    self.active = false;
                    None
                }
            }
            PinchPhase::Changed if self.active => {
                if sample.touches.len() < 2 {
                    debug!("touch lost mid-pinch");
                    self.active = false;
                    Some(MergeEvent::Cancel)
                } else {
                    Some(MergeEvent::Progress {
                        velocity: sample.velocity,
                        scale: sample.scale,
                    })
                }
            }
            PinchPhase::Ended if self.active => {
                self.active = false;
                Some(MergeEvent::End)
            }
            PinchPhase::Cancelled if self.active => {
                self.active = false;
                Some(MergeEvent::Cancel)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Press {
    index: usize,
    origin: Point,
    since: Instant,
}

/// Fires once when a press stays on a row, within `slop` points, for `min_duration`.
#[derive(Debug)]
pub struct LongPressDetector {
    min_duration: Duration,
    slop: f64,
    press: Option<Press>,
    fired: bool,
}

impl LongPressDetector {
    pub fn new(min_duration: Duration, slop: f64) -> Self {
        Self {
            min_duration,
            slop,
            press: None,
            fired: false,
        }
    }

    /// Start tracking. Presses outside any row are ignored.
    pub fn press(&mut self, index: Option<usize>, at: Point, now: Instant) {
        self.fired = false;
        self.press = index.map(|index| Press {
            index,
            origin: at,
            since: now,
        });
    }

    pub fn moved(&mut self, to: Point) {
        if self
            .press
            .is_some_and(|p| p.origin.distance_to(to) > self.slop)
        {
            self.press = None;
        }
    }

    pub fn release(&mut self) {
        self.press = None;
        self.fired = false;
    }

    /// Call on every tick; yields the split request at most once per press.
    pub fn poll(&mut self, now: Instant) -> Option<GestureEvent> {
        if self.fired {
            return None;
        }
        let press = self.press?;
        if now.saturating_duration_since(press.since) < self.min_duration {
            return None;
        }
        self.fired = true;
        debug!(index = press.index, "long press");
        Some(GestureEvent::Split { index: press.index })
    }
}

/// Builds two-finger pinch samples from a single pointer: one finger is
/// pinned in place, the dragged pointer is the other.
#[derive(Debug, Default)]
pub struct TwoFingerEmulator {
    pinned: Option<Point>,
    drag: Option<DragState>,
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    start_distance: f64,
    last_scale: f64,
    last_time: Instant,
    pinned: Point,
}

impl TwoFingerEmulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pinned(&self) -> Option<Point> {
        self.pinned
    }

    /// Pin a finger at `at`, or lift it if one is already pinned.
    /// Lifting mid-drag yields a one-touch sample so the pinch cancels.
    pub fn toggle_pin(&mut self, at: Point) -> Option<PinchSample> {
        if self.pinned.take().is_some() {
            return self.drag.map(|d| PinchSample {
                phase: PinchPhase::Changed,
                touches: vec![d.pinned],
                scale: d.last_scale,
                velocity: 0.0,
            });
        }
        self.pinned = Some(at);
        None
    }

    pub fn drag_start(&mut self, at: Point, now: Instant) -> Option<PinchSample> {
        let pinned = self.pinned?;
        self.drag = Some(DragState {
            start_distance: pinned.distance_to(at).max(1.0),
            last_scale: 1.0,
            last_time: now,
            pinned,
        });
        Some(PinchSample {
            phase: PinchPhase::Began,
            touches: vec![pinned, at],
            scale: 1.0,
            velocity: 0.0,
        })
    }

    /// Velocity is scale change per second; negative while the fingers close.
    pub fn drag_move(&mut self, at: Point, now: Instant) -> Option<PinchSample> {
        let drag = self.drag.as_mut()?;
        let scale = drag.pinned.distance_to(at) / drag.start_distance;
        let dt = now.saturating_duration_since(drag.last_time).as_secs_f64();
        let velocity = if dt > 0.0 {
            (scale - drag.last_scale) / dt
        } else {
            scale - drag.last_scale
        };
        drag.last_scale = scale;
        drag.last_time = now;
        let touches = if self.pinned.is_some() {
            vec![drag.pinned, at]
        } else {
            vec![at]
        };
        Some(PinchSample {
            phase: PinchPhase::Changed,
            touches,
            scale,
            velocity,
        })
    }

    pub fn drag_end(&mut self) -> Option<PinchSample> {
        let drag = self.drag.take()?;
        Some(PinchSample {
            phase: PinchPhase::Ended,
            touches: Vec::new(),
            scale: drag.last_scale,
            velocity: 0.0,
        })
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }
}
