//! The list surface the merge core drives: row geometry lookups, structural
//! updates, row nudging, and the floating forming-preview overlay.
//!
//! Animations are fire-and-forget. The one completion the core waits on, the
//! bounce-back after a cancelled pinch, is reported back by the host through
//! [`crate::controller::ListController::restore_finished`].

use crate::color::Rgba;
use crate::geometry::{Point, Rect};
use std::time::Duration;

/// How inserted or deleted rows are animated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAnimation {
    Automatic,
    None,
}

/// The transient overlay row shown while a pinch is in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewOverlay {
    pub frame: Rect,
    pub color: Rgba,
    pub distance_text: String,
    pub payout_text: String,
}

/// Where a row should come to rest when a restore animation finishes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestoreTarget {
    pub index: usize,
    pub center: Point,
    pub alpha: f64,
}

pub trait ListSurface {
    fn row_index_at_point(&self, point: Point) -> Option<usize>;
    fn row_frame(&self, index: usize) -> Rect;
    fn row_center(&self, index: usize) -> Point;
    fn row_alpha(&self, index: usize) -> f64;

    /// Move a row immediately (used for per-sample nudging).
    fn set_row_center(&mut self, index: usize, center: Point);
    fn set_row_alpha(&mut self, index: usize, alpha: f64);

    /// Animate rows back to rest; the host reports completion separately.
    fn animate_restore(&mut self, targets: &[RestoreTarget], duration: Duration);

    fn begin_batch_update(&mut self);
    fn insert_rows(&mut self, indices: &[usize], animation: RowAnimation);
    fn delete_rows(&mut self, indices: &[usize], animation: RowAnimation);
    fn end_batch_update(&mut self);

    fn add_overlay(&mut self, overlay: &PreviewOverlay);
    fn update_overlay(&mut self, overlay: &PreviewOverlay);
    fn remove_overlay(&mut self);
}

#[cfg(test)]
pub mod testing {
    //! A fixed-layout surface that records every call.

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Begin,
        Insert(Vec<usize>),
        Delete(Vec<usize>),
        End,
        AddOverlay,
        UpdateOverlay,
        RemoveOverlay,
        Restore(Vec<RestoreTarget>),
    }

    #[derive(Debug, Clone, Copy)]
    struct Slot {
        offset: f64,
        alpha: f64,
    }

    /// Rows stacked at `index * row_height`, width 320. Restore animations
    /// land instantly.
    #[derive(Debug)]
    pub struct RecordingSurface {
        pub row_height: f64,
        slots: Vec<Slot>,
        pub calls: Vec<Call>,
        pub overlay: Option<PreviewOverlay>,
        depth: usize,
    }

    impl RecordingSurface {
        pub const WIDTH: f64 = 320.0;

        pub fn new(rows: usize, row_height: f64) -> Self {
            Self {
                row_height,
                slots: vec![
                    Slot {
                        offset: 0.0,
                        alpha: 1.0
                    };
                    rows
                ],
                calls: Vec::new(),
                overlay: None,
                depth: 0,
            }
        }

        pub fn len(&self) -> usize {
            self.slots.len()
        }

        /// Point inside the row at `index`, `dy` below its resting top edge.
        pub fn point_in_row(&self, index: usize, dy: f64) -> Point {
            Point::new(Self::WIDTH / 2.0, index as f64 * self.row_height + dy)
        }

        fn rest_center(&self, index: usize) -> Point {
            Point::new(
                Self::WIDTH / 2.0,
                index as f64 * self.row_height + self.row_height / 2.0,
            )
        }
    }

    impl ListSurface for RecordingSurface {
        fn row_index_at_point(&self, point: Point) -> Option<usize> {
            if point.y < 0.0 || point.x < 0.0 || point.x >= Self::WIDTH {
                return None;
            }
            let index = (point.y / self.row_height) as usize;
            (index < self.slots.len()).then_some(index)
        }

        fn row_frame(&self, index: usize) -> Rect {
            let offset = self.slots.get(index).map_or(0.0, |s| s.offset);
            Rect::new(
                0.0,
                index as f64 * self.row_height + offset,
                Self::WIDTH,
                self.row_height,
            )
        }

        fn row_center(&self, index: usize) -> Point {
            self.row_frame(index).center()
        }

        fn row_alpha(&self, index: usize) -> f64 {
            self.slots.get(index).map_or(1.0, |s| s.alpha)
        }

        fn set_row_center(&mut self, index: usize, center: Point) {
            let rest = self.rest_center(index).y;
            if let Some(slot) = self.slots.get_mut(index) {
                slot.offset = center.y - rest;
            }
        }

        fn set_row_alpha(&mut self, index: usize, alpha: f64) {
            if let Some(slot) = self.slots.get_mut(index) {
                slot.alpha = alpha;
            }
        }

        fn animate_restore(&mut self, targets: &[RestoreTarget], _duration: Duration) {
            for t in targets {
                self.set_row_center(t.index, t.center);
                self.set_row_alpha(t.index, t.alpha);
            }
            self.calls.push(Call::Restore(targets.to_vec()));
        }

        fn begin_batch_update(&mut self) {
            self.depth += 1;
            self.calls.push(Call::Begin);
        }

        fn insert_rows(&mut self, indices: &[usize], _animation: RowAnimation) {
            let mut sorted = indices.to_vec();
            sorted.sort_unstable();
            for i in sorted {
                let at = i.min(self.slots.len());
                self.slots.insert(
                    at,
                    Slot {
                        offset: 0.0,
                        alpha: 1.0,
                    },
                );
            }
            self.calls.push(Call::Insert(indices.to_vec()));
        }

        fn delete_rows(&mut self, indices: &[usize], _animation: RowAnimation) {
            let mut sorted = indices.to_vec();
            sorted.sort_unstable_by(|a, b| b.cmp(a));
            for i in sorted {
                if i < self.slots.len() {
                    self.slots.remove(i);
                }
            }
            self.calls.push(Call::Delete(indices.to_vec()));
        }

        fn end_batch_update(&mut self) {
            self.depth = self.depth.saturating_sub(1);
            self.calls.push(Call::End);
        }

        fn add_overlay(&mut self, overlay: &PreviewOverlay) {
            self.overlay = Some(overlay.clone());
            self.calls.push(Call::AddOverlay);
        }

        fn update_overlay(&mut self, overlay: &PreviewOverlay) {
            self.overlay = Some(overlay.clone());
            self.calls.push(Call::UpdateOverlay);
        }

        fn remove_overlay(&mut self) {
            self.overlay = None;
            self.calls.push(Call::RemoveOverlay);
        }
    }
}
