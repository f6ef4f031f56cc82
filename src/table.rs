//! Terminal list surface: lays rows out in points, tracks per-row nudge
//! offset and opacity, runs bounce-back tweens, and maps terminal cells to
//! list coordinates.

use crate::geometry::{Point, Rect};
use crate::surface::{ListSurface, PreviewOverlay, RestoreTarget, RowAnimation};
use std::time::{Duration, Instant};
use tracing::trace;

/// Points per terminal line.
pub const POINTS_PER_LINE: f64 = 8.0;
/// Points per terminal column (cells are roughly twice as tall as wide).
pub const POINTS_PER_COLUMN: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowSlot {
    /// Vertical displacement from the resting position.
    pub offset: f64,
    pub alpha: f64,
}

impl Default for RowSlot {
    fn default() -> Self {
        Self {
            offset: 0.0,
            alpha: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct TweenRow {
    index: usize,
    from: RowSlot,
    to: RowSlot,
}

#[derive(Debug, Clone)]
struct RestoreTween {
    started: Instant,
    duration: Duration,
    rows: Vec<TweenRow>,
}

#[derive(Debug)]
pub struct TableView {
    row_height: f64,
    width: f64,
    viewport_height: f64,
    scroll: f64,
    slots: Vec<RowSlot>,
    overlay: Option<PreviewOverlay>,
    restore: Option<RestoreTween>,
    batch_depth: usize,
    inserted: Vec<usize>,
}

impl TableView {
    pub fn new(rows: usize, row_height: f64) -> Self {
        Self {
            row_height,
            width: 80.0 * POINTS_PER_COLUMN,
            viewport_height: 24.0 * POINTS_PER_LINE,
            scroll: 0.0,
            slots: vec![RowSlot::default(); rows],
            overlay: None,
            restore: None,
            batch_depth: 0,
            inserted: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn slot(&self, index: usize) -> Option<RowSlot> {
        self.slots.get(index).copied()
    }

    pub fn overlay(&self) -> Option<&PreviewOverlay> {
        self.overlay.as_ref()
    }

    pub fn scroll(&self) -> f64 {
        self.scroll
    }

    pub fn is_restoring(&self) -> bool {
        self.restore.is_some()
    }

    /// Resize to a viewport of `cols` x `lines` terminal cells.
    pub fn set_viewport(&mut self, cols: u16, lines: u16) {
        self.width = f64::from(cols) * POINTS_PER_COLUMN;
        self.viewport_height = f64::from(lines) * POINTS_PER_LINE;
        self.scroll_by(0.0);
    }

    pub fn content_height(&self) -> f64 {
        self.slots.len() as f64 * self.row_height
    }

    pub fn scroll_by(&mut self, dy: f64) {
        let max = (self.content_height() - self.viewport_height).max(0.0);
        self.scroll = (self.scroll + dy).clamp(0.0, max);
    }

    /// Scroll just enough to bring row `index` fully into view.
    pub fn scroll_to_row(&mut self, index: usize) {
        let top = index as f64 * self.row_height;
        let bottom = top + self.row_height;
        if top < self.scroll {
            self.scroll_by(top - self.scroll);
        } else if bottom > self.scroll + self.viewport_height {
            self.scroll_by(bottom - self.scroll - self.viewport_height);
        }
    }

    /// List coordinates of the terminal cell `(col, line)` relative to the viewport origin.
    pub fn cell_to_point(&self, col: u16, line: u16) -> Point {
        Point::new(
            (f64::from(col) + 0.5) * POINTS_PER_COLUMN,
            (f64::from(line) + 0.5) * POINTS_PER_LINE + self.scroll,
        )
    }

    /// Row indices inserted since the last call (for the fade-in effect).
    pub fn take_inserted(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.inserted)
    }

    fn rest_top(&self, index: usize) -> f64 {
        index as f64 * self.row_height
    }

    /// Advance the bounce-back tween. Returns true on the tick it lands.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(tween) = &self.restore else {
            return false;
        };
        let t = if tween.duration.is_zero() {
            1.0
        } else {
            (now.saturating_duration_since(tween.started).as_secs_f64()
                / tween.duration.as_secs_f64())
            .min(1.0)
        };
        // Ease out: fast departure, gentle landing.
        let k = 1.0 - (1.0 - t) * (1.0 - t);
        for row in &tween.rows {
            if let Some(slot) = self.slots.get_mut(row.index) {
                slot.offset = row.from.offset + (row.to.offset - row.from.offset) * k;
                slot.alpha = row.from.alpha + (row.to.alpha - row.from.alpha) * k;
            }
        }
        if t >= 1.0 {
            self.restore = None;
            true
        } else {
            false
        }
    }

    fn shift_tween_for_insert(&mut self, at: usize) {
        if let Some(tween) = &mut self.restore {
            for row in tween.rows.iter_mut().filter(|r| r.index >= at) {
                row.index += 1;
            }
        }
    }

    fn shift_tween_for_delete(&mut self, at: usize) {
        if let Some(tween) = &mut self.restore {
            tween.rows.retain(|r| r.index != at);
            for row in tween.rows.iter_mut().filter(|r| r.index > at) {
                row.index -= 1;
            }
        }
    }
}

impl ListSurface for TableView {
    fn row_index_at_point(&self, point: Point) -> Option<usize> {
        let content = Rect::new(0.0, 0.0, self.width, self.content_height());
        if !content.contains(point) {
            return None;
        }
        let index = (point.y / self.row_height) as usize;
        (index < self.slots.len()).then_some(index)
    }

    fn row_frame(&self, index: usize) -> Rect {
        let offset = self.slots.get(index).map_or(0.0, |s| s.offset);
        Rect::new(0.0, self.rest_top(index) + offset, self.width, self.row_height)
    }

    fn row_center(&self, index: usize) -> Point {
        self.row_frame(index).center()
    }

    fn row_alpha(&self, index: usize) -> f64 {
        self.slots.get(index).map_or(1.0, |s| s.alpha)
    }

    fn set_row_center(&mut self, index: usize, center: Point) {
        let rest = self.rest_top(index) + self.row_height / 2.0;
        if let Some(slot) = self.slots.get_mut(index) {
            slot.offset = center.y - rest;
        }
    }

    fn set_row_alpha(&mut self, index: usize, alpha: f64) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.alpha = alpha.clamp(0.0, 1.0);
        }
    }

    fn animate_restore(&mut self, targets: &[RestoreTarget], duration: Duration) {
        let rows = targets
            .iter()
            .filter_map(|t| {
                let from = self.slots.get(t.index).copied()?;
                let rest = self.rest_top(t.index) + self.row_height / 2.0;
                Some(TweenRow {
                    index: t.index,
                    from,
                    to: RowSlot {
                        offset: t.center.y - rest,
                        alpha: t.alpha,
                    },
                })
            })
            .collect();
        self.restore = Some(RestoreTween {
            started: Instant::now(),
            duration,
            rows,
        });
    }

    fn begin_batch_update(&mut self) {
        self.batch_depth += 1;
    }

    fn insert_rows(&mut self, indices: &[usize], animation: RowAnimation) {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        for i in sorted {
            let at = i.min(self.slots.len());
            self.slots.insert(at, RowSlot::default());
            self.shift_tween_for_insert(at);
            if animation != RowAnimation::None {
                self.inserted.push(at);
            }
        }
        trace!(?indices, "rows inserted");
    }

    fn delete_rows(&mut self, indices: &[usize], _animation: RowAnimation) {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();
        for i in sorted {
            if i < self.slots.len() {
                self.slots.remove(i);
                self.shift_tween_for_delete(i);
            }
        }
        trace!(?indices, "rows deleted");
    }

    fn end_batch_update(&mut self) {
        self.batch_depth = self.batch_depth.saturating_sub(1);
        if self.batch_depth == 0 {
            self.scroll_by(0.0);
        }
    }

    fn add_overlay(&mut self, overlay: &PreviewOverlay) {
        self.overlay = Some(overlay.clone());
    }

    fn update_overlay(&mut self, overlay: &PreviewOverlay) {
        self.overlay = Some(overlay.clone());
    }

    fn remove_overlay(&mut self) {
        self.overlay = None;
    }
}
