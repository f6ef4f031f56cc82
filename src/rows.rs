//! Row collection: one ordered sequence of rows (colour, distance, payout)
//! and the paired structural edits that keep it aligned with the visible list.
//!
//! Every edit validates first and mutates second, and the mutation happens
//! inside the same begin/end batch as the matching surface instruction, so
//! the backing rows and the visible rows never disagree in length.

use crate::color::{Rgba, average_color};
use crate::surface::{ListSurface, RowAnimation};
use thiserror::Error;

/// One list entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Row {
    pub color: Rgba,
    pub distance: f64,
    pub payout: f64,
}

impl Row {
    /// New row whose payout is derived from `distance * rate` once, at creation.
    pub fn new(color: Rgba, distance: f64, rate: f64) -> Self {
        Self {
            color,
            distance,
            payout: distance * rate,
        }
    }
}

/// What the host needs to paint one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowContent {
    pub color: Rgba,
    pub distance_text: String,
    pub payout_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("row index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("rows {top} and {bottom} are not adjacent")]
    NotAdjacent { top: usize, bottom: usize },
}

/// Short decimal: at most two places, trailing zeros dropped, one place kept.
pub fn format_amount(value: f64) -> String {
    let mut s = format!("{value:.2}");
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.push('0');
    }
    s
}

pub fn format_payout(value: f64) -> String {
    format!("${}", format_amount(value))
}

#[derive(Debug, Clone, Default)]
pub struct RowCollection {
    rows: Vec<Row>,
}

impl RowCollection {
    /// Rows built from parallel colour/distance seeds; extra entries on either side are ignored.
    pub fn seeded(colors: &[Rgba], distances: &[f64], rate: f64) -> Self {
        let rows = colors
            .iter()
            .zip(distances)
            .map(|(&c, &d)| Row::new(c, d, rate))
            .collect();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn content(&self, index: usize) -> Option<RowContent> {
        self.rows.get(index).map(|row| RowContent {
            color: row.color,
            distance_text: format_amount(row.distance),
            payout_text: format_payout(row.payout),
        })
    }

    fn check_index(&self, index: usize) -> Result<(), RowError> {
        if index < self.rows.len() {
            Ok(())
        } else {
            Err(RowError::IndexOutOfRange {
                index,
                len: self.rows.len(),
            })
        }
    }

    /// Replace rows `top` and `top + 1` with one row carrying `color` and the
    /// summed distance and payout. Returns the merged row's index (`top`).
    pub fn merge_at<S: ListSurface + ?Sized>(
        &mut self,
        top: usize,
        bottom: usize,
        color: Rgba,
        surface: &mut S,
    ) -> Result<usize, RowError> {
        if top.checked_add(1) != Some(bottom) {
            return Err(RowError::NotAdjacent { top, bottom });
        }
        self.check_index(bottom)?;

        surface.begin_batch_update();
        // Higher index first so the second removal is not shifted.
        let lower = self.rows.remove(bottom);
        let upper = self.rows.remove(top);
        let merged = Row {
            color,
            distance: upper.distance + lower.distance,
            payout: upper.payout + lower.payout,
        };
        self.rows.insert(top, merged);
        surface.delete_rows(&[top, bottom], RowAnimation::Automatic);
        surface.insert_rows(&[top], RowAnimation::Automatic);
        surface.end_batch_update();
        Ok(top)
    }

    /// Colour for a row split in above `index`: the explicit colour if given,
    /// else a blend with the row above, else a blend with white.
    pub fn split_color(&self, index: usize, explicit: Option<Rgba>) -> Result<Rgba, RowError> {
        let len = self.rows.len();
        if index > len {
            return Err(RowError::IndexOutOfRange { index, len });
        }
        if let Some(c) = explicit {
            return Ok(c);
        }
        let color = match (self.rows.get(index), index.checked_sub(1).and_then(|i| self.rows.get(i))) {
            (Some(here), Some(above)) => average_color(here.color, above.color),
            (Some(here), None) => average_color(here.color, Rgba::WHITE),
            // Appending at the end: blend the last row with white.
            (None, Some(above)) => average_color(above.color, Rgba::WHITE),
            (None, None) => Rgba::WHITE,
        };
        Ok(color)
    }

    /// Insert a new row above `index` (or append when `index == len`).
    /// `seed` supplies `(distance, payout)`; without it the new row is zeroed.
    pub fn split_insert_above<S: ListSurface + ?Sized>(
        &mut self,
        index: usize,
        explicit: Option<Rgba>,
        seed: Option<(f64, f64)>,
        surface: &mut S,
    ) -> Result<usize, RowError> {
        let color = self.split_color(index, explicit)?;
        let (distance, payout) = seed.unwrap_or((0.0, 0.0));

        surface.begin_batch_update();
        self.rows.insert(
            index,
            Row {
                color,
                distance,
                payout,
            },
        );
        surface.insert_rows(&[index], RowAnimation::Automatic);
        surface.end_batch_update();
        Ok(index)
    }
}
