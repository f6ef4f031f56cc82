//! Pinch-to-merge session: one interaction at a time, from candidate
//! selection through live preview to commit or bounce-back.
//!
//! ```text
//! Idle --Start(2 touches on adjacent rows)--> Candidate
//! Candidate/Previewing --Progress--> Previewing        (preview below threshold)
//! Candidate/Previewing --Progress--> Idle              (commit: rows merged)
//! Candidate/Previewing --End/Cancel--> Cancelling      (rows animate home)
//! Cancelling --restore_finished--> Idle
//! ```
//!
//! A forming preview only exists inside `Previewing`, so a preview without a
//! candidate cannot be represented. Cancelling with nothing in flight is a
//! no-op.

use crate::MergeConfig;
use crate::color::{Rgba, average_color};
use crate::geometry::{Point, Rect};
use crate::rows::{RowCollection, format_amount, format_payout};
use crate::surface::{ListSurface, PreviewOverlay, RestoreTarget};
use tracing::{debug, info, warn};

/// Discrete events fed to the session by the gesture adapter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MergeEvent {
    Start { touches: [Point; 2] },
    Progress { velocity: f64, scale: f64 },
    End,
    Cancel,
}

/// Why a `Start` did not produce a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// A touch landed outside every row.
    MissedRow,
    SameRow,
    NotAdjacent,
    /// Another interaction (or its bounce-back) is still in flight.
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionOutcome {
    Ignored,
    Rejected(Rejection),
    Armed { top: usize, bottom: usize },
    /// Preview updated; `ratio` is preview height over the original row height.
    Previewing { ratio: f64 },
    Committed { index: usize },
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CandidateRow {
    index: usize,
    original_center: Point,
}

/// The pinned pair under the two fingers. `top` is the row under the upper
/// finger, which is not necessarily the lower index.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    top: CandidateRow,
    bottom: CandidateRow,
    row_height: f64,
}

impl Candidate {
    fn ordered(&self) -> (usize, usize) {
        let (a, b) = (self.top.index, self.bottom.index);
        (a.min(b), a.max(b))
    }

    fn restore_targets(&self) -> [RestoreTarget; 2] {
        [self.top, self.bottom].map(|row| RestoreTarget {
            index: row.index,
            center: row.original_center,
            alpha: 1.0,
        })
    }

    fn shift_for_insert(&mut self, at: usize, dy: f64) {
        for row in [&mut self.top, &mut self.bottom] {
            if row.index >= at {
                row.index += 1;
                row.original_center.y += dy;
            }
        }
    }
}

/// In-progress merge result shown over the pinched rows.
#[derive(Debug, Clone, PartialEq)]
pub struct FormingPreview {
    pub frame: Rect,
    pub color: Rgba,
    pub distance: f64,
    pub payout: f64,
}

impl FormingPreview {
    fn overlay(&self) -> PreviewOverlay {
        PreviewOverlay {
            frame: self.frame,
            color: self.color,
            distance_text: format_amount(self.distance),
            payout_text: format_payout(self.payout),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
enum SessionState {
    #[default]
    Idle,
    Candidate(Candidate),
    Previewing {
        candidate: Candidate,
        preview: FormingPreview,
    },
    /// Rows are animating home; re-arming waits for the host's completion signal.
    Cancelling { rows: [usize; 2] },
}

/// Coarse state name for display and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Candidate,
    Previewing,
    Cancelling,
}

#[derive(Debug)]
pub struct MergeSession {
    config: MergeConfig,
    state: SessionState,
}

impl MergeSession {
    pub fn new(config: MergeConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            SessionState::Idle => Phase::Idle,
            SessionState::Candidate(_) => Phase::Candidate,
            SessionState::Previewing { .. } => Phase::Previewing,
            SessionState::Cancelling { .. } => Phase::Cancelling,
        }
    }

    /// Candidate rows as `(lower index, higher index)`, if a pinch is active.
    pub fn candidate_rows(&self) -> Option<(usize, usize)> {
        match &self.state {
            SessionState::Candidate(c) | SessionState::Previewing { candidate: c, .. } => {
                Some(c.ordered())
            }
            _ => None,
        }
    }

    pub fn preview(&self) -> Option<&FormingPreview> {
        match &self.state {
            SessionState::Previewing { preview, .. } => Some(preview),
            _ => None,
        }
    }

    /// `(distance, payout)` of the live preview, used to seed split rows.
    pub fn preview_totals(&self) -> Option<(f64, f64)> {
        self.preview().map(|p| (p.distance, p.payout))
    }

    pub fn handle<S: ListSurface + ?Sized>(
        &mut self,
        event: MergeEvent,
        rows: &mut RowCollection,
        surface: &mut S,
    ) -> SessionOutcome {
        match event {
            MergeEvent::Start { touches } => self.start(touches, rows, surface),
            MergeEvent::Progress { velocity, scale } => {
                self.progress(velocity, scale, rows, surface)
            }
            MergeEvent::End | MergeEvent::Cancel => self.cancel(surface),
        }
    }

    fn start<S: ListSurface + ?Sized>(
        &mut self,
        touches: [Point; 2],
        rows: &RowCollection,
        surface: &S,
    ) -> SessionOutcome {
        if self.state != SessionState::Idle {
            debug!(phase = ?self.phase(), "pinch start ignored, session busy");
            return SessionOutcome::Rejected(Rejection::Busy);
        }
        match Self::find_candidate(touches, rows, surface) {
            Ok(candidate) => {
                debug!(
                    top = candidate.top.index,
                    bottom = candidate.bottom.index,
                    "merge candidate armed"
                );
                self.state = SessionState::Candidate(candidate);
                SessionOutcome::Armed {
                    top: candidate.top.index,
                    bottom: candidate.bottom.index,
                }
            }
            Err(reason) => {
                debug!(?reason, "merge candidate rejected");
                SessionOutcome::Rejected(reason)
            }
        }
    }

    fn find_candidate<S: ListSurface + ?Sized>(
        touches: [Point; 2],
        rows: &RowCollection,
        surface: &S,
    ) -> Result<Candidate, Rejection> {
        let [a, b] = touches;
        // Finger position decides labelling, not index order.
        let (top_touch, bottom_touch) = if a.y <= b.y { (a, b) } else { (b, a) };
        let lookup = |p: Point| {
            surface
                .row_index_at_point(p)
                .filter(|&i| i < rows.len())
                .ok_or(Rejection::MissedRow)
        };
        let top = lookup(top_touch)?;
        let bottom = lookup(bottom_touch)?;
        if top == bottom {
            return Err(Rejection::SameRow);
        }
        if top.abs_diff(bottom) != 1 {
            return Err(Rejection::NotAdjacent);
        }
        Ok(Candidate {
            top: CandidateRow {
                index: top,
                original_center: surface.row_center(top),
            },
            bottom: CandidateRow {
                index: bottom,
                original_center: surface.row_center(bottom),
            },
            row_height: surface.row_frame(top).height,
        })
    }

    fn progress<S: ListSurface + ?Sized>(
        &mut self,
        velocity: f64,
        scale: f64,
        rows: &mut RowCollection,
        surface: &mut S,
    ) -> SessionOutcome {
        let (candidate, previous) = match std::mem::take(&mut self.state) {
            SessionState::Candidate(c) => (c, None),
            SessionState::Previewing { candidate, preview } => (candidate, Some(preview)),
            other => {
                self.state = other;
                return SessionOutcome::Ignored;
            }
        };

        let top_frame = surface.row_frame(candidate.top.index);
        let bottom_frame = surface.row_frame(candidate.bottom.index);
        let frame = top_frame
            .intersection(&bottom_frame)
            .grow_vertical(self.config.preview_inset);
        let ratio = if candidate.row_height > 0.0 {
            frame.height / candidate.row_height
        } else {
            0.0
        };

        if ratio > self.config.commit_threshold {
            return self.commit(candidate, previous.is_some(), rows, surface);
        }

        let (Some(upper), Some(lower)) = (
            rows.get(candidate.top.index).copied(),
            rows.get(candidate.bottom.index).copied(),
        ) else {
            // Rows vanished under the pinch; drop it rather than preview stale indices.
            warn!(?candidate, "candidate rows missing during progress");
            if previous.is_some() {
                surface.remove_overlay();
            }
            self.bounce_back(&candidate, surface);
            return SessionOutcome::Cancelled;
        };

        let preview = FormingPreview {
            frame,
            color: previous
                .as_ref()
                .map_or_else(|| average_color(upper.color, lower.color), |p| p.color),
            distance: upper.distance + lower.distance,
            payout: upper.payout + lower.payout,
        };
        if previous.is_some() {
            surface.update_overlay(&preview.overlay());
        } else {
            debug!(top = candidate.top.index, "forming preview created");
            surface.add_overlay(&preview.overlay());
        }

        self.nudge(&candidate, velocity, surface);
        debug!(ratio, velocity, scale, "pinch progress");
        self.state = SessionState::Previewing { candidate, preview };
        SessionOutcome::Previewing { ratio }
    }

    /// Push the pair together and dim it while converging; apart and brighter otherwise.
    fn nudge<S: ListSurface + ?Sized>(&self, candidate: &Candidate, velocity: f64, surface: &mut S) {
        let converging = velocity < self.config.velocity_threshold;
        let (dy, da) = if converging {
            (self.config.nudge_step, -self.config.opacity_step)
        } else {
            (-self.config.nudge_step, self.config.opacity_step)
        };
        for (index, dir) in [(candidate.top.index, 1.0), (candidate.bottom.index, -1.0)] {
            let mut center = surface.row_center(index);
            center.y += dy * dir;
            surface.set_row_center(index, center);
            let alpha = (surface.row_alpha(index) + da).clamp(0.0, 1.0);
            surface.set_row_alpha(index, alpha);
        }
    }

    fn commit<S: ListSurface + ?Sized>(
        &mut self,
        candidate: Candidate,
        had_preview: bool,
        rows: &mut RowCollection,
        surface: &mut S,
    ) -> SessionOutcome {
        if had_preview {
            surface.remove_overlay();
        }
        let (top, bottom) = candidate.ordered();
        let color = match (rows.get(top), rows.get(bottom)) {
            (Some(a), Some(b)) => average_color(a.color, b.color),
            _ => Rgba::WHITE,
        };
        surface.set_row_alpha(top, 0.0);
        surface.set_row_alpha(bottom, 0.0);
        match rows.merge_at(top, bottom, color, surface) {
            Ok(index) => {
                info!(top, bottom, index, "rows merged");
                self.state = SessionState::Idle;
                SessionOutcome::Committed { index }
            }
            Err(err) => {
                warn!(%err, "merge skipped");
                self.bounce_back(&candidate, surface);
                SessionOutcome::Cancelled
            }
        }
    }

    /// Abort any in-flight pinch. Safe to call at any time.
    pub fn cancel<S: ListSurface + ?Sized>(&mut self, surface: &mut S) -> SessionOutcome {
        let candidate = match std::mem::take(&mut self.state) {
            SessionState::Candidate(c) => c,
            SessionState::Previewing { candidate, .. } => {
                surface.remove_overlay();
                candidate
            }
            other => {
                self.state = other;
                return SessionOutcome::Ignored;
            }
        };
        info!(
            top = candidate.top.index,
            bottom = candidate.bottom.index,
            "pinch cancelled"
        );
        self.bounce_back(&candidate, surface);
        SessionOutcome::Cancelled
    }

    fn bounce_back<S: ListSurface + ?Sized>(&mut self, candidate: &Candidate, surface: &mut S) {
        surface.animate_restore(&candidate.restore_targets(), self.config.restore_duration);
        self.state = SessionState::Cancelling {
            rows: [candidate.top.index, candidate.bottom.index],
        };
    }

    /// Host signal that the bounce-back animation landed. Returns true if the
    /// session was waiting on it.
    pub fn restore_finished(&mut self) -> bool {
        if let SessionState::Cancelling { rows } = self.state {
            debug!(?rows, "bounce-back finished");
            self.state = SessionState::Idle;
            true
        } else {
            false
        }
    }

    /// True when inserting at `at` would land between the pinched rows.
    pub fn splits_candidate(&self, at: usize) -> bool {
        self.candidate_rows()
            .is_some_and(|(lower, higher)| lower < at && at <= higher)
    }

    /// Keep candidate indices pointing at the same rows after a row is inserted at `at`.
    pub fn shift_for_insert(&mut self, at: usize, dy: f64) {
        match &mut self.state {
            SessionState::Candidate(c) | SessionState::Previewing { candidate: c, .. } => {
                c.shift_for_insert(at, dy);
            }
            SessionState::Cancelling { rows } => {
                for row in rows.iter_mut().filter(|r| **r >= at) {
                    *row += 1;
                }
            }
            SessionState::Idle => {}
        }
    }

    /// Drop all session state without animating; removes any live overlay.
    pub fn teardown<S: ListSurface + ?Sized>(&mut self, surface: &mut S) {
        if let SessionState::Previewing { .. } = self.state {
            surface.remove_overlay();
        }
        self.state = SessionState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::testing::{Call, RecordingSurface};
    use proptest::prelude::*;

    const ROW_H: f64 = 48.0;

    fn rows() -> RowCollection {
        RowCollection::seeded(
            &[
                Rgba::RED,
                Rgba::ORANGE,
                Rgba::YELLOW,
                Rgba::GREEN,
                Rgba::BLUE,
                Rgba::PURPLE,
            ],
            &[1.2, 2.4, 23.0, 4.5, 1.1, 7.6],
            0.5,
        )
    }

    fn setup() -> (MergeSession, RowCollection, RecordingSurface) {
        let rows = rows();
        let surface = RecordingSurface::new(rows.len(), ROW_H);
        (MergeSession::new(MergeConfig::default()), rows, surface)
    }

    fn start_on(
        session: &mut MergeSession,
        rows: &mut RowCollection,
        surface: &mut RecordingSurface,
        a: usize,
        b: usize,
    ) -> SessionOutcome {
        let touches = [surface.point_in_row(a, 10.0), surface.point_in_row(b, 30.0)];
        session.handle(MergeEvent::Start { touches }, rows, surface)
    }

    fn converge(session: &mut MergeSession, rows: &mut RowCollection, surface: &mut RecordingSurface) -> SessionOutcome {
        session.handle(
            MergeEvent::Progress {
                velocity: -1.0,
                scale: 0.9,
            },
            rows,
            surface,
        )
    }

    #[test]
    fn adjacent_touches_arm_candidate() {
        let (mut s, mut rows, mut surface) = setup();
        let out = start_on(&mut s, &mut rows, &mut surface, 2, 3);
        assert_eq!(out, SessionOutcome::Armed { top: 2, bottom: 3 });
        assert_eq!(s.phase(), Phase::Candidate);
        assert_eq!(s.candidate_rows(), Some((2, 3)));
    }

    #[test]
    fn finger_order_decides_labels() {
        let (mut s, mut rows, mut surface) = setup();
        let touches = [surface.point_in_row(3, 5.0), surface.point_in_row(2, 5.0)];
        let out = s.handle(MergeEvent::Start { touches }, &mut rows, &mut surface);
        assert_eq!(out, SessionOutcome::Armed { top: 2, bottom: 3 });
    }

    #[test]
    fn same_row_never_arms_and_progress_is_noop() {
        let (mut s, mut rows, mut surface) = setup();
        let out = start_on(&mut s, &mut rows, &mut surface, 2, 2);
        assert_eq!(out, SessionOutcome::Rejected(Rejection::SameRow));
        assert_eq!(converge(&mut s, &mut rows, &mut surface), SessionOutcome::Ignored);
        assert!(surface.calls.is_empty());
        assert!(surface.overlay.is_none());
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn non_adjacent_and_missed_rows_are_rejected() {
        let (mut s, mut rows, mut surface) = setup();
        assert_eq!(
            start_on(&mut s, &mut rows, &mut surface, 1, 3),
            SessionOutcome::Rejected(Rejection::NotAdjacent)
        );
        let touches = [surface.point_in_row(0, 5.0), Point::new(10.0, 10_000.0)];
        assert_eq!(
            s.handle(MergeEvent::Start { touches }, &mut rows, &mut surface),
            SessionOutcome::Rejected(Rejection::MissedRow)
        );
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn first_progress_creates_preview_with_blend_and_sums() {
        let (mut s, mut rows, mut surface) = setup();
        start_on(&mut s, &mut rows, &mut surface, 0, 1);
        let out = converge(&mut s, &mut rows, &mut surface);
        assert!(matches!(out, SessionOutcome::Previewing { .. }));

        let preview = s.preview().unwrap();
        assert_eq!(preview.color, average_color(Rgba::RED, Rgba::ORANGE));
        assert!((preview.distance - 3.6).abs() < 1e-9);
        assert!((preview.payout - 1.8).abs() < 1e-9);
        // Touching rows: zero-height band grown by the inset on both edges.
        assert_eq!(preview.frame.height, 4.0);
        assert_eq!(preview.frame.y, ROW_H - 2.0);

        let overlay = surface.overlay.as_ref().unwrap();
        assert_eq!(overlay.distance_text, "3.6");
        assert_eq!(overlay.payout_text, "$1.8");
        assert_eq!(surface.calls, vec![Call::AddOverlay]);

        converge(&mut s, &mut rows, &mut surface);
        assert_eq!(surface.calls, vec![Call::AddOverlay, Call::UpdateOverlay]);
    }

    #[test]
    fn converging_moves_rows_together_and_dims() {
        let (mut s, mut rows, mut surface) = setup();
        start_on(&mut s, &mut rows, &mut surface, 2, 3);
        let top_before = surface.row_center(2);
        let bottom_before = surface.row_center(3);
        converge(&mut s, &mut rows, &mut surface);
        assert_eq!(surface.row_center(2).y, top_before.y + 2.0);
        assert_eq!(surface.row_center(3).y, bottom_before.y - 2.0);
        assert!(surface.row_alpha(2) < 1.0);
        assert!(surface.row_alpha(3) < 1.0);
    }

    #[test]
    fn diverging_restores_opacity_clamped() {
        let (mut s, mut rows, mut surface) = setup();
        start_on(&mut s, &mut rows, &mut surface, 2, 3);
        let top_before = surface.row_center(2);
        s.handle(
            MergeEvent::Progress {
                velocity: 1.0,
                scale: 1.1,
            },
            &mut rows,
            &mut surface,
        );
        assert_eq!(surface.row_center(2).y, top_before.y - 2.0);
        assert_eq!(surface.row_alpha(2), 1.0);
    }

    #[test]
    fn converging_pinch_commits_merge() {
        let (mut s, mut rows, mut surface) = setup();
        let old2 = *rows.get(2).unwrap();
        let old3 = *rows.get(3).unwrap();
        start_on(&mut s, &mut rows, &mut surface, 2, 3);

        let mut committed = None;
        for _ in 0..100 {
            if let SessionOutcome::Committed { index } = converge(&mut s, &mut rows, &mut surface) {
                committed = Some(index);
                break;
            }
        }
        assert_eq!(committed, Some(2));
        s.handle(MergeEvent::End, &mut rows, &mut surface);

        assert_eq!(rows.len(), 5);
        assert_eq!(surface.len(), 5);
        let merged = rows.get(2).unwrap();
        assert_eq!(merged.color, average_color(old2.color, old3.color));
        assert!((merged.distance - (old2.distance + old3.distance)).abs() < 1e-9);
        assert!(surface.overlay.is_none());
        assert_eq!(s.phase(), Phase::Idle);
        assert!(surface.calls.contains(&Call::Delete(vec![2, 3])));
    }

    #[test]
    fn commit_needs_threshold_overlap() {
        let (mut s, mut rows, mut surface) = setup();
        start_on(&mut s, &mut rows, &mut surface, 2, 3);
        // Preview is 4pt tall on tick k and grows 4pt per tick; 0.95 * 48 = 45.6,
        // so ticks 1..=11 preview and tick 12 commits.
        for _ in 0..11 {
            let out = converge(&mut s, &mut rows, &mut surface);
            let SessionOutcome::Previewing { ratio } = out else {
                panic!("committed too early: {out:?}");
            };
            assert!(ratio <= 0.95);
        }
        assert!(matches!(
            converge(&mut s, &mut rows, &mut surface),
            SessionOutcome::Committed { .. }
        ));
    }

    #[test]
    fn cancel_below_threshold_restores_everything() {
        let (mut s, mut rows, mut surface) = setup();
        let before = rows.rows().to_vec();
        let centers = (surface.row_center(2), surface.row_center(3));
        start_on(&mut s, &mut rows, &mut surface, 2, 3);
        for _ in 0..5 {
            converge(&mut s, &mut rows, &mut surface);
        }
        assert_eq!(s.handle(MergeEvent::Cancel, &mut rows, &mut surface), SessionOutcome::Cancelled);

        assert_eq!(rows.rows(), &before[..]);
        assert_eq!((surface.row_center(2), surface.row_center(3)), centers);
        assert_eq!(surface.row_alpha(2), 1.0);
        assert_eq!(surface.row_alpha(3), 1.0);
        assert!(surface.overlay.is_none());
        assert_eq!(s.phase(), Phase::Cancelling);
    }

    #[test]
    fn vanished_rows_bounce_the_pinch_back() {
        let (mut s, mut rows, mut surface) = setup();
        let center = surface.row_center(4);
        start_on(&mut s, &mut rows, &mut surface, 4, 5);
        converge(&mut s, &mut rows, &mut surface);
        converge(&mut s, &mut rows, &mut surface);
        assert!(surface.row_alpha(4) < 1.0);

        // Rows shrink behind the session's back.
        let mut elsewhere = RecordingSurface::new(rows.len(), ROW_H);
        rows.merge_at(0, 1, Rgba::WHITE, &mut elsewhere).unwrap();

        assert_eq!(converge(&mut s, &mut rows, &mut surface), SessionOutcome::Cancelled);
        assert_eq!(s.phase(), Phase::Cancelling);
        assert!(surface.overlay.is_none());
        assert_eq!(surface.row_center(4), center);
        assert_eq!(surface.row_alpha(4), 1.0);
        assert!(matches!(surface.calls.last(), Some(Call::Restore(_))));
    }

    #[test]
    fn insert_between_pinched_rows_is_detected() {
        let (mut s, mut rows, mut surface) = setup();
        start_on(&mut s, &mut rows, &mut surface, 2, 3);
        assert!(s.splits_candidate(3));
        assert!(!s.splits_candidate(2));
        assert!(!s.splits_candidate(4));
    }

    #[test]
    fn cancel_is_idempotent() {
        let (mut s, mut rows, mut surface) = setup();
        assert_eq!(s.cancel(&mut surface), SessionOutcome::Ignored);
        start_on(&mut s, &mut rows, &mut surface, 0, 1);
        assert_eq!(s.cancel(&mut surface), SessionOutcome::Cancelled);
        assert_eq!(s.cancel(&mut surface), SessionOutcome::Ignored);
        let restores = surface
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Restore(_)))
            .count();
        assert_eq!(restores, 1);
    }

    #[test]
    fn cannot_rearm_until_bounce_back_finishes() {
        let (mut s, mut rows, mut surface) = setup();
        start_on(&mut s, &mut rows, &mut surface, 0, 1);
        s.handle(MergeEvent::End, &mut rows, &mut surface);
        assert_eq!(
            start_on(&mut s, &mut rows, &mut surface, 0, 1),
            SessionOutcome::Rejected(Rejection::Busy)
        );
        assert!(s.restore_finished());
        assert!(!s.restore_finished());
        assert!(matches!(
            start_on(&mut s, &mut rows, &mut surface, 0, 1),
            SessionOutcome::Armed { .. }
        ));
    }

    #[test]
    fn second_start_while_previewing_is_busy() {
        let (mut s, mut rows, mut surface) = setup();
        start_on(&mut s, &mut rows, &mut surface, 0, 1);
        converge(&mut s, &mut rows, &mut surface);
        assert_eq!(
            start_on(&mut s, &mut rows, &mut surface, 3, 4),
            SessionOutcome::Rejected(Rejection::Busy)
        );
        assert_eq!(s.candidate_rows(), Some((0, 1)));
    }

    #[test]
    fn insert_above_candidate_shifts_indices() {
        let (mut s, mut rows, mut surface) = setup();
        start_on(&mut s, &mut rows, &mut surface, 2, 3);
        s.shift_for_insert(1, ROW_H);
        assert_eq!(s.candidate_rows(), Some((3, 4)));
        s.shift_for_insert(5, ROW_H);
        assert_eq!(s.candidate_rows(), Some((3, 4)));
    }

    #[test]
    fn teardown_removes_overlay() {
        let (mut s, mut rows, mut surface) = setup();
        start_on(&mut s, &mut rows, &mut surface, 0, 1);
        converge(&mut s, &mut rows, &mut surface);
        s.teardown(&mut surface);
        assert!(surface.overlay.is_none());
        assert_eq!(s.phase(), Phase::Idle);
    }

    proptest! {
        #[test]
        fn rejected_starts_never_mutate(a in 0usize..6, b in 0usize..6, dy in 0.0..47.0f64) {
            prop_assume!(a.abs_diff(b) != 1);
            let (mut s, mut rows, mut surface) = setup();
            let before = rows.rows().to_vec();
            let touches = [surface.point_in_row(a, dy), surface.point_in_row(b, 47.0 - dy)];
            let out = s.handle(MergeEvent::Start { touches }, &mut rows, &mut surface);
            prop_assert!(matches!(out, SessionOutcome::Rejected(_)));
            for _ in 0..30 {
                prop_assert_eq!(converge(&mut s, &mut rows, &mut surface), SessionOutcome::Ignored);
            }
            prop_assert_eq!(rows.rows(), &before[..]);
            prop_assert!(surface.calls.is_empty());
        }
    }
}
