//! List controller: owns the rows, the merge session and the surface for
//! the lifetime of one list view, and answers the host's data queries.

use crate::MergeConfig;
use crate::gesture::GestureEvent;
use crate::rows::{RowCollection, RowContent, RowError};
use crate::session::{MergeEvent, MergeSession, Phase, SessionOutcome};
use crate::surface::ListSurface;
use crate::table::TableView;
use std::time::Instant;
use tracing::{info, warn};

/// Result of dispatching one gesture event.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Session(SessionOutcome),
    Split(Result<usize, RowError>),
}

#[derive(Debug)]
pub struct ListController<S: ListSurface> {
    config: MergeConfig,
    rows: RowCollection,
    session: MergeSession,
    surface: S,
}

impl<S: ListSurface> ListController<S> {
    /// `surface` must already show `rows.len()` rows.
    pub fn new(rows: RowCollection, surface: S, config: MergeConfig) -> Self {
        info!(rows = rows.len(), "list controller ready");
        Self {
            config,
            rows,
            session: MergeSession::new(config),
            surface,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Every row has the same height.
    pub fn row_height(&self, _index: usize) -> f64 {
        self.config.row_height
    }

    pub fn populate_row(&self, index: usize) -> Option<RowContent> {
        self.rows.content(index)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[cfg(test)]
    pub fn rows(&self) -> &RowCollection {
        &self.rows
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn session(&self) -> &MergeSession {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn dispatch(&mut self, event: GestureEvent) -> Dispatch {
        match event {
            GestureEvent::Merge(e) => Dispatch::Session(self.handle(e)),
            GestureEvent::Split { index } => Dispatch::Split(self.split(index)),
        }
    }

    pub fn handle(&mut self, event: MergeEvent) -> SessionOutcome {
        let outcome = self
            .session
            .handle(event, &mut self.rows, &mut self.surface);
        if outcome == SessionOutcome::Cancelled && self.config.restore_duration.is_zero() {
            self.session.restore_finished();
        }
        outcome
    }

    /// Insert a row above `index`, seeded from the live preview when a pinch is underway.
    pub fn split(&mut self, index: usize) -> Result<usize, RowError> {
        let seed = self.session.preview_totals();
        if self.session.splits_candidate(index) {
            // The pair would no longer be adjacent.
            info!(index, "split lands inside the pinch, cancelling it");
            self.session.cancel(&mut self.surface);
            if self.config.restore_duration.is_zero() {
                self.session.restore_finished();
            }
        }
        match self
            .rows
            .split_insert_above(index, None, seed, &mut self.surface)
        {
            Ok(at) => {
                self.session.shift_for_insert(at, self.config.row_height);
                info!(index = at, seeded = seed.is_some(), "row split");
                Ok(at)
            }
            Err(err) => {
                warn!(%err, "split skipped");
                Err(err)
            }
        }
    }

    /// Host signal that the bounce-back animation completed.
    pub fn restore_finished(&mut self) -> bool {
        self.session.restore_finished()
    }

    /// Drop any in-flight interaction and hand the rows back.
    pub fn teardown(mut self) -> RowCollection {
        self.session.teardown(&mut self.surface);
        info!(rows = self.rows.len(), "list controller torn down");
        self.rows
    }
}

impl ListController<TableView> {
    /// Advance the terminal surface. Returns true when a landed bounce-back
    /// re-armed the session.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.surface.is_restoring() && self.surface.tick(now) && self.session.restore_finished()
    }
}
