//! App: terminal init, main loop, key and mouse handling.

use crate::controller::{Dispatch, ListController};
use crate::geometry::Point;
use crate::gesture::{
    GestureEvent, LongPressDetector, PinchAdapter, PinchPhase, PinchSample, TwoFingerEmulator,
};
use crate::input::{Action, key_to_action};
use crate::rows::RowCollection;
use crate::session::SessionOutcome;
use crate::surface::ListSurface;
use crate::table::TableView;
use crate::theme::Theme;
use crate::{Args, MergeConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tachyonfx::Effect;
use tracing::info;

/// Seed distances for the initial rows, paired with the theme's seed colours.
const SEED_DISTANCES: [f64; 6] = [1.2, 2.4, 23.0, 4.5, 1.1, 7.6];

/// Scale change per keyboard pinch step.
const KEY_PINCH_STEP: f64 = 0.05;

/// Movement (points) that still counts as holding still for a long press.
const LONG_PRESS_SLOP: f64 = 6.0;

/// Keyboard-driven pinch: two fingers parked on row centres.
#[derive(Debug, Clone, Copy)]
struct KeyPinch {
    touches: [Point; 2],
    scale: f64,
}

pub struct App {
    args: Args,
    theme: Theme,
    controller: ListController<TableView>,
    adapter: PinchAdapter,
    long_press: LongPressDetector,
    fingers: TwoFingerEmulator,
    key_pinch: Option<KeyPinch>,
    cursor: usize,
    status: String,
    /// Rows inside the list border, in terminal cells (for mouse mapping).
    list_area: Rect,
    /// TachyonFX fade for freshly inserted rows.
    insert_effect: Option<Effect>,
    insert_effect_process_time: Option<Instant>,
    fading_rows: Vec<usize>,
}

impl App {
    pub fn new(args: Args, config: MergeConfig, theme: Theme) -> Result<Self> {
        let rows = RowCollection::seeded(&theme.rows, &SEED_DISTANCES, config.payout_rate);
        let table = TableView::new(rows.len(), config.row_height);
        let controller = ListController::new(rows, table, config);
        Ok(Self {
            args,
            theme,
            controller,
            adapter: PinchAdapter::new(),
            long_press: LongPressDetector::new(config.long_press, LONG_PRESS_SLOP),
            fingers: TwoFingerEmulator::new(),
            key_pinch: None,
            cursor: 0,
            status: String::from("Press m to pinch the cursor row with the next one"),
            list_area: Rect::default(),
            insert_effect: None,
            insert_effect_process_time: None,
            fading_rows: Vec::new(),
        })
    }

    pub fn run(mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = execute!(std::io::stdout(), DisableMouseCapture);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        let rows = self.controller.teardown();
        info!(rows = rows.len(), "exiting");
        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.args.frame_rate.max(1.0));
        loop {
            let now = Instant::now();
            self.controller.tick(now);
            if let Some(split) = self.long_press.poll(now) {
                self.dispatch(split);
            }
            self.collect_inserted();

            terminal.draw(|f| {
                let (list, _) = crate::ui::layout(f.area());
                self.list_area = list;
                self.controller
                    .surface_mut()
                    .set_viewport(list.width, list.height);
                crate::ui::draw(
                    f,
                    &self.controller,
                    &self.theme,
                    self.cursor,
                    &self.status,
                    self.fingers.pinned(),
                    &self.fading_rows,
                    &mut self.insert_effect,
                    &mut self.insert_effect_process_time,
                    now,
                    self.args.no_animation,
                );
            })?;
            if self
                .insert_effect
                .as_ref()
                .is_some_and(|e| e.done())
            {
                self.insert_effect = None;
                self.insert_effect_process_time = None;
                self.fading_rows.clear();
            }

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if key_to_action(key) == Action::Quit {
                                return Ok(());
                            }
                            self.apply_action(key_to_action(key));
                        }
                        Event::Mouse(mouse) => self.on_mouse(mouse, Instant::now()),
                        _ => {}
                    }
                }
            }
        }
    }

    fn collect_inserted(&mut self) {
        let inserted = self.controller.surface_mut().take_inserted();
        if !inserted.is_empty() && !self.args.no_animation {
            self.fading_rows = inserted;
            self.insert_effect = None;
            self.insert_effect_process_time = None;
        }
    }

    fn dispatch(&mut self, event: GestureEvent) {
        let result = self.controller.dispatch(event);
        if let Some(status) = crate::ui::describe(&result) {
            self.status = status;
        }
        match result {
            Dispatch::Session(SessionOutcome::Committed { index }) | Dispatch::Split(Ok(index)) => {
                self.cursor = index;
                self.controller.surface_mut().scroll_to_row(index);
            }
            _ => {}
        }
        self.clamp_cursor();
    }

    fn feed_pinch(&mut self, sample: &PinchSample) {
        if let Some(event) = self.adapter.process(sample) {
            self.dispatch(GestureEvent::Merge(event));
        }
    }

    fn clamp_cursor(&mut self) {
        let count = self.controller.row_count();
        self.cursor = self.cursor.min(count.saturating_sub(1));
    }

    fn key_pinch_sample(&mut self, phase: PinchPhase, velocity: f64) -> Option<PinchSample> {
        let pinch = self.key_pinch.as_mut()?;
        pinch.scale = (pinch.scale + velocity * KEY_PINCH_STEP).max(0.0);
        Some(PinchSample {
            phase,
            touches: pinch.touches.to_vec(),
            scale: pinch.scale,
            velocity,
        })
    }

    fn apply_action(&mut self, action: Action) {
        let row_height = self.controller.row_height(self.cursor);
        match action {
            Action::CursorUp => {
                self.cursor = self.cursor.saturating_sub(1);
                self.controller.surface_mut().scroll_to_row(self.cursor);
            }
            Action::CursorDown => {
                self.cursor += 1;
                self.clamp_cursor();
                self.controller.surface_mut().scroll_to_row(self.cursor);
            }
            Action::PinchStart => {
                if self.cursor + 1 >= self.controller.row_count() {
                    self.status = String::from("No row below the cursor to pinch with");
                    return;
                }
                let surface = self.controller.surface();
                let touches = [
                    surface.row_center(self.cursor),
                    surface.row_center(self.cursor + 1),
                ];
                self.key_pinch = Some(KeyPinch {
                    touches,
                    scale: 1.0,
                });
                if let Some(sample) = self.key_pinch_sample(PinchPhase::Began, 0.0) {
                    self.feed_pinch(&sample);
                }
            }
            Action::PinchIn | Action::PinchOut => {
                let velocity = if action == Action::PinchIn { -1.0 } else { 1.0 };
                if let Some(sample) = self.key_pinch_sample(PinchPhase::Changed, velocity) {
                    self.feed_pinch(&sample);
                }
            }
            Action::PinchRelease | Action::PinchCancel => {
                let phase = if action == Action::PinchRelease {
                    PinchPhase::Ended
                } else {
                    PinchPhase::Cancelled
                };
                if let Some(sample) = self.key_pinch_sample(phase, 0.0) {
                    self.feed_pinch(&sample);
                }
                self.key_pinch = None;
            }
            Action::Split => self.dispatch(GestureEvent::Split { index: self.cursor }),
            Action::ScrollUp => self.controller.surface_mut().scroll_by(-row_height),
            Action::ScrollDown => self.controller.surface_mut().scroll_by(row_height),
            Action::Quit | Action::None => {}
        }
    }

    /// Terminal cell to list point, if the cell is inside the list.
    fn mouse_point(&self, mouse: &MouseEvent) -> Option<Point> {
        let area = self.list_area;
        let inside = mouse.column >= area.x
            && mouse.column < area.x + area.width
            && mouse.row >= area.y
            && mouse.row < area.y + area.height;
        inside.then(|| {
            self.controller
                .surface()
                .cell_to_point(mouse.column - area.x, mouse.row - area.y)
        })
    }

    fn on_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        let point = self.mouse_point(&mouse);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Right) => {
                if let Some(p) = point {
                    if let Some(sample) = self.fingers.toggle_pin(p) {
                        self.feed_pinch(&sample);
                    }
                }
            }
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(p) = point else { return };
                let row = self.controller.surface().row_index_at_point(p);
                // Selection stays live alongside the gesture recognizers.
                if self.adapter.recognizes_simultaneously() || !self.adapter.is_active() {
                    if let Some(index) = row {
                        self.cursor = index;
                    }
                }
                if let Some(sample) = self.fingers.drag_start(p, now) {
                    self.feed_pinch(&sample);
                } else {
                    self.long_press.press(row, p, now);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let Some(p) = point else { return };
                if !self.fingers.is_dragging() {
                    self.long_press.moved(p);
                } else if let Some(sample) = self.fingers.drag_move(p, now) {
                    self.feed_pinch(&sample);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.long_press.release();
                if let Some(sample) = self.fingers.drag_end() {
                    self.feed_pinch(&sample);
                }
            }
            MouseEventKind::ScrollUp => {
                let step = self.controller.row_height(0) / 2.0;
                self.controller.surface_mut().scroll_by(-step);
            }
            MouseEventKind::ScrollDown => {
                let step = self.controller.row_height(0) / 2.0;
                self.controller.surface_mut().scroll_by(step);
            }
            _ => {}
        }
    }
}
