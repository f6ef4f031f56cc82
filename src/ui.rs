//! Layout and drawing: rows, forming preview, pinned finger, status and help.

use crate::color::Rgba;
use crate::controller::{Dispatch, ListController};
use crate::geometry::{Point, Rect as ListRect};
use crate::rows::RowError;
use crate::session::{Phase, Rejection, SessionOutcome};
use crate::surface::ListSurface;
use crate::table::{POINTS_PER_COLUMN, POINTS_PER_LINE, TableView};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Lines reserved under the list for status and help.
const STATUS_HEIGHT: u16 = 2;

/// Duration of the fade-in on inserted rows.
const INSERT_FADE_MS: u32 = 350;

/// Split the screen into the list interior and the status strip.
pub fn layout(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(STATUS_HEIGHT)])
        .split(area);
    let list_outer = chunks[0];
    let list = Rect {
        x: list_outer.x + 1,
        y: list_outer.y + 1,
        width: list_outer.width.saturating_sub(2),
        height: list_outer.height.saturating_sub(2),
    };
    (list, chunks[1])
}

/// Map a list rectangle (points) to terminal cells inside `area`, clipped.
fn to_cells(r: &ListRect, area: Rect, scroll: f64) -> Option<Rect> {
    let top = ((r.y - scroll) / POINTS_PER_LINE).round();
    let bottom = ((r.bottom() - scroll) / POINTS_PER_LINE).round();
    let left = (r.x / POINTS_PER_COLUMN).round();
    let right = (r.right() / POINTS_PER_COLUMN).round();
    let h = f64::from(area.height);
    let w = f64::from(area.width);
    let (top, bottom) = (top.max(0.0), bottom.min(h));
    let (left, right) = (left.max(0.0), right.min(w));
    if bottom <= top || right <= left {
        return None;
    }
    Some(Rect {
        x: area.x + left as u16,
        y: area.y + top as u16,
        width: (right - left) as u16,
        height: (bottom - top) as u16,
    })
}

fn point_to_cell(p: Point, area: Rect, scroll: f64) -> Option<Position> {
    let col = (p.x / POINTS_PER_COLUMN).floor();
    let line = ((p.y - scroll) / POINTS_PER_LINE).floor();
    let inside = col >= 0.0 && line >= 0.0 && col < f64::from(area.width) && line < f64::from(area.height);
    inside.then(|| Position::new(area.x + col as u16, area.y + line as u16))
}

/// Black or white, whichever reads better on `bg`.
fn text_on(bg: Rgba) -> Color {
    let luma = 0.2126 * bg.r + 0.7152 * bg.g + 0.0722 * bg.b;
    if luma > 0.5 { Color::Black } else { Color::White }
}

fn row_lines(distance: &str, payout: &str, width: u16) -> Vec<Line<'static>> {
    let left = format!(" {distance} mi");
    let right = format!("{payout} ");
    let gap = usize::from(width).saturating_sub(left.len() + right.len() + 2);
    vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(left, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" ".repeat(gap)),
            Span::raw(right),
        ]),
    ]
}

/// Draw the list, the forming preview and the status strip. Inserted rows in
/// `fading_rows` fade in through a TachyonFX effect kept in `insert_effect`.
pub fn draw(
    frame: &mut Frame,
    controller: &ListController<TableView>,
    theme: &Theme,
    cursor: usize,
    status: &str,
    pinned: Option<Point>,
    fading_rows: &[usize],
    insert_effect: &mut Option<Effect>,
    insert_effect_process_time: &mut Option<Instant>,
    now: Instant,
    no_animation: bool,
) {
    let area = frame.area();
    let (list, status_area) = layout(area);
    let list_outer = Rect {
        x: list.x.saturating_sub(1),
        y: list.y.saturating_sub(1),
        width: list.width + 2,
        height: list.height + 2,
    };
    let bg: Color = Color::from(theme.bg);

    frame.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::from(theme.div_line)))
            .title(Span::styled(
                " pinchlist ",
                Style::default().fg(Color::from(theme.title)).add_modifier(Modifier::BOLD),
            ))
            .style(Style::default().bg(bg)),
        list_outer,
    );

    let table = controller.surface();
    let scroll = table.scroll();
    let pinched = controller.session().candidate_rows();
    for index in 0..controller.row_count() {
        let Some(content) = controller.populate_row(index) else {
            continue;
        };
        let Some(cells) = to_cells(&table.row_frame(index), list, scroll) else {
            continue;
        };
        let fill = content.color.over(theme.bg, table.row_alpha(index));
        let border = if index == cursor {
            Style::default().fg(Color::from(theme.title)).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::from(theme.bg))
        };
        let under_pinch = pinched.is_some_and(|(top, bottom)| index == top || index == bottom);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(if under_pinch {
                BorderType::Double
            } else {
                BorderType::Rounded
            })
            .border_style(border.bg(Color::from(fill)));
        frame.render_widget(
            Paragraph::new(row_lines(
                &content.distance_text,
                &content.payout_text,
                cells.width,
            ))
            .block(block)
            .style(Style::default().bg(Color::from(fill)).fg(text_on(fill))),
            cells,
        );
    }

    if controller.is_empty() {
        frame.render_widget(
            Paragraph::new("No rows. Press s to add one.")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::from(theme.inactive_fg))),
            list,
        );
    }

    if let Some(overlay) = table.overlay() {
        if let Some(cells) = to_cells(&overlay.frame, list, scroll) {
            let fill = overlay.color.over(theme.bg, 1.0);
            frame.render_widget(Clear, cells);
            frame.render_widget(
                Paragraph::new(Line::from(format!(
                    " {} mi  {} ",
                    overlay.distance_text, overlay.payout_text
                )))
                .alignment(Alignment::Center)
                .style(
                    Style::default()
                        .bg(Color::from(fill))
                        .fg(text_on(fill))
                        .add_modifier(Modifier::BOLD),
                ),
                cells,
            );
        }
    }

    if let Some(pos) = pinned.and_then(|p| point_to_cell(p, list, scroll)) {
        frame.render_widget(
            Paragraph::new("◉").style(Style::default().fg(Color::from(theme.title))),
            Rect {
                x: pos.x,
                y: pos.y,
                width: 1,
                height: 1,
            },
        );
    }

    if !no_animation && !fading_rows.is_empty() {
        apply_insert_effect(
            frame,
            table,
            list,
            bg,
            fading_rows,
            insert_effect,
            insert_effect_process_time,
            now,
        );
    }

    draw_status(frame, controller, theme, status, status_area);
}

/// Create or advance the fade-in over freshly inserted rows.
fn apply_insert_effect(
    frame: &mut Frame,
    table: &TableView,
    list: Rect,
    bg: Color,
    fading_rows: &[usize],
    insert_effect: &mut Option<Effect>,
    insert_effect_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let delta = insert_effect_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
    *insert_effect_process_time = Some(now);

    if insert_effect.is_none() {
        let mut cells = HashSet::new();
        for &index in fading_rows {
            if let Some(r) = to_cells(&table.row_frame(index), list, table.scroll()) {
                for y in r.y..r.y + r.height {
                    for x in r.x..r.x + r.width {
                        cells.insert((x, y));
                    }
                }
            }
        }
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            cells.contains(&(pos.x, pos.y))
        }));
        let effect = fx::fade_from(bg, bg, (INSERT_FADE_MS, Interpolation::QuadOut))
            .with_filter(filter)
            .with_area(list);
        *insert_effect = Some(effect);
    }

    if let Some(effect) = insert_effect {
        frame.render_effect(effect, list, TfxDuration::from_millis(delta_ms));
    }
}

fn draw_status(
    frame: &mut Frame,
    controller: &ListController<TableView>,
    theme: &Theme,
    status: &str,
    area: Rect,
) {
    let phase = match controller.phase() {
        Phase::Idle => "idle",
        Phase::Candidate => "armed",
        Phase::Previewing => "pinching",
        Phase::Cancelling => "settling",
    };
    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!(" [{phase}] "),
                Style::default().fg(Color::from(theme.title)).add_modifier(Modifier::BOLD),
            ),
            Span::styled(status.to_string(), Style::default().fg(Color::from(theme.main_fg))),
            Span::styled(
                format!("   {} rows", controller.row_count()),
                Style::default().fg(Color::from(theme.inactive_fg)),
            ),
        ]),
        Line::from(Span::styled(
            " m pinch  -/+ in/out  Enter release  Esc cancel  s split  right-click pin  q quit",
            Style::default().fg(Color::from(theme.inactive_fg)),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines).style(Style::default().bg(Color::from(theme.bg))),
        area,
    );
}

/// Status text for a dispatch result; `None` keeps the current text.
pub fn describe(result: &Dispatch) -> Option<String> {
    let text = match result {
        Dispatch::Session(SessionOutcome::Ignored) => return None,
        Dispatch::Session(SessionOutcome::Armed { top, bottom }) => {
            format!("Pinching rows {} and {}", top + 1, bottom + 1)
        }
        Dispatch::Session(SessionOutcome::Previewing { ratio }) => {
            format!("Merging… {:.0}%", (ratio * 100.0).min(100.0))
        }
        Dispatch::Session(SessionOutcome::Committed { index }) => {
            format!("Merged into row {}", index + 1)
        }
        Dispatch::Session(SessionOutcome::Cancelled) => String::from("Pinch cancelled"),
        Dispatch::Session(SessionOutcome::Rejected(reason)) => match reason {
            Rejection::MissedRow => String::from("Both fingers must be on rows"),
            Rejection::SameRow => String::from("Fingers are on the same row"),
            Rejection::NotAdjacent => String::from("Only neighbouring rows can merge"),
            Rejection::Busy => String::from("Still settling, try again"),
        },
        Dispatch::Split(Ok(index)) => format!("Split in new row {}", index + 1),
        Dispatch::Split(Err(RowError::IndexOutOfRange { index, .. })) => {
            format!("No row {} to split", index + 1)
        }
        Dispatch::Split(Err(err)) => err.to_string(),
    };
    Some(text)
}
