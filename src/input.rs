//! Key bindings: arrows and vim-style movement, pinch and split keys.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CursorUp,
    CursorDown,
    /// Put two fingers on the cursor row and the row below it.
    PinchStart,
    PinchIn,
    PinchOut,
    PinchRelease,
    PinchCancel,
    Split,
    ScrollUp,
    ScrollDown,
    Quit,
    None,
}

/// Map key event to list action. Ctrl-C always quits.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Up | KeyCode::Char('k') => Action::CursorUp,
        KeyCode::Down | KeyCode::Char('j') => Action::CursorDown,
        KeyCode::Char('m') => Action::PinchStart,
        KeyCode::Char('-' | ',') => Action::PinchIn,
        KeyCode::Char('+' | '=' | '.') => Action::PinchOut,
        KeyCode::Enter => Action::PinchRelease,
        KeyCode::Esc => Action::PinchCancel,
        KeyCode::Char('s') => Action::Split,
        KeyCode::PageUp => Action::ScrollUp,
        KeyCode::PageDown => Action::ScrollDown,
        _ => Action::None,
    }
}
