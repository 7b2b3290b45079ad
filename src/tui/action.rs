use crate::state::DisplayMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Typing a query string to follow.
    Linking,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Viewport
    PrevDay,
    NextDay,
    Up,
    Down,
    NextPage,
    PrevPage,
    Today,

    // Dialogs
    Open,
    Close,

    // Display
    ToggleDisplay,
    SetDisplay(DisplayMode),
    CycleFilter,

    // History
    Back,
    Forward,
    StartLink,

    // Link input
    Input(char),
    Backspace,
    SubmitLink,
    CancelLink,

    ToggleHelp,
    Quit,
}

/// Maps a key press to an action for the given input mode.
pub fn map_key(mode: InputMode, key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }
    match mode {
        InputMode::Linking => match key.code {
            KeyCode::Enter => Some(Action::SubmitLink),
            KeyCode::Esc => Some(Action::CancelLink),
            KeyCode::Backspace => Some(Action::Backspace),
            KeyCode::Char(c) => Some(Action::Input(c)),
            _ => None,
        },
        InputMode::Normal => match key.code {
            KeyCode::Char('h') | KeyCode::Left => Some(Action::PrevDay),
            KeyCode::Char('l') | KeyCode::Right => Some(Action::NextDay),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::Up),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::Down),
            KeyCode::Char('n') | KeyCode::PageDown => Some(Action::NextPage),
            KeyCode::Char('p') | KeyCode::PageUp => Some(Action::PrevPage),
            KeyCode::Char('t') => Some(Action::Today),
            KeyCode::Enter => Some(Action::Open),
            KeyCode::Esc => Some(Action::Close),
            KeyCode::Tab => Some(Action::ToggleDisplay),
            KeyCode::Char('a') => Some(Action::SetDisplay(DisplayMode::Alerts)),
            KeyCode::Char('e') => Some(Action::SetDisplay(DisplayMode::Events)),
            KeyCode::Char('f') => Some(Action::CycleFilter),
            KeyCode::Char('[') => Some(Action::Back),
            KeyCode::Char(']') => Some(Action::Forward),
            KeyCode::Char('g') => Some(Action::StartLink),
            KeyCode::Char('?') => Some(Action::ToggleHelp),
            KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        },
    }
}
