use crate::client::NewsApi;
use crate::model::{CalendarEntry, NewsEventAlert};
use crate::session::Session;
use crate::state::{Detail, DetailKind};
use crate::tui::action::{Action, InputMode};
use chrono::NaiveDate;
use ratatui::widgets::ListState;

pub struct AppState<A: NewsApi> {
    pub session: Session<A>,

    // UI State
    pub mode: InputMode,
    pub day_index: usize,
    pub list_state: ListState,
    pub popup_state: ListState,
    pub show_full_help: bool,

    // Inputs
    pub input_buffer: String,

    // System
    pub message: String,
    pub should_quit: bool,
}

impl<A: NewsApi> AppState<A> {
    pub fn new(session: Session<A>) -> Self {
        Self {
            session,
            mode: InputMode::Normal,
            day_index: 0,
            list_state: ListState::default(),
            popup_state: ListState::default(),
            show_full_help: false,
            input_buffer: String::new(),
            message: "Loading...".to_string(),
            should_quit: false,
        }
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        self.session.calendar().visible_range().days()
    }

    pub fn selected_day(&self) -> NaiveDate {
        let days = self.days();
        let idx = self.day_index.min(days.len().saturating_sub(1));
        days.get(idx)
            .copied()
            .unwrap_or_else(|| self.session.calendar().anchor())
    }

    pub fn entries_on(&self, day: NaiveDate) -> Vec<&CalendarEntry> {
        self.session
            .calendar()
            .entries_on(day, self.session.filter())
    }

    /// Alerts of the event dialog, when it is the visible one.
    pub fn event_alerts(&self) -> Option<&[NewsEventAlert]> {
        match self.session.dialog() {
            Some(Detail::Event(event)) => Some(&event.news_alerts),
            _ => None,
        }
    }

    /// Keeps the selections inside what is currently displayed.
    pub fn clamp_selection(&mut self) {
        let days = self.days().len();
        if self.day_index >= days {
            self.day_index = days.saturating_sub(1);
        }
        let count = self.entries_on(self.selected_day()).len();
        clamp(&mut self.list_state, count);
        let alerts = self.event_alerts().map_or(0, <[_]>::len);
        clamp(&mut self.popup_state, alerts);
    }

    pub fn update(&mut self, action: Action) {
        match action {
            Action::PrevDay => {
                if self.day_index > 0 {
                    self.day_index -= 1;
                } else {
                    self.session.prev();
                    self.day_index = self.days().len().saturating_sub(1);
                }
                self.list_state.select(None);
            }
            Action::NextDay => {
                if self.day_index + 1 < self.days().len() {
                    self.day_index += 1;
                } else {
                    self.session.next();
                    self.day_index = 0;
                }
                self.list_state.select(None);
            }
            Action::Up => {
                if self.event_alerts().is_some() {
                    self.popup_state.select_previous();
                } else {
                    self.list_state.select_previous();
                }
            }
            Action::Down => {
                if self.event_alerts().is_some() {
                    self.popup_state.select_next();
                } else {
                    self.list_state.select_next();
                }
            }
            Action::NextPage => self.session.next(),
            Action::PrevPage => self.session.prev(),
            Action::Today => self.session.go_today(),
            Action::Open => self.open_selected(),
            Action::Close => {
                self.session.close_dialog();
                self.popup_state.select(None);
            }
            Action::ToggleDisplay => self.session.toggle_display(),
            Action::SetDisplay(mode) => self.session.set_display(mode),
            Action::CycleFilter => {
                self.session.cycle_filter();
                self.message = match self.session.filter().class() {
                    Some(class) => format!("Showing {}", class),
                    None => "Showing all senders".to_string(),
                };
            }
            Action::Back => {
                if !self.session.back() {
                    self.message = "Nothing to go back to".to_string();
                }
            }
            Action::Forward => {
                if !self.session.forward() {
                    self.message = "Nothing to go forward to".to_string();
                }
            }
            Action::StartLink => {
                self.mode = InputMode::Linking;
                self.input_buffer = self.session.location().search().to_query_string();
            }
            Action::Input(c) => self.input_buffer.push(c),
            Action::Backspace => {
                self.input_buffer.pop();
            }
            Action::SubmitLink => {
                let query = std::mem::take(&mut self.input_buffer);
                self.session.follow_link(&query);
                self.message = format!("Opened ?{}", query.trim_start_matches('?'));
                self.mode = InputMode::Normal;
            }
            Action::CancelLink => {
                self.input_buffer.clear();
                self.mode = InputMode::Normal;
            }
            Action::ToggleHelp => self.show_full_help = !self.show_full_help,
            Action::Quit => self.should_quit = true,
        }
        self.clamp_selection();
    }

    fn open_selected(&mut self) {
        // Inside an event dialog Enter opens the highlighted alert on top of it.
        if let Some(alerts) = self.event_alerts() {
            let idx = self.popup_state.selected().unwrap_or(0);
            if let Some(alert_id) = alerts.get(idx).map(|a| a.alert_id.clone()) {
                self.session.open_detail(DetailKind::Alert, &alert_id);
            }
            return;
        }
        if self.session.dialog().is_some() {
            return;
        }
        let day = self.selected_day();
        let idx = self.list_state.selected().unwrap_or(0);
        if !self.session.open_entry(day, idx) {
            self.message = format!("Nothing on {}", day.format("%a %b %-d"));
        }
    }
}

fn clamp(state: &mut ListState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        _ => {}
    }
}
