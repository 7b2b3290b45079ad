// Navigation and dialog state shared by the synchronizer, the session and the UI.
use crate::error::DateError;
use crate::location::{ALERT, DISPLAY, END, EVENT, START, SearchParams};
use crate::model::{NewsAlert, NewsEvent};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Default, PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Alerts,
    Events,
}

impl DisplayMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayMode::Alerts => "alerts",
            DisplayMode::Events => "events",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Alerts => DisplayMode::Events,
            DisplayMode::Events => DisplayMode::Alerts,
        }
    }

    /// The detail kind opened when an entry is clicked in this mode.
    pub fn detail_kind(self) -> DetailKind {
        match self {
            DisplayMode::Alerts => DetailKind::Alert,
            DisplayMode::Events => DetailKind::Event,
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alerts" => Ok(DisplayMode::Alerts),
            "events" => Ok(DisplayMode::Events),
            other => Err(format!("unknown display mode '{}'", other)),
        }
    }
}

/// Parses a `year-month-day` string. Exactly three numeric parts are required,
/// the year must fit `yyyy` and the day must exist.
pub fn parse_ymd(s: &str) -> Result<NaiveDate, DateError> {
    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() != 3 {
        return Err(DateError::Format(s.to_string()));
    }
    let year: i32 = parts[0]
        .parse()
        .map_err(|_| DateError::Format(s.to_string()))?;
    let month: u32 = parts[1]
        .parse()
        .map_err(|_| DateError::Format(s.to_string()))?;
    let day: u32 = parts[2]
        .parse()
        .map_err(|_| DateError::Format(s.to_string()))?;
    if !(1..=9999).contains(&year) {
        return Err(DateError::OutOfRange(s.to_string()));
    }
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| DateError::OutOfRange(s.to_string()))
}

pub fn format_ymd(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn start_str(&self) -> String {
        format_ymd(self.start)
    }

    pub fn end_str(&self) -> String {
        format_ymd(self.end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        let mut out = Vec::new();
        let mut day = self.start;
        while day <= self.end {
            out.push(day);
            match day.checked_add_days(Days::new(1)) {
                Some(next) => day = next,
                None => break,
            }
        }
        out
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start_str(), self.end_str())
    }
}

/// The view state encoded in the URL query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub display_mode: DisplayMode,
    pub open_alert_id: Option<String>,
    pub open_event_id: Option<String>,
}

impl NavigationState {
    pub fn from_search(search: &SearchParams) -> Self {
        let non_empty = |key: &str| {
            search
                .get(key)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let display_mode = match search.get(DISPLAY).filter(|v| !v.is_empty()) {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("{}; falling back to {}", e, DisplayMode::default());
                DisplayMode::default()
            }),
            None => DisplayMode::default(),
        };

        Self {
            start_date: non_empty(START),
            end_date: non_empty(END),
            display_mode,
            open_alert_id: non_empty(ALERT),
            open_event_id: non_empty(EVENT),
        }
    }

    pub fn open_id(&self, kind: DetailKind) -> Option<&str> {
        match kind {
            DetailKind::Alert => self.open_alert_id.as_deref(),
            DetailKind::Event => self.open_event_id.as_deref(),
        }
    }

    pub fn set_open_id(&mut self, kind: DetailKind, id: Option<String>) {
        match kind {
            DetailKind::Alert => self.open_alert_id = id,
            DetailKind::Event => self.open_event_id = id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailKind {
    Alert,
    Event,
}

impl DetailKind {
    pub const ALL: [DetailKind; 2] = [DetailKind::Alert, DetailKind::Event];

    /// Query parameter holding this kind's identifier.
    pub fn param(self) -> &'static str {
        match self {
            DetailKind::Alert => ALERT,
            DetailKind::Event => EVENT,
        }
    }
}

impl fmt::Display for DetailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.param())
    }
}

/// A fetched detail payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Detail {
    Alert(NewsAlert),
    Event(NewsEvent),
}

impl Detail {
    pub fn kind(&self) -> DetailKind {
        match self {
            Detail::Alert(_) => DetailKind::Alert,
            Detail::Event(_) => DetailKind::Event,
        }
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    #[default]
    None,
    Alert,
    Event,
}

impl From<DetailKind> for DialogKind {
    fn from(kind: DetailKind) -> Self {
        match kind {
            DetailKind::Alert => DialogKind::Alert,
            DetailKind::Event => DialogKind::Event,
        }
    }
}
