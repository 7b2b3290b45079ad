// Calendar viewport: which dates are visible and which entries are loaded for them.
use crate::model::CalendarEntry;
use crate::state::DateRange;
use chrono::{Datelike, Days, NaiveDate};
use std::collections::BTreeMap;

#[derive(Default, PartialEq, Eq, Clone, Copy, Debug)]
pub enum ViewKind {
    #[default]
    Week,
    Day,
}

impl ViewKind {
    fn span_days(self) -> u64 {
        match self {
            ViewKind::Week => 7,
            ViewKind::Day => 1,
        }
    }
}

/// Declarative replacement for hiding rendered nodes by class: entries are
/// filtered before they reach the view.
#[derive(Default, PartialEq, Eq, Clone, Debug)]
pub struct SenderFilter(Option<String>);

impl SenderFilter {
    pub fn all() -> Self {
        Self(None)
    }

    pub fn only(sender_class: impl Into<String>) -> Self {
        Self(Some(sender_class.into()))
    }

    pub fn class(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn matches(&self, entry: &CalendarEntry) -> bool {
        match &self.0 {
            Some(class) => entry.has_class(class),
            None => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CalendarView {
    kind: ViewKind,
    anchor: NaiveDate,
    entries: Vec<CalendarEntry>,
    narrow_width: u16,
}

impl CalendarView {
    pub fn new(today: NaiveDate, narrow_width: u16) -> Self {
        Self {
            kind: ViewKind::Week,
            anchor: today,
            entries: Vec::new(),
            narrow_width,
        }
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    /// Inclusive visible window. Weeks start on Sunday.
    pub fn visible_range(&self) -> DateRange {
        // The anchor only ever moves to dates whose window exists.
        range_around(self.kind, self.anchor)
            .unwrap_or_else(|| DateRange::new(self.anchor, self.anchor))
    }

    /// Moves the anchor. Returns whether the visible range changed. A date
    /// whose window falls outside the calendar is refused.
    pub fn goto_date(&mut self, date: NaiveDate) -> bool {
        if range_around(self.kind, date).is_none() {
            tracing::warn!(%date, "Date out of calendar range; staying put");
            return false;
        }
        let before = self.visible_range();
        self.anchor = date;
        self.visible_range() != before
    }

    pub fn next(&mut self) -> bool {
        match self
            .anchor
            .checked_add_days(Days::new(self.kind.span_days()))
        {
            Some(date) => self.goto_date(date),
            None => false,
        }
    }

    pub fn prev(&mut self) -> bool {
        match self
            .anchor
            .checked_sub_days(Days::new(self.kind.span_days()))
        {
            Some(date) => self.goto_date(date),
            None => false,
        }
    }

    pub fn today(&mut self, today: NaiveDate) -> bool {
        self.goto_date(today)
    }

    pub fn set_kind(&mut self, kind: ViewKind) -> bool {
        if range_around(kind, self.anchor).is_none() {
            return false;
        }
        let before = self.visible_range();
        self.kind = kind;
        self.visible_range() != before
    }

    /// Narrow screens get the day view. Returns whether the range changed.
    pub fn fit_width(&mut self, columns: u16) -> bool {
        let kind = if columns < self.narrow_width {
            ViewKind::Day
        } else {
            ViewKind::Week
        };
        self.set_kind(kind)
    }

    pub fn set_entries(&mut self, entries: Vec<CalendarEntry>) {
        self.entries = entries;
    }

    pub fn clear_entries(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[CalendarEntry] {
        &self.entries
    }

    /// Entries starting on `day` that pass the filter, earliest first.
    pub fn entries_on(&self, day: NaiveDate, filter: &SenderFilter) -> Vec<&CalendarEntry> {
        let mut out: Vec<&CalendarEntry> = self
            .entries
            .iter()
            .filter(|e| e.start.date_naive() == day && filter.matches(e))
            .collect();
        out.sort_by_key(|e| e.start);
        out
    }

    /// Sender classes seen in the loaded entries, with a display name.
    pub fn senders(&self) -> BTreeMap<String, String> {
        let mut senders = BTreeMap::new();
        for entry in &self.entries {
            for sender in &entry.senders {
                senders
                    .entry(crate::model::sender_class_name(sender))
                    .or_insert_with(|| sender.clone());
            }
        }
        senders
    }
}

fn range_around(kind: ViewKind, anchor: NaiveDate) -> Option<DateRange> {
    match kind {
        ViewKind::Week => {
            let offset = u64::from(anchor.weekday().num_days_from_sunday());
            let start = anchor.checked_sub_days(Days::new(offset))?;
            let end = start.checked_add_days(Days::new(6))?;
            Some(DateRange::new(start, end))
        }
        ViewKind::Day => Some(DateRange::new(anchor, anchor)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(id: &str, sender: &str, day: u32, hour: u32) -> CalendarEntry {
        CalendarEntry {
            obj_id: id.to_string(),
            title: format!("{}\n\nsubject", sender),
            start: Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap(),
            end: None,
            class_names: vec![crate::model::sender_class_name(sender)],
            senders: vec![sender.to_string()],
        }
    }

    #[test]
    fn week_starts_on_sunday() {
        // 2024-01-10 is a Wednesday.
        let view = CalendarView::new(date(2024, 1, 10), 100);
        assert_eq!(
            view.visible_range(),
            DateRange::new(date(2024, 1, 7), date(2024, 1, 13))
        );
    }

    #[test]
    fn goto_within_same_week_keeps_range() {
        let mut view = CalendarView::new(date(2024, 1, 10), 100);
        assert!(!view.goto_date(date(2024, 1, 12)));
        assert!(view.goto_date(date(2024, 1, 14)));
        assert_eq!(view.visible_range().start, date(2024, 1, 14));
    }

    #[test]
    fn paging_moves_by_view_span() {
        let mut view = CalendarView::new(date(2024, 1, 10), 100);
        assert!(view.next());
        assert_eq!(view.visible_range().start, date(2024, 1, 14));
        assert!(view.set_kind(ViewKind::Day));
        assert!(view.prev());
        assert_eq!(view.visible_range(), DateRange::new(date(2024, 1, 16), date(2024, 1, 16)));
    }

    #[test]
    fn dates_at_the_end_of_time_are_refused() {
        let mut view = CalendarView::new(date(2024, 1, 10), 100);
        let last = NaiveDate::MAX;
        assert!(!view.goto_date(last));
        assert_eq!(view.anchor(), date(2024, 1, 10));

        // A day view can show it, but cannot page past it.
        view.set_kind(ViewKind::Day);
        assert!(view.goto_date(last));
        assert!(!view.next());
        assert_eq!(view.visible_range(), DateRange::new(last, last));
        assert!(!view.set_kind(ViewKind::Week));
        assert_eq!(view.kind(), ViewKind::Day);
    }

    #[test]
    fn narrow_width_switches_to_day_view() {
        let mut view = CalendarView::new(date(2024, 1, 10), 100);
        assert!(view.fit_width(80));
        assert_eq!(view.kind(), ViewKind::Day);
        assert!(!view.fit_width(60));
        assert!(view.fit_width(140));
        assert_eq!(view.kind(), ViewKind::Week);
    }

    #[test]
    fn entries_are_filtered_and_sorted() {
        let mut view = CalendarView::new(date(2024, 1, 10), 100);
        view.set_entries(vec![
            entry("1", "CNN", 8, 15),
            entry("2", "BBC", 8, 9),
            entry("3", "CNN", 8, 7),
            entry("4", "CNN", 9, 7),
        ]);

        let all: Vec<&str> = view
            .entries_on(date(2024, 1, 8), &SenderFilter::all())
            .iter()
            .map(|e| e.obj_id.as_str())
            .collect();
        assert_eq!(all, vec!["3", "2", "1"]);

        let cnn: Vec<&str> = view
            .entries_on(date(2024, 1, 8), &SenderFilter::only("cnn"))
            .iter()
            .map(|e| e.obj_id.as_str())
            .collect();
        assert_eq!(cnn, vec!["3", "1"]);

        let senders = view.senders();
        assert_eq!(senders.get("bbc").map(String::as_str), Some("BBC"));
        assert_eq!(senders.len(), 2);
    }
}
