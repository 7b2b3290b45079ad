// Converts API payloads into calendar entries
use crate::model::item::{CalendarEntry, NewsAlertLite, NewsEvent};

/// CSS-style class for a sender: whitespace, `.` and `!` removed, lowercased.
pub fn sender_class_name(sender: &str) -> String {
    sender
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.' && *c != '!')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Renders an alert's delay after the first alert of its event.
pub fn format_time_lapsed(seconds: i64) -> String {
    format!("{} minute(s), {} seconds", seconds / 60, seconds % 60)
}

impl NewsAlertLite {
    pub fn calendar_title(&self) -> String {
        format!("{}\n\n{}", self.sender, self.subject)
    }

    pub fn to_entry(&self) -> CalendarEntry {
        CalendarEntry {
            obj_id: self.id.clone(),
            title: self.calendar_title(),
            start: self.timestamp,
            end: None,
            class_names: vec![sender_class_name(&self.sender)],
            senders: vec![self.sender.clone()],
        }
    }
}

impl NewsEvent {
    /// Size bucket used to style the event by how many alerts it groups.
    pub fn size_class(&self) -> String {
        match self.news_alerts.len() {
            0..=3 => "news_event_cal_small".to_string(),
            n if n >= 10 => "news_event_cal_large".to_string(),
            n => format!("news_event_cal_{}", n),
        }
    }

    pub fn to_entry(&self) -> CalendarEntry {
        let mut class_names = vec![self.size_class(), "news_event_cal".to_string()];
        let mut senders = Vec::new();
        for alert in &self.news_alerts {
            class_names.push(sender_class_name(&alert.sender));
            if !senders.contains(&alert.sender) {
                senders.push(alert.sender.clone());
            }
        }

        CalendarEntry {
            obj_id: self.id.clone(),
            title: self.top_phrases.join(","),
            start: self.event_start,
            end: Some(self.event_end),
            class_names,
            senders,
        }
    }
}
