// Payloads returned by the newshound API and the calendar entries built from them.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifiers come back as JSON numbers from some deployments and as
/// hex strings from others. Both are kept as strings.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Num(i64),
        Str(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Num(n) => n.to_string(),
        RawId::Str(s) => s,
    })
}

/// Alert without body, as returned by range queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsAlertLite {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub article_url: String,
    pub sender: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, rename = "phrases", alias = "tags")]
    pub top_phrases: Vec<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub top_sentence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    #[serde(rename = "sentence")]
    pub value: String,
    #[serde(default, rename = "noun_phrases")]
    pub phrases: Vec<String>,
}

/// Full alert, as returned by `/alert/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsAlert {
    #[serde(flatten)]
    pub lite: NewsAlertLite,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub sentences: Vec<Sentence>,
}

/// An alert as seen from inside an event, with its position and delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsEventAlert {
    #[serde(deserialize_with = "id_string")]
    pub alert_id: String,
    #[serde(default)]
    pub instance_id: String,
    #[serde(default)]
    pub article_url: String,
    pub sender: String,
    #[serde(default, rename = "phrases", alias = "tags")]
    pub top_phrases: Vec<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub top_sentence: String,
    #[serde(default)]
    pub order: i64,
    /// Seconds after the first alert of the event.
    #[serde(default)]
    pub time_lapsed: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsEvent {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, rename = "phrases", alias = "tags")]
    pub top_phrases: Vec<String>,
    pub event_start: DateTime<Utc>,
    pub event_end: DateTime<Utc>,
    #[serde(default)]
    pub news_alerts: Vec<NewsEventAlert>,
    #[serde(default)]
    pub top_sentence: String,
    #[serde(default)]
    pub top_sender: String,
}

/// One item in the calendar grid.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEntry {
    pub obj_id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub class_names: Vec<String>,
    /// Sender display names, in the order they appear.
    pub senders: Vec<String>,
}

impl CalendarEntry {
    pub fn has_class(&self, class: &str) -> bool {
        self.class_names.iter().any(|c| c == class)
    }
}
