// End-to-end behaviour of the session against an in-process API.
use chrono::{NaiveDate, TimeZone, Utc};
use newshound::client::NewsApi;
use newshound::config::Config;
use newshound::error::ApiError;
use newshound::location::{ALERT, DISPLAY, END, START, SearchParams};
use newshound::model::{NewsAlert, NewsAlertLite, NewsEvent};
use newshound::session::{Session, SessionEvent};
use newshound::state::{DateRange, DetailKind, DialogKind, DisplayMode};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};

#[derive(Clone, Default)]
struct FakeApi {
    calls: Arc<Mutex<Vec<String>>>,
    fail_ranges: bool,
}

impl FakeApi {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn lite(id: &str, day: NaiveDate) -> NewsAlertLite {
    NewsAlertLite {
        id: id.to_string(),
        article_url: String::new(),
        sender: "CNN".to_string(),
        timestamp: Utc.from_utc_datetime(&day.and_hms_opt(12, 0, 0).unwrap()),
        top_phrases: vec![],
        subject: "Breaking".to_string(),
        top_sentence: String::new(),
    }
}

fn news_event(id: &str, day: NaiveDate) -> NewsEvent {
    let start = Utc.from_utc_datetime(&day.and_hms_opt(12, 0, 0).unwrap());
    NewsEvent {
        id: id.to_string(),
        top_phrases: vec!["vote".to_string()],
        event_start: start,
        event_end: start + chrono::Duration::hours(1),
        news_alerts: vec![],
        top_sentence: String::new(),
        top_sender: String::new(),
    }
}

impl NewsApi for FakeApi {
    async fn find_alerts(&self, range: DateRange) -> Result<Vec<NewsAlertLite>, ApiError> {
        self.record(format!("find_alerts/{}/{}", range.start_str(), range.end_str()));
        if self.fail_ranges {
            return Err(ApiError::Status {
                status: 500,
                url: "find_alerts".to_string(),
            });
        }
        Ok(vec![lite(&format!("a-{}", range.start_str()), range.start)])
    }

    async fn find_events(&self, range: DateRange) -> Result<Vec<NewsEvent>, ApiError> {
        self.record(format!("find_events/{}/{}", range.start_str(), range.end_str()));
        Ok(vec![news_event(&format!("e-{}", range.start_str()), range.start)])
    }

    async fn get_alert(&self, id: &str) -> Result<NewsAlert, ApiError> {
        self.record(format!("alert/{}", id));
        if id == "missing" {
            return Err(ApiError::Status {
                status: 404,
                url: format!("alert/{}", id),
            });
        }
        Ok(NewsAlert {
            lite: lite(id, date(2024, 1, 15)),
            body: "<p>body</p>".to_string(),
            sentences: vec![],
        })
    }

    async fn get_event(&self, id: &str) -> Result<NewsEvent, ApiError> {
        self.record(format!("event/{}", id));
        Ok(news_event(id, date(2024, 1, 15)))
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Wednesday; its week is 2024-01-07..2024-01-13.
fn today() -> NaiveDate {
    date(2024, 1, 10)
}

fn session(
    api: FakeApi,
    initial: &str,
) -> (Session<FakeApi>, UnboundedReceiver<SessionEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let session = Session::new(
        api,
        &Config::default(),
        SearchParams::parse(initial),
        today(),
        tx,
    );
    (session, rx)
}

/// Runs the loop until nothing has happened for a while.
async fn drain(session: &mut Session<FakeApi>, rx: &mut UnboundedReceiver<SessionEvent>) {
    loop {
        session.pump_location();
        match tokio::time::timeout(Duration::from_millis(200), rx.recv()).await {
            Ok(Some(event)) => session.handle(event),
            _ => break,
        }
    }
    session.pump_location();
}

#[tokio::test]
async fn first_render_writes_visible_range() {
    let api = FakeApi::default();
    let (mut s, mut rx) = session(api.clone(), "");
    s.start();
    drain(&mut s, &mut rx).await;

    let search = s.location().search();
    assert_eq!(search.get(START), Some("2024-01-07"));
    assert_eq!(search.get(END), Some("2024-01-13"));
    assert_eq!(search.get(DISPLAY), Some("alerts"));
    assert_eq!(api.calls(), vec!["find_alerts/2024-01-07/2024-01-13"]);
    assert_eq!(s.calendar().entries().len(), 1);
}

#[tokio::test]
async fn deep_link_opens_alert_once() {
    let api = FakeApi::default();
    let (mut s, mut rx) = session(api.clone(), "start=2024-01-14&end=2024-01-20&alert=42");
    s.start();
    drain(&mut s, &mut rx).await;

    assert_eq!(s.calendar().visible_range().start, date(2024, 1, 14));
    assert_eq!(s.sync().dialog_kind(), DialogKind::Alert);
    assert_eq!(s.location().search().get(ALERT), Some("42"));
    let alert_calls = api.calls().iter().filter(|c| c.starts_with("alert/")).count();
    assert_eq!(alert_calls, 1);
}

#[tokio::test]
async fn closing_dialog_clears_url_and_back_reopens_it() {
    let api = FakeApi::default();
    let (mut s, mut rx) = session(api.clone(), "start=2024-01-14&end=2024-01-20&alert=42");
    s.start();
    drain(&mut s, &mut rx).await;

    s.close_dialog();
    drain(&mut s, &mut rx).await;
    assert_eq!(s.sync().dialog_kind(), DialogKind::None);
    assert_eq!(s.location().search().get(ALERT), None);
    assert_eq!(s.sync().navigation().open_alert_id, None);

    assert!(s.back());
    drain(&mut s, &mut rx).await;
    assert_eq!(s.sync().dialog_kind(), DialogKind::Alert);
    assert_eq!(s.sync().navigation().open_alert_id.as_deref(), Some("42"));
}

#[tokio::test]
async fn mode_only_switch_refetches_in_place() {
    let api = FakeApi::default();
    let (mut s, mut rx) = session(api.clone(), "");
    s.start();
    drain(&mut s, &mut rx).await;
    let range = s.calendar().visible_range();

    s.set_display(DisplayMode::Events);
    drain(&mut s, &mut rx).await;

    assert_eq!(s.calendar().visible_range(), range);
    assert_eq!(s.location().search().get(DISPLAY), Some("events"));
    assert_eq!(
        api.calls(),
        vec![
            "find_alerts/2024-01-07/2024-01-13",
            "find_events/2024-01-07/2024-01-13"
        ]
    );
    assert_eq!(s.calendar().entries()[0].obj_id, "e-2024-01-07");
}

#[tokio::test]
async fn overlapping_range_requests_apply_only_the_latest() {
    let api = FakeApi::default();
    let (mut s, mut rx) = session(api.clone(), "");
    s.start();
    // Page forward before the first response is handled.
    s.next();
    drain(&mut s, &mut rx).await;

    assert_eq!(
        api.calls(),
        vec![
            "find_alerts/2024-01-07/2024-01-13",
            "find_alerts/2024-01-14/2024-01-20"
        ]
    );
    let ids: Vec<&str> = s
        .calendar()
        .entries()
        .iter()
        .map(|e| e.obj_id.as_str())
        .collect();
    assert_eq!(ids, vec!["a-2024-01-14"]);
    assert_eq!(s.location().search().get(START), Some("2024-01-14"));
}

#[tokio::test]
async fn failed_detail_leaves_url_alone() {
    let api = FakeApi::default();
    let (mut s, mut rx) = session(api.clone(), "");
    s.start();
    drain(&mut s, &mut rx).await;
    let before = s.location().search();

    s.open_detail(DetailKind::Alert, "missing");
    drain(&mut s, &mut rx).await;

    assert_eq!(s.sync().dialog_kind(), DialogKind::None);
    assert_eq!(s.location().search(), before);
}

#[tokio::test]
async fn opening_entry_writes_id_into_url() {
    let api = FakeApi::default();
    let (mut s, mut rx) = session(api.clone(), "display=events");
    s.start();
    drain(&mut s, &mut rx).await;

    assert!(s.open_entry(date(2024, 1, 7), 0));
    drain(&mut s, &mut rx).await;

    assert_eq!(s.sync().dialog_kind(), DialogKind::Event);
    assert_eq!(s.location().search().get("event"), Some("e-2024-01-07"));
    assert!(!s.open_entry(date(2024, 1, 8), 0));
}

#[tokio::test]
async fn range_failure_renders_empty_calendar() {
    let api = FakeApi {
        fail_ranges: true,
        ..FakeApi::default()
    };
    let (mut s, mut rx) = session(api.clone(), "");
    s.start();
    drain(&mut s, &mut rx).await;

    assert!(s.calendar().entries().is_empty());
    assert_eq!(s.location().search().get(START), Some("2024-01-07"));
}

#[tokio::test]
async fn link_without_start_reloads_to_defaults() {
    let api = FakeApi::default();
    let (mut s, mut rx) = session(api.clone(), "");
    s.start();
    drain(&mut s, &mut rx).await;
    s.next();
    drain(&mut s, &mut rx).await;

    s.follow_link("display=events");
    drain(&mut s, &mut rx).await;

    let search = s.location().search();
    assert_eq!(search.get(START), Some("2024-01-07"));
    assert_eq!(search.get(DISPLAY), Some("events"));
    assert_eq!(s.display_mode(), DisplayMode::Events);
    assert_eq!(
        api.calls().last().map(String::as_str),
        Some("find_events/2024-01-07/2024-01-13")
    );
}

#[tokio::test]
async fn narrow_terminal_switches_to_day_view() {
    let api = FakeApi::default();
    let (mut s, mut rx) = session(api.clone(), "");
    s.start();
    drain(&mut s, &mut rx).await;

    s.resize(60);
    drain(&mut s, &mut rx).await;

    let search = s.location().search();
    assert_eq!(search.get(START), Some("2024-01-10"));
    assert_eq!(search.get(END), Some("2024-01-10"));
}

#[tokio::test]
async fn malformed_date_link_keeps_viewport() {
    let api = FakeApi::default();
    let (mut s, mut rx) = session(api.clone(), "");
    s.start();
    drain(&mut s, &mut rx).await;
    let range = s.calendar().visible_range();

    s.follow_link("start=2024-99-01&end=2024-01-13&display=alerts");
    drain(&mut s, &mut rx).await;

    assert_eq!(s.calendar().visible_range(), range);
}

#[tokio::test]
async fn out_of_range_deep_link_keeps_todays_week() {
    let api = FakeApi::default();
    let (mut s, mut rx) = session(api.clone(), "start=262142-12-31&end=262142-12-31");
    s.start();
    drain(&mut s, &mut rx).await;

    assert_eq!(s.calendar().visible_range().start, date(2024, 1, 7));
    assert_eq!(api.calls(), vec!["find_alerts/2024-01-07/2024-01-13"]);
}
