// HTTP behaviour of the API client against a mock server.
use chrono::NaiveDate;
use newshound::client::{NewsApi, NewsClient, fetch_detail, fetch_entries};
use newshound::error::ApiError;
use newshound::state::{DateRange, Detail, DetailKind, DisplayMode};

fn first_week() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
    )
}

const ALERTS_JSON: &str = r#"[
  {
    "id": 42,
    "article_url": "https://example.com/a",
    "sender": "FoxNews.com",
    "timestamp": "2024-01-02T14:30:00Z",
    "phrases": ["senate"],
    "subject": "Senate votes",
    "top_sentence": "The senate voted."
  }
]"#;

const EVENT_JSON: &str = r#"{
  "id": "5f1a",
  "phrases": ["senate", "vote"],
  "event_start": "2024-01-02T14:30:00-05:00",
  "event_end": "2024-01-02T16:00:00-05:00",
  "news_alerts": [
    {"alert_id": 42, "instance_id": "i1", "sender": "CNN", "subject": "Vote", "order": 0, "time_lapsed": 0},
    {"alert_id": 43, "instance_id": "i2", "sender": "BBC", "subject": "Vote", "order": 1, "time_lapsed": 135}
  ],
  "top_sentence": "The senate voted.",
  "top_sender": "CNN"
}"#;

#[tokio::test]
async fn find_alerts_decodes_list() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/find_alerts/2024-01-01/2024-01-07")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(ALERTS_JSON)
        .create_async()
        .await;

    let client = NewsClient::new(&server.url(), false).unwrap();
    let alerts = client.find_alerts(first_week()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].id, "42");
    assert_eq!(alerts[0].sender, "FoxNews.com");
    assert_eq!(alerts[0].top_phrases, vec!["senate"]);
}

#[tokio::test]
async fn null_body_is_an_empty_list() {
    let mut server = mockito::Server::new_async().await;
    let _alerts = server
        .mock("GET", "/find_alerts/2024-01-01/2024-01-07")
        .with_status(200)
        .with_body("null")
        .create_async()
        .await;
    let _events = server
        .mock("GET", "/find_events/2024-01-01/2024-01-07")
        .with_status(200)
        .with_body("null\n")
        .create_async()
        .await;

    let client = NewsClient::new(&server.url(), false).unwrap();
    assert!(client.find_alerts(first_week()).await.unwrap().is_empty());
    assert!(client.find_events(first_week()).await.unwrap().is_empty());
}

#[tokio::test]
async fn event_detail_decodes_nested_alerts() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/event/5f1a")
        .with_status(200)
        .with_body(EVENT_JSON)
        .create_async()
        .await;

    let client = NewsClient::new(&server.url(), false).unwrap();
    let detail = fetch_detail(&client, DetailKind::Event, "5f1a").await.unwrap();
    let Detail::Event(event) = detail else {
        panic!("expected an event");
    };
    assert_eq!(event.id, "5f1a");
    assert_eq!(event.news_alerts.len(), 2);
    assert_eq!(event.news_alerts[1].alert_id, "43");
    assert_eq!(event.news_alerts[1].time_lapsed, 135);
    assert_eq!(event.event_start.to_rfc3339(), "2024-01-02T19:30:00+00:00");
}

#[tokio::test]
async fn alert_detail_includes_body() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/alert/42")
        .with_status(200)
        .with_body(
            r#"{"id": 42, "sender": "CNN", "timestamp": "2024-01-02T14:30:00Z",
                "subject": "Vote", "body": "<p>hi</p>",
                "sentences": [{"sentence": "hi", "noun_phrases": ["hi"]}]}"#,
        )
        .create_async()
        .await;

    let client = NewsClient::new(&format!("{}/", server.url()), false).unwrap();
    let alert = client.get_alert("42").await.unwrap();
    assert_eq!(alert.lite.id, "42");
    assert_eq!(alert.body, "<p>hi</p>");
    assert_eq!(alert.sentences[0].phrases, vec!["hi"]);
}

#[tokio::test]
async fn error_status_is_reported() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/alert/7")
        .with_status(404)
        .create_async()
        .await;

    let client = NewsClient::new(&server.url(), false).unwrap();
    match client.get_alert("7").await {
        Err(ApiError::Status { status, .. }) => assert_eq!(status, 404),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn fetch_entries_degrades_to_empty() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/find_events/2024-01-01/2024-01-07")
        .with_status(500)
        .create_async()
        .await;
    let _bad = server
        .mock("GET", "/find_alerts/2024-01-01/2024-01-07")
        .with_status(200)
        .with_body("{not json")
        .create_async()
        .await;

    let client = NewsClient::new(&server.url(), false).unwrap();
    assert!(
        fetch_entries(&client, first_week(), DisplayMode::Events)
            .await
            .is_empty()
    );
    assert!(
        fetch_entries(&client, first_week(), DisplayMode::Alerts)
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn fetch_entries_builds_calendar_items() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/find_alerts/2024-01-01/2024-01-07")
        .with_status(200)
        .with_body(ALERTS_JSON)
        .create_async()
        .await;

    let client = NewsClient::new(&server.url(), false).unwrap();
    let entries = fetch_entries(&client, first_week(), DisplayMode::Alerts).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].obj_id, "42");
    assert_eq!(entries[0].title, "FoxNews.com\n\nSenate votes");
    assert_eq!(entries[0].class_names, vec!["foxnewscom"]);
}

#[test]
fn invalid_host_is_rejected() {
    assert!(matches!(
        NewsClient::new("http://bad host", false),
        Err(ApiError::InvalidUri { .. })
    ));
}

#[tokio::test]
async fn detail_id_is_escaped_into_one_segment() {
    let mut server = mockito::Server::new_async().await;
    let escaped = server
        .mock("GET", "/alert/..%2Ffind_alerts%2F2024-01-01")
        .with_status(404)
        .create_async()
        .await;

    let client = NewsClient::new(&server.url(), false).unwrap();
    let result = client.get_alert("../find_alerts/2024-01-01").await;

    escaped.assert_async().await;
    assert!(matches!(result, Err(ApiError::Status { status: 404, .. })));
}
