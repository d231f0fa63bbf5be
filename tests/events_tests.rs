use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use eventflow::config::Config;
use eventflow::error::Error;
use eventflow::events::{EventChanges, ImageUpload, NewEvent};
use eventflow::EventFlow;

fn client_for(server: &MockServer) -> EventFlow {
    let config = Config::new(&server.uri(), "test-anon-key", "https://auth.example.org");
    EventFlow::new(config).unwrap()
}

fn event_body(id: i64, title: &str, date: &str, location: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "description": "",
        "date": date,
        "location": location,
        "image_url": null,
        "organization_id": "user-1",
        "author_name": "River Organizer",
        "created_at": "2026-06-01T10:00:00Z"
    })
}

async fn sign_in(app: &EventFlow, server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user-1",
            "email": "organizer@example.com",
            "app_metadata": {},
            "user_metadata": { "full_name": "River Organizer" },
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        })))
        .mount(server)
        .await;

    let location =
        Url::parse("https://app.test/#access_token=session-at&refresh_token=session-rt").unwrap();
    let page = app.session().hydrate(&location).await;
    assert!(page.user.is_some());
}

#[tokio::test]
async fn upcoming_asks_for_events_soonest_first() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/events"))
        .and(query_param("select", "*"))
        .and(query_param("order", "date.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            event_body(1, "Park cleanup", "2026-09-01", "Riverside park"),
            event_body(2, "Food drive", "2026-09-12", "Community hall"),
        ])))
        .mount(&server)
        .await;

    let app = client_for(&server);
    let events = app.events().upcoming().await.unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].title, "Park cleanup");
    assert_eq!(events[1].id, 2);
}

#[tokio::test]
async fn search_matches_title_or_location_case_insensitively() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            event_body(1, "River festival", "2026-09-01", "Old town square"),
            event_body(2, "Food drive", "2026-09-12", "Riverside hall"),
            event_body(3, "Book swap", "2026-09-20", "Library"),
        ])))
        .mount(&server)
        .await;

    let app = client_for(&server);
    let hits = app.events().search("RIVER").await.unwrap();

    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|e| e.id == 1 || e.id == 2));

    let none = app.events().search("stadium").await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn publish_rejects_incomplete_forms_before_any_request() {
    let server = MockServer::start().await;
    let app = client_for(&server);

    let incomplete = NewEvent {
        title: String::new(),
        description: "Great event".to_string(),
        date: "2026-09-01".to_string(),
        location: "Main square".to_string(),
    };

    let result = app.events().publish(incomplete, None).await;
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[tokio::test]
async fn publish_requires_a_session() {
    let server = MockServer::start().await;
    let app = client_for(&server);

    let event = NewEvent {
        title: "Park cleanup".to_string(),
        description: String::new(),
        date: "2026-09-01".to_string(),
        location: "Riverside park".to_string(),
    };

    let result = app.events().publish(event, None).await;
    assert!(matches!(result, Err(Error::Auth(_))));
}

#[tokio::test]
async fn publish_uploads_the_image_and_stamps_the_record() {
    let server = MockServer::start().await;
    let app = client_for(&server);
    sign_in(&app, &server).await;

    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/event-images/[0-9a-f-]+\.png$"))
        .and(header("Authorization", "Bearer session-at"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "event-images/x.png"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/events"))
        .and(header("Authorization", "Bearer session-at"))
        .and(header("Prefer", "return=minimal"))
        .and(body_partial_json(json!({
            "title": "Park cleanup",
            "date": "2026-09-01",
            "location": "Riverside park",
            "organization_id": "user-1",
            "author_name": "River Organizer"
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let event = NewEvent {
        title: "Park cleanup".to_string(),
        description: "Gloves provided".to_string(),
        date: "2026-09-01".to_string(),
        location: "Riverside park".to_string(),
    };
    let image = ImageUpload {
        file_name: "poster.png".to_string(),
        bytes: vec![0x89, 0x50, 0x4e, 0x47],
        content_type: Some("image/png".to_string()),
    };

    app.events().publish(event, Some(image)).await.unwrap();
}

#[tokio::test]
async fn revise_updates_only_the_owned_record() {
    let server = MockServer::start().await;
    let app = client_for(&server);
    sign_in(&app, &server).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/events"))
        .and(query_param("id", "eq.7"))
        .and(query_param("organization_id", "eq.user-1"))
        .and(body_partial_json(json!({"location": "New venue"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let changes = EventChanges {
        location: Some("New venue".to_string()),
        ..EventChanges::default()
    };
    app.events().revise(7, changes).await.unwrap();
}

#[tokio::test]
async fn retract_deletes_only_the_owned_record() {
    let server = MockServer::start().await;
    let app = client_for(&server);
    sign_in(&app, &server).await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/events"))
        .and(query_param("id", "eq.7"))
        .and(query_param("organization_id", "eq.user-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    app.events().retract(7).await.unwrap();
}

#[tokio::test]
async fn mine_lists_the_organizers_events_newest_first() {
    let server = MockServer::start().await;
    let app = client_for(&server);
    sign_in(&app, &server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/events"))
        .and(query_param("organization_id", "eq.user-1"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            event_body(5, "Food drive", "2026-09-12", "Community hall"),
        ])))
        .mount(&server)
        .await;

    let mine = app.events().mine().await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].organization_id, "user-1");
}
