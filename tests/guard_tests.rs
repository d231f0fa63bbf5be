use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use eventflow::auth::Session;
use eventflow::config::Config;
use eventflow::guard::GuardDecision;
use eventflow::EventFlow;

fn client_for(server: &MockServer) -> EventFlow {
    let config = Config::new(&server.uri(), "test-anon-key", "https://auth.example.org");
    EventFlow::new(config).unwrap()
}

fn user_body(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "email": "organizer@example.com",
        "app_metadata": {},
        "user_metadata": {},
        "created_at": "2026-01-01T00:00:00Z",
        "updated_at": "2026-01-01T00:00:00Z"
    })
}

#[tokio::test]
async fn anonymous_visitor_may_browse_the_home_feed() {
    let server = MockServer::start().await;
    let app = client_for(&server);

    let (decision, page) = app
        .authorize("/", &Url::parse("https://app.test/").unwrap())
        .await;

    assert_eq!(decision, GuardDecision::Allow);
    assert!(page.user.is_none());
}

#[tokio::test]
async fn anonymous_visitor_is_sent_to_the_configured_login_page() {
    let server = MockServer::start().await;
    let app = client_for(&server);

    let (decision, _) = app
        .authorize("/dashboard", &Url::parse("https://app.test/dashboard").unwrap())
        .await;

    match decision {
        GuardDecision::Redirect(login) => {
            assert_eq!(login.as_str(), "https://auth.example.org/login");
        }
        GuardDecision::Allow => panic!("protected route must not render for an anonymous visitor"),
    }
}

#[tokio::test]
async fn fresh_redirect_session_unlocks_the_dashboard() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_body("user-1")))
        .mount(&server)
        .await;

    let app = client_for(&server);
    let location = Url::parse(
        "https://app.test/dashboard#access_token=redirect-at&refresh_token=redirect-rt",
    )
    .unwrap();

    let (decision, page) = app.authorize("/dashboard", &location).await;

    assert_eq!(decision, GuardDecision::Allow);
    assert_eq!(
        page.cleaned_location.unwrap().as_str(),
        "https://app.test/dashboard"
    );
}

/// Visiting a protected route with an expired persisted session and no URL
/// tokens: one refresh attempt, then exactly one redirect decision, with no
/// content allowed beforehand.
#[tokio::test]
async fn expired_persisted_session_yields_a_single_redirect() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "revoked"})))
        .expect(1)
        .mount(&server)
        .await;

    let app = client_for(&server);

    let stale = Session {
        access_token: "stale-access-token".to_string(),
        refresh_token: "stale-refresh-token".to_string(),
        token_type: "bearer".to_string(),
        expires_in: 3600,
        expires_at: Some(1),
        user: serde_json::from_value(user_body("user-1")).unwrap(),
    };
    assert!(!app.session().restore(stale).await);

    let (decision, page) = app
        .authorize("/profile", &Url::parse("https://app.test/profile").unwrap())
        .await;

    assert!(page.user.is_none());
    assert_eq!(
        decision,
        GuardDecision::Redirect(Url::parse("https://auth.example.org/login").unwrap())
    );
}
