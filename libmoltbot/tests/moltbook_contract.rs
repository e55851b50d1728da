//! Moltbook client against a local mock HTTP server

use libmoltbot::config::ApiConfig;
use libmoltbot::error::{BotError, RemoteError};
use libmoltbot::pacing::{RecordingSleeper, Shutdown};
use libmoltbot::platforms::moltbook::MoltbookClient;
use libmoltbot::platforms::Platform;
use libmoltbot::Credentials;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, sleeper: &RecordingSleeper) -> MoltbookClient {
    client_with(server, sleeper, 3, 10)
}

fn client_with(
    server: &MockServer,
    sleeper: &RecordingSleeper,
    max_retries: u32,
    timeout_seconds: u64,
) -> MoltbookClient {
    let api = ApiConfig {
        base_url: server.uri(),
        timeout_seconds,
        max_retries,
        ..Default::default()
    };
    MoltbookClient::from_config(
        &api,
        &Credentials::new("test-key", "TestBot"),
        Arc::new(sleeper.clone()),
        Shutdown::new(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_fetch_feed_sends_auth_and_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(query_param("limit", "10"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "posts": [
                {"id": "a1", "content": "Hello AI", "author": {"username": "alice"}, "comment_count": 0},
                {"id": 7, "content": "numeric id", "liked": true},
                {"content": "no id, dropped"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let feed = client(&server, &RecordingSleeper::new())
        .fetch_feed(10)
        .await
        .unwrap();

    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0].id, "a1");
    assert_eq!(feed[0].author_username.as_deref(), Some("alice"));
    assert_eq!(feed[0].comment_count, Some(0));
    assert_eq!(feed[1].id, "7");
    assert!(feed[1].liked);
    assert_eq!(feed[1].comment_count, None);
}

#[tokio::test]
async fn test_unsuccessful_listing_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": false, "error": "busy"})),
        )
        .mount(&server)
        .await;

    let feed = client(&server, &RecordingSleeper::new())
        .fetch_feed(5)
        .await
        .unwrap();

    assert!(feed.is_empty());
}

#[tokio::test]
async fn test_like_and_follow_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/posts/p1/upvote"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/alice/follow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, &RecordingSleeper::new());

    client.like("p1").await.unwrap();
    client.follow("alice").await.unwrap();
}

#[tokio::test]
async fn test_reply_sends_parent_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/posts"))
        .and(body_json(json!({"content": "Nice!", "parent_id": "p9"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"success": true, "post": {"id": "r1"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let created = client(&server, &RecordingSleeper::new())
        .create_post("Nice!", Some("p9"))
        .await
        .unwrap();

    assert_eq!(created.id, "r1");
}

#[tokio::test]
async fn test_non_ascii_username_is_percent_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/%E8%87%AA%E5%8A%A8%E5%8C%96/follow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    client(&server, &RecordingSleeper::new())
        .follow("自动化")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_created_with_plain_text_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(201).set_body_string("Created"))
        .expect(1)
        .mount(&server)
        .await;

    let created = client(&server, &RecordingSleeper::new())
        .create_post("hello", None)
        .await
        .unwrap();

    assert!(created.id.is_empty());
}

#[tokio::test]
async fn test_list_comments() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts/p1/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "comments": [{"id": "c1", "content": "first", "author": {"username": "bob"}}]
        })))
        .mount(&server)
        .await;

    let comments = client(&server, &RecordingSleeper::new())
        .list_comments("p1")
        .await
        .unwrap();

    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].author_username.as_deref(), Some("bob"));
}

#[tokio::test]
async fn test_rate_limit_waits_for_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/posts/p1/upvote"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "2"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/posts/p1/upvote"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    let sleeper = RecordingSleeper::new();

    client(&server, &sleeper).like("p1").await.unwrap();

    assert_eq!(sleeper.durations(), vec![Duration::from_secs(2)]);
}

#[tokio::test]
async fn test_rate_limit_hint_in_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({"retry_after": 3})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "posts": []})))
        .mount(&server)
        .await;
    let sleeper = RecordingSleeper::new();

    client(&server, &sleeper).fetch_feed(10).await.unwrap();

    assert_eq!(sleeper.total(), Duration::from_secs(3));
}

#[tokio::test]
async fn test_server_error_on_feed_is_retried_then_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;
    let sleeper = RecordingSleeper::new();

    let err = client(&server, &sleeper).fetch_feed(10).await.unwrap_err();

    assert!(matches!(err, BotError::Remote(RemoteError::Server(_))));
    assert_eq!(
        sleeper.durations(),
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4)
        ]
    );
}

#[tokio::test]
async fn test_server_error_on_post_is_not_reissued() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, &RecordingSleeper::new())
        .create_post("hello", None)
        .await
        .unwrap_err();

    assert!(matches!(err, BotError::Remote(RemoteError::Server(_))));
}

#[tokio::test]
async fn test_unauthorized_is_fatal_and_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, &RecordingSleeper::new())
        .fetch_feed(10)
        .await
        .unwrap_err();

    assert!(err.is_fatal());
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_not_found_is_skippable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/posts/gone/upvote"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, &RecordingSleeper::new())
        .like("gone")
        .await
        .unwrap_err();

    assert!(err.is_skippable());
}

#[tokio::test]
async fn test_slow_response_times_out_as_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "posts": []}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = client_with(&server, &RecordingSleeper::new(), 0, 1)
        .fetch_feed(10)
        .await
        .unwrap_err();

    assert!(matches!(err, BotError::Remote(RemoteError::Transport(_))));
}

#[tokio::test]
async fn test_user_info() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/TestBot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "user": {"username": "TestBot", "display_name": "Test Bot", "follower_count": 12}
        })))
        .mount(&server)
        .await;

    let info = client(&server, &RecordingSleeper::new())
        .user_info("TestBot")
        .await
        .unwrap();

    assert_eq!(info.display_name.as_deref(), Some("Test Bot"));
    assert_eq!(info.follower_count, Some(12));
}
