use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, response::IntoResponse};
use serde_json::{Value, json};

use knowledge_feed::api::{
    ApiClient, ApiError, AuthProvider, ProfileRequest, StaticToken, SyncRequest,
};

/// What the fake backend saw of each request.
#[derive(Clone, Debug, Default)]
struct Seen {
    authorization: Option<String>,
    query: HashMap<String, String>,
    body: Option<Value>,
}

type Log = Arc<Mutex<Vec<Seen>>>;

fn record(log: &Log, headers: &HeaderMap, query: HashMap<String, String>, body: Option<Value>) {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    log.lock().unwrap().push(Seen {
        authorization,
        query,
        body,
    });
}

async fn nodes(
    State(log): State<Log>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    record(&log, &headers, query, None);
    Json(json!({
        "nodes": [
            { "id": "AI", "label": "AI", "x": 10.0, "y": -4.0, "size": 60, "tone": "accent", "posts": null },
            { "id": "rust", "posts": [{ "id": "p1", "type": "image", "mediaUrl": "https://img/1.png", "timestamp": 1700000000 }] }
        ],
        "edges": [{ "from": "AI", "to": "rust" }]
    }))
}

async fn rejected(State(log): State<Log>, headers: HeaderMap) -> impl IntoResponse {
    record(&log, &headers, HashMap::new(), None);
    StatusCode::UNAUTHORIZED
}

async fn unavailable() -> impl IntoResponse {
    StatusCode::SERVICE_UNAVAILABLE
}

async fn sync(State(log): State<Log>, headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    record(&log, &headers, HashMap::new(), Some(body));
    StatusCode::OK
}

async fn profile(
    State(log): State<Log>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    record(&log, &headers, query, None);
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    match authorization {
        "Bearer expired" => StatusCode::UNAUTHORIZED.into_response(),
        "Bearer boom" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => Json(json!({ "name": "Ada", "handle": "ada" })).into_response(),
    }
}

async fn spawn_backend() -> (String, Log) {
    let log = Log::default();
    let app = Router::new()
        .route("/api/get_nodes_and_posts", get(nodes))
        .route("/api/twitter/sync/status", get(rejected))
        .route("/api/twitter/link", get(unavailable))
        .route("/api/twitter/sync", post(sync))
        .route("/api/user/profile", get(profile))
        .with_state(Arc::clone(&log));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/api"), log)
}

fn client(base_url: &str, token: Option<&str>) -> (ApiClient, Arc<StaticToken>) {
    let auth = Arc::new(StaticToken::new(token.map(str::to_owned)));
    let client = ApiClient::new(base_url, auth.clone()).unwrap();
    (client, auth)
}

#[tokio::test]
async fn nodes_request_carries_token_and_limit() {
    knowledge_feed::init_test_tracing();
    let (base_url, log) = spawn_backend().await;
    let (client, _) = client(&base_url, Some("secret"));

    let snapshot = client.get_nodes_and_posts(Some(20)).await.unwrap();

    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.authorization.as_deref(), Some("Bearer secret"));
    assert_eq!(seen.query.get("limit").map(String::as_str), Some("20"));

    assert_eq!(snapshot.nodes.len(), 2);
    assert!(snapshot.nodes[0].posts.is_empty());
    assert_eq!(snapshot.nodes[1].display_label(), "rust");
    let post = &snapshot.nodes[1].posts[0];
    assert_eq!(post.media.thumbnail(), Some("https://img/1.png"));
    assert_eq!(post.resolved_timestamp(), Some(1_700_000_000_000.0));
    assert_eq!(snapshot.edges[0].strength, 1);
}

#[tokio::test]
async fn nodes_request_without_limit_has_no_query() {
    let (base_url, log) = spawn_backend().await;
    let (client, _) = client(&base_url, None);

    client.get_nodes_and_posts(None).await.unwrap();

    let seen = log.lock().unwrap()[0].clone();
    assert!(seen.authorization.is_none());
    assert!(seen.query.is_empty());
}

#[tokio::test]
async fn unauthorized_response_drops_the_token() {
    let (base_url, _log) = spawn_backend().await;
    let (client, auth) = client(&base_url, Some("stale"));

    let error = client.get_twitter_sync_status(None).await.unwrap_err();

    assert!(error.is_unauthorized());
    assert_eq!(error.status(), Some(reqwest::StatusCode::UNAUTHORIZED));
    assert!(auth.token().is_none());
}

#[tokio::test]
async fn server_errors_surface_their_status() {
    let (base_url, _log) = spawn_backend().await;
    let (client, auth) = client(&base_url, Some("token"));

    let error = client.get_twitter_link(None).await.unwrap_err();

    assert!(matches!(error, ApiError::Status { status } if status == reqwest::StatusCode::SERVICE_UNAVAILABLE));
    assert!(!error.is_unauthorized());
    assert_eq!(auth.token().as_deref(), Some("token"));
}

#[tokio::test]
async fn empty_sync_body_decodes_as_empty_object() {
    let (base_url, log) = spawn_backend().await;
    let (client, _) = client(&base_url, Some("token"));

    let request = SyncRequest {
        user_id: Some("u1".to_owned()),
        limit: Some(50),
        force: Some(true),
    };
    let response = client.sync_twitter(&request).await.unwrap();
    assert!(response.is_empty());

    // A session token replaces the user id.
    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.body, Some(json!({ "limit": 50, "force": true })));
}

#[tokio::test]
async fn anonymous_profile_request_names_the_user() {
    let (base_url, log) = spawn_backend().await;
    let (client, _) = client(&base_url, None);

    let profile = client
        .get_user_profile(&ProfileRequest {
            user_id: Some("u1".to_owned()),
            refresh: true,
        })
        .await
        .unwrap();
    assert!(profile.has_identity());
    assert_eq!(profile.handle.as_deref(), Some("ada"));

    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.query.get("user_id").map(String::as_str), Some("u1"));
    assert_eq!(seen.query.get("refresh").map(String::as_str), Some("true"));
}

#[tokio::test]
async fn session_tokens_are_validated_against_the_profile() {
    let (base_url, _log) = spawn_backend().await;
    let (client, _) = client(&base_url, None);

    assert!(client.validate_session_token("good").await.unwrap());
    assert!(!client.validate_session_token("expired").await.unwrap());
    assert!(matches!(
        client.validate_session_token("boom").await,
        Err(ApiError::Status { status }) if status == reqwest::StatusCode::INTERNAL_SERVER_ERROR
    ));
}
