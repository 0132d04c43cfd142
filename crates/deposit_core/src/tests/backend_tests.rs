use super::*;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use shared::domain::RecordId;
use tokio::{net::TcpListener, sync::Mutex};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Seen {
    route: &'static str,
    authorization: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct BackendState {
    base: String,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl BackendState {
    async fn remember(&self, route: &'static str, headers: &HeaderMap, body: Value) {
        let authorization = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        self.seen.lock().await.push(Seen {
            route,
            authorization,
            body,
        });
    }
}

fn draft_body(base: &str, id: &str) -> Value {
    json!({
        "id": id,
        "links": {
            "self": format!("{base}/api/records/{id}/draft"),
            "self_html": format!("{base}/uploads/{id}"),
            "publish": format!("{base}/api/records/{id}/draft/actions/publish"),
            "review": format!("{base}/api/records/{id}/draft/review"),
            "submit-review": format!("{base}/api/records/{id}/draft/actions/submit-review"),
            "reserve_doi": format!("{base}/api/records/{id}/draft/pids/doi")
        },
        "metadata": {"title": "Ocean samples"},
        "files": {"enabled": true},
        "access": {"record": "public", "files": "public"}
    })
}

async fn create_draft(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.remember("create", &headers, body).await;
    let mut draft = draft_body(&state.base, "abcd-1234");
    draft["errors"] = json!([
        {"field": "metadata.creators", "messages": ["Missing data for required field."]}
    ]);
    (StatusCode::CREATED, Json(draft))
}

async fn update_draft(
    State(state): State<BackendState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.remember("update", &headers, body).await;
    Json(draft_body(&state.base, &id))
}

async fn read_draft(
    State(state): State<BackendState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Json<Value> {
    state.remember("read", &headers, Value::Null).await;
    Json(draft_body(&state.base, &id))
}

async fn delete_draft(State(state): State<BackendState>, headers: HeaderMap) -> StatusCode {
    state.remember("delete", &headers, Value::Null).await;
    StatusCode::NO_CONTENT
}

async fn publish_draft(
    State(state): State<BackendState>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.remember("publish", &headers, Value::Null).await;
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "status": 400,
            "message": "A validation error occurred.",
            "errors": [{"field": "metadata.title", "messages": ["Missing data for required field."]}]
        })),
    )
}

async fn submit_review(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.remember("submit_review", &headers, body).await;
    Json(json!({"id": "req-42", "links": {"self_html": format!("{}/me/requests/req-42", state.base)}}))
}

async fn put_review(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    state.remember("put_review", &headers, body).await;
    StatusCode::OK
}

async fn delete_review(State(state): State<BackendState>, headers: HeaderMap) -> StatusCode {
    state.remember("delete_review", &headers, Value::Null).await;
    StatusCode::NO_CONTENT
}

async fn reserve_doi(
    State(state): State<BackendState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Json<Value> {
    state.remember("reserve_doi", &headers, Value::Null).await;
    let mut draft = draft_body(&state.base, &id);
    draft["pids"] = json!({"doi": {"identifier": format!("10.1234/{id}"), "provider": "datacite"}});
    Json(draft)
}

async fn discard_doi(
    State(state): State<BackendState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Json<Value> {
    state.remember("discard_doi", &headers, Value::Null).await;
    Json(draft_body(&state.base, &id))
}

async fn spawn_backend() -> (String, Arc<Mutex<Vec<Seen>>>) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let base = format!("http://{addr}");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let state = BackendState {
        base: base.clone(),
        seen: seen.clone(),
    };
    let app = Router::new()
        .route("/api/records", post(create_draft))
        .route(
            "/api/records/:id/draft",
            put(update_draft).get(read_draft).delete(delete_draft),
        )
        .route("/api/records/:id/draft/actions/publish", post(publish_draft))
        .route(
            "/api/records/:id/draft/actions/submit-review",
            post(submit_review),
        )
        .route(
            "/api/records/:id/draft/review",
            put(put_review).delete(delete_review),
        )
        .route(
            "/api/records/:id/draft/pids/doi",
            post(reserve_doi).delete(discard_doi),
        )
        .route("/health", get(|| async { "ok" }))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (base, seen)
}

async fn routes(seen: &Arc<Mutex<Vec<Seen>>>) -> Vec<&'static str> {
    seen.lock().await.iter().map(|seen| seen.route).collect()
}

#[tokio::test]
async fn create_posts_to_records_and_splits_validation_errors() {
    let (base, seen) = spawn_backend().await;
    let api = RestDepositApi::new(format!("{base}/api/"));

    let response = api.save(&Draft::default()).await.expect("create draft");

    assert_eq!(response.data.id, Some(RecordId::new("abcd-1234")));
    assert_eq!(
        response.data.links.self_html(),
        Some(format!("{base}/uploads/abcd-1234").as_str())
    );
    assert!(response.has_validation_errors());
    assert!(response.errors.lookup("metadata.creators").is_some());
    assert!(response.data.extra.get("errors").is_none());

    let seen = seen.lock().await;
    assert_eq!(seen[0].route, "create");
    assert!(seen[0].body.get("id").is_none());
}

#[tokio::test]
async fn update_puts_to_self_link_with_bearer_token() {
    let (base, seen) = spawn_backend().await;
    let api = RestDepositApi::with_options(
        format!("{base}/api"),
        Some("secret-token".to_string()),
        Duration::from_secs(5),
    )
    .expect("client");
    let draft: Draft =
        serde_json::from_value(draft_body(&base, "abcd-1234")).expect("draft fixture");

    let response = api.save(&draft).await.expect("update draft");

    assert!(!response.has_validation_errors());
    let seen = seen.lock().await;
    assert_eq!(seen[0].route, "update");
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer secret-token"));
    assert_eq!(seen[0].body["metadata"]["title"], json!("Ocean samples"));
}

#[tokio::test]
async fn publish_rejection_carries_status_and_field_errors() {
    let (base, _seen) = spawn_backend().await;
    let api = RestDepositApi::new(format!("{base}/api"));
    let draft: Draft =
        serde_json::from_value(draft_body(&base, "abcd-1234")).expect("draft fixture");

    let err = api
        .publish(&draft.links)
        .await
        .expect_err("publish rejected");

    assert_eq!(err.status, Some(400));
    assert_eq!(err.code, ErrorCode::Validation);
    assert_eq!(err.message, "A validation error occurred.");
    assert!(err.errors.lookup("metadata.title").is_some());
}

#[tokio::test]
async fn review_request_names_the_receiving_community() {
    let (base, seen) = spawn_backend().await;
    let api = RestDepositApi::new(format!("{base}/api"));
    let draft: Draft =
        serde_json::from_value(draft_body(&base, "abcd-1234")).expect("draft fixture");
    let community = CommunityId(Uuid::parse_str("7a1c5a6e-2d2f-4b77-9a4c-5e2c9e7a1b11").expect("uuid"));

    api.create_or_update_review(&draft.links, community)
        .await
        .expect("put review");
    api.delete_review(&draft.links).await.expect("delete review");

    let seen = seen.lock().await;
    assert_eq!(
        seen[0].body,
        json!({
            "receiver": {"community": "7a1c5a6e-2d2f-4b77-9a4c-5e2c9e7a1b11"},
            "type": "community-submission"
        })
    );
    assert_eq!(seen[1].route, "delete_review");
}

#[tokio::test]
async fn pid_reservation_uses_the_scheme_link() {
    let (base, seen) = spawn_backend().await;
    let api = RestDepositApi::new(format!("{base}/api"));
    let draft: Draft =
        serde_json::from_value(draft_body(&base, "abcd-1234")).expect("draft fixture");

    let reserved = api.reserve_pid(&draft.links, "doi").await.expect("reserve");
    assert_eq!(reserved.data.pids["doi"].identifier, "10.1234/abcd-1234");

    api.discard_pid(&draft.links, "doi").await.expect("discard");
    assert_eq!(routes(&seen).await, vec!["reserve_doi", "discard_doi"]);
}

#[tokio::test]
async fn read_delete_and_submit_follow_draft_links() {
    let (base, seen) = spawn_backend().await;
    let api = RestDepositApi::new(format!("{base}/api"));
    let draft: Draft =
        serde_json::from_value(draft_body(&base, "abcd-1234")).expect("draft fixture");

    api.read(&draft.links).await.expect("read");
    let request = api.submit_review(&draft.links).await.expect("submit");
    api.delete(&draft.links).await.expect("delete");

    assert_eq!(request.data.id, RequestId::new("req-42"));
    assert_eq!(routes(&seen).await, vec!["read", "submit_review", "delete"]);
}

#[tokio::test]
async fn missing_link_fails_without_a_request() {
    let (base, seen) = spawn_backend().await;
    let api = RestDepositApi::new(format!("{base}/api"));

    let err = api
        .reserve_pid(&Links::default(), "oai")
        .await
        .expect_err("no link");

    assert_eq!(err.status, None);
    assert!(err.message.contains("reserve_oai"));
    assert!(routes(&seen).await.is_empty());
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let api = RestDepositApi::new(format!("http://{addr}/api"));
    let err = api.save(&Draft::default()).await.expect_err("unreachable");

    assert_eq!(err.code, ErrorCode::Transport);
    assert!(err.errors.is_empty());
}

#[tokio::test]
async fn each_action_looks_up_its_own_relation() {
    let (base, seen) = spawn_backend().await;
    let api = RestDepositApi::new(format!("{base}/api"));
    let only_self: Links = [("self", format!("{base}/api/records/abcd-1234/draft"))]
        .into_iter()
        .collect();

    let publish = api.publish(&only_self).await.expect_err("no publish link");
    let submit = api.submit_review(&only_self).await.expect_err("no submit link");
    let review = api.delete_review(&only_self).await.expect_err("no review link");

    assert!(publish.message.contains("`publish`"));
    assert!(submit.message.contains("`submit-review`"));
    assert!(review.message.contains("`review`"));
    assert!(routes(&seen).await.is_empty());

    api.read(&only_self).await.expect("self link is enough to read");
    assert_eq!(routes(&seen).await, vec!["read"]);
}
