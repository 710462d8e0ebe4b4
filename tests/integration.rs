use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use pickup_dispatch::api::rest::router;
use pickup_dispatch::engine::matching::MatchingSettings;
use pickup_dispatch::state::AppState;
use pickup_dispatch::store::memory::InMemoryStore;
use serde_json::{json, Value};
use tower::ServiceExt;

fn setup() -> axum::Router {
    let state = AppState::new(
        Arc::new(InMemoryStore::new()),
        MatchingSettings::default(),
        1024,
    );
    router(Arc::new(state))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn register_worker(app: &axum::Router, name: &str) -> String {
    let res = app
        .clone()
        .oneshot(json_request("POST", "/workers", json!({ "name": name })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await["id"].as_str().unwrap().to_string()
}

async fn create_pickup(app: &axum::Router, lat: f64, lng: f64, items: Value) -> String {
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/requests",
            json!({
                "requester_id": "00000000-0000-0000-0000-0000000000aa",
                "items": items,
                "location": { "lat": lat, "lng": lng },
                "address": "Unter den Linden 1"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_returns_ok() {
    let app = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["workers"], 0);
    assert_eq!(body["requests"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let app = setup();
    let worker_id = register_worker(&app, "Metrics Mia").await;
    let missing = "00000000-0000-0000-0000-000000000000";
    app.clone()
        .oneshot(post_empty(&format!("/workers/{worker_id}/claims/{missing}")))
        .await
        .unwrap();
    create_pickup(&app, 52.52, 13.405, json!([])).await;
    let claimed = create_pickup(&app, 52.52, 13.405, json!([])).await;
    app.clone()
        .oneshot(post_empty(&format!("/workers/{worker_id}/claims/{claimed}")))
        .await
        .unwrap();

    let response = app.oneshot(get_request("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("claims_total"));
    assert!(body.contains("RequestNotFound"));
    assert!(body.contains("# TYPE open_requests gauge"));
    assert!(body.lines().any(|line| line == "open_requests 1"));
}

#[tokio::test]
async fn register_worker_empty_name_returns_400() {
    let app = setup();
    let response = app
        .oneshot(json_request("POST", "/workers", json!({ "name": "  " })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn availability_update_validates_status() {
    let app = setup();
    let worker_id = register_worker(&app, "Eve").await;

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/workers/{worker_id}/availability"),
            json!({ "status": "online" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["availability"], "Online");

    let res = app
        .oneshot(json_request(
            "PATCH",
            &format!("/workers/{worker_id}/availability"),
            json!({ "status": "napping" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["kind"], "InvalidAvailability");
}

#[tokio::test]
async fn nearby_rejects_non_finite_coordinates() {
    let app = setup();
    let worker_id = register_worker(&app, "Nan").await;

    let res = app
        .oneshot(get_request(&format!(
            "/workers/{worker_id}/nearby?lat=NaN&lng=13.4"
        )))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["kind"], "InvalidCoordinates");
}

#[tokio::test]
async fn get_nonexistent_request_returns_404() {
    let app = setup();
    let fake_id = "00000000-0000-0000-0000-000000000000";
    let response = app
        .oneshot(get_request(&format!("/requests/{fake_id}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["kind"], "RequestNotFound");
}

#[tokio::test]
async fn create_request_returns_unclaimed_pending() {
    let app = setup();
    let id = create_pickup(&app, 52.51, 13.39, json!([])).await;

    let res = app
        .oneshot(get_request(&format!("/requests/{id}")))
        .await
        .unwrap();
    let body = body_json(res).await;

    assert_eq!(body["status"], "Pending");
    assert!(body["collector_id"].is_null());
    assert_eq!(body["priority"], "Normal");
}

#[tokio::test]
async fn full_pickup_flow() {
    let app = setup();
    let worker_id = register_worker(&app, "Dispatch Dan").await;
    let rival_id = register_worker(&app, "Rival Rita").await;

    let near_id = create_pickup(
        &app,
        52.521,
        13.405,
        json!([{ "type": "plastic", "weight": 5.5 }, { "type": "paper", "weight": 3.2 }]),
    )
    .await;
    let far_id = create_pickup(
        &app,
        52.55,
        13.405,
        json!({ "bag": { "materialType": "Glass", "weight": "2.1" } }),
    )
    .await;
    let _out_of_range = create_pickup(&app, 53.5, 10.0, json!([])).await;

    let res = app
        .clone()
        .oneshot(get_request(&format!(
            "/workers/{worker_id}/nearby?lat=52.52&lng=13.405"
        )))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let work = body_json(res).await;
    let nearby = work["nearby"].as_array().unwrap();
    assert_eq!(nearby.len(), 2);
    assert_eq!(nearby[0]["request_id"], near_id);
    assert_eq!(nearby[0]["primary_item"], "plastic");
    assert_eq!(nearby[0]["total_weight"], 8.7);
    assert_eq!(nearby[0]["distance_label"], "0.1 km");
    assert_eq!(nearby[0]["address"], "Unter den Linden 1");
    assert_eq!(nearby[1]["request_id"], far_id);
    assert!(work["active"].as_array().unwrap().is_empty());

    let res = app
        .clone()
        .oneshot(post_empty(&format!("/workers/{worker_id}/claims/{near_id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["collector_id"], worker_id);

    let res = app
        .clone()
        .oneshot(post_empty(&format!("/workers/{rival_id}/claims/{near_id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(res).await["kind"], "RequestAlreadyClaimed");

    let res = app
        .clone()
        .oneshot(post_empty(&format!(
            "/workers/{rival_id}/completions/{near_id}"
        )))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app
        .clone()
        .oneshot(get_request(&format!(
            "/workers/{worker_id}/nearby?lat=52.52&lng=13.405"
        )))
        .await
        .unwrap();
    let work = body_json(res).await;
    assert_eq!(work["nearby"].as_array().unwrap().len(), 1);
    assert_eq!(work["active"][0]["request_id"], near_id);

    let res = app
        .clone()
        .oneshot(post_empty(&format!(
            "/workers/{worker_id}/completions/{near_id}"
        )))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let completed = body_json(res).await;
    assert_eq!(completed["status"], "Completed");
    assert!(completed["completed_at"].is_string());

    let res = app
        .clone()
        .oneshot(post_empty(&format!(
            "/workers/{worker_id}/completions/{near_id}"
        )))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["completed_at"], completed["completed_at"]);

    let res = app
        .clone()
        .oneshot(get_request(&format!("/workers/{worker_id}/stats")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let stats = body_json(res).await;
    assert_eq!(stats["completed_lifetime"], 1);
    assert_eq!(stats["completed_today"], 1);
    assert_eq!(stats["collected"]["by_material"]["plastic"], 5.5);
    assert_eq!(stats["collected"]["total"], 8.7);

    let res = app
        .oneshot(get_request("/requests/stats/materials"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let report = body_json(res).await;
    assert_eq!(report["by_material"]["glass"], 2.1);
    assert_eq!(report["by_material"]["metal"], 0.0);
    assert_eq!(report["total"], 10.8);
}

#[tokio::test]
async fn canceled_request_cannot_be_claimed() {
    let app = setup();
    let worker_id = register_worker(&app, "Late Larry").await;
    let id = create_pickup(&app, 52.52, 13.405, json!([])).await;

    let res = app
        .clone()
        .oneshot(post_empty(&format!("/requests/{id}/cancel")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "Canceled");

    let res = app
        .oneshot(post_empty(&format!("/workers/{worker_id}/claims/{id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(res).await["kind"], "RequestClosed");
}
