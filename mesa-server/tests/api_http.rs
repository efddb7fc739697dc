//! HTTP API 集成测试
//!
//! 通过 `build_app` 直接驱动路由器 (tower oneshot)，不开监听端口。
//! 覆盖完整预订流程与错误信封 (code/message/data)。

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use mesa_server::api::build_app;
use mesa_server::core::Config;
use mesa_server::db::DbService;
use mesa_server::ServerState;
use serde_json::{Value, json};
use shared::models::{OpenInterval, OperatingSchedule};
use tower::ServiceExt;

const DAY: &str = "2031-05-09";

fn test_config() -> Config {
    Config {
        work_dir: String::new(),
        http_port: 0,
        timezone: chrono_tz::Europe::Madrid,
        environment: "test".into(),
        slot_granularity_minutes: 30,
        max_alternative_slots: 3,
        lock_wait_ms: 3000,
        duration_small_minutes: 90,
        duration_large_minutes: 120,
        large_party_threshold: 4,
    }
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request")
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

/// 装配应用并通过 API 种入: 1 区域 + 1 张 4 人桌, 每天 12:00-23:30 营业
async fn seeded_app() -> Router {
    let config = test_config();
    let db = DbService::in_memory().expect("db");
    let state = ServerState::initialize_with_db(&config, db).expect("state");
    let app = build_app(state);

    let (status, zone) = send(
        &app,
        request("POST", "/api/zones", Some(json!({"name": "Main", "description": null}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let zone_id = zone["id"].as_i64().expect("zone id");

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/tables",
            Some(json!({"name": "T1", "zone_id": zone_id, "capacity": 4})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let schedule = serde_json::to_value(OperatingSchedule::uniform(vec![OpenInterval::new(
        "12:00", "23:30",
    )]))
    .expect("schedule json");
    let (status, _) = send(&app, request("PUT", "/api/schedule", Some(schedule))).await;
    assert_eq!(status, StatusCode::OK);

    app
}

fn booking_body(time: &str) -> Value {
    json!({
        "customer": {"name": "Nuria Bosch", "phone": "+34611222333"},
        "party_size": 2,
        "date": DAY,
        "time": time,
        "source": "ONLINE"
    })
}

#[tokio::test]
async fn health_reports_ok() {
    let app = seeded_app().await;
    let (status, body) = send(&app, request("GET", "/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn full_booking_flow_over_http() {
    let app = seeded_app().await;

    // 准入
    let (status, created) = send(
        &app,
        request("POST", "/api/reservations", Some(booking_body("20:00"))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "PENDING");
    assert_eq!(created["party_size"], 2);
    let number = created["reservation_number"].as_str().expect("number");
    assert!(number.starts_with("RSV203105090"), "got {number}");
    let id = created["id"].as_i64().expect("id");

    // 单条查询
    let (status, fetched) = send(
        &app,
        request("GET", &format!("/api/reservations/{id}"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], created["id"]);

    // 确认
    let (status, confirmed) = send(
        &app,
        request(
            "PATCH",
            &format!("/api/reservations/{id}/status"),
            Some(json!({"event": "CONFIRM"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "CONFIRMED");

    // 改期到空闲时段
    let (status, moved) = send(
        &app,
        request(
            "POST",
            &format!("/api/reservations/{id}/reschedule"),
            Some(json!({"date": DAY, "time": "22:00"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["status"], "CONFIRMED");

    // 取消并检查审计事件流: CREATED, CONFIRMED, RESCHEDULED, CANCELLED
    let (status, cancelled) = send(
        &app,
        request(
            "DELETE",
            &format!("/api/reservations/{id}"),
            Some(json!({"reason": "change of plans"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "CANCELLED");

    let (status, events) = send(
        &app,
        request("GET", &format!("/api/reservations/{id}/events"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let events = events.as_array().expect("events array");
    assert_eq!(events.len(), 4);

    // 当日列表包含该预订 (取消后仍可见)
    let (status, listed) = send(
        &app,
        request("GET", &format!("/api/reservations?date={DAY}"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().expect("list").len(), 1);
}

#[tokio::test]
async fn full_slot_returns_conflict_envelope() {
    let app = seeded_app().await;

    let (status, _) = send(
        &app,
        request("POST", "/api/reservations", Some(booking_body("20:00"))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // 唯一一张桌已被占, 重叠时段必拒
    let (status, body) = send(
        &app,
        request("POST", "/api/reservations", Some(booking_body("20:30"))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "E4101");
    let alternatives = body["data"]["alternative_slots"]
        .as_array()
        .expect("alternatives");
    assert!(!alternatives.is_empty());
    for slot in alternatives {
        assert!(slot["time"].is_string());
        assert!(slot["timestamp_millis"].is_i64());
    }
}

#[tokio::test]
async fn availability_tracks_bookings() {
    let app = seeded_app().await;

    let uri = format!("/api/availability?date={DAY}&time=20:00&party_size=2");
    let (status, before) = send(&app, request("GET", &uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(before["available"], true);

    send(
        &app,
        request("POST", "/api/reservations", Some(booking_body("20:00"))),
    )
    .await;

    let (status, after) = send(&app, request("GET", &uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["available"], false);

    // 时段列表不再含 20:00 前后 90 分钟内的起点
    let slots_uri = format!("/api/availability/slots?date={DAY}&party_size=2");
    let (status, slots) = send(&app, request("GET", &slots_uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    let times: Vec<&str> = slots
        .as_array()
        .expect("slots")
        .iter()
        .filter_map(|s| s["time"].as_str())
        .collect();
    assert!(!times.contains(&"20:00"));
    assert!(!times.contains(&"19:00"));
    assert!(times.contains(&"18:30"));
    assert!(times.contains(&"21:30"));
}

#[tokio::test]
async fn unknown_reservation_is_a_not_found_envelope() {
    let app = seeded_app().await;
    let (status, body) = send(&app, request("GET", "/api/reservations/424242", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "E0003");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn malformed_date_is_rejected() {
    let app = seeded_app().await;
    let (status, body) = send(
        &app,
        request("GET", "/api/reservations?date=09-05-2031", None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0002");
}

#[tokio::test]
async fn illegal_transition_is_unprocessable() {
    let app = seeded_app().await;

    let (_, created) = send(
        &app,
        request("POST", "/api/reservations", Some(booking_body("20:00"))),
    )
    .await;
    let id = created["id"].as_i64().expect("id");

    // PENDING 不可直接 COMPLETE
    let (status, body) = send(
        &app,
        request(
            "PATCH",
            &format!("/api/reservations/{id}/status"),
            Some(json!({"event": "COMPLETE"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "E4102");
}
