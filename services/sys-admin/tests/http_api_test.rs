use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use rbac_telemetry::HealthStatus;
use serde_json::{Value, json};
use sys_admin::api::http::{AppState, HealthProbe, router};
use sys_admin::application::RoleAdministrationService;
use sys_admin::infrastructure::persistence::MemoryStore;
use tower::ServiceExt;

struct FixedProbe(bool);

#[async_trait]
impl HealthProbe for FixedProbe {
    async fn probe(&self) -> HealthStatus {
        let mut status = HealthStatus::new();
        let message = (!self.0).then(|| "connection refused".to_string());
        status.add_check("postgres", self.0, message);
        status
    }
}

async fn app_with(healthy: bool) -> Router {
    let store = MemoryStore::seeded().await.unwrap();
    let roles = RoleAdministrationService::new(Arc::new(store.clone()), Arc::new(store.roles()));

    router(AppState {
        roles,
        request_timeout: Duration::from_secs(5),
        health: Arc::new(FixedProbe(healthy)),
        metrics: None,
    })
}

async fn app() -> Router {
    app_with(true).await
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn create(app: &Router, name: &str, code: &str) -> i64 {
    let (_, body) = send(
        app,
        Method::POST,
        "/api/v1/role",
        Some(json!({"name": name, "code": code, "sort": 1})),
    )
    .await;
    assert_eq!(body["code"], 200, "{body}");
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_create_and_get_role() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/role",
        Some(json!({
            "name": "运维",
            "code": "ops",
            "default_router": "/ops",
            "status": 2,
            "remark": "值班",
            "sort": 3
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 200);
    assert_eq!(body["msg"], "ok");
    let id = body["data"]["id"].as_i64().unwrap();

    let (_, body) = send(&app, Method::GET, &format!("/api/v1/role/{id}"), None).await;
    assert_eq!(body["code"], 200);
    assert_eq!(body["data"]["name"], "运维");
    assert_eq!(body["data"]["default_router"], "/ops");
    assert_eq!(body["data"]["status"], 2);
    assert_eq!(body["data"]["sort"], 3);
    assert!(body["data"].get("deleted_at").is_none());
}

#[tokio::test]
async fn test_duplicate_name_uses_business_code() {
    let app = app().await;
    create(&app, "运维", "ops").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/role",
        Some(json!({"name": "运维", "code": "ops-2", "sort": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 3102);
    assert_eq!(body["msg"], "角色名称已存在");
    assert_eq!(body["data"], Value::Null);
}

#[tokio::test]
async fn test_malformed_requests_are_invalid_param() {
    let app = app().await;

    let cases = [
        (Method::POST, "/api/v1/role", Some(json!({"code": "ops", "sort": 1}))),
        (
            Method::POST,
            "/api/v1/role",
            Some(json!({"name": "运维", "code": "ops", "status": 3, "sort": 1})),
        ),
        (
            Method::POST,
            "/api/v1/role",
            Some(json!({"name": "运维", "code": "ops", "sort": -1})),
        ),
        (Method::DELETE, "/api/v1/role", Some(json!({"ids": []}))),
        (Method::GET, "/api/v1/role/abc", None),
        (Method::GET, "/api/v1/role/list?page=1", None),
        (Method::GET, "/api/v1/role/list?page=1&size=5", None),
    ];

    for (method, uri, body) in cases {
        let (status, response) = send(&app, method, uri, body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["code"], 2002, "{uri}: {response}");
    }
}

#[tokio::test]
async fn test_update_and_delete() {
    let app = app().await;
    let id = create(&app, "运维", "ops").await;

    let (_, body) = send(
        &app,
        Method::PUT,
        "/api/v1/role",
        Some(json!({"id": id, "name": "运维", "code": "ops", "sort": 8})),
    )
    .await;
    assert_eq!(body["code"], 200);

    let (_, body) = send(
        &app,
        Method::DELETE,
        "/api/v1/role",
        Some(json!({"ids": [id]})),
    )
    .await;
    assert_eq!(body["code"], 200);

    let (_, body) = send(&app, Method::GET, &format!("/api/v1/role/{id}"), None).await;
    assert_eq!(body["code"], 3101);
}

#[tokio::test]
async fn test_super_admin_cannot_be_deleted() {
    let app = app().await;

    let (_, body) = send(&app, Method::GET, "/api/v1/role/options", None).await;
    let admin = body["data"][0]["id"].as_i64().unwrap();

    let (_, body) = send(
        &app,
        Method::DELETE,
        "/api/v1/role",
        Some(json!({"ids": [admin]})),
    )
    .await;
    assert_eq!(body["code"], 3104);
}

#[tokio::test]
async fn test_list_and_options() {
    let app = app().await;
    create(&app, "财务主管", "finance-lead").await;
    create(&app, "运维", "ops").await;

    let (_, body) = send(
        &app,
        Method::GET,
        "/api/v1/role/list?name=%E8%B4%A2%E5%8A%A1&page=1&size=10",
        None,
    )
    .await;
    assert_eq!(body["code"], 200);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["list"][0]["code"], "finance-lead");

    let (_, body) = send(&app, Method::GET, "/api/v1/role/options", None).await;
    let options = body["data"].as_array().unwrap();
    assert_eq!(options.len(), 3);
    assert_eq!(options[0]["name"], "超级管理员");
    assert!(options[0].get("code").is_none());
}

#[tokio::test]
async fn test_health_reports_dependency_state() {
    let (status, body) = send(&app().await, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["healthy"], true);

    let (status, body) = send(&app_with(false).await, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], 503);
    assert_eq!(body["detail"], "Service unavailable: Unhealthy: postgres");
}

#[tokio::test]
async fn test_unknown_route_is_problem_details() {
    let (status, body) = send(&app().await, Method::GET, "/api/v1/menu", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}
