//! 路由装配

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::health::HealthProbe;
use crate::application::RoleAdministrationService;

/// 处理器共享状态
#[derive(Clone)]
pub struct AppState {
    pub roles: RoleAdministrationService,
    /// 每个请求上下文的截止时间
    pub request_timeout: Duration,
    pub health: Arc<dyn HealthProbe>,
    pub metrics: Option<PrometheusHandle>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/v1/role",
            post(handlers::create_role)
                .put(handlers::update_role)
                .delete(handlers::delete_roles),
        )
        .route("/api/v1/role/list", get(handlers::list_roles))
        .route("/api/v1/role/options", get(handlers::list_active_options))
        .route("/api/v1/role/{id}", get(handlers::get_role))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .fallback(handlers::fallback)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
