//! 角色接口处理器

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use rbac_common::{Page, RequestContext};
use rbac_errors::AppError;

use super::dto::{
    CreateRoleRequest, CreateRoleResponse, DeleteRolesRequest, ListRolesParams, UpdateRoleRequest,
};
use super::response::{ApiError, ApiResponse, ApiResult};
use super::routes::AppState;
use crate::domain::role::{Role, RoleId, RoleOption};

fn context(state: &AppState) -> RequestContext {
    RequestContext::new().with_timeout(state.request_timeout)
}

pub async fn create_role(
    State(state): State<AppState>,
    payload: Result<Json<CreateRoleRequest>, JsonRejection>,
) -> ApiResult<CreateRoleResponse> {
    let Json(req) = payload.map_err(|e| ApiError::invalid(e.body_text()))?;

    let role = state.roles.create_role(&context(&state), req.into()).await?;
    Ok(ApiResponse::ok(CreateRoleResponse { id: role.id }))
}

pub async fn update_role(
    State(state): State<AppState>,
    payload: Result<Json<UpdateRoleRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(req) = payload.map_err(|e| ApiError::invalid(e.body_text()))?;

    state.roles.update_role(&context(&state), req.into()).await?;
    Ok(ApiResponse::done())
}

pub async fn delete_roles(
    State(state): State<AppState>,
    payload: Result<Json<DeleteRolesRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(req) = payload.map_err(|e| ApiError::invalid(e.body_text()))?;

    state.roles.delete_roles(&context(&state), req.into()).await?;
    Ok(ApiResponse::done())
}

pub async fn get_role(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Role> {
    let Path(id) = id.map_err(|e| ApiError::invalid(e.body_text()))?;

    let role = state.roles.get_role(&context(&state), RoleId(id)).await?;
    Ok(ApiResponse::ok(role))
}

pub async fn list_roles(
    State(state): State<AppState>,
    params: Result<Query<ListRolesParams>, QueryRejection>,
) -> ApiResult<Page<Role>> {
    let Query(params) = params.map_err(|e| ApiError::invalid(e.body_text()))?;

    let page = state.roles.list_roles(&context(&state), params.into()).await?;
    Ok(ApiResponse::ok(page))
}

pub async fn list_active_options(State(state): State<AppState>) -> ApiResult<Vec<RoleOption>> {
    let options = state.roles.list_active_options(&context(&state)).await?;
    Ok(ApiResponse::ok(options))
}

/// 以 RFC 7807 格式输出基础设施错误
fn problem(err: AppError) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "application/problem+json")],
        Json(err.to_problem_details()),
    )
        .into_response()
}

pub async fn health(State(state): State<AppState>) -> Response {
    let status = state.health.probe().await;
    if status.healthy {
        return Json(status).into_response();
    }

    let failed: Vec<String> = status
        .checks
        .iter()
        .filter(|check| !check.healthy)
        .map(|check| check.name.clone())
        .collect();
    problem(AppError::unavailable(format!("Unhealthy: {}", failed.join(", "))))
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => problem(AppError::not_found("Metrics recorder not installed")),
    }
}

pub async fn fallback() -> Response {
    problem(AppError::not_found("Route not found"))
}
