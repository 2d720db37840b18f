//! 统一响应信封

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::RoleError;

/// 成功码
pub const CODE_OK: i32 = 200;

/// 统一响应
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub data: Option<T>,
    pub msg: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: CODE_OK,
            data: Some(data),
            msg: "ok".to_string(),
        }
    }
}

impl ApiResponse<()> {
    /// 无数据的成功响应
    pub fn done() -> Self {
        Self {
            code: CODE_OK,
            data: None,
            msg: "ok".to_string(),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// 业务错误响应
#[derive(Debug)]
pub struct ApiError(pub RoleError);

impl ApiError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self(RoleError::invalid(msg))
    }

    pub fn code(&self) -> i32 {
        match &self.0 {
            RoleError::InvalidParam(_) => 2002,
            RoleError::Timeout | RoleError::Canceled => 2006,
            RoleError::NotFound => 3101,
            RoleError::NameExists => 3102,
            RoleError::CodeExists => 3103,
            RoleError::SuperAdminProtected => 3104,
            RoleError::ServerError => 5001,
        }
    }

    pub fn message(&self) -> String {
        match &self.0 {
            RoleError::InvalidParam(detail) => format!("无效的参数: {}", detail),
            RoleError::Timeout => "请求超时".to_string(),
            RoleError::Canceled => "请求已取消".to_string(),
            RoleError::NotFound => "角色不存在".to_string(),
            RoleError::NameExists => "角色名称已存在".to_string(),
            RoleError::CodeExists => "角色编码已存在".to_string(),
            RoleError::SuperAdminProtected => "超级管理员不允许删除或修改编码".to_string(),
            RoleError::ServerError => "系统错误".to_string(),
        }
    }
}

impl From<RoleError> for ApiError {
    fn from(e: RoleError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        ApiResponse::<()> {
            code: self.code(),
            data: None,
            msg: self.message(),
        }
        .into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;
