//! rbac-errors - 统一错误处理
//!
//! 基础设施层统一使用 [`AppError`]，对外输出基于 RFC 7807 Problem Details 规范

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用错误类型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// 唯一约束冲突，携带约束（索引）名称
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn unique_violation(constraint: impl Into<String>) -> Self {
        Self::UniqueViolation(constraint.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// 违反的唯一约束名称（仅 `UniqueViolation`）
    pub fn violated_constraint(&self) -> Option<&str> {
        match self {
            Self::UniqueViolation(constraint) => Some(constraint),
            _ => None,
        }
    }

    /// 转换为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Conflict(_) | Self::UniqueViolation(_) => 409,
            Self::Internal(_) | Self::Database(_) => 500,
            Self::Unavailable(_) => 503,
        }
    }

    /// 转换为 Problem Details
    ///
    /// 基础设施类错误不向外暴露原始信息
    pub fn to_problem_details(&self) -> ProblemDetails {
        let detail = match self {
            Self::Internal(_) | Self::Database(_) => self.problem_title().to_string(),
            _ => self.to_string(),
        };

        ProblemDetails {
            r#type: format!("/problems/{}", self.problem_slug()),
            title: self.problem_title().to_string(),
            status: self.status_code(),
            detail,
            instance: None,
        }
    }

    fn problem_slug(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not-found",
            Self::Validation(_) => "validation",
            Self::Conflict(_) | Self::UniqueViolation(_) => "conflict",
            Self::Internal(_) => "internal",
            Self::Database(_) => "database",
            Self::Unavailable(_) => "unavailable",
        }
    }

    fn problem_title(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "Resource Not Found",
            Self::Validation(_) => "Validation Error",
            Self::Conflict(_) | Self::UniqueViolation(_) => "Conflict",
            Self::Internal(_) => "Internal Server Error",
            Self::Database(_) => "Database Error",
            Self::Unavailable(_) => "Service Unavailable",
        }
    }
}

/// RFC 7807 Problem Details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_carries_constraint() {
        let err = AppError::unique_violation("uk_sys_role_name");
        assert_eq!(err.violated_constraint(), Some("uk_sys_role_name"));
        assert_eq!(err.status_code(), 409);
        assert_eq!(AppError::internal("x").violated_constraint(), None);
    }

    #[test]
    fn test_problem_details_hides_database_cause() {
        let err = AppError::database("relation \"sys_role\" does not exist");
        let problem = err.to_problem_details();

        assert_eq!(problem.status, 500);
        assert_eq!(problem.r#type, "/problems/database");
        assert!(!problem.detail.contains("sys_role"));
    }

    #[test]
    fn test_problem_details_serialization_skips_instance() {
        let json = serde_json::to_value(AppError::unavailable("db down").to_problem_details())
            .unwrap();

        assert_eq!(json["status"], 503);
        assert!(json.get("instance").is_none());
    }
}
