//! 角色管理错误

use rbac_common::Interrupted;
use rbac_errors::AppError;
use thiserror::Error;
use tracing::error;

use crate::domain::role::{ROLE_CODE_UNIQUE, ROLE_NAME_UNIQUE};

/// 角色管理操作的结果错误
///
/// 除 `ServerError` 外都是预期的业务结果；基础设施故障统一折叠为
/// `ServerError`，原因只写入日志。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleError {
    #[error("Role name already exists")]
    NameExists,

    #[error("Role code already exists")]
    CodeExists,

    #[error("Role not found")]
    NotFound,

    #[error("Super admin role cannot be deleted or recoded")]
    SuperAdminProtected,

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Operation timed out")]
    Timeout,

    #[error("Operation canceled")]
    Canceled,

    #[error("Internal server error")]
    ServerError,
}

impl RoleError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParam(msg.into())
    }

    /// metrics 标签
    pub fn kind(&self) -> &'static str {
        match self {
            RoleError::NameExists => "name_exists",
            RoleError::CodeExists => "code_exists",
            RoleError::NotFound => "not_found",
            RoleError::SuperAdminProtected => "super_admin_protected",
            RoleError::InvalidParam(_) => "invalid_param",
            RoleError::Timeout => "timeout",
            RoleError::Canceled => "canceled",
            RoleError::ServerError => "server_error",
        }
    }
}

impl From<AppError> for RoleError {
    fn from(e: AppError) -> Self {
        match e.violated_constraint() {
            Some(ROLE_NAME_UNIQUE) => RoleError::NameExists,
            Some(ROLE_CODE_UNIQUE) => RoleError::CodeExists,
            _ => {
                error!(error = %e, "Role storage operation failed");
                RoleError::ServerError
            }
        }
    }
}

impl From<Interrupted> for RoleError {
    fn from(e: Interrupted) -> Self {
        match e {
            Interrupted::Canceled => RoleError::Canceled,
            Interrupted::DeadlineExceeded => RoleError::Timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_translation() {
        assert_eq!(
            RoleError::from(AppError::unique_violation(ROLE_NAME_UNIQUE)),
            RoleError::NameExists
        );
        assert_eq!(
            RoleError::from(AppError::unique_violation(ROLE_CODE_UNIQUE)),
            RoleError::CodeExists
        );
        assert_eq!(
            RoleError::from(AppError::unique_violation("uk_sys_user_role")),
            RoleError::ServerError
        );
    }

    #[test]
    fn test_infrastructure_errors_are_opaque() {
        let err = RoleError::from(AppError::database("password authentication failed"));
        assert_eq!(err, RoleError::ServerError);
        assert!(!err.to_string().contains("password"));
    }

    #[test]
    fn test_interruptions() {
        assert_eq!(RoleError::from(Interrupted::Canceled), RoleError::Canceled);
        assert_eq!(
            RoleError::from(Interrupted::DeadlineExceeded),
            RoleError::Timeout
        );
    }
}
