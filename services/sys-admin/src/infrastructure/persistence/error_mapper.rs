//! 数据库错误映射工具
//!
//! 提供统一的 SQLx 错误到 AppError 的转换

use rbac_errors::AppError;

/// 将 SQLx 错误转换为 AppError，区分不同错误类型
///
/// 唯一约束冲突保留约束名，供上层翻译为业务错误。
pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::RowNotFound => AppError::not_found("Record not found"),
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            // PostgreSQL 约束违规代码
            Some("23505") => {
                AppError::unique_violation(db_err.constraint().unwrap_or_default())
            }
            Some("23503") => AppError::validation("Foreign key constraint violation"),
            Some("23514") => AppError::validation("Check constraint violation"),
            Some("23502") => AppError::validation("Not null constraint violation"),
            Some("22001") => AppError::validation("String data too long"),
            Some("22P02") => AppError::validation("Invalid input syntax"),
            Some(code) => AppError::database(format!("Database error ({}): {}", code, db_err)),
            None => AppError::database(db_err.to_string()),
        },
        sqlx::Error::PoolTimedOut => AppError::internal("Database connection pool timeout"),
        sqlx::Error::PoolClosed => AppError::internal("Database connection pool is closed"),
        sqlx::Error::Protocol(msg) => AppError::internal(format!("Database protocol error: {}", msg)),
        _ => AppError::database(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found() {
        let err = map_sqlx_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_pool_timeout() {
        let err = map_sqlx_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_protocol_error() {
        let err = map_sqlx_error(sqlx::Error::Protocol("unexpected message".to_string()));
        assert!(matches!(err, AppError::Internal(msg) if msg.contains("unexpected message")));
    }
}
