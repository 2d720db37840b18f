//! 健康检查

use async_trait::async_trait;
use rbac_adapter_postgres::check_connection;
use rbac_telemetry::HealthStatus;
use sqlx::PgPool;

/// 依赖探测
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self) -> HealthStatus;
}

/// PostgreSQL 连接池探测
pub struct PoolProbe {
    pool: PgPool,
}

impl PoolProbe {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthProbe for PoolProbe {
    async fn probe(&self) -> HealthStatus {
        let mut status = HealthStatus::new();
        match check_connection(&self.pool).await {
            Ok(()) => status.add_check("postgres", true, None),
            Err(e) => status.add_check("postgres", false, Some(e.to_string())),
        }
        status
    }
}
