//! 基础设施资源管理

use std::time::Duration;

use metrics::gauge;
use rbac_adapter_postgres::{
    IsolationLevel, Migration, MigrationManager, PostgresConfig, TransactionOptions,
    create_pool,
};
use rbac_common::{RetryConfig, with_retry};
use rbac_config::AppConfig;
use rbac_errors::{AppError, AppResult};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::info;

/// 基础设施资源容器
pub struct Infrastructure {
    /// 应用配置
    config: AppConfig,
    /// PostgreSQL 连接池
    postgres_pool: PgPool,
    /// 业务事务使用的选项
    transaction_options: TransactionOptions,
}

impl Infrastructure {
    /// 从配置创建基础设施资源（带重试），按需执行迁移
    pub async fn from_config(config: AppConfig, migrations: &[Migration]) -> AppResult<Self> {
        let retry_config = RetryConfig::default();
        let isolation_level: IsolationLevel = config.database.isolation_level.parse()?;

        let pg_config = PostgresConfig::new(config.database.url.expose_secret())
            .with_max_connections(config.database.max_connections)
            .with_min_connections(config.database.min_connections)
            .with_connect_timeout(Duration::from_secs(config.database.acquire_timeout_secs));
        let postgres_pool = with_retry(
            &retry_config,
            "PostgreSQL connection",
            |err: &AppError| matches!(err, AppError::Unavailable(_)),
            || {
                let cfg = pg_config.clone();
                async move { create_pool(&cfg).await }
            },
        )
        .await?;
        info!(
            max_connections = config.database.max_connections,
            isolation_level = isolation_level.as_sql(),
            "PostgreSQL connection pool created"
        );

        if config.database.run_migrations {
            let result = MigrationManager::new(postgres_pool.clone())
                .migrate(migrations)
                .await?;
            info!(
                applied = result.applied_count(),
                skipped = result.skipped.len(),
                "Database migrations finished"
            );
        }

        Ok(Self {
            config,
            postgres_pool,
            transaction_options: TransactionOptions::new().with_isolation_level(isolation_level),
        })
    }

    /// 获取应用配置
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 获取 PostgreSQL 连接池
    pub fn postgres_pool(&self) -> PgPool {
        self.postgres_pool.clone()
    }

    /// 业务事务的隔离级别与访问模式
    pub fn transaction_options(&self) -> TransactionOptions {
        self.transaction_options
    }

    /// 定期采集连接池状态
    pub fn spawn_pool_metrics(&self, interval: Duration) -> JoinHandle<()> {
        let pool = self.postgres_pool.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                record_pool_state(&pool);
            }
        })
    }
}

fn record_pool_state(pool: &PgPool) {
    let size = pool.size();
    let idle = pool.num_idle() as u32;
    gauge!("db_pool_size", "pool" => "primary").set(f64::from(size));
    gauge!("db_pool_idle", "pool" => "primary").set(f64::from(idle));
    gauge!("db_pool_active", "pool" => "primary").set(f64::from(size.saturating_sub(idle)));
}
