//! 服务启动器

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use rbac_adapter_postgres::Migration;
use rbac_config::AppConfig;
use rbac_errors::AppResult;
use rbac_telemetry::init_metrics;
use tracing::info;

use crate::infrastructure::Infrastructure;
use crate::runtime::{init_runtime, shutdown_signal};

const POOL_METRICS_INTERVAL: Duration = Duration::from_secs(15);

/// 运行 HTTP 服务
///
/// 加载配置、初始化日志与 metrics、创建基础设施并执行迁移，
/// 然后用 `router_builder` 构建路由，收到关闭信号后优雅退出。
pub async fn run_http<F, Fut>(
    config_dir: &str,
    migrations: &[Migration],
    router_builder: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(Arc<Infrastructure>, PrometheusHandle) -> Fut,
    Fut: Future<Output = AppResult<Router>>,
{
    let config = AppConfig::load(config_dir)?;
    init_runtime(&config)?;

    info!("Starting {} service", config.app_name);

    let metrics_handle = init_metrics()?;
    let infra = Arc::new(Infrastructure::from_config(config, migrations).await?);
    let pool_metrics = infra.spawn_pool_metrics(POOL_METRICS_INTERVAL);

    let addr = infra.config().server.bind_addr();
    let router = router_builder(infra.clone(), metrics_handle).await?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "HTTP server starting");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool_metrics.abort();
    infra.postgres_pool().close().await;

    info!("Service stopped");
    Ok(())
}
