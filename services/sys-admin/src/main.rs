//! sys-admin 服务入口

use std::sync::Arc;
use std::time::Duration;

use rbac_bootstrap::{Infrastructure, run_http};
use tracing::info;

use sys_admin::api::http::{AppState, PoolProbe, router};
use sys_admin::application::RoleAdministrationService;
use sys_admin::domain::role::RoleTable;
use sys_admin::infrastructure::persistence::{PgFacade, PostgresUnitOfWorkFactory};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 本地开发时从 .env 读取 APP_ 前缀的覆盖项
    dotenvy::dotenv().ok();

    run_http(
        "config",
        &sys_admin::migrations(),
        |infra: Arc<Infrastructure>, metrics| async move {
            let pool = infra.postgres_pool();
            let config = infra.config();
            let slow_query = Duration::from_millis(config.database.slow_query_ms);

            let uow_factory = Arc::new(PostgresUnitOfWorkFactory::new(
                pool.clone(),
                infra.transaction_options(),
                slow_query,
            ));
            let roles = Arc::new(PgFacade::<RoleTable>::on_pool(pool.clone(), slow_query));
            let service = RoleAdministrationService::new(uow_factory, roles);

            info!("Role administration service initialized");

            Ok(router(AppState {
                roles: service,
                request_timeout: Duration::from_millis(config.role.request_timeout_ms),
                health: Arc::new(PoolProbe::new(pool)),
                metrics: Some(metrics),
            }))
        },
    )
    .await
}
