//! PostgreSQL Unit of Work 实现
//!
//! 事务在 `begin` 时开启；未提交即被丢弃时由 sqlx 在连接归还前回滚。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rbac_adapter_postgres::{TransactionOptions, begin_with_options};
use rbac_errors::{AppError, AppResult};
use rbac_ports::{QueryFacade, UnitOfWork};
use sqlx::PgPool;
use tokio::sync::Mutex;
use tracing::debug;

use super::error_mapper::map_sqlx_error;
use super::postgres::{PgFacade, PgHandle, SharedTx};
use crate::domain::role::{RoleTable, UserRoleTable};
use crate::domain::unit_of_work::{RoleUnitOfWork, UnitOfWorkFactory};

/// PostgreSQL Unit of Work
pub struct PostgresUnitOfWork {
    tx: SharedTx,
    roles: PgFacade<RoleTable>,
    user_roles: PgFacade<UserRoleTable>,
}

impl PostgresUnitOfWork {
    pub fn new(tx: SharedTx, slow_query: Duration) -> Self {
        Self {
            roles: PgFacade::new(PgHandle::Tx(tx.clone()), slow_query),
            user_roles: PgFacade::new(PgHandle::Tx(tx.clone()), slow_query),
            tx,
        }
    }

    async fn take_tx(&self) -> AppResult<sqlx::Transaction<'static, sqlx::Postgres>> {
        self.tx
            .lock()
            .await
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed"))
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn commit(self: Box<Self>) -> AppResult<()> {
        let tx = self.take_tx().await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        let tx = self.take_tx().await?;
        tx.rollback().await.map_err(map_sqlx_error)?;
        debug!("Transaction rolled back");
        Ok(())
    }
}

impl RoleUnitOfWork for PostgresUnitOfWork {
    fn roles(&self) -> &dyn QueryFacade<RoleTable> {
        &self.roles
    }

    fn user_roles(&self) -> &dyn QueryFacade<UserRoleTable> {
        &self.user_roles
    }
}

/// PostgreSQL Unit of Work 工厂
pub struct PostgresUnitOfWorkFactory {
    pool: PgPool,
    options: TransactionOptions,
    slow_query: Duration,
}

impl PostgresUnitOfWorkFactory {
    pub fn new(pool: PgPool, options: TransactionOptions, slow_query: Duration) -> Self {
        Self {
            pool,
            options,
            slow_query,
        }
    }
}

#[async_trait]
impl UnitOfWorkFactory for PostgresUnitOfWorkFactory {
    async fn begin(&self) -> AppResult<Box<dyn RoleUnitOfWork>> {
        let tx = begin_with_options(&self.pool, &self.options).await?;
        let shared: SharedTx = Arc::new(Mutex::new(Some(tx)));
        Ok(Box::new(PostgresUnitOfWork::new(shared, self.slow_query)))
    }
}
