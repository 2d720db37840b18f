//! PostgreSQL 查询门面
//!
//! 同一个 [`PgFacade`] 既可绑定连接池（每条语句自动提交），也可绑定共享事务。

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rbac_adapter_postgres::{push_options, push_where};
use rbac_errors::{AppError, AppResult};
use rbac_ports::{Column, Filter, FindOptions, QueryFacade, Table};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder, Transaction};
use tokio::sync::Mutex;

use super::db_metrics::QueryTimer;
use super::error_mapper::map_sqlx_error;
use crate::domain::role::{
    Role, RoleDraft, RoleId, RoleStatus, RoleTable, UserRole, UserRoleDraft, UserRoleTable,
};

/// Shared transaction type
pub type SharedTx = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

/// 门面绑定的执行目标
#[derive(Clone)]
pub enum PgHandle {
    Pool(PgPool),
    Tx(SharedTx),
}

/// 在句柄对应的连接上执行 `$body`
macro_rules! on_conn {
    ($handle:expr, |$conn:ident| $body:expr) => {{
        match $handle {
            PgHandle::Pool(pool) => {
                let mut pooled = pool.acquire().await.map_err(map_sqlx_error)?;
                let $conn: &mut PgConnection = &mut *pooled;
                $body
            }
            PgHandle::Tx(tx) => {
                let mut guard = tx.lock().await;
                let tx = guard
                    .as_mut()
                    .ok_or_else(|| AppError::internal("Transaction already consumed"))?;
                let $conn: &mut PgConnection = &mut **tx;
                $body
            }
        }
    }};
}

/// 表的 SQL 映射
pub trait PgTable: Table {
    type Row: for<'r> FromRow<'r, PgRow> + Send + Unpin;

    /// SELECT / RETURNING 列清单
    const COLUMNS: &'static str;

    fn into_record(row: Self::Row) -> AppResult<Self::Record>;

    /// 追加 `(列...) VALUES (...)`
    fn push_insert(qb: &mut QueryBuilder<'_, Postgres>, draft: &Self::Draft);

    /// 追加 `列 = 值, ...`
    fn push_assignments(qb: &mut QueryBuilder<'_, Postgres>, draft: &Self::Draft);
}

/// 通用 PostgreSQL 查询门面
pub struct PgFacade<T> {
    handle: PgHandle,
    slow_query: Duration,
    _table: PhantomData<fn() -> T>,
}

impl<T> PgFacade<T> {
    pub fn new(handle: PgHandle, slow_query: Duration) -> Self {
        Self {
            handle,
            slow_query,
            _table: PhantomData,
        }
    }

    pub fn on_pool(pool: PgPool, slow_query: Duration) -> Self {
        Self::new(PgHandle::Pool(pool), slow_query)
    }
}

#[async_trait]
impl<T: PgTable> QueryFacade<T> for PgFacade<T> {
    async fn find(
        &self,
        filter: &Filter<T::Column>,
        options: &FindOptions<T::Column>,
    ) -> AppResult<Vec<T::Record>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM {}", T::COLUMNS, T::NAME));
        push_where(&mut qb, filter, T::DELETED_AT);
        push_options(&mut qb, options);

        let timer = QueryTimer::new(T::NAME, "find", self.slow_query);
        let result: AppResult<Vec<T::Row>> = on_conn!(&self.handle, |conn| {
            qb.build_query_as::<T::Row>()
                .fetch_all(conn)
                .await
                .map_err(map_sqlx_error)
        });
        timer.observe(&result);

        result?.into_iter().map(T::into_record).collect()
    }

    async fn count(&self, filter: &Filter<T::Column>) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {}", T::NAME));
        push_where(&mut qb, filter, T::DELETED_AT);

        let timer = QueryTimer::new(T::NAME, "count", self.slow_query);
        let result: AppResult<i64> = on_conn!(&self.handle, |conn| {
            qb.build_query_scalar::<i64>()
                .fetch_one(conn)
                .await
                .map_err(map_sqlx_error)
        });
        timer.observe(&result);

        Ok(u64::try_from(result?).unwrap_or_default())
    }

    async fn insert(&self, draft: &T::Draft) -> AppResult<T::Record> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("INSERT INTO {} ", T::NAME));
        T::push_insert(&mut qb, draft);
        qb.push(" RETURNING ").push(T::COLUMNS);

        let timer = QueryTimer::new(T::NAME, "insert", self.slow_query);
        let result: AppResult<T::Row> = on_conn!(&self.handle, |conn| {
            qb.build_query_as::<T::Row>()
                .fetch_one(conn)
                .await
                .map_err(map_sqlx_error)
        });
        timer.observe(&result);

        T::into_record(result?)
    }

    async fn update(&self, filter: &Filter<T::Column>, draft: &T::Draft) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("UPDATE {} SET ", T::NAME));
        T::push_assignments(&mut qb, draft);
        push_where(&mut qb, filter, T::DELETED_AT);

        let timer = QueryTimer::new(T::NAME, "update", self.slow_query);
        let result = on_conn!(&self.handle, |conn| {
            qb.build().execute(conn).await.map_err(map_sqlx_error)
        });
        timer.observe(&result);

        Ok(result?.rows_affected())
    }

    async fn delete(&self, filter: &Filter<T::Column>) -> AppResult<u64> {
        let mut qb = match T::DELETED_AT {
            Some(deleted_at) => {
                let mut qb = QueryBuilder::<Postgres>::new(format!("UPDATE {} SET ", T::NAME));
                qb.push(deleted_at.name())
                    .push(" = NOW(), updated_at = NOW()");
                qb
            }
            None => QueryBuilder::<Postgres>::new(format!("DELETE FROM {}", T::NAME)),
        };
        // 已软删除的行不再计数
        push_where(&mut qb, &filter.clone().live_only(), T::DELETED_AT);

        let timer = QueryTimer::new(T::NAME, "delete", self.slow_query);
        let result = on_conn!(&self.handle, |conn| {
            qb.build().execute(conn).await.map_err(map_sqlx_error)
        });
        timer.observe(&result);

        Ok(result?.rows_affected())
    }
}

// ============ 数据行映射 ============

#[derive(sqlx::FromRow)]
pub struct RoleRow {
    id: i64,
    name: String,
    code: String,
    default_router: Option<String>,
    status: i16,
    remark: Option<String>,
    sort: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<RoleRow> for Role {
    type Error = AppError;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        let status = RoleStatus::from_i16(row.status).ok_or_else(|| {
            AppError::internal(format!("Role {} has invalid status {}", row.id, row.status))
        })?;

        Ok(Role {
            id: RoleId(row.id),
            name: row.name,
            code: row.code,
            default_router: row.default_router,
            status,
            remark: row.remark,
            sort: row.sort,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

impl PgTable for RoleTable {
    type Row = RoleRow;

    const COLUMNS: &'static str = "id, name, code, default_router, status, remark, sort, \
                                   created_at, updated_at, deleted_at";

    fn into_record(row: RoleRow) -> AppResult<Role> {
        Role::try_from(row)
    }

    fn push_insert(qb: &mut QueryBuilder<'_, Postgres>, draft: &RoleDraft) {
        qb.push("(name, code, default_router, status, remark, sort) VALUES (");
        let mut values = qb.separated(", ");
        values
            .push_bind(draft.name.clone())
            .push_bind(draft.code.clone())
            .push_bind(draft.default_router.clone())
            .push_bind(draft.status.as_i16())
            .push_bind(draft.remark.clone())
            .push_bind(draft.sort)
            .push_unseparated(")");
    }

    fn push_assignments(qb: &mut QueryBuilder<'_, Postgres>, draft: &RoleDraft) {
        qb.push("name = ")
            .push_bind(draft.name.clone())
            .push(", code = ")
            .push_bind(draft.code.clone())
            .push(", default_router = ")
            .push_bind(draft.default_router.clone())
            .push(", status = ")
            .push_bind(draft.status.as_i16())
            .push(", remark = ")
            .push_bind(draft.remark.clone())
            .push(", sort = ")
            .push_bind(draft.sort)
            .push(", updated_at = NOW()");
    }
}

#[derive(sqlx::FromRow)]
pub struct UserRoleRow {
    id: i64,
    user_id: i64,
    role_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRoleRow> for UserRole {
    fn from(row: UserRoleRow) -> Self {
        UserRole {
            id: row.id,
            user_id: row.user_id,
            role_id: RoleId(row.role_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl PgTable for UserRoleTable {
    type Row = UserRoleRow;

    const COLUMNS: &'static str = "id, user_id, role_id, created_at, updated_at";

    fn into_record(row: UserRoleRow) -> AppResult<UserRole> {
        Ok(row.into())
    }

    fn push_insert(qb: &mut QueryBuilder<'_, Postgres>, draft: &UserRoleDraft) {
        qb.push("(user_id, role_id) VALUES (")
            .push_bind(draft.user_id)
            .push(", ")
            .push_bind(draft.role_id.0)
            .push(")");
    }

    fn push_assignments(qb: &mut QueryBuilder<'_, Postgres>, draft: &UserRoleDraft) {
        qb.push("user_id = ")
            .push_bind(draft.user_id)
            .push(", role_id = ")
            .push_bind(draft.role_id.0)
            .push(", updated_at = NOW()");
    }
}
