//! 内存存储
//!
//! 与 PostgreSQL 实现遵守同一组契约：软删除、部分唯一索引、序列不回收、
//! 事务隔离。事务持有整张表的独占锁并在副本上工作，提交时替换，丢弃即回滚。
//! 支持按 `表.操作` 注入故障，供测试覆盖原子性、超时与约束冲突路径。

use std::collections::{BTreeMap, HashMap};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rbac_errors::{AppError, AppResult};
use rbac_ports::{Filter, FindOptions, QueryFacade, Table, UnitOfWork};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::domain::role::{
    ROLE_CODE_UNIQUE, ROLE_NAME_UNIQUE, Role, RoleDraft, RoleId, RoleStatus, RoleTable,
    SUPER_ADMIN_CODE, USER_ROLE_UNIQUE, UserRole, UserRoleDraft, UserRoleTable,
};
use crate::domain::unit_of_work::{RoleUnitOfWork, UnitOfWorkFactory};

/// 注入的故障
#[derive(Debug, Clone)]
pub enum Fault {
    /// 操作直接失败
    Fail(AppError),
    /// 操作执行前等待
    Delay(Duration),
}

#[derive(Debug, Clone, Default)]
struct Tables {
    roles: BTreeMap<i64, Role>,
    user_roles: BTreeMap<i64, UserRole>,
}

#[derive(Default)]
struct Shared {
    tables: Arc<Mutex<Tables>>,
    role_seq: AtomicI64,
    user_role_seq: AtomicI64,
    faults: StdMutex<HashMap<String, Fault>>,
    statements: StdMutex<HashMap<String, u64>>,
    commits: AtomicU64,
    rollbacks: AtomicU64,
}

impl Shared {
    fn fault(&self, key: &str) -> Option<Fault> {
        self.faults
            .lock()
            .ok()
            .and_then(|faults| faults.get(key).cloned())
    }

    async fn trip(&self, key: &str) -> AppResult<()> {
        if let Ok(mut statements) = self.statements.lock() {
            *statements.entry(key.to_string()).or_default() += 1;
        }

        match self.fault(key) {
            Some(Fault::Fail(err)) => Err(err),
            Some(Fault::Delay(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// 内存存储
#[derive(Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置超级管理员角色的存储
    pub async fn seeded() -> AppResult<Self> {
        let store = Self::new();
        store
            .roles()
            .insert(&RoleDraft {
                name: "超级管理员".to_string(),
                code: SUPER_ADMIN_CODE.to_string(),
                default_router: None,
                status: RoleStatus::Enabled,
                remark: None,
                sort: 0,
            })
            .await?;
        Ok(store)
    }

    /// 自动提交的角色表门面
    pub fn roles(&self) -> MemoryFacade<RoleTable> {
        MemoryFacade::new(self.clone(), Scope::Auto)
    }

    /// 自动提交的用户角色关联表门面
    pub fn user_roles(&self) -> MemoryFacade<UserRoleTable> {
        MemoryFacade::new(self.clone(), Scope::Auto)
    }

    /// 注入故障；键为 `表名.操作`（如 `sys_role.delete`）、`begin` 或 `commit`
    pub fn inject(&self, key: impl Into<String>, fault: Fault) {
        if let Ok(mut faults) = self.shared.faults.lock() {
            faults.insert(key.into(), fault);
        }
    }

    pub fn clear_faults(&self) {
        if let Ok(mut faults) = self.shared.faults.lock() {
            faults.clear();
        }
    }

    /// 已执行的语句次数；键与 [`MemoryStore::inject`] 相同（如 `sys_role.find`）
    pub fn statements(&self, key: &str) -> u64 {
        self.shared
            .statements
            .lock()
            .ok()
            .and_then(|statements| statements.get(key).copied())
            .unwrap_or(0)
    }

    pub fn commits(&self) -> u64 {
        self.shared.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> u64 {
        self.shared.rollbacks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UnitOfWorkFactory for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn RoleUnitOfWork>> {
        self.shared.trip("begin").await?;

        let guard = self.shared.tables.clone().lock_owned().await;
        let working = (*guard).clone();
        let state = Arc::new(Mutex::new(Some(TxState { guard, working })));

        Ok(Box::new(MemoryUnitOfWork {
            store: self.clone(),
            roles: MemoryFacade::new(self.clone(), Scope::Tx(state.clone())),
            user_roles: MemoryFacade::new(self.clone(), Scope::Tx(state.clone())),
            state,
        }))
    }
}

struct TxState {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

type SharedState = Arc<Mutex<Option<TxState>>>;

#[derive(Clone)]
enum Scope {
    Auto,
    Tx(SharedState),
}

fn consumed() -> AppError {
    AppError::internal("Transaction already consumed")
}

/// 内存 Unit of Work
pub struct MemoryUnitOfWork {
    store: MemoryStore,
    state: SharedState,
    roles: MemoryFacade<RoleTable>,
    user_roles: MemoryFacade<UserRoleTable>,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.store.shared.trip("commit").await?;

        let TxState { mut guard, working } = self.state.lock().await.take().ok_or_else(consumed)?;
        *guard = working;
        self.store.shared.commits.fetch_add(1, Ordering::SeqCst);
        debug!("Memory transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.state.lock().await.take().ok_or_else(consumed)?;
        self.store.shared.rollbacks.fetch_add(1, Ordering::SeqCst);
        debug!("Memory transaction rolled back");
        Ok(())
    }
}

impl RoleUnitOfWork for MemoryUnitOfWork {
    fn roles(&self) -> &dyn QueryFacade<RoleTable> {
        &self.roles
    }

    fn user_roles(&self) -> &dyn QueryFacade<UserRoleTable> {
        &self.user_roles
    }
}

/// 表在内存中的存取方式
trait MemoryTable: Table {
    fn rows(tables: &Tables) -> &BTreeMap<i64, Self::Record>;

    fn rows_mut(tables: &mut Tables) -> &mut BTreeMap<i64, Self::Record>;

    fn sequence(shared: &Shared) -> &AtomicI64;

    fn build(id: i64, draft: &Self::Draft, now: DateTime<Utc>) -> Self::Record;

    fn apply(record: &mut Self::Record, draft: &Self::Draft, now: DateTime<Utc>);

    fn mark_deleted(record: &mut Self::Record, now: DateTime<Utc>);

    /// 检查 `candidate` 与其他行是否冲突，返回被违反的约束名
    fn violated(
        rows: &BTreeMap<i64, Self::Record>,
        id: i64,
        candidate: &Self::Record,
    ) -> Option<&'static str>;

    fn is_deleted(record: &Self::Record) -> bool {
        Self::DELETED_AT.is_some_and(|column| !Self::value(record, column).is_null())
    }
}

impl MemoryTable for RoleTable {
    fn rows(tables: &Tables) -> &BTreeMap<i64, Role> {
        &tables.roles
    }

    fn rows_mut(tables: &mut Tables) -> &mut BTreeMap<i64, Role> {
        &mut tables.roles
    }

    fn sequence(shared: &Shared) -> &AtomicI64 {
        &shared.role_seq
    }

    fn build(id: i64, draft: &RoleDraft, now: DateTime<Utc>) -> Role {
        Role {
            id: RoleId(id),
            name: draft.name.clone(),
            code: draft.code.clone(),
            default_router: draft.default_router.clone(),
            status: draft.status,
            remark: draft.remark.clone(),
            sort: draft.sort,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn apply(role: &mut Role, draft: &RoleDraft, now: DateTime<Utc>) {
        role.name = draft.name.clone();
        role.code = draft.code.clone();
        role.default_router = draft.default_router.clone();
        role.status = draft.status;
        role.remark = draft.remark.clone();
        role.sort = draft.sort;
        role.updated_at = now;
    }

    fn mark_deleted(role: &mut Role, now: DateTime<Utc>) {
        role.deleted_at = Some(now);
        role.updated_at = now;
    }

    fn violated(rows: &BTreeMap<i64, Role>, id: i64, candidate: &Role) -> Option<&'static str> {
        if candidate.deleted_at.is_some() {
            return None;
        }
        let live = move || {
            rows.values()
                .filter(move |role| role.id.0 != id && role.deleted_at.is_none())
        };

        if live().any(|role| role.name == candidate.name) {
            Some(ROLE_NAME_UNIQUE)
        } else if live().any(|role| role.code == candidate.code) {
            Some(ROLE_CODE_UNIQUE)
        } else {
            None
        }
    }
}

impl MemoryTable for UserRoleTable {
    fn rows(tables: &Tables) -> &BTreeMap<i64, UserRole> {
        &tables.user_roles
    }

    fn rows_mut(tables: &mut Tables) -> &mut BTreeMap<i64, UserRole> {
        &mut tables.user_roles
    }

    fn sequence(shared: &Shared) -> &AtomicI64 {
        &shared.user_role_seq
    }

    fn build(id: i64, draft: &UserRoleDraft, now: DateTime<Utc>) -> UserRole {
        UserRole {
            id,
            user_id: draft.user_id,
            role_id: draft.role_id,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(link: &mut UserRole, draft: &UserRoleDraft, now: DateTime<Utc>) {
        link.user_id = draft.user_id;
        link.role_id = draft.role_id;
        link.updated_at = now;
    }

    fn mark_deleted(_link: &mut UserRole, _now: DateTime<Utc>) {}

    fn violated(
        rows: &BTreeMap<i64, UserRole>,
        id: i64,
        candidate: &UserRole,
    ) -> Option<&'static str> {
        rows.iter()
            .any(|(other, link)| {
                *other != id && link.user_id == candidate.user_id && link.role_id == candidate.role_id
            })
            .then_some(USER_ROLE_UNIQUE)
    }
}

/// 通用内存查询门面
pub struct MemoryFacade<T> {
    store: MemoryStore,
    scope: Scope,
    _table: PhantomData<fn() -> T>,
}

impl<T: MemoryTable> MemoryFacade<T> {
    fn new(store: MemoryStore, scope: Scope) -> Self {
        Self {
            store,
            scope,
            _table: PhantomData,
        }
    }

    async fn trip(&self, operation: &str) -> AppResult<()> {
        self.store
            .shared
            .trip(&format!("{}.{}", T::NAME, operation))
            .await
    }

    async fn read<R, F>(&self, f: F) -> AppResult<R>
    where
        F: FnOnce(&Tables) -> R + Send,
    {
        match &self.scope {
            Scope::Auto => {
                let tables = self.store.shared.tables.lock().await;
                Ok(f(&tables))
            }
            Scope::Tx(state) => {
                let state = state.lock().await;
                let state = state.as_ref().ok_or_else(consumed)?;
                Ok(f(&state.working))
            }
        }
    }

    /// 语句级原子写入：在副本上执行，成功后替换
    async fn write<R, F>(&self, f: F) -> AppResult<R>
    where
        F: FnOnce(&mut Tables) -> AppResult<R> + Send,
    {
        match &self.scope {
            Scope::Auto => {
                let mut tables = self.store.shared.tables.lock().await;
                let mut copy = tables.clone();
                let result = f(&mut copy)?;
                *tables = copy;
                Ok(result)
            }
            Scope::Tx(state) => {
                let mut state = state.lock().await;
                let state = state.as_mut().ok_or_else(consumed)?;
                let mut copy = state.working.clone();
                let result = f(&mut copy)?;
                state.working = copy;
                Ok(result)
            }
        }
    }

    fn matching<'a>(
        tables: &'a Tables,
        filter: &'a Filter<T::Column>,
    ) -> impl Iterator<Item = (&'a i64, &'a T::Record)> + 'a {
        T::rows(tables).iter().filter(move |(_, record)| {
            (filter.includes_deleted() || !T::is_deleted(record))
                && filter.matches(|column| T::value(record, column))
        })
    }

    fn matching_ids(tables: &Tables, filter: &Filter<T::Column>) -> Vec<i64> {
        Self::matching(tables, filter).map(|(id, _)| *id).collect()
    }
}

fn ensure_unique<T: MemoryTable>(tables: &Tables, id: i64, candidate: &T::Record) -> AppResult<()> {
    match T::violated(T::rows(tables), id, candidate) {
        Some(constraint) => Err(AppError::unique_violation(constraint)),
        None => Ok(()),
    }
}

#[async_trait]
impl<T: MemoryTable> QueryFacade<T> for MemoryFacade<T> {
    async fn find(
        &self,
        filter: &Filter<T::Column>,
        options: &FindOptions<T::Column>,
    ) -> AppResult<Vec<T::Record>> {
        self.trip("find").await?;

        self.read(|tables| {
            let mut records: Vec<T::Record> = Self::matching(tables, filter)
                .map(|(_, record)| record.clone())
                .collect();
            // 稳定排序，未指定的次序保持 id 升序
            records.sort_by(|a, b| options.compare(|c| T::value(a, c), |c| T::value(b, c)));

            match options.window {
                Some(window) => records
                    .into_iter()
                    .skip(usize::try_from(window.offset).unwrap_or(usize::MAX))
                    .take(usize::try_from(window.limit).unwrap_or(usize::MAX))
                    .collect(),
                None => records,
            }
        })
        .await
    }

    async fn count(&self, filter: &Filter<T::Column>) -> AppResult<u64> {
        self.trip("count").await?;

        self.read(|tables| Self::matching(tables, filter).count() as u64)
            .await
    }

    async fn insert(&self, draft: &T::Draft) -> AppResult<T::Record> {
        self.trip("insert").await?;

        let shared = &self.store.shared;
        self.write(|tables| {
            let id = T::sequence(shared).fetch_add(1, Ordering::SeqCst) + 1;
            let record = T::build(id, draft, Utc::now());
            ensure_unique::<T>(tables, id, &record)?;
            T::rows_mut(tables).insert(id, record.clone());
            Ok(record)
        })
        .await
    }

    async fn update(&self, filter: &Filter<T::Column>, draft: &T::Draft) -> AppResult<u64> {
        self.trip("update").await?;

        let filter = filter.clone().live_only();
        self.write(|tables| {
            let ids = Self::matching_ids(tables, &filter);

            let now = Utc::now();
            for id in &ids {
                let Some(mut record) = T::rows(tables).get(id).cloned() else {
                    continue;
                };
                T::apply(&mut record, draft, now);
                ensure_unique::<T>(tables, *id, &record)?;
                T::rows_mut(tables).insert(*id, record);
            }
            Ok(ids.len() as u64)
        })
        .await
    }

    async fn delete(&self, filter: &Filter<T::Column>) -> AppResult<u64> {
        self.trip("delete").await?;

        let filter = filter.clone().live_only();
        self.write(|tables| {
            let ids = Self::matching_ids(tables, &filter);

            let now = Utc::now();
            let rows = T::rows_mut(tables);
            for id in &ids {
                if T::DELETED_AT.is_some() {
                    if let Some(record) = rows.get_mut(id) {
                        T::mark_deleted(record, now);
                    }
                } else {
                    rows.remove(id);
                }
            }
            Ok(ids.len() as u64)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::role::RoleColumn;

    fn draft(name: &str, code: &str) -> RoleDraft {
        RoleDraft {
            name: name.to_string(),
            code: code.to_string(),
            default_router: None,
            status: RoleStatus::Enabled,
            remark: None,
            sort: 0,
        }
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let store = MemoryStore::new();

        let uow = store.begin().await.unwrap();
        let created = uow.roles().insert(&draft("运维", "ops")).await.unwrap();
        drop(uow);

        assert_eq!(store.roles().count(&Filter::new()).await.unwrap(), 0);

        // 序列不随回滚复用
        let next = store.roles().insert(&draft("运维", "ops")).await.unwrap();
        assert!(next.id > created.id);
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let store = MemoryStore::new();

        let uow = store.begin().await.unwrap();
        uow.roles().insert(&draft("运维", "ops")).await.unwrap();
        uow.commit().await.unwrap();

        assert_eq!(store.roles().count(&Filter::new()).await.unwrap(), 1);
        assert_eq!(store.commits(), 1);
    }

    #[tokio::test]
    async fn test_unique_index_ignores_deleted_rows() {
        let store = MemoryStore::new();
        let roles = store.roles();

        roles.insert(&draft("运维", "ops")).await.unwrap();
        let err = roles.insert(&draft("运维", "ops-2")).await.unwrap_err();
        assert_eq!(err.violated_constraint(), Some(ROLE_NAME_UNIQUE));

        let deleted = roles
            .delete(&Filter::new().eq(RoleColumn::Code, "ops"))
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        roles.insert(&draft("运维", "ops")).await.unwrap();

        // 已软删除的行不会被再次删除
        let all = Filter::new().eq(RoleColumn::Name, "运维").with_deleted();
        assert_eq!(roles.count(&all).await.unwrap(), 2);
        assert_eq!(roles.delete(&all).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_statement_leaves_no_partial_update() {
        let store = MemoryStore::new();
        let roles = store.roles();
        roles.insert(&draft("甲", "a")).await.unwrap();
        roles.insert(&draft("乙", "b")).await.unwrap();

        let err = roles
            .update(&Filter::new(), &draft("丙", "c"))
            .await
            .unwrap_err();
        assert_eq!(err.violated_constraint(), Some(ROLE_NAME_UNIQUE));

        let names: Vec<String> = roles
            .find(&Filter::new(), &FindOptions::default())
            .await
            .unwrap()
            .into_iter()
            .map(|role| role.name)
            .collect();
        assert_eq!(names, vec!["甲", "乙"]);
    }

    #[tokio::test]
    async fn test_statements_are_counted_per_table() {
        let store = MemoryStore::new();
        let roles = store.roles();

        roles.insert(&draft("运维", "ops")).await.unwrap();
        roles
            .exists(&Filter::new().eq(RoleColumn::Code, "ops"))
            .await
            .unwrap();
        store.user_roles().count(&Filter::new()).await.unwrap();

        assert_eq!(store.statements("sys_role.insert"), 1);
        assert_eq!(store.statements("sys_role.find"), 1);
        assert_eq!(store.statements("sys_role.count"), 0);
        assert_eq!(store.statements("sys_user_role.count"), 1);
    }

    #[tokio::test]
    async fn test_injected_fault_fails_operation() {
        let store = MemoryStore::new();
        store.inject("sys_role.count", Fault::Fail(AppError::database("boom")));

        assert!(store.roles().count(&Filter::new()).await.is_err());
        store.clear_faults();
        assert!(store.roles().count(&Filter::new()).await.is_ok());
    }
}
