//! 角色管理服务
//!
//! 写操作在 Unit of Work 中先做唯一性预检再落库，存储层唯一索引是最终裁决；
//! 读操作直接走连接池绑定的门面。取消与超时只作用于提交之前，提交一旦开始
//! 即执行完毕。

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use metrics::counter;
use rbac_common::{Page, RequestContext, paginate};
use rbac_ports::{Filter, FindOptions, OrderBy, QueryFacade, run_in_transaction};
use tracing::{debug, info, instrument};

use super::commands::{CreateRoleCommand, DeleteRolesCommand, UpdateRoleCommand};
use super::error::RoleError;
use super::queries::ListRolesQuery;
use crate::domain::role::{
    Role, RoleColumn, RoleId, RoleOption, RoleStatus, RoleTable, UserRoleColumn,
};
use crate::domain::unit_of_work::{RoleUnitOfWork, UnitOfWorkFactory};

/// 角色管理服务
#[derive(Clone)]
pub struct RoleAdministrationService {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    roles: Arc<dyn QueryFacade<RoleTable>>,
}

impl RoleAdministrationService {
    pub fn new(
        uow_factory: Arc<dyn UnitOfWorkFactory>,
        roles: Arc<dyn QueryFacade<RoleTable>>,
    ) -> Self {
        Self { uow_factory, roles }
    }

    /// 创建角色
    #[instrument(skip(self, ctx, cmd), fields(name = %cmd.name, code = %cmd.code))]
    pub async fn create_role(
        &self,
        ctx: &RequestContext,
        cmd: CreateRoleCommand,
    ) -> Result<Role, RoleError> {
        execute("create", async {
            ctx.check()?;
            cmd.validate().map_err(RoleError::InvalidParam)?;

            let role = self
                .in_transaction(ctx, move |uow| create_in(uow, cmd).boxed())
                .await?;

            info!(role_id = %role.id, "Role created");
            Ok(role)
        })
        .await
    }

    /// 更新角色（全量覆盖）
    #[instrument(skip(self, ctx, cmd), fields(role_id = %cmd.id, name = %cmd.name, code = %cmd.code))]
    pub async fn update_role(
        &self,
        ctx: &RequestContext,
        cmd: UpdateRoleCommand,
    ) -> Result<(), RoleError> {
        execute("update", async {
            ctx.check()?;
            cmd.validate().map_err(RoleError::InvalidParam)?;

            self.in_transaction(ctx, move |uow| update_in(uow, cmd).boxed())
                .await?;

            info!("Role updated");
            Ok(())
        })
        .await
    }

    /// 批量删除角色
    ///
    /// 全部成功或全部失败；关联的用户角色记录在同一事务中删除。
    #[instrument(skip(self, ctx, cmd), fields(ids = ?cmd.ids))]
    pub async fn delete_roles(
        &self,
        ctx: &RequestContext,
        cmd: DeleteRolesCommand,
    ) -> Result<(), RoleError> {
        execute("delete", async {
            ctx.check()?;
            cmd.validate().map_err(RoleError::InvalidParam)?;

            let deleted = self
                .in_transaction(ctx, move |uow| delete_in(uow, cmd).boxed())
                .await?;

            info!(deleted, "Roles deleted");
            Ok(())
        })
        .await
    }

    /// 获取角色详情
    #[instrument(skip(self, ctx), fields(role_id = %id))]
    pub async fn get_role(&self, ctx: &RequestContext, id: RoleId) -> Result<Role, RoleError> {
        execute("get", interruptible(ctx, async {
            self.roles
                .first(&Filter::new().eq(RoleColumn::Id, id), &FindOptions::default())
                .await?
                .ok_or(RoleError::NotFound)
        }))
        .await
    }

    /// 分页查询角色，按 `sort ASC, id DESC` 排序
    #[instrument(skip(self, ctx, query), fields(page = query.page, size = query.size))]
    pub async fn list_roles(
        &self,
        ctx: &RequestContext,
        query: ListRolesQuery,
    ) -> Result<Page<Role>, RoleError> {
        execute("list", interruptible(ctx, async {
            query.validate().map_err(RoleError::InvalidParam)?;

            let filter = &query.filter();
            let roles = &self.roles;

            let page = paginate(
                query.page_request(),
                |offset, limit| async move {
                    let options = FindOptions::new()
                        .order_by(OrderBy::asc(RoleColumn::Sort))
                        .order_by(OrderBy::desc(RoleColumn::Id))
                        .window(offset, limit);
                    roles.find(filter, &options).await
                },
                || roles.count(filter),
            )
            .await?;

            debug!(returned = page.list.len(), total = page.total, "Roles listed");
            Ok(page)
        }))
        .await
    }

    /// 启用角色的下拉选项，按 `sort ASC, id ASC` 排序
    #[instrument(skip(self, ctx))]
    pub async fn list_active_options(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<RoleOption>, RoleError> {
        execute("options", interruptible(ctx, async {
            let roles = self
                .roles
                .find(
                    &Filter::new().eq(RoleColumn::Status, RoleStatus::Enabled),
                    &FindOptions::new()
                        .order_by(OrderBy::asc(RoleColumn::Sort))
                        .order_by(OrderBy::asc(RoleColumn::Id)),
                )
                .await?;

            Ok(roles.into_iter().map(RoleOption::from).collect())
        }))
        .await
    }

    /// 在新事务中执行 `work`
    ///
    /// 开启事务与 `work` 受上下文约束；`work` 完成后再检查一次上下文，
    /// 之后的提交不再被中断，调用方看到的结果与已提交的状态一致。
    async fn in_transaction<T, W>(&self, ctx: &RequestContext, work: W) -> Result<T, RoleError>
    where
        T: Send + 'static,
        W: for<'a> FnOnce(&'a dyn RoleUnitOfWork) -> BoxFuture<'a, Result<T, RoleError>>
            + Send
            + 'static,
    {
        let uow = interruptible(ctx, async { Ok(self.uow_factory.begin().await?) }).await?;

        let ctx = ctx.clone();
        run_in_transaction(uow, move |uow| {
            async move {
                let value = interruptible(&ctx, work(uow)).await?;
                ctx.check()?;
                Ok(value)
            }
            .boxed()
        })
        .await
    }
}

/// 在上下文内执行，取消或超时时丢弃 `fut`
async fn interruptible<T, F>(ctx: &RequestContext, fut: F) -> Result<T, RoleError>
where
    F: Future<Output = Result<T, RoleError>>,
{
    ctx.run(fut).await?
}

/// 执行操作并记录结果
async fn execute<T, F>(operation: &'static str, fut: F) -> Result<T, RoleError>
where
    F: Future<Output = Result<T, RoleError>>,
{
    let result = fut.await;

    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => {
            if *e != RoleError::ServerError {
                debug!(operation, reason = %e, "Role operation rejected");
            }
            e.kind()
        }
    };
    counter!("role_operations_total", "operation" => operation, "outcome" => outcome).increment(1);

    result
}

async fn create_in(uow: &dyn RoleUnitOfWork, cmd: CreateRoleCommand) -> Result<Role, RoleError> {
    let roles = uow.roles();

    if roles
        .exists(&Filter::new().eq(RoleColumn::Name, cmd.name.as_str()))
        .await?
    {
        return Err(RoleError::NameExists);
    }
    if roles
        .exists(&Filter::new().eq(RoleColumn::Code, cmd.code.as_str()))
        .await?
    {
        return Err(RoleError::CodeExists);
    }

    Ok(roles.insert(&cmd.into_draft()).await?)
}

async fn update_in(uow: &dyn RoleUnitOfWork, cmd: UpdateRoleCommand) -> Result<(), RoleError> {
    let roles = uow.roles();
    let by_id = Filter::new().eq(RoleColumn::Id, cmd.id);

    let existing = roles
        .first(&by_id, &FindOptions::default())
        .await?
        .ok_or(RoleError::NotFound)?;

    // 超级管理员的编码不可修改
    if existing.is_super_admin() && existing.code != cmd.code {
        return Err(RoleError::SuperAdminProtected);
    }

    // 名称或编码未变化时不做唯一性检查
    if existing.name != cmd.name
        && roles
            .exists(
                &Filter::new()
                    .eq(RoleColumn::Name, cmd.name.as_str())
                    .ne(RoleColumn::Id, cmd.id),
            )
            .await?
    {
        return Err(RoleError::NameExists);
    }
    if existing.code != cmd.code
        && roles
            .exists(
                &Filter::new()
                    .eq(RoleColumn::Code, cmd.code.as_str())
                    .ne(RoleColumn::Id, cmd.id),
            )
            .await?
    {
        return Err(RoleError::CodeExists);
    }

    // 并发删除后行已不可见
    if roles.update(&by_id, &cmd.into_draft()).await? == 0 {
        return Err(RoleError::NotFound);
    }
    Ok(())
}

async fn delete_in(uow: &dyn RoleUnitOfWork, cmd: DeleteRolesCommand) -> Result<u64, RoleError> {
    let ids = cmd.distinct_ids();
    let roles = uow.roles();

    let found = roles
        .find(
            &Filter::new().is_in(RoleColumn::Id, ids.iter().copied()),
            &FindOptions::default(),
        )
        .await?;

    if found.len() < ids.len() {
        return Err(RoleError::NotFound);
    }
    if found.iter().any(Role::is_super_admin) {
        return Err(RoleError::SuperAdminProtected);
    }

    let unlinked = uow
        .user_roles()
        .delete(&Filter::new().is_in(UserRoleColumn::RoleId, ids.iter().copied()))
        .await?;
    let deleted = roles
        .delete(&Filter::new().is_in(RoleColumn::Id, ids.iter().copied()))
        .await?;

    debug!(unlinked, deleted, "Role associations removed");
    Ok(deleted)
}
