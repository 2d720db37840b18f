//! Unit of Work 模式
//!
//! 角色管理的写操作在一个事务中协调 `sys_role` 与 `sys_user_role`。

use async_trait::async_trait;
use rbac_errors::AppResult;
use rbac_ports::{QueryFacade, UnitOfWork};

use crate::domain::role::{RoleTable, UserRoleTable};

/// 角色管理 Unit of Work
///
/// 返回的门面都绑定到同一个事务，彼此可见对方的写入。
pub trait RoleUnitOfWork: UnitOfWork {
    /// 角色表
    fn roles(&self) -> &dyn QueryFacade<RoleTable>;

    /// 用户角色关联表
    fn user_roles(&self) -> &dyn QueryFacade<UserRoleTable>;
}

/// Unit of Work 工厂 trait
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    /// 开始新的事务
    async fn begin(&self) -> AppResult<Box<dyn RoleUnitOfWork>>;
}
