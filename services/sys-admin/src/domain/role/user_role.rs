//! 用户角色关联

use chrono::{DateTime, Utc};
use rbac_ports::{Column, Table, Value};
use serde::{Deserialize, Serialize};

use super::role::RoleId;

/// 用户角色关联唯一约束
pub const USER_ROLE_UNIQUE: &str = "uk_sys_user_role";

/// 用户与角色的关联记录
///
/// 由用户分配流程创建；删除角色时随之物理删除。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub id: i64,
    pub user_id: i64,
    pub role_id: RoleId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRoleDraft {
    pub user_id: i64,
    pub role_id: RoleId,
}

/// `sys_user_role` 列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRoleColumn {
    Id,
    UserId,
    RoleId,
    CreatedAt,
    UpdatedAt,
}

impl Column for UserRoleColumn {
    fn name(&self) -> &'static str {
        match self {
            UserRoleColumn::Id => "id",
            UserRoleColumn::UserId => "user_id",
            UserRoleColumn::RoleId => "role_id",
            UserRoleColumn::CreatedAt => "created_at",
            UserRoleColumn::UpdatedAt => "updated_at",
        }
    }
}

/// `sys_user_role` 表（无软删除）
pub struct UserRoleTable;

impl Table for UserRoleTable {
    type Column = UserRoleColumn;
    type Record = UserRole;
    type Draft = UserRoleDraft;

    const NAME: &'static str = "sys_user_role";
    const DELETED_AT: Option<UserRoleColumn> = None;

    fn value(row: &UserRole, column: UserRoleColumn) -> Value {
        match column {
            UserRoleColumn::Id => row.id.into(),
            UserRoleColumn::UserId => row.user_id.into(),
            UserRoleColumn::RoleId => row.role_id.into(),
            UserRoleColumn::CreatedAt => row.created_at.into(),
            UserRoleColumn::UpdatedAt => row.updated_at.into(),
        }
    }
}
