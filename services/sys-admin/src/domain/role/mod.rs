//! 角色领域模块

#![allow(clippy::module_inception)]

pub mod role;
pub mod user_role;

pub use role::{
    ROLE_CODE_UNIQUE, ROLE_NAME_UNIQUE, Role, RoleColumn, RoleDraft, RoleId, RoleOption,
    RoleStatus, RoleTable, SUPER_ADMIN_CODE,
};
pub use user_role::{USER_ROLE_UNIQUE, UserRole, UserRoleColumn, UserRoleDraft, UserRoleTable};
