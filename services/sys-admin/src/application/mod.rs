//! 应用层模块

pub mod role;

pub use role::{
    CreateRoleCommand, DeleteRolesCommand, ListRolesQuery, RoleAdministrationService, RoleError,
    UpdateRoleCommand,
};
