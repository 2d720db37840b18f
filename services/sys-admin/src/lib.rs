//! sys-admin - 角色管理服务
//!
//! 角色的创建、更新、批量删除与查询；写操作在单个事务中完成，
//! 名称与编码在未删除的角色间唯一。

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;

use rbac_adapter_postgres::Migration;

/// 内嵌的数据库迁移
pub fn migrations() -> Vec<Migration> {
    vec![Migration::new(
        1,
        "init",
        include_str!("../migrations/0001_init.sql"),
    )]
}
