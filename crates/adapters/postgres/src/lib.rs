//! rbac-adapter-postgres - PostgreSQL 适配器
//!
//! 连接池、事务选项、嵌入式迁移，以及将通用查询模型渲染为参数化 SQL。

mod connection;
mod migration;
mod sql;
mod transaction;

pub use connection::*;
pub use migration::*;
pub use sql::*;
pub use transaction::*;
