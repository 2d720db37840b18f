//! rbac-ports - 抽象 trait 层
//!
//! 定义持久化的抽象接口：通用查询模型、表级 QueryFacade 与 Unit of Work

mod facade;
mod query;
mod unit_of_work;

pub use facade::*;
pub use query::*;
pub use unit_of_work::*;
