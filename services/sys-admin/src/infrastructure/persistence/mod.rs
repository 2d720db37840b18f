//! 持久化实现
//!
//! `postgres` 为生产实现；`memory` 为语义一致的内存实现，供测试使用。

pub mod db_metrics;
pub mod error_mapper;
pub mod memory;
pub mod postgres;
pub mod unit_of_work;

pub use memory::{Fault, MemoryFacade, MemoryStore, MemoryUnitOfWork};
pub use postgres::{PgFacade, PgHandle, PgTable, SharedTx};
pub use unit_of_work::{PostgresUnitOfWork, PostgresUnitOfWorkFactory};
