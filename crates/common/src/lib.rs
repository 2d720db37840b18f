//! rbac-common - 通用类型和工具库

pub mod context;
pub mod pagination;
pub mod retry;

pub use context::*;
pub use pagination::*;
pub use retry::*;
