//! 角色应用层模块

pub mod commands;
pub mod error;
pub mod queries;
pub mod service;

pub use commands::*;
pub use error::RoleError;
pub use queries::*;
pub use service::RoleAdministrationService;
