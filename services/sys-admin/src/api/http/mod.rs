//! HTTP 接口
//!
//! 业务结果统一包装为 `{code, data, msg}`，HTTP 状态码恒为 200。

pub mod dto;
pub mod handlers;
pub mod health;
pub mod response;
pub mod routes;

pub use health::{HealthProbe, PoolProbe};
pub use response::{ApiError, ApiResponse};
pub use routes::{AppState, router};
