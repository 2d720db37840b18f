//! 领域层

pub mod role;
pub mod unit_of_work;
