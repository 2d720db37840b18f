//! 角色相关查询定义

use rbac_common::PageRequest;
use rbac_ports::Filter;

use crate::domain::role::{RoleColumn, RoleStatus};

/// 每页数量下限
pub const MIN_PAGE_SIZE: u32 = 10;
/// 每页数量上限
pub const MAX_PAGE_SIZE: u32 = 100;

/// 角色分页查询
///
/// 名称与编码为区分大小写的子串匹配，多个条件取交集。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRolesQuery {
    pub name: Option<String>,
    pub code: Option<String>,
    pub status: Option<RoleStatus>,
    pub page: u32,
    pub size: u32,
}

impl ListRolesQuery {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            name: None,
            code: None,
            status: None,
            page,
            size,
        }
    }

    /// 验证查询参数
    pub fn validate(&self) -> Result<(), String> {
        if self.page < 1 {
            return Err("Page must be greater than or equal to 1".to_string());
        }
        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&self.size) {
            return Err(format!(
                "Size must be between {} and {}",
                MIN_PAGE_SIZE, MAX_PAGE_SIZE
            ));
        }
        Ok(())
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.size)
    }

    /// 过滤条件；空字符串等同于未指定
    pub fn filter(&self) -> Filter<RoleColumn> {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());

        Filter::new()
            .and_then(non_empty(&self.name), |f, name| {
                f.contains(RoleColumn::Name, name)
            })
            .and_then(non_empty(&self.code), |f, code| {
                f.contains(RoleColumn::Code, code)
            })
            .and_then(self.status, |f, status| f.eq(RoleColumn::Status, status))
    }
}
