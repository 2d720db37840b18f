//! 角色实体

use chrono::{DateTime, Utc};
use derive_more::{Display, From};
use rbac_ports::{Column, Table, Value};
use serde::{Deserialize, Serialize};

/// 受保护的超级管理员角色编码
pub const SUPER_ADMIN_CODE: &str = "super-admin";

/// 角色名称唯一索引
pub const ROLE_NAME_UNIQUE: &str = "uk_sys_role_name";

/// 角色编码唯一索引
pub const ROLE_CODE_UNIQUE: &str = "uk_sys_role_code";

/// 角色 ID（数据库序列分配，不复用）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
)]
#[display("{_0}")]
#[serde(transparent)]
pub struct RoleId(pub i64);

impl From<RoleId> for Value {
    fn from(id: RoleId) -> Self {
        Value::Int(id.0)
    }
}

/// 角色状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
pub enum RoleStatus {
    #[default]
    Enabled,
    Disabled,
}

impl RoleStatus {
    pub fn as_i16(&self) -> i16 {
        match self {
            RoleStatus::Enabled => 1,
            RoleStatus::Disabled => 2,
        }
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(RoleStatus::Enabled),
            2 => Some(RoleStatus::Disabled),
            _ => None,
        }
    }
}

impl From<RoleStatus> for i16 {
    fn from(status: RoleStatus) -> Self {
        status.as_i16()
    }
}

impl TryFrom<i16> for RoleStatus {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        RoleStatus::from_i16(value).ok_or_else(|| format!("invalid role status: {}", value))
    }
}

impl From<RoleStatus> for Value {
    fn from(status: RoleStatus) -> Self {
        Value::Int(i64::from(status.as_i16()))
    }
}

/// 角色实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub code: String,
    pub default_router: Option<String>,
    pub status: RoleStatus,
    pub remark: Option<String>,
    pub sort: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Role {
    /// 是否为受保护的超级管理员角色
    pub fn is_super_admin(&self) -> bool {
        self.code == SUPER_ADMIN_CODE
    }
}

/// 角色可写字段
///
/// 插入与更新都写入全部字段；`None` 写为 NULL。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDraft {
    pub name: String,
    pub code: String,
    pub default_router: Option<String>,
    pub status: RoleStatus,
    pub remark: Option<String>,
    pub sort: i64,
}

/// 角色下拉选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleOption {
    pub id: RoleId,
    pub name: String,
}

impl From<Role> for RoleOption {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
        }
    }
}

/// `sys_role` 列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleColumn {
    Id,
    Name,
    Code,
    DefaultRouter,
    Status,
    Remark,
    Sort,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

impl Column for RoleColumn {
    fn name(&self) -> &'static str {
        match self {
            RoleColumn::Id => "id",
            RoleColumn::Name => "name",
            RoleColumn::Code => "code",
            RoleColumn::DefaultRouter => "default_router",
            RoleColumn::Status => "status",
            RoleColumn::Remark => "remark",
            RoleColumn::Sort => "sort",
            RoleColumn::CreatedAt => "created_at",
            RoleColumn::UpdatedAt => "updated_at",
            RoleColumn::DeletedAt => "deleted_at",
        }
    }
}

/// `sys_role` 表
pub struct RoleTable;

impl Table for RoleTable {
    type Column = RoleColumn;
    type Record = Role;
    type Draft = RoleDraft;

    const NAME: &'static str = "sys_role";
    const DELETED_AT: Option<RoleColumn> = Some(RoleColumn::DeletedAt);

    fn value(role: &Role, column: RoleColumn) -> Value {
        match column {
            RoleColumn::Id => role.id.into(),
            RoleColumn::Name => role.name.clone().into(),
            RoleColumn::Code => role.code.clone().into(),
            RoleColumn::DefaultRouter => role.default_router.clone().into(),
            RoleColumn::Status => role.status.into(),
            RoleColumn::Remark => role.remark.clone().into(),
            RoleColumn::Sort => role.sort.into(),
            RoleColumn::CreatedAt => role.created_at.into(),
            RoleColumn::UpdatedAt => role.updated_at.into(),
            RoleColumn::DeletedAt => role.deleted_at.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(RoleStatus::Enabled.as_i16(), 1);
        assert_eq!(RoleStatus::Disabled.as_i16(), 2);
        assert_eq!(RoleStatus::from_i16(2), Some(RoleStatus::Disabled));
        assert_eq!(RoleStatus::from_i16(0), None);
        assert_eq!(RoleStatus::default(), RoleStatus::Enabled);
    }

    #[test]
    fn test_status_serializes_as_number() {
        assert_eq!(serde_json::to_string(&RoleStatus::Disabled).unwrap(), "2");
        assert_eq!(
            serde_json::from_str::<RoleStatus>("1").unwrap(),
            RoleStatus::Enabled
        );
        assert!(serde_json::from_str::<RoleStatus>("3").is_err());
    }

    #[test]
    fn test_role_json_shape() {
        let now = Utc::now();
        let role = Role {
            id: RoleId(7),
            name: "运维".to_string(),
            code: "ops".to_string(),
            default_router: None,
            status: RoleStatus::Enabled,
            remark: Some("on call".to_string()),
            sort: 3,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let json = serde_json::to_value(&role).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["status"], 1);
        assert!(json["default_router"].is_null());
        assert!(json.get("deleted_at").is_none());
        assert!(!role.is_super_admin());
    }
}
