//! 角色相关命令定义

use std::collections::BTreeSet;

use crate::domain::role::{RoleDraft, RoleId, RoleStatus};

const NAME_MAX_LEN: usize = 64;
const CODE_MAX_LEN: usize = 64;
const TEXT_MAX_LEN: usize = 255;

/// 名称、编码及可选字段的公共校验
fn validate_fields(
    name: &str,
    code: &str,
    default_router: Option<&str>,
    remark: Option<&str>,
    sort: i64,
) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Role name cannot be empty".to_string());
    }
    if name.chars().count() > NAME_MAX_LEN {
        return Err(format!("Role name cannot exceed {} characters", NAME_MAX_LEN));
    }
    if code.trim().is_empty() {
        return Err("Role code cannot be empty".to_string());
    }
    if code.chars().count() > CODE_MAX_LEN {
        return Err(format!("Role code cannot exceed {} characters", CODE_MAX_LEN));
    }
    if default_router.is_some_and(|r| r.chars().count() > TEXT_MAX_LEN) {
        return Err(format!(
            "Default router cannot exceed {} characters",
            TEXT_MAX_LEN
        ));
    }
    if remark.is_some_and(|r| r.chars().count() > TEXT_MAX_LEN) {
        return Err(format!("Remark cannot exceed {} characters", TEXT_MAX_LEN));
    }
    if sort < 0 {
        return Err("Sort must be greater than or equal to 0".to_string());
    }
    Ok(())
}

/// 创建角色命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleCommand {
    pub name: String,
    pub code: String,
    pub default_router: Option<String>,
    /// 缺省为启用
    pub status: Option<RoleStatus>,
    pub remark: Option<String>,
    pub sort: i64,
}

impl CreateRoleCommand {
    /// 验证命令参数
    pub fn validate(&self) -> Result<(), String> {
        validate_fields(
            &self.name,
            &self.code,
            self.default_router.as_deref(),
            self.remark.as_deref(),
            self.sort,
        )
    }

    pub fn into_draft(self) -> RoleDraft {
        RoleDraft {
            name: self.name,
            code: self.code,
            default_router: self.default_router,
            status: self.status.unwrap_or_default(),
            remark: self.remark,
            sort: self.sort,
        }
    }
}

/// 更新角色命令
///
/// 全量覆盖：缺省的可选字段写为 NULL，缺省状态写为启用。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRoleCommand {
    pub id: RoleId,
    pub name: String,
    pub code: String,
    pub default_router: Option<String>,
    pub status: Option<RoleStatus>,
    pub remark: Option<String>,
    pub sort: i64,
}

impl UpdateRoleCommand {
    /// 验证命令参数
    pub fn validate(&self) -> Result<(), String> {
        if self.id.0 <= 0 {
            return Err("Role id must be positive".to_string());
        }
        validate_fields(
            &self.name,
            &self.code,
            self.default_router.as_deref(),
            self.remark.as_deref(),
            self.sort,
        )
    }

    pub fn into_draft(self) -> RoleDraft {
        RoleDraft {
            name: self.name,
            code: self.code,
            default_router: self.default_router,
            status: self.status.unwrap_or_default(),
            remark: self.remark,
            sort: self.sort,
        }
    }
}

/// 批量删除角色命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRolesCommand {
    pub ids: Vec<RoleId>,
}

impl DeleteRolesCommand {
    pub fn new(ids: impl IntoIterator<Item = RoleId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// 验证命令参数
    pub fn validate(&self) -> Result<(), String> {
        if self.ids.is_empty() {
            return Err("Role ids cannot be empty".to_string());
        }
        Ok(())
    }

    /// 去重后的 ID 集合
    pub fn distinct_ids(&self) -> BTreeSet<RoleId> {
        self.ids.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(name: &str, code: &str, sort: i64) -> CreateRoleCommand {
        CreateRoleCommand {
            name: name.to_string(),
            code: code.to_string(),
            default_router: None,
            status: None,
            remark: None,
            sort,
        }
    }

    #[test]
    fn test_create_validation() {
        assert!(create("运维", "ops", 0).validate().is_ok());
        assert!(create("", "ops", 0).validate().is_err());
        assert!(create("  ", "ops", 0).validate().is_err());
        assert!(create("运维", "", 0).validate().is_err());
        assert!(create("运维", "ops", -1).validate().is_err());
        assert!(create(&"x".repeat(65), "ops", 0).validate().is_err());
        // 按字符而非字节计数
        assert!(create(&"角".repeat(64), "ops", 0).validate().is_ok());
    }

    #[test]
    fn test_create_defaults_to_enabled() {
        let draft = create("运维", "ops", 2).into_draft();
        assert_eq!(draft.status, RoleStatus::Enabled);
        assert_eq!(draft.sort, 2);
    }

    #[test]
    fn test_update_is_full_replace() {
        let cmd = UpdateRoleCommand {
            id: RoleId(3),
            name: "运维".to_string(),
            code: "ops".to_string(),
            default_router: None,
            status: None,
            remark: None,
            sort: 1,
        };
        assert!(cmd.validate().is_ok());

        let draft = cmd.into_draft();
        assert_eq!(draft.status, RoleStatus::Enabled);
        assert_eq!(draft.remark, None);
        assert_eq!(draft.default_router, None);
    }

    #[test]
    fn test_update_rejects_non_positive_id() {
        let cmd = UpdateRoleCommand {
            id: RoleId(0),
            name: "运维".to_string(),
            code: "ops".to_string(),
            default_router: None,
            status: Some(RoleStatus::Disabled),
            remark: None,
            sort: 1,
        };
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn test_delete_requires_ids_and_dedups() {
        assert!(DeleteRolesCommand::new([]).validate().is_err());

        let cmd = DeleteRolesCommand::new([RoleId(3), RoleId(1), RoleId(3)]);
        assert!(cmd.validate().is_ok());
        assert_eq!(
            cmd.distinct_ids().into_iter().collect::<Vec<_>>(),
            vec![RoleId(1), RoleId(3)]
        );
    }
}
