//! 请求与响应 DTO

use serde::{Deserialize, Serialize};

use crate::application::{
    CreateRoleCommand, DeleteRolesCommand, ListRolesQuery, UpdateRoleCommand,
};
use crate::domain::role::{RoleId, RoleStatus};

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub code: String,
    pub default_router: Option<String>,
    /// 1 启用，2 禁用
    pub status: Option<RoleStatus>,
    pub remark: Option<String>,
    pub sort: i64,
}

impl From<CreateRoleRequest> for CreateRoleCommand {
    fn from(req: CreateRoleRequest) -> Self {
        Self {
            name: req.name,
            code: req.code,
            default_router: req.default_router,
            status: req.status,
            remark: req.remark,
            sort: req.sort,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateRoleResponse {
    pub id: RoleId,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub default_router: Option<String>,
    pub status: Option<RoleStatus>,
    pub remark: Option<String>,
    pub sort: i64,
}

impl From<UpdateRoleRequest> for UpdateRoleCommand {
    fn from(req: UpdateRoleRequest) -> Self {
        Self {
            id: RoleId(req.id),
            name: req.name,
            code: req.code,
            default_router: req.default_router,
            status: req.status,
            remark: req.remark,
            sort: req.sort,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteRolesRequest {
    pub ids: Vec<i64>,
}

impl From<DeleteRolesRequest> for DeleteRolesCommand {
    fn from(req: DeleteRolesRequest) -> Self {
        DeleteRolesCommand::new(req.ids.into_iter().map(RoleId))
    }
}

#[derive(Debug, Deserialize)]
pub struct ListRolesParams {
    pub name: Option<String>,
    pub code: Option<String>,
    pub status: Option<RoleStatus>,
    pub page: u32,
    pub size: u32,
}

impl From<ListRolesParams> for ListRolesQuery {
    fn from(params: ListRolesParams) -> Self {
        Self {
            name: params.name,
            code: params.code,
            status: params.status,
            page: params.page,
            size: params.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_optional_fields() {
        let req: CreateRoleRequest =
            serde_json::from_str(r#"{"name":"运维","code":"ops","sort":1}"#).unwrap();
        let cmd = CreateRoleCommand::from(req);

        assert_eq!(cmd.status, None);
        assert_eq!(cmd.default_router, None);
        assert_eq!(cmd.into_draft().status, RoleStatus::Enabled);
    }

    #[test]
    fn test_invalid_status_rejected() {
        let result = serde_json::from_str::<CreateRoleRequest>(
            r#"{"name":"运维","code":"ops","status":3,"sort":1}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_name_rejected() {
        let result = serde_json::from_str::<UpdateRoleRequest>(r#"{"id":1,"code":"ops","sort":1}"#);
        assert!(result.is_err());
    }
}
