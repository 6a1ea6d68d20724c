use super::entities::{Theme, UserRole, UserStatus};
use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

// 用户查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct UserListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub search: Option<String>,
}

// 用户列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub search: Option<String>,
}

impl From<UserListParams> for UserListQuery {
    fn from(params: UserListParams) -> Self {
        Self {
            page: Some(params.pagination.page),
            size: Some(params.pagination.size),
            role: params.role,
            status: params.status,
            search: params.search,
        }
    }
}

// 用户创建请求（用于存储层，password 为哈希后的值）
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub name: Option<String>,
}

// 用户更新请求（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub name: Option<String>,
    // Some(None) 表示清空头像
    pub avatar_url: Option<Option<String>>,
}

// 个人资料更新请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

// 管理员更新用户请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct AdminUpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

// 通知偏好的部分更新
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct NotificationSettingsPatch {
    pub email: Option<bool>,
    pub assignment: Option<bool>,
    pub exam: Option<bool>,
}

// 用户设置更新请求
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct UpdateSettingsRequest {
    pub notification: Option<NotificationSettingsPatch>,
    pub theme: Option<Theme>,
}
