use serde::Deserialize;
use ts_rs::TS;

use crate::models::users::entities::UserRole;

// 用户登录请求（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "auth.ts")]
pub struct LoginRequest {
    /// 用户名或邮箱
    pub username: String,
    /// 密码
    pub password: String,
    /// 是否记住我
    #[serde(default)]
    pub remember_me: bool,
}

// 用户注册请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "auth.ts")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    /// 只允许 student / teacher，缺省为 student
    pub role: Option<UserRole>,
}

// 修改密码请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "auth.ts")]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}
