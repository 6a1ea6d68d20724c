use serde::{Deserialize, Serialize};
use ts_rs::TS;

define_string_enum! {
    /// 用户角色
    UserRole, "用户角色", "user.ts" {
        Student => "student",
        Teacher => "teacher",
        Admin => "admin",
    }
}

impl UserRole {
    pub const STUDENT: &'static str = "student";
    pub const TEACHER: &'static str = "teacher";
    pub const ADMIN: &'static str = "admin";

    pub fn teacher_roles() -> &'static [&'static UserRole] {
        &[&Self::Teacher, &Self::Admin]
    }
    pub fn student_roles() -> &'static [&'static UserRole] {
        &[&Self::Student]
    }
}

define_string_enum! {
    /// 用户状态
    UserStatus, "用户状态", "user.ts" {
        Active => "active",
        Disabled => "disabled",
    }
}

// 用户实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)] // 不序列化到JSON响应中
    #[ts(skip)]
    pub password_hash: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub fn brief(&self) -> UserBrief {
        UserBrief {
            id: self.id,
            username: self.username.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

// 嵌入在其他响应中的用户摘要
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct UserBrief {
    pub id: i64,
    pub username: String,
    pub name: Option<String>,
    pub email: String,
    pub avatar_url: Option<String>,
}

define_string_enum! {
    /// 界面主题
    Theme, "主题", "user.ts" {
        Light => "light",
        Dark => "dark",
    }
}

// 通知偏好
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct NotificationSettings {
    pub email: bool,
    pub assignment: bool,
    pub exam: bool,
}

// 用户设置
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "user.ts")]
pub struct UserSettings {
    pub notification: NotificationSettings,
    pub theme: Theme,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            notification: NotificationSettings {
                email: true,
                assignment: true,
                exam: true,
            },
            theme: Theme::Light,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("teacher".parse::<UserRole>().unwrap(), UserRole::Teacher);
        assert_eq!(UserRole::Student.to_string(), UserRole::STUDENT);
        assert!("root".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_deserialize_error_message() {
        let err = serde_json::from_str::<UserRole>("\"guest\"").unwrap_err();
        assert!(err.to_string().contains("无效的用户角色"));
    }

    #[test]
    fn test_default_settings() {
        let settings = UserSettings::default();
        assert!(settings.notification.email);
        assert!(settings.notification.assignment);
        assert!(settings.notification.exam);
        assert_eq!(settings.theme, Theme::Light);
    }
}
