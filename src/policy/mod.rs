//! 访问控制策略
//!
//! 所有业务入口在读写资源前都通过 [`authorize`] 判定，
//! 角色与归属的比较只在这里出现。

use actix_web::HttpResponse;
use tracing::debug;

use crate::models::users::entities::{User, UserRole};
use crate::models::{ApiResponse, ErrorCode};

/// 被访问资源的归属描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyResource {
    /// 课程及其管理操作，归课程教师所有
    CourseOwned { teacher_id: i64 },
    /// 课程内容（章节、作业、资源），已选课的学生可读
    CourseContent { teacher_id: i64, enrolled: bool },
    /// 用户自己的数据（选课记录、提交等）
    SelfOwned { owner_id: i64 },
    AdminOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
}

pub fn can_access(actor: &User, resource: PolicyResource, action: Action) -> bool {
    if !actor.is_active() {
        return false;
    }
    if actor.role == UserRole::Admin {
        return true;
    }

    match resource {
        PolicyResource::CourseOwned { teacher_id } => {
            actor.role == UserRole::Teacher && actor.id == teacher_id
        }
        PolicyResource::CourseContent {
            teacher_id,
            enrolled,
        } => match actor.role {
            UserRole::Teacher => actor.id == teacher_id,
            UserRole::Student => action == Action::Read && enrolled,
            UserRole::Admin => true,
        },
        PolicyResource::SelfOwned { owner_id } => actor.id == owner_id,
        PolicyResource::AdminOnly => false,
    }
}

/// 判定失败时返回统一的 403 响应
pub fn authorize(
    actor: &User,
    resource: PolicyResource,
    action: Action,
) -> Result<(), HttpResponse> {
    if can_access(actor, resource, action) {
        return Ok(());
    }
    debug!(
        "Access denied for user {} ({}) on {:?} ({:?})",
        actor.id, actor.role, resource, action
    );
    Err(HttpResponse::Forbidden().json(ApiResponse::error_empty(
        ErrorCode::Forbidden,
        "没有权限执行此操作",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserStatus;

    fn user(id: i64, role: UserRole) -> User {
        let now = chrono::Utc::now();
        User {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            password_hash: String::new(),
            role,
            status: UserStatus::Active,
            name: None,
            avatar_url: None,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_admin_passes_everything() {
        let admin = user(1, UserRole::Admin);
        assert!(can_access(&admin, PolicyResource::AdminOnly, Action::Write));
        assert!(can_access(
            &admin,
            PolicyResource::CourseOwned { teacher_id: 9 },
            Action::Write
        ));
        assert!(can_access(
            &admin,
            PolicyResource::SelfOwned { owner_id: 9 },
            Action::Read
        ));
    }

    #[test]
    fn test_teacher_only_owns_own_courses() {
        let teacher = user(2, UserRole::Teacher);
        assert!(can_access(
            &teacher,
            PolicyResource::CourseOwned { teacher_id: 2 },
            Action::Write
        ));
        assert!(!can_access(
            &teacher,
            PolicyResource::CourseOwned { teacher_id: 3 },
            Action::Read
        ));
        // 教师即使“选课”也不能访问他人课程内容
        assert!(!can_access(
            &teacher,
            PolicyResource::CourseContent {
                teacher_id: 3,
                enrolled: true
            },
            Action::Read
        ));
        assert!(!can_access(&teacher, PolicyResource::AdminOnly, Action::Read));
    }

    #[test]
    fn test_student_reads_enrolled_content_only() {
        let student = user(5, UserRole::Student);
        let enrolled = PolicyResource::CourseContent {
            teacher_id: 2,
            enrolled: true,
        };
        assert!(can_access(&student, enrolled, Action::Read));
        assert!(!can_access(&student, enrolled, Action::Write));
        assert!(!can_access(
            &student,
            PolicyResource::CourseContent {
                teacher_id: 2,
                enrolled: false
            },
            Action::Read
        ));
        assert!(!can_access(
            &student,
            PolicyResource::CourseOwned { teacher_id: 5 },
            Action::Read
        ));
        assert!(can_access(
            &student,
            PolicyResource::SelfOwned { owner_id: 5 },
            Action::Write
        ));
        assert!(!can_access(
            &student,
            PolicyResource::SelfOwned { owner_id: 6 },
            Action::Read
        ));
    }

    #[test]
    fn test_disabled_actor_is_denied() {
        let mut admin = user(1, UserRole::Admin);
        admin.status = UserStatus::Disabled;
        assert!(!can_access(&admin, PolicyResource::AdminOnly, Action::Read));
        assert!(authorize(&admin, PolicyResource::AdminOnly, Action::Read).is_err());
    }
}
