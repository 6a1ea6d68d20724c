//! 各业务服务共用的查找与鉴权辅助函数
//!
//! 返回 `Result<_, HttpResponse>`，错误分支已经是可直接返回的响应。

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, web};

use crate::cache::{ObjectCache, user_cache_key};
use crate::middlewares::RequireJWT;
use crate::models::assignments::entities::Assignment;
use crate::models::chapters::entities::Chapter;
use crate::models::courses::entities::{Course, CourseStatus};
use crate::models::enrollments::entities::EnrollmentStatus;
use crate::models::users::entities::{User, UserRole};
use crate::models::{ApiResponse, ErrorCode};
use crate::policy::{Action, PolicyResource, authorize};
use crate::storage::Storage;
use crate::utils::error_response;

pub(crate) fn get_cache(request: &HttpRequest) -> Arc<dyn ObjectCache> {
    request
        .app_data::<web::Data<Arc<dyn ObjectCache>>>()
        .expect("Cache not found in app data")
        .get_ref()
        .clone()
}

/// 用户资料变化后清除认证缓存
pub(crate) async fn invalidate_user(request: &HttpRequest, user_id: i64) {
    get_cache(request).remove(&user_cache_key(user_id)).await;
}

pub(crate) fn current_user(request: &HttpRequest) -> Result<User, HttpResponse> {
    RequireJWT::extract_user_claims(request).ok_or_else(|| {
        HttpResponse::Unauthorized().json(ApiResponse::error_empty(ErrorCode::Unauthorized, "未登录"))
    })
}

pub(crate) fn bad_request(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(code, message))
}

pub(crate) fn not_found(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(code, message))
}

pub(crate) async fn find_course(
    storage: &Arc<dyn Storage>,
    request: &HttpRequest,
    course_id: i64,
) -> Result<Course, HttpResponse> {
    match storage.get_course_by_id(course_id).await {
        Ok(Some(course)) => Ok(course),
        Ok(None) => Err(not_found(ErrorCode::CourseNotFound, "课程不存在")),
        Err(e) => Err(error_response(request, &e)),
    }
}

pub(crate) async fn find_chapter(
    storage: &Arc<dyn Storage>,
    request: &HttpRequest,
    chapter_id: i64,
) -> Result<Chapter, HttpResponse> {
    match storage.get_chapter_by_id(chapter_id).await {
        Ok(Some(chapter)) => Ok(chapter),
        Ok(None) => Err(not_found(ErrorCode::ChapterNotFound, "章节不存在")),
        Err(e) => Err(error_response(request, &e)),
    }
}

pub(crate) async fn find_assignment(
    storage: &Arc<dyn Storage>,
    request: &HttpRequest,
    assignment_id: i64,
) -> Result<Assignment, HttpResponse> {
    match storage.get_assignment_by_id(assignment_id).await {
        Ok(Some(assignment)) => Ok(assignment),
        Ok(None) => Err(not_found(ErrorCode::AssignmentNotFound, "作业不存在")),
        Err(e) => Err(error_response(request, &e)),
    }
}

/// 学生在课程中是否有进行中（active）的选课
pub(crate) async fn is_actively_enrolled(
    storage: &Arc<dyn Storage>,
    request: &HttpRequest,
    course_id: i64,
    student_id: i64,
) -> Result<bool, HttpResponse> {
    match storage.get_live_enrollment(course_id, student_id).await {
        Ok(enrollment) => {
            Ok(enrollment.is_some_and(|e| e.status == EnrollmentStatus::Active))
        }
        Err(e) => Err(error_response(request, &e)),
    }
}

/// 课程管理操作：课程教师或管理员
pub(crate) fn require_course_owner(actor: &User, course: &Course) -> Result<(), HttpResponse> {
    authorize(
        actor,
        PolicyResource::CourseOwned {
            teacher_id: course.teacher_id,
        },
        Action::Write,
    )
}

/// 课程内容访问：课程教师、管理员或已选课学生（只读）
///
/// 学生只能访问已发布或已关闭课程的内容。
pub(crate) async fn require_course_content(
    storage: &Arc<dyn Storage>,
    request: &HttpRequest,
    actor: &User,
    course: &Course,
    action: Action,
) -> Result<(), HttpResponse> {
    let enrolled = if actor.role == UserRole::Student && course.status != CourseStatus::Draft {
        is_actively_enrolled(storage, request, course.id, actor.id).await?
    } else {
        false
    };
    authorize(
        actor,
        PolicyResource::CourseContent {
            teacher_id: course.teacher_id,
            enrolled,
        },
        action,
    )
}
