use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::CourseService;
use crate::models::courses::entities::{Course, CourseStatus};
use crate::models::courses::responses::CourseDetailResponse;
use crate::models::users::entities::{User, UserRole};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{current_user, find_course, not_found};
use crate::storage::Storage;
use crate::utils::error_response;

pub async fn get_course(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let course = unwrap_or_respond!(find_course(&storage, request, course_id).await);

    let enrolled = if actor.role == UserRole::Student {
        match storage.get_live_enrollment(course.id, actor.id).await {
            Ok(enrollment) => enrollment.is_some(),
            Err(e) => return Ok(error_response(request, &e)),
        }
    } else {
        false
    };
    unwrap_or_respond!(check_course_visible(&actor, &course, enrolled));

    let chapters = match storage.list_chapters_by_course(course.id).await {
        Ok(chapters) => chapters,
        Err(e) => return Ok(error_response(request, &e)),
    };
    let teacher = unwrap_or_respond!(load_teacher(&storage, request, course.teacher_id).await);

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        CourseDetailResponse {
            course,
            teacher,
            chapters,
            enrolled,
        },
        "获取课程详情成功",
    )))
}

/// 课程详情的可见性
///
/// 已发布课程对所有人可见；未发布课程只对教师本人与管理员可见，
/// 已关闭课程对仍在读的学生可见。学生看不到时返回 404，其他教师返回 403。
fn check_course_visible(actor: &User, course: &Course, enrolled: bool) -> Result<(), HttpResponse> {
    let visible = match actor.role {
        UserRole::Admin => true,
        UserRole::Teacher => course.status == CourseStatus::Published || course.teacher_id == actor.id,
        UserRole::Student => {
            course.status == CourseStatus::Published
                || (course.status == CourseStatus::Closed && enrolled)
        }
    };
    if visible {
        return Ok(());
    }
    if actor.role == UserRole::Student {
        Err(not_found(ErrorCode::CourseNotFound, "课程不存在"))
    } else {
        Err(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "无权查看该课程",
        )))
    }
}

async fn load_teacher(
    storage: &Arc<dyn Storage>,
    request: &HttpRequest,
    teacher_id: i64,
) -> Result<Option<crate::models::users::entities::UserBrief>, HttpResponse> {
    match storage.get_user_by_id(teacher_id).await {
        Ok(user) => Ok(user.map(|u| u.brief())),
        Err(e) => Err(error_response(request, &e)),
    }
}
