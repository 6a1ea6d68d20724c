use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::CourseService;
use super::create::check_title_available;
use crate::models::courses::entities::CourseStatus;
use crate::models::courses::requests::{UpdateCourseRequest, UpdateCourseStatusRequest};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{bad_request, current_user, find_course, not_found, require_course_owner};
use crate::utils::error_response;
use crate::utils::validate::validate_course_fields;

pub async fn update_course(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
    update_data: UpdateCourseRequest,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let course = unwrap_or_respond!(find_course(&storage, request, course_id).await);
    unwrap_or_respond!(require_course_owner(&actor, &course));

    if course.status == CourseStatus::Published {
        return Ok(bad_request(
            ErrorCode::CoursePublishedReadOnly,
            "课程已发布，无法编辑，请先取消发布",
        ));
    }

    let update_data = UpdateCourseRequest {
        title: update_data.title.map(|t| t.trim().to_string()),
        description: update_data.description.map(|d| d.trim().to_string()),
        ..update_data
    };
    if let Err(msg) = validate_course_fields(
        update_data.title.as_deref(),
        update_data.description.as_deref(),
        update_data.price,
    ) {
        return Ok(bad_request(ErrorCode::ValidationError, msg));
    }
    if let Some(title) = update_data.title.as_deref()
        && title != course.title
    {
        unwrap_or_respond!(
            check_title_available(&storage, request, course.teacher_id, title, Some(course.id))
                .await
        );
    }

    match storage.update_course(course_id, update_data).await {
        Ok(Some(course)) => {
            info!("Course {} updated by user {}", course_id, actor.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(course, "课程更新成功")))
        }
        Ok(None) => Ok(not_found(ErrorCode::CourseNotFound, "课程不存在")),
        Err(e) => Ok(error_response(request, &e)),
    }
}

pub async fn update_course_status(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
    status_data: UpdateCourseStatusRequest,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let course = unwrap_or_respond!(find_course(&storage, request, course_id).await);
    unwrap_or_respond!(require_course_owner(&actor, &course));

    let next = status_data.status;
    if !course.status.can_transition_to(next) {
        return Ok(bad_request(
            ErrorCode::CourseInvalidStatus,
            format!("课程状态不能从 {} 变更为 {}", course.status, next),
        ));
    }

    // 发布前置条件：标题、描述、封面与至少一个章节
    if next == CourseStatus::Published {
        let chapter_count = match storage.count_chapters_by_course(course.id).await {
            Ok(count) => count,
            Err(e) => return Ok(error_response(request, &e)),
        };
        let missing = course.publish_blockers(chapter_count);
        if !missing.is_empty() {
            return Ok(bad_request(
                ErrorCode::CoursePublishRequirement,
                format!("课程发布条件不满足，缺少: {}", missing.join(", ")),
            ));
        }
    }

    match storage.update_course_status(course_id, next).await {
        Ok(Some(course)) => {
            info!(
                "Course {} status changed to {} by user {}",
                course_id, next, actor.id
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(course, "课程状态已更新")))
        }
        Ok(None) => Ok(not_found(ErrorCode::CourseNotFound, "课程不存在")),
        Err(e) => Ok(error_response(request, &e)),
    }
}
