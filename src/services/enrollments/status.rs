use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{EnrollmentService, find_enrollment};
use crate::errors::LearnHubError;
use crate::models::enrollments::entities::EnrollmentStatus;
use crate::models::enrollments::requests::{
    UpdateEnrollmentProgressRequest, UpdateEnrollmentStatusRequest,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::policy::{Action, PolicyResource, authorize};
use crate::services::common::{bad_request, current_user, find_chapter, not_found};
use crate::utils::{error_response, error_response_with_code};

/// 退课、完成或恢复（已退课的记录不能恢复）
pub async fn update_status(
    service: &EnrollmentService,
    request: &HttpRequest,
    enrollment_id: i64,
    status_data: UpdateEnrollmentStatusRequest,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let enrollment = unwrap_or_respond!(find_enrollment(&storage, request, enrollment_id).await);
    unwrap_or_respond!(authorize(
        &actor,
        PolicyResource::SelfOwned {
            owner_id: enrollment.student_id,
        },
        Action::Write,
    ));

    match storage
        .update_enrollment_status(enrollment.id, status_data.status)
        .await
    {
        Ok(Some(updated)) => {
            info!(
                "Enrollment {} status {} -> {} by user {}",
                enrollment.id, enrollment.status, updated.status, actor.id
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(updated, "选课状态已更新")))
        }
        Ok(None) => Ok(not_found(ErrorCode::EnrollmentNotFound, "选课记录不存在")),
        Err(e @ LearnHubError::InvalidState(_)) => Ok(error_response_with_code(
            request,
            &e,
            ErrorCode::EnrollmentInvalidStatus,
        )),
        Err(e) => Ok(error_response(request, &e)),
    }
}

/// 通过选课记录标记章节完成，与学习接口共用同一份学习记录
pub async fn update_progress(
    service: &EnrollmentService,
    request: &HttpRequest,
    enrollment_id: i64,
    progress_data: UpdateEnrollmentProgressRequest,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let enrollment = unwrap_or_respond!(find_enrollment(&storage, request, enrollment_id).await);

    if enrollment.student_id != actor.id {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "只能更新自己的学习进度",
        )));
    }
    if enrollment.status != EnrollmentStatus::Active {
        return Ok(bad_request(
            ErrorCode::EnrollmentInvalidStatus,
            "选课记录不是进行中状态",
        ));
    }

    let chapter = unwrap_or_respond!(find_chapter(&storage, request, progress_data.chapter_id).await);
    if chapter.course_id != enrollment.course_id {
        return Ok(not_found(ErrorCode::ChapterNotFound, "章节不属于该课程"));
    }

    match storage.complete_chapter(actor.id, &chapter).await {
        Ok(progress) => Ok(HttpResponse::Ok().json(ApiResponse::success(progress, "学习进度已更新"))),
        Err(e) => Ok(error_response(request, &e)),
    }
}
