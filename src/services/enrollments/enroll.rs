use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::EnrollmentService;
use crate::errors::LearnHubError;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::current_user;
use crate::utils::{error_response, error_response_with_code};

pub async fn enroll(
    service: &EnrollmentService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);

    // 课程存在性、发布状态与重复选课都在同一事务内检查
    match storage.enroll(course_id, actor.id).await {
        Ok(enrollment) => {
            info!("Student {} enrolled in course {}", actor.id, course_id);
            Ok(HttpResponse::Created().json(ApiResponse::success(enrollment, "选课成功")))
        }
        Err(e @ LearnHubError::NotFound(_)) => {
            Ok(error_response_with_code(request, &e, ErrorCode::CourseNotFound))
        }
        Err(e @ LearnHubError::InvalidState(_)) => {
            Ok(error_response_with_code(request, &e, ErrorCode::CourseInvalidStatus))
        }
        Err(e @ LearnHubError::Conflict(_)) => {
            Ok(error_response_with_code(request, &e, ErrorCode::AlreadyEnrolled))
        }
        Err(e) => Ok(error_response(request, &e)),
    }
}
