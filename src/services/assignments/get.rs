use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AssignmentService;
use crate::models::assignments::entities::AssignmentStatus;
use crate::models::assignments::responses::AssignmentDetailResponse;
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode};
use crate::policy::Action;
use crate::services::common::{
    current_user, find_assignment, find_course, not_found, require_course_content,
};
use crate::utils::error_response;

pub async fn get_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let assignment = unwrap_or_respond!(find_assignment(&storage, request, assignment_id).await);
    let course = unwrap_or_respond!(find_course(&storage, request, assignment.course_id).await);
    unwrap_or_respond!(require_course_content(&storage, request, &actor, &course, Action::Read).await);

    let is_student = actor.role == UserRole::Student;
    // 草稿作业对学生不可见
    if is_student && assignment.status == AssignmentStatus::Draft {
        return Ok(not_found(ErrorCode::AssignmentNotFound, "作业不存在"));
    }

    let assignment = match storage.get_assignment_with_attachments(assignment.id).await {
        Ok(Some(assignment)) => assignment,
        Ok(None) => return Ok(not_found(ErrorCode::AssignmentNotFound, "作业不存在")),
        Err(e) => return Ok(error_response(request, &e)),
    };

    let my_submission = if is_student {
        match storage
            .get_student_submission(assignment.assignment.id, actor.id)
            .await
        {
            Ok(submission) => submission,
            Err(e) => return Ok(error_response(request, &e)),
        }
    } else {
        None
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        AssignmentDetailResponse {
            assignment,
            course_title: course.title,
            my_submission,
        },
        "获取作业详情成功",
    )))
}
