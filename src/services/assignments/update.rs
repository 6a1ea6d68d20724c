use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::AssignmentService;
use crate::models::assignments::entities::AssignmentStatus;
use crate::models::assignments::requests::{
    UpdateAssignmentRequest, UpdateAssignmentStatusRequest,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{
    bad_request, current_user, find_assignment, find_course, not_found, require_course_owner,
};
use crate::utils::error_response;
use crate::utils::validate::validate_assignment_fields;

pub async fn update_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    update_data: UpdateAssignmentRequest,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let assignment = unwrap_or_respond!(find_assignment(&storage, request, assignment_id).await);
    let course = unwrap_or_respond!(find_course(&storage, request, assignment.course_id).await);
    unwrap_or_respond!(require_course_owner(&actor, &course));

    if assignment.status == AssignmentStatus::Published {
        return Ok(bad_request(
            ErrorCode::AssignmentPublishedReadOnly,
            "作业已发布，无法编辑，请先取消发布",
        ));
    }

    let update_data = UpdateAssignmentRequest {
        title: update_data.title.map(|t| t.trim().to_string()),
        description: update_data.description.map(|d| d.trim().to_string()),
        ..update_data
    };
    if let Err(msg) = validate_assignment_fields(
        update_data.title.as_deref(),
        update_data.description.as_deref(),
        update_data.total_score,
    ) {
        return Ok(bad_request(ErrorCode::ValidationError, msg));
    }

    match storage.update_assignment(assignment.id, update_data).await {
        Ok(Some(updated)) => {
            info!("Assignment {} updated by user {}", assignment.id, actor.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(updated, "作业更新成功")))
        }
        Ok(None) => Ok(not_found(ErrorCode::AssignmentNotFound, "作业不存在")),
        Err(e) => Ok(error_response(request, &e)),
    }
}

pub async fn update_assignment_status(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    status_data: UpdateAssignmentStatusRequest,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let assignment = unwrap_or_respond!(find_assignment(&storage, request, assignment_id).await);
    let course = unwrap_or_respond!(find_course(&storage, request, assignment.course_id).await);
    unwrap_or_respond!(require_course_owner(&actor, &course));

    let next = status_data.status;
    if !assignment.status.can_transition_to(next) {
        return Ok(bad_request(
            ErrorCode::AssignmentInvalidStatus,
            format!("作业状态不能从 {} 变更为 {}", assignment.status, next),
        ));
    }

    match storage.update_assignment_status(assignment.id, next).await {
        Ok(Some(updated)) => {
            info!(
                "Assignment {} status changed to {} by user {}",
                assignment.id, next, actor.id
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(updated, "作业状态已更新")))
        }
        Ok(None) => Ok(not_found(ErrorCode::AssignmentNotFound, "作业不存在")),
        Err(e) => Ok(error_response(request, &e)),
    }
}
