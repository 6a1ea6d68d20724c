use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::AssignmentService;
use crate::config::get_config;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{
    current_user, find_assignment, find_course, not_found, require_course_owner,
};
use crate::utils::error_response;
use crate::utils::upload::remove_uploaded_files;

pub async fn delete_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let assignment = unwrap_or_respond!(find_assignment(&storage, request, assignment_id).await);
    let course = unwrap_or_respond!(find_course(&storage, request, assignment.course_id).await);
    unwrap_or_respond!(require_course_owner(&actor, &course));

    match storage.delete_assignment(assignment.id).await {
        Ok(Some(files)) => {
            let config = get_config(request);
            remove_uploaded_files(&config.upload.dir, &files).await;
            info!(
                "Assignment {} deleted by user {}, {} file(s) cleaned up",
                assignment.id,
                actor.id,
                files.len()
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("作业已删除")))
        }
        Ok(None) => Ok(not_found(ErrorCode::AssignmentNotFound, "作业不存在")),
        Err(e) => Ok(error_response(request, &e)),
    }
}
