use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::CourseService;
use crate::config::get_config;
use crate::errors::LearnHubError;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{current_user, find_course, not_found, require_course_owner};
use crate::utils::upload::remove_uploaded_files;
use crate::utils::{error_response, error_response_with_code};

pub async fn delete_course(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let course = unwrap_or_respond!(find_course(&storage, request, course_id).await);
    unwrap_or_respond!(require_course_owner(&actor, &course));

    match storage.delete_course(course_id).await {
        Ok(Some(files)) => {
            // 数据库事务已提交，文件清理失败只记录日志
            let config = get_config(request);
            remove_uploaded_files(&config.upload.dir, &files).await;
            info!(
                "Course {} deleted by user {}, {} file(s) cleaned up",
                course_id,
                actor.id,
                files.len()
            );
            Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty("课程已删除")))
        }
        Ok(None) => Ok(not_found(ErrorCode::CourseNotFound, "课程不存在")),
        Err(e @ LearnHubError::InvalidState(_)) => Ok(error_response_with_code(
            request,
            &e,
            ErrorCode::CourseHasEnrollments,
        )),
        Err(e) => Ok(error_response(request, &e)),
    }
}
