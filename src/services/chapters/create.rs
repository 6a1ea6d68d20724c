use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::ChapterService;
use crate::errors::LearnHubError;
use crate::models::chapters::requests::CreateChapterRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{bad_request, current_user, find_course, require_course_owner};
use crate::utils::validate::validate_chapter_fields;
use crate::utils::{error_response, error_response_with_code};

pub async fn create_chapter(
    service: &ChapterService,
    request: &HttpRequest,
    course_id: i64,
    chapter_data: CreateChapterRequest,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let course = unwrap_or_respond!(find_course(&storage, request, course_id).await);
    unwrap_or_respond!(require_course_owner(&actor, &course));

    let chapter_data = CreateChapterRequest {
        title: chapter_data.title.trim().to_string(),
        ..chapter_data
    };
    if let Err(msg) = validate_chapter_fields(
        Some(&chapter_data.title),
        chapter_data.duration,
        chapter_data.order,
    ) {
        return Ok(bad_request(ErrorCode::ValidationError, msg));
    }

    match storage.create_chapter(course.id, chapter_data).await {
        Ok(chapter) => {
            info!(
                "Chapter {} (order {}) created in course {} by user {}",
                chapter.id, chapter.order, course.id, actor.id
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(chapter, "章节创建成功")))
        }
        Err(e @ LearnHubError::Conflict(_)) => Ok(error_response_with_code(
            request,
            &e,
            ErrorCode::ChapterOrderConflict,
        )),
        Err(e) => Ok(error_response(request, &e)),
    }
}
