use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::ChapterService;
use crate::errors::LearnHubError;
use crate::models::chapters::requests::UpdateChapterRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{
    bad_request, current_user, find_chapter, find_course, not_found, require_course_owner,
};
use crate::utils::validate::validate_chapter_fields;
use crate::utils::{error_response, error_response_with_code};

pub async fn update_chapter(
    service: &ChapterService,
    request: &HttpRequest,
    chapter_id: i64,
    update_data: UpdateChapterRequest,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let chapter = unwrap_or_respond!(find_chapter(&storage, request, chapter_id).await);
    let course = unwrap_or_respond!(find_course(&storage, request, chapter.course_id).await);
    unwrap_or_respond!(require_course_owner(&actor, &course));

    let update_data = UpdateChapterRequest {
        title: update_data.title.map(|t| t.trim().to_string()),
        ..update_data
    };
    if let Err(msg) = validate_chapter_fields(
        update_data.title.as_deref(),
        update_data.duration,
        update_data.order,
    ) {
        return Ok(bad_request(ErrorCode::ValidationError, msg));
    }

    match storage.update_chapter(chapter.id, update_data).await {
        Ok(Some(chapter)) => {
            info!("Chapter {} updated by user {}", chapter.id, actor.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(chapter, "章节更新成功")))
        }
        Ok(None) => Ok(not_found(ErrorCode::ChapterNotFound, "章节不存在")),
        Err(e @ LearnHubError::Conflict(_)) => Ok(error_response_with_code(
            request,
            &e,
            ErrorCode::ChapterOrderConflict,
        )),
        Err(e) => Ok(error_response(request, &e)),
    }
}
