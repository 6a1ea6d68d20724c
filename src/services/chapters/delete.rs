use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::ChapterService;
use crate::config::get_config;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{
    current_user, find_chapter, find_course, not_found, require_course_owner,
};
use crate::utils::error_response;
use crate::utils::upload::remove_uploaded_files;

pub async fn delete_chapter(
    service: &ChapterService,
    request: &HttpRequest,
    chapter_id: i64,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let chapter = unwrap_or_respond!(find_chapter(&storage, request, chapter_id).await);
    let course = unwrap_or_respond!(find_course(&storage, request, chapter.course_id).await);
    unwrap_or_respond!(require_course_owner(&actor, &course));

    match storage.delete_chapter(chapter.id).await {
        Ok(Some(files)) => {
            let config = get_config(request);
            remove_uploaded_files(&config.upload.dir, &files).await;
            info!(
                "Chapter {} deleted from course {} by user {}",
                chapter.id, course.id, actor.id
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("章节已删除")))
        }
        Ok(None) => Ok(not_found(ErrorCode::ChapterNotFound, "章节不存在")),
        Err(e) => Ok(error_response(request, &e)),
    }
}
