use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ChapterService;
use crate::models::ApiResponse;
use crate::models::chapters::responses::{ChapterDetailResponse, ChapterListResponse};
use crate::models::users::entities::UserRole;
use crate::policy::Action;
use crate::services::common::{current_user, find_chapter, find_course, require_course_content};
use crate::utils::error_response;

pub async fn list_chapters(
    service: &ChapterService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let course = unwrap_or_respond!(find_course(&storage, request, course_id).await);
    unwrap_or_respond!(require_course_content(&storage, request, &actor, &course, Action::Read).await);

    match storage.list_chapters_by_course(course.id).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            ChapterListResponse { items },
            "获取章节列表成功",
        ))),
        Err(e) => Ok(error_response(request, &e)),
    }
}

pub async fn get_chapter(
    service: &ChapterService,
    request: &HttpRequest,
    chapter_id: i64,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let chapter = unwrap_or_respond!(find_chapter(&storage, request, chapter_id).await);
    let course = unwrap_or_respond!(find_course(&storage, request, chapter.course_id).await);
    unwrap_or_respond!(require_course_content(&storage, request, &actor, &course, Action::Read).await);

    let resources = match storage.list_chapter_resources(chapter.id).await {
        Ok(resources) => resources,
        Err(e) => return Ok(error_response(request, &e)),
    };

    // 只有学生有学习记录
    let study_record = if actor.role == UserRole::Student {
        match storage.get_study_record(actor.id, chapter.id).await {
            Ok(record) => record,
            Err(e) => return Ok(error_response(request, &e)),
        }
    } else {
        None
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        ChapterDetailResponse {
            chapter,
            resources,
            study_record,
        },
        "获取章节详情成功",
    )))
}
