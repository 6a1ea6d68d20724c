use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::debug;

use super::{StudyService, enrolled_chapter};
use crate::errors::LearnHubError;
use crate::models::study::requests::UpdateStudyProgressRequest;
use crate::models::study::responses::StudyStatusResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{bad_request, current_user, not_found};
use crate::utils::{error_response, error_response_with_code};

pub async fn get_study_status(
    service: &StudyService,
    request: &HttpRequest,
    chapter_id: i64,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let chapter = unwrap_or_respond!(enrolled_chapter(&storage, request, &actor, chapter_id).await);

    match storage.get_study_record(actor.id, chapter.id).await {
        Ok(record) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            StudyStatusResponse::from_record(chapter.id, record.as_ref()),
            "获取学习状态成功",
        ))),
        Err(e) => Ok(error_response(request, &e)),
    }
}

pub async fn start(
    service: &StudyService,
    request: &HttpRequest,
    chapter_id: i64,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let chapter = unwrap_or_respond!(enrolled_chapter(&storage, request, &actor, chapter_id).await);

    match storage.start_study(actor.id, &chapter).await {
        Ok(record) => {
            debug!("Student {} started chapter {}", actor.id, chapter.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(record, "开始学习")))
        }
        Err(e) => Ok(error_response(request, &e)),
    }
}

pub async fn update_progress(
    service: &StudyService,
    request: &HttpRequest,
    chapter_id: i64,
    progress_data: UpdateStudyProgressRequest,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));

    if !(0..=100).contains(&progress_data.progress) {
        return Ok(bad_request(
            ErrorCode::StudyProgressInvalid,
            "学习进度必须在 0 到 100 之间",
        ));
    }

    let storage = service.get_storage(request);
    let chapter = unwrap_or_respond!(enrolled_chapter(&storage, request, &actor, chapter_id).await);

    match storage
        .update_study_progress(actor.id, &chapter, progress_data.progress)
        .await
    {
        Ok(Some(progress)) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(progress, "学习进度已更新")))
        }
        Ok(None) => Ok(not_found(
            ErrorCode::StudyRecordNotFound,
            "学习记录不存在，请先开始学习",
        )),
        Err(e @ LearnHubError::Validation(_)) => Ok(error_response_with_code(
            request,
            &e,
            ErrorCode::StudyProgressInvalid,
        )),
        Err(e) => Ok(error_response(request, &e)),
    }
}

pub async fn complete(
    service: &StudyService,
    request: &HttpRequest,
    chapter_id: i64,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let chapter = unwrap_or_respond!(enrolled_chapter(&storage, request, &actor, chapter_id).await);

    match storage.complete_chapter(actor.id, &chapter).await {
        Ok(progress) => {
            debug!(
                "Student {} completed chapter {}, course progress {}",
                actor.id, chapter.id, progress.enrollment_progress
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(progress, "章节已完成")))
        }
        Err(e) => Ok(error_response(request, &e)),
    }
}
