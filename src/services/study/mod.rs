pub mod progress;
pub mod stats;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::ApiResponse;
use crate::models::ErrorCode;
use crate::models::chapters::entities::Chapter;
use crate::models::study::requests::UpdateStudyProgressRequest;
use crate::models::users::entities::User;
use crate::services::common::{find_chapter, is_actively_enrolled};
use crate::storage::Storage;

pub struct StudyService {
    storage: Option<Arc<dyn Storage>>,
}

impl StudyService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub async fn get_study_status(&self, request: &HttpRequest, chapter_id: i64) -> ActixResult<HttpResponse> {
        progress::get_study_status(self, request, chapter_id).await
    }

    pub async fn start(&self, request: &HttpRequest, chapter_id: i64) -> ActixResult<HttpResponse> {
        progress::start(self, request, chapter_id).await
    }

    pub async fn update_progress(
        &self,
        request: &HttpRequest,
        chapter_id: i64,
        progress_data: UpdateStudyProgressRequest,
    ) -> ActixResult<HttpResponse> {
        progress::update_progress(self, request, chapter_id, progress_data).await
    }

    pub async fn complete(&self, request: &HttpRequest, chapter_id: i64) -> ActixResult<HttpResponse> {
        progress::complete(self, request, chapter_id).await
    }

    pub async fn get_course_stats(&self, request: &HttpRequest, course_id: i64) -> ActixResult<HttpResponse> {
        stats::get_course_stats(self, request, course_id).await
    }
}

/// 学习操作要求学生在章节所属课程中有进行中的选课
pub(crate) async fn enrolled_chapter(
    storage: &Arc<dyn Storage>,
    request: &HttpRequest,
    actor: &User,
    chapter_id: i64,
) -> Result<Chapter, HttpResponse> {
    let chapter = find_chapter(storage, request, chapter_id).await?;
    if !is_actively_enrolled(storage, request, chapter.course_id, actor.id).await? {
        return Err(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::NotEnrolled,
            "未选修该课程或选课已结束",
        )));
    }
    Ok(chapter)
}
