pub mod create;
pub mod delete;
pub mod get;
pub mod resources;
pub mod update;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::chapters::requests::{CreateChapterRequest, UpdateChapterRequest};
use crate::storage::Storage;

pub struct ChapterService {
    storage: Option<Arc<dyn Storage>>,
}

impl ChapterService {
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

    pub async fn list_chapters(&self, request: &HttpRequest, course_id: i64) -> ActixResult<HttpResponse> {
        get::list_chapters(self, request, course_id).await
    }

    pub async fn get_chapter(&self, request: &HttpRequest, chapter_id: i64) -> ActixResult<HttpResponse> {
        get::get_chapter(self, request, chapter_id).await
    }

    pub async fn create_chapter(
        &self,
        request: &HttpRequest,
        course_id: i64,
        chapter_data: CreateChapterRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_chapter(self, request, course_id, chapter_data).await
    }

    pub async fn update_chapter(
        &self,
        request: &HttpRequest,
        chapter_id: i64,
        update_data: UpdateChapterRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_chapter(self, request, chapter_id, update_data).await
    }

    pub async fn delete_chapter(&self, request: &HttpRequest, chapter_id: i64) -> ActixResult<HttpResponse> {
        delete::delete_chapter(self, request, chapter_id).await
    }

    pub async fn add_resource(
        &self,
        request: &HttpRequest,
        chapter_id: i64,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        resources::add_resource(self, request, chapter_id, payload).await
    }

    pub async fn delete_resource(
        &self,
        request: &HttpRequest,
        chapter_id: i64,
        resource_id: i64,
    ) -> ActixResult<HttpResponse> {
        resources::delete_resource(self, request, chapter_id, resource_id).await
    }
}
