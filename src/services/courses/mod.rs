pub mod cover;
pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::courses::requests::{
    CourseListParams, CreateCourseRequest, UpdateCourseRequest, UpdateCourseStatusRequest,
};
use crate::storage::Storage;

pub struct CourseService {
    storage: Option<Arc<dyn Storage>>,
}

impl CourseService {
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

    // 课程列表，可见范围取决于角色
    pub async fn list_courses(
        &self,
        request: &HttpRequest,
        query: CourseListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_courses(self, request, query).await
    }

    pub async fn get_course(&self, request: &HttpRequest, course_id: i64) -> ActixResult<HttpResponse> {
        get::get_course(self, request, course_id).await
    }

    pub async fn create_course(
        &self,
        request: &HttpRequest,
        course_data: CreateCourseRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_course(self, request, course_data).await
    }

    pub async fn update_course(
        &self,
        request: &HttpRequest,
        course_id: i64,
        update_data: UpdateCourseRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_course(self, request, course_id, update_data).await
    }

    pub async fn update_course_status(
        &self,
        request: &HttpRequest,
        course_id: i64,
        status_data: UpdateCourseStatusRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_course_status(self, request, course_id, status_data).await
    }

    pub async fn upload_cover(
        &self,
        request: &HttpRequest,
        course_id: i64,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        cover::upload_cover(self, request, course_id, payload).await
    }

    pub async fn delete_course(&self, request: &HttpRequest, course_id: i64) -> ActixResult<HttpResponse> {
        delete::delete_course(self, request, course_id).await
    }
}
