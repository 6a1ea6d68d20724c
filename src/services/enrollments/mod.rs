pub mod detail;
pub mod enroll;
pub mod list;
pub mod status;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::enrollments::entities::Enrollment;
use crate::models::enrollments::requests::{
    CourseStudentListParams, EnrollmentListParams, UpdateEnrollmentProgressRequest,
    UpdateEnrollmentStatusRequest,
};
use crate::models::ErrorCode;
use crate::services::common::not_found;
use crate::storage::Storage;
use crate::utils::error_response;

pub struct EnrollmentService {
    storage: Option<Arc<dyn Storage>>,
}

impl EnrollmentService {
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

    pub async fn enroll(&self, request: &HttpRequest, course_id: i64) -> ActixResult<HttpResponse> {
        enroll::enroll(self, request, course_id).await
    }

    pub async fn list_my_enrollments(
        &self,
        request: &HttpRequest,
        query: EnrollmentListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_my_enrollments(self, request, query).await
    }

    pub async fn list_course_students(
        &self,
        request: &HttpRequest,
        course_id: i64,
        query: CourseStudentListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_course_students(self, request, course_id, query).await
    }

    pub async fn update_status(
        &self,
        request: &HttpRequest,
        enrollment_id: i64,
        status_data: UpdateEnrollmentStatusRequest,
    ) -> ActixResult<HttpResponse> {
        status::update_status(self, request, enrollment_id, status_data).await
    }

    pub async fn update_progress(
        &self,
        request: &HttpRequest,
        enrollment_id: i64,
        progress_data: UpdateEnrollmentProgressRequest,
    ) -> ActixResult<HttpResponse> {
        status::update_progress(self, request, enrollment_id, progress_data).await
    }

    pub async fn get_detail(&self, request: &HttpRequest, enrollment_id: i64) -> ActixResult<HttpResponse> {
        detail::get_detail(self, request, enrollment_id).await
    }
}

pub(crate) async fn find_enrollment(
    storage: &Arc<dyn Storage>,
    request: &HttpRequest,
    enrollment_id: i64,
) -> Result<Enrollment, HttpResponse> {
    match storage.get_enrollment_by_id(enrollment_id).await {
        Ok(Some(enrollment)) => Ok(enrollment),
        Ok(None) => Err(not_found(ErrorCode::EnrollmentNotFound, "选课记录不存在")),
        Err(e) => Err(error_response(request, &e)),
    }
}
