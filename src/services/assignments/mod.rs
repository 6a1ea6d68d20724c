pub mod attachments;
pub mod create;
pub mod delete;
pub mod get;
pub mod grade;
pub mod list;
pub mod submit;
pub mod update;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::assignments::requests::{
    AssignmentListParams, GradeSubmissionRequest, NewAttachment, UpdateAssignmentRequest,
    UpdateAssignmentStatusRequest,
};
use crate::storage::Storage;
use crate::utils::upload::SavedFile;

pub struct AssignmentService {
    storage: Option<Arc<dyn Storage>>,
}

impl AssignmentService {
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

    // 教师视角的作业列表
    pub async fn list_assignments(
        &self,
        request: &HttpRequest,
        query: AssignmentListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_assignments(self, request, query).await
    }

    pub async fn list_student_assignments(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_student_assignments(self, request).await
    }

    pub async fn list_course_assignments(
        &self,
        request: &HttpRequest,
        course_id: i64,
    ) -> ActixResult<HttpResponse> {
        list::list_course_assignments(self, request, course_id).await
    }

    pub async fn create_assignment(
        &self,
        request: &HttpRequest,
        course_id: i64,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        create::create_assignment(self, request, course_id, payload).await
    }

    pub async fn get_assignment(&self, request: &HttpRequest, assignment_id: i64) -> ActixResult<HttpResponse> {
        get::get_assignment(self, request, assignment_id).await
    }

    pub async fn update_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        update_data: UpdateAssignmentRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_assignment(self, request, assignment_id, update_data).await
    }

    pub async fn update_assignment_status(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        status_data: UpdateAssignmentStatusRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_assignment_status(self, request, assignment_id, status_data).await
    }

    pub async fn delete_assignment(&self, request: &HttpRequest, assignment_id: i64) -> ActixResult<HttpResponse> {
        delete::delete_assignment(self, request, assignment_id).await
    }

    pub async fn add_attachments(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        attachments::add_attachments(self, request, assignment_id, payload).await
    }

    pub async fn delete_attachment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        attachment_id: i64,
    ) -> ActixResult<HttpResponse> {
        attachments::delete_attachment(self, request, assignment_id, attachment_id).await
    }

    pub async fn submit(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        submit::submit(self, request, assignment_id, payload).await
    }

    pub async fn grade_submission(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        submission_id: i64,
        grade_data: GradeSubmissionRequest,
    ) -> ActixResult<HttpResponse> {
        grade::grade_submission(self, request, assignment_id, submission_id, grade_data).await
    }

    pub async fn list_submissions(&self, request: &HttpRequest, assignment_id: i64) -> ActixResult<HttpResponse> {
        grade::list_submissions(self, request, assignment_id).await
    }
}

/// 已落盘的上传文件转换为附件记录
pub(crate) fn attachment_from(file: &SavedFile) -> NewAttachment {
    NewAttachment {
        title: file.original_name.clone(),
        url: file.url.clone(),
        file_type: file.extension.clone(),
        file_name: file.original_name.clone(),
        size: file.size,
    }
}
