use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{AssignmentService, attachment_from};
use crate::config::get_config;
use crate::errors::LearnHubError;
use crate::models::assignments::requests::NewSubmission;
use crate::models::assignments::responses::SubmitAssignmentResponse;
use crate::models::files::entities::UploadCategory;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{
    bad_request, current_user, find_assignment, is_actively_enrolled,
};
use crate::utils::upload::{FileRule, collect_multipart, remove_uploaded_files};
use crate::utils::validate::SUBMISSION_CONTENT_MAX;
use crate::utils::{error_response, error_response_with_code};

const SUBMISSION_FIELD: &str = "file";
const DEFAULT_CONTENT: &str = "无备注";

/// 提交或重新提交作业
///
/// 每个学生每个作业只有一条提交。重新提交时覆盖内容；带新文件时替换旧附件，
/// 旧文件在事务提交后删除。
pub async fn submit(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let config = get_config(request);
    let assignment = unwrap_or_respond!(find_assignment(&storage, request, assignment_id).await);

    if !unwrap_or_respond!(is_actively_enrolled(&storage, request, assignment.course_id, actor.id).await) {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::NotEnrolled,
            "未选修该课程或选课已结束",
        )));
    }

    let mut form = match collect_multipart(
        payload,
        &config.upload,
        &[FileRule::single(SUBMISSION_FIELD, UploadCategory::Submissions)],
    )
    .await
    {
        Ok(form) => form,
        Err(e) => return Ok(error_response(request, &e)),
    };

    let content = form
        .non_empty("content")
        .unwrap_or_else(|| DEFAULT_CONTENT.to_string());
    if content.chars().count() > SUBMISSION_CONTENT_MAX {
        form.discard().await;
        return Ok(bad_request(
            ErrorCode::ValidationError,
            "提交内容不能超过 5000 个字符",
        ));
    }
    let file = form.take_file(SUBMISSION_FIELD);

    let submission = NewSubmission {
        assignment_id: assignment.id,
        student_id: actor.id,
        content,
        attachment: file.as_ref().map(attachment_from),
    };

    match storage.submit_assignment(submission).await {
        Ok(outcome) => {
            remove_uploaded_files(&config.upload.dir, &outcome.replaced_files).await;
            info!(
                "Student {} {} assignment {}",
                actor.id,
                if outcome.resubmitted { "resubmitted" } else { "submitted" },
                assignment.id
            );
            let message = if outcome.resubmitted { "作业已重新提交" } else { "作业提交成功" };
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                SubmitAssignmentResponse {
                    submission: outcome.submission,
                    resubmitted: outcome.resubmitted,
                },
                message,
            )))
        }
        Err(e) => {
            if let Some(file) = file {
                remove_uploaded_files(&config.upload.dir, &[file.url]).await;
            }
            let code = match &e {
                LearnHubError::NotFound(_) => ErrorCode::AssignmentNotFound,
                LearnHubError::InvalidState(_) => ErrorCode::AssignmentInvalidStatus,
                LearnHubError::Conflict(_) => ErrorCode::AlreadySubmitted,
                _ => return Ok(error_response(request, &e)),
            };
            Ok(error_response_with_code(request, &e, code))
        }
    }
}
