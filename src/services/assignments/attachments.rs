use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{AssignmentService, attachment_from};
use crate::config::get_config;
use crate::models::files::entities::UploadCategory;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{
    bad_request, current_user, find_assignment, find_course, not_found, require_course_owner,
};
use crate::utils::error_response;
use crate::utils::upload::{FileRule, collect_multipart, remove_uploaded_files};

const ATTACHMENTS_FIELD: &str = "attachments";

pub async fn add_attachments(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let config = get_config(request);
    let assignment = unwrap_or_respond!(find_assignment(&storage, request, assignment_id).await);
    let course = unwrap_or_respond!(find_course(&storage, request, assignment.course_id).await);
    unwrap_or_respond!(require_course_owner(&actor, &course));

    let mut form = match collect_multipart(
        payload,
        &config.upload,
        &[FileRule::multiple(ATTACHMENTS_FIELD, UploadCategory::Attachments)],
    )
    .await
    {
        Ok(form) => form,
        Err(e) => return Ok(error_response(request, &e)),
    };
    let files = form.take_files(ATTACHMENTS_FIELD);
    if files.is_empty() {
        return Ok(bad_request(ErrorCode::FileUploadFailed, "请选择要上传的附件"));
    }

    let urls: Vec<String> = files.iter().map(|f| f.url.clone()).collect();
    let attachments = files.iter().map(attachment_from).collect();
    match storage
        .add_assignment_attachments(assignment.id, attachments)
        .await
    {
        Ok(saved) => {
            info!(
                "{} attachment(s) added to assignment {} by user {}",
                saved.len(),
                assignment.id,
                actor.id
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(saved, "附件上传成功")))
        }
        Err(e) => {
            remove_uploaded_files(&config.upload.dir, &urls).await;
            Ok(error_response(request, &e))
        }
    }
}

pub async fn delete_attachment(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    attachment_id: i64,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let assignment = unwrap_or_respond!(find_assignment(&storage, request, assignment_id).await);
    let course = unwrap_or_respond!(find_course(&storage, request, assignment.course_id).await);
    unwrap_or_respond!(require_course_owner(&actor, &course));

    let attachment = match storage.get_assignment_attachment(attachment_id).await {
        Ok(Some(attachment)) if attachment.assignment_id == assignment.id => attachment,
        Ok(_) => return Ok(not_found(ErrorCode::AttachmentNotFound, "附件不存在")),
        Err(e) => return Ok(error_response(request, &e)),
    };

    match storage.delete_assignment_attachment(attachment.id).await {
        Ok(true) => {
            // 文件删除失败只记日志
            let config = get_config(request);
            remove_uploaded_files(&config.upload.dir, &[attachment.url]).await;
            info!(
                "Attachment {} removed from assignment {} by user {}",
                attachment.id, assignment.id, actor.id
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("附件已删除")))
        }
        Ok(false) => Ok(not_found(ErrorCode::AttachmentNotFound, "附件不存在")),
        Err(e) => Ok(error_response(request, &e)),
    }
}
