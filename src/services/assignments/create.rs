use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{DateTime, Utc};
use tracing::info;

use super::{AssignmentService, attachment_from};
use crate::config::get_config;
use crate::models::assignments::requests::NewAssignment;
use crate::models::files::entities::UploadCategory;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{bad_request, current_user, find_course, require_course_owner};
use crate::utils::error_response;
use crate::utils::upload::{FileRule, UploadForm, collect_multipart, remove_uploaded_files};
use crate::utils::validate::validate_assignment_fields;

const ATTACHMENTS_FIELD: &str = "attachments";
const DEFAULT_TOTAL_SCORE: f64 = 100.0;

pub async fn create_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    course_id: i64,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let config = get_config(request);
    let course = unwrap_or_respond!(find_course(&storage, request, course_id).await);
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

    let new_assignment = match parse_assignment_form(&form, course.id, actor.id) {
        Ok(new_assignment) => new_assignment,
        Err(msg) => {
            // 校验失败时删除本次请求上传的全部文件
            form.discard().await;
            return Ok(bad_request(ErrorCode::ValidationError, msg));
        }
    };

    let files = form.take_files(ATTACHMENTS_FIELD);
    let urls: Vec<String> = files.iter().map(|f| f.url.clone()).collect();
    let attachments = files.iter().map(attachment_from).collect();

    match storage.create_assignment(new_assignment, attachments).await {
        Ok(assignment) => {
            info!(
                "Assignment {} created in course {} by user {} with {} attachment(s)",
                assignment.assignment.id,
                course.id,
                actor.id,
                assignment.attachments.len()
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(assignment, "作业创建成功")))
        }
        Err(e) => {
            remove_uploaded_files(&config.upload.dir, &urls).await;
            Ok(error_response(request, &e))
        }
    }
}

fn parse_assignment_form(
    form: &UploadForm,
    course_id: i64,
    created_by: i64,
) -> Result<NewAssignment, String> {
    let title = form.non_empty("title").ok_or("作业标题不能为空")?;
    let description = form.non_empty("description").ok_or("作业描述不能为空")?;
    let deadline = form.non_empty("deadline").ok_or("截止日期不能为空")?;
    let deadline = DateTime::parse_from_rfc3339(&deadline)
        .map_err(|_| "截止日期格式不正确，应为 RFC 3339".to_string())?
        .with_timezone(&Utc);
    let total_score = match form.non_empty("total_score") {
        Some(raw) => raw
            .parse::<f64>()
            .map_err(|_| "作业总分必须为数字".to_string())?,
        None => DEFAULT_TOTAL_SCORE,
    };

    validate_assignment_fields(Some(&title), Some(&description), Some(total_score))?;

    Ok(NewAssignment {
        course_id,
        created_by,
        title,
        description,
        deadline,
        total_score,
    })
}
