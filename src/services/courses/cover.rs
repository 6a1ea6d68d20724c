use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::CourseService;
use crate::config::get_config;
use crate::models::files::entities::UploadCategory;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{bad_request, current_user, find_course, not_found, require_course_owner};
use crate::utils::error_response;
use crate::utils::upload::{FileRule, UPLOAD_URL_PREFIX, collect_multipart, remove_uploaded_files};

const COVER_FIELD: &str = "cover";

pub async fn upload_cover(
    service: &CourseService,
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
        &[FileRule::single(COVER_FIELD, UploadCategory::Covers)],
    )
    .await
    {
        Ok(form) => form,
        Err(e) => return Ok(error_response(request, &e)),
    };
    let Some(file) = form.take_file(COVER_FIELD) else {
        return Ok(bad_request(ErrorCode::FileUploadFailed, "请选择封面图片"));
    };

    match storage
        .update_course_cover(course_id, Some(file.url.clone()))
        .await
    {
        Ok(Some(updated)) => {
            if let Some(old) = course
                .cover_image
                .filter(|url| url.starts_with(UPLOAD_URL_PREFIX))
            {
                remove_uploaded_files(&config.upload.dir, &[old]).await;
            }
            info!("Course {} cover updated by user {}", course_id, actor.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(updated, "封面上传成功")))
        }
        Ok(None) => {
            remove_uploaded_files(&config.upload.dir, &[file.url]).await;
            Ok(not_found(ErrorCode::CourseNotFound, "课程不存在"))
        }
        Err(e) => {
            remove_uploaded_files(&config.upload.dir, &[file.url]).await;
            Ok(error_response(request, &e))
        }
    }
}
