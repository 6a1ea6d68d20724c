use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::ChapterService;
use crate::config::get_config;
use crate::models::chapters::entities::ResourceType;
use crate::models::chapters::requests::NewChapterResource;
use crate::models::files::entities::UploadCategory;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{
    bad_request, current_user, find_chapter, find_course, not_found, require_course_owner,
};
use crate::utils::error_response;
use crate::utils::upload::{FileRule, collect_multipart, remove_uploaded_files};

const RESOURCE_FIELD: &str = "file";

pub async fn add_resource(
    service: &ChapterService,
    request: &HttpRequest,
    chapter_id: i64,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let config = get_config(request);
    let chapter = unwrap_or_respond!(find_chapter(&storage, request, chapter_id).await);
    let course = unwrap_or_respond!(find_course(&storage, request, chapter.course_id).await);
    unwrap_or_respond!(require_course_owner(&actor, &course));

    let mut form = match collect_multipart(
        payload,
        &config.upload,
        &[FileRule::single(RESOURCE_FIELD, UploadCategory::Resources)],
    )
    .await
    {
        Ok(form) => form,
        Err(e) => return Ok(error_response(request, &e)),
    };

    let parsed_type = form.text("type").map(str::parse::<ResourceType>);
    let parsed_duration = form.text("duration").map(str::parse::<i32>);

    let resource_type = match parsed_type {
        Some(Ok(resource_type)) => resource_type,
        Some(Err(msg)) => {
            form.discard().await;
            return Ok(bad_request(ErrorCode::ValidationError, msg));
        }
        None => ResourceType::Other,
    };
    let duration = match parsed_duration {
        Some(Ok(duration)) if duration >= 0 => Some(duration),
        Some(_) => {
            form.discard().await;
            return Ok(bad_request(ErrorCode::ValidationError, "资源时长必须为非负整数"));
        }
        None => None,
    };
    let title = form.non_empty("title");
    let Some(file) = form.take_file(RESOURCE_FIELD) else {
        form.discard().await;
        return Ok(bad_request(ErrorCode::FileUploadFailed, "请选择要上传的文件"));
    };

    let new_resource = NewChapterResource {
        title: title.unwrap_or_else(|| file.original_name.clone()),
        url: file.url.clone(),
        resource_type,
        file_name: file.original_name.clone(),
        size: file.size,
        duration,
    };

    match storage.add_chapter_resource(chapter.id, new_resource).await {
        Ok(resource) => {
            info!(
                "Resource {} added to chapter {} by user {}",
                resource.id, chapter.id, actor.id
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(resource, "资源上传成功")))
        }
        Err(e) => {
            remove_uploaded_files(&config.upload.dir, &[file.url]).await;
            Ok(error_response(request, &e))
        }
    }
}

pub async fn delete_resource(
    service: &ChapterService,
    request: &HttpRequest,
    chapter_id: i64,
    resource_id: i64,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let chapter = unwrap_or_respond!(find_chapter(&storage, request, chapter_id).await);
    let course = unwrap_or_respond!(find_course(&storage, request, chapter.course_id).await);
    unwrap_or_respond!(require_course_owner(&actor, &course));

    let resource = match storage.get_chapter_resource(resource_id).await {
        Ok(Some(resource)) if resource.chapter_id == chapter.id => resource,
        Ok(_) => return Ok(not_found(ErrorCode::ResourceNotFound, "资源不存在")),
        Err(e) => return Ok(error_response(request, &e)),
    };

    match storage.delete_chapter_resource(resource.id).await {
        Ok(true) => {
            let config = get_config(request);
            remove_uploaded_files(&config.upload.dir, &[resource.url]).await;
            info!(
                "Resource {} removed from chapter {} by user {}",
                resource.id, chapter.id, actor.id
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("资源已删除")))
        }
        Ok(false) => Ok(not_found(ErrorCode::ResourceNotFound, "资源不存在")),
        Err(e) => Ok(error_response(request, &e)),
    }
}
