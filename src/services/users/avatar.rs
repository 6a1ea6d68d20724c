use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::UserService;
use crate::config::get_config;
use crate::models::files::entities::UploadCategory;
use crate::models::users::requests::UpdateUserRequest;
use crate::models::users::responses::AvatarResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{bad_request, current_user, invalidate_user, not_found};
use crate::utils::error_response;
use crate::utils::upload::{FileRule, UPLOAD_URL_PREFIX, collect_multipart, remove_uploaded_files};

const AVATAR_FIELD: &str = "avatar";

pub async fn upload_avatar(
    service: &UserService,
    request: &HttpRequest,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let config = get_config(request);

    let mut form = match collect_multipart(
        payload,
        &config.upload,
        &[FileRule::single(AVATAR_FIELD, UploadCategory::Avatars)],
    )
    .await
    {
        Ok(form) => form,
        Err(e) => return Ok(error_response(request, &e)),
    };

    let Some(file) = form.take_file(AVATAR_FIELD) else {
        return Ok(bad_request(ErrorCode::FileUploadFailed, "请选择头像文件"));
    };

    let update = UpdateUserRequest {
        avatar_url: Some(Some(file.url.clone())),
        ..Default::default()
    };
    let previous = actor.avatar_url.clone();
    match storage.update_user(actor.id, update).await {
        Ok(Some(_)) => {
            invalidate_user(request, actor.id).await;
            remove_local_avatar(&config.upload.dir, previous).await;
            info!("User {} uploaded avatar {}", actor.id, file.stored_name);
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                AvatarResponse {
                    avatar_url: file.url,
                },
                "头像上传成功",
            )))
        }
        Ok(None) => {
            remove_uploaded_files(&config.upload.dir, &[file.url]).await;
            Ok(not_found(ErrorCode::UserNotFound, "用户不存在"))
        }
        Err(e) => {
            remove_uploaded_files(&config.upload.dir, &[file.url]).await;
            Ok(error_response(request, &e))
        }
    }
}

pub async fn delete_avatar(
    service: &UserService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let config = get_config(request);

    let update = UpdateUserRequest {
        avatar_url: Some(None),
        ..Default::default()
    };
    match storage.update_user(actor.id, update).await {
        Ok(Some(_)) => {
            invalidate_user(request, actor.id).await;
            remove_local_avatar(&config.upload.dir, actor.avatar_url).await;
            Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty("头像已删除")))
        }
        Ok(None) => Ok(not_found(ErrorCode::UserNotFound, "用户不存在")),
        Err(e) => Ok(error_response(request, &e)),
    }
}

// 只清理本站上传的头像，外部链接保持不动
async fn remove_local_avatar(upload_dir: &str, avatar_url: Option<String>) {
    if let Some(url) = avatar_url.filter(|u| u.starts_with(UPLOAD_URL_PREFIX)) {
        remove_uploaded_files(upload_dir, &[url]).await;
    }
}
