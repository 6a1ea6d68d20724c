use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::FileService;
use super::access::locate_file;
use crate::models::ApiResponse;
use crate::models::files::requests::FileQuery;
use crate::models::files::responses::FilePreviewResponse;
use crate::services::common::current_user;

pub async fn get_info(
    service: &FileService,
    request: &HttpRequest,
    file_id: i64,
    query: FileQuery,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let info = unwrap_or_respond!(locate_file(&storage, request, &actor, query.kind, file_id).await);

    Ok(HttpResponse::Ok().json(ApiResponse::success(info, "获取文件信息成功")))
}

pub async fn get_preview(
    service: &FileService,
    request: &HttpRequest,
    file_id: i64,
    query: FileQuery,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let info = unwrap_or_respond!(locate_file(&storage, request, &actor, query.kind, file_id).await);

    // 预览直接使用公开的上传地址
    let preview_url = info.url.clone();
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        FilePreviewResponse { info, preview_url },
        "获取预览信息成功",
    )))
}
