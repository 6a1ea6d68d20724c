use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::header};
use tracing::{error, warn};

use super::access::locate_file;
use super::{FileService, content_type_for};
use crate::config::get_config;
use crate::errors::LearnHubError;
use crate::models::files::requests::FileQuery;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{current_user, not_found};
use crate::utils::upload::path_from_url;

pub async fn download(
    service: &FileService,
    request: &HttpRequest,
    file_id: i64,
    query: FileQuery,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let info = unwrap_or_respond!(locate_file(&storage, request, &actor, query.kind, file_id).await);

    let config = get_config(request);
    let Some(path) = path_from_url(&config.upload.dir, &info.url) else {
        warn!("File {} ({}) has unexpected url {}", info.id, info.kind, info.url);
        return Ok(not_found(ErrorCode::FileNotFound, "文件不存在"));
    };

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(not_found(ErrorCode::FileNotFound, "文件不存在"));
        }
        Err(e) => {
            error!(
                "{}",
                LearnHubError::file_operation(format!("读取文件 {} 失败: {e}", path.display()))
                    .format_simple()
            );
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                "文件读取失败",
            )));
        }
    };

    // 使用上传时的原始文件名
    let file_name = info.file_name.replace(['"', '\\', '\r', '\n'], "_");
    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, content_type_for(&info.file_name)))
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        ))
        .body(bytes))
}
