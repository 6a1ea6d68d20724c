use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::header};
use std::time::UNIX_EPOCH;
use tracing::debug;

use super::content_type_for;
use crate::config::get_config;
use crate::models::ErrorCode;
use crate::services::common::not_found;
use crate::utils::upload::resolve_upload_path;

const UPLOAD_CACHE_CONTROL: &str = "public, max-age=86400";

/// 公开访问上传目录中的文件，带 ETag 与一天缓存
pub async fn serve_upload(
    request: &HttpRequest,
    category: &str,
    file_name: &str,
) -> ActixResult<HttpResponse> {
    let config = get_config(request);
    let Some(path) = resolve_upload_path(&config.upload.dir, category, file_name) else {
        debug!("Rejected upload path {}/{}", category, file_name);
        return Ok(not_found(ErrorCode::FileNotFound, "文件不存在"));
    };

    let metadata = match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => metadata,
        _ => return Ok(not_found(ErrorCode::FileNotFound, "文件不存在")),
    };
    let modified = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let etag = format!("\"{:x}-{:x}\"", metadata.len(), modified);

    let not_modified = request
        .headers()
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').any(|tag| tag.trim() == etag || tag.trim() == "*"));
    if not_modified {
        return Ok(HttpResponse::NotModified()
            .insert_header((header::ETAG, etag))
            .insert_header((header::CACHE_CONTROL, UPLOAD_CACHE_CONTROL))
            .finish());
    }

    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(HttpResponse::Ok()
            .insert_header((header::CONTENT_TYPE, content_type_for(file_name)))
            .insert_header((header::ETAG, etag))
            .insert_header((header::CACHE_CONTROL, UPLOAD_CACHE_CONTROL))
            .body(bytes)),
        Err(_) => Ok(not_found(ErrorCode::FileNotFound, "文件不存在")),
    }
}
