//! 备份与恢复
//!
//! 备份文件写入 `backups/backup_<毫秒时间戳>.json`，文件名只接受 `backup_<数字>.json`。

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{error, info, warn};

use super::AdminService;
use crate::config::get_config;
use crate::models::admin::entities::BackupFile;
use crate::models::admin::requests::RestoreRequest;
use crate::models::admin::responses::{BackupInfo, BackupListResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{bad_request, get_cache, not_found};
use crate::utils::error_response;
use crate::utils::validate::is_valid_backup_filename;

fn internal_error(code: ErrorCode, message: &str) -> HttpResponse {
    HttpResponse::InternalServerError().json(ApiResponse::error_empty(code, message))
}

pub async fn create_backup(service: &AdminService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let config = get_config(request);

    let data = match storage.export_backup_data().await {
        Ok(data) => data,
        Err(e) => return Ok(error_response(request, &e)),
    };
    let now = Utc::now();
    let backup = BackupFile { timestamp: now, data };
    let content = match serde_json::to_vec_pretty(&backup) {
        Ok(content) => content,
        Err(e) => {
            error!("Failed to serialize backup: {}", e);
            return Ok(internal_error(ErrorCode::BackupFailed, "备份失败"));
        }
    };

    let filename = format!("backup_{}.json", now.timestamp_millis());
    let dir = Path::new(&config.backup.dir);
    let written = async {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(dir.join(&filename), &content).await
    }
    .await;
    if let Err(e) = written {
        error!("Failed to write backup {}: {}", filename, e);
        return Ok(internal_error(ErrorCode::BackupFailed, "备份文件写入失败"));
    }

    info!("Backup {} created ({} bytes)", filename, content.len());
    Ok(HttpResponse::Created().json(ApiResponse::success(
        BackupInfo {
            filename,
            size: content.len() as i64,
            created_at: now,
        },
        "备份成功",
    )))
}

pub async fn list_backups(request: &HttpRequest) -> ActixResult<HttpResponse> {
    let config = get_config(request);
    let mut items = Vec::new();

    // 目录不存在时返回空列表
    if let Ok(mut dir) = tokio::fs::read_dir(&config.backup.dir).await {
        while let Ok(Some(entry)) = dir.next_entry().await {
            let filename = entry.file_name().to_string_lossy().to_string();
            if !is_valid_backup_filename(&filename) {
                continue;
            }
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            let created_at = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            items.push(BackupInfo {
                filename,
                size: metadata.len() as i64,
                created_at,
            });
        }
    }
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        BackupListResponse { items },
        "获取备份列表成功",
    )))
}

pub async fn restore_backup(
    service: &AdminService,
    request: &HttpRequest,
    restore: RestoreRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let config = get_config(request);

    if !is_valid_backup_filename(&restore.filename) {
        return Ok(bad_request(ErrorCode::ValidationError, "无效的备份文件名"));
    }
    let path = Path::new(&config.backup.dir).join(&restore.filename);
    let content = match tokio::fs::read(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(not_found(ErrorCode::BackupNotFound, "备份文件不存在"));
        }
        Err(e) => {
            error!("Failed to read backup {}: {}", restore.filename, e);
            return Ok(internal_error(ErrorCode::RestoreFailed, "备份文件读取失败"));
        }
    };
    let backup: BackupFile = match serde_json::from_slice(&content) {
        Ok(backup) => backup,
        Err(e) => {
            warn!("Backup {} is malformed: {}", restore.filename, e);
            return Ok(bad_request(ErrorCode::RestoreFailed, "备份文件格式错误"));
        }
    };

    match storage.restore_backup_data(backup.data).await {
        Ok(summary) => {
            // 恢复后所有缓存的用户都可能已失效
            get_cache(request).invalidate_all().await;
            info!(
                "Backup {} (taken at {}) restored: {:?}",
                restore.filename, backup.timestamp, summary
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(summary, "恢复成功")))
        }
        Err(e) => Ok(error_response(request, &e)),
    }
}

pub async fn delete_backup(request: &HttpRequest, filename: &str) -> ActixResult<HttpResponse> {
    let config = get_config(request);

    if !is_valid_backup_filename(filename) {
        return Ok(bad_request(ErrorCode::ValidationError, "无效的备份文件名"));
    }
    match tokio::fs::remove_file(Path::new(&config.backup.dir).join(filename)).await {
        Ok(()) => {
            info!("Backup {} deleted", filename);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("备份已删除")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok(not_found(ErrorCode::BackupNotFound, "备份文件不存在"))
        }
        Err(e) => {
            error!("Failed to delete backup {}: {}", filename, e);
            Ok(internal_error(ErrorCode::InternalServerError, "删除备份失败"))
        }
    }
}
