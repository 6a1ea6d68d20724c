//! 日志查看：读取滚动日志文件中的 JSON 行
//!
//! 文件按日期倒序读取，同一文件内也是新的在前。

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::NaiveDate;
use std::path::Path;
use tracing::warn;

use crate::config::{LOG_FILE_PREFIX, get_config};
use crate::models::admin::requests::LogQueryParams;
use crate::models::admin::responses::LogListResponse;
use crate::models::common::PaginationInfo;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::bad_request;

const MAX_PAGE_SIZE: i64 = 100;

pub async fn list_logs(request: &HttpRequest, query: LogQueryParams) -> ActixResult<HttpResponse> {
    let config = get_config(request);

    let date = match query.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                return Ok(bad_request(ErrorCode::ValidationError, "日期格式应为 YYYY-MM-DD"));
            }
        },
        None => None,
    };
    let level = query
        .level
        .map(|l| l.trim().to_ascii_uppercase())
        .filter(|l| !l.is_empty());

    let files = log_files(&config.app.log_dir, date).await;
    let mut entries = Vec::new();
    for file in files {
        let content = match tokio::fs::read_to_string(&file).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read log file {}: {}", file.display(), e);
                continue;
            }
        };
        // 非 JSON 行直接跳过
        entries.extend(
            content
                .lines()
                .rev()
                .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
                .filter(|entry| match &level {
                    Some(level) => entry["level"].as_str() == Some(level.as_str()),
                    None => true,
                }),
        );
    }

    let page = query.pagination.page.max(1);
    let size = query.pagination.size.clamp(1, MAX_PAGE_SIZE);
    let total = entries.len() as i64;
    let items = entries
        .into_iter()
        .skip(page_offset(page, size))
        .take(size as usize)
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        LogListResponse {
            items,
            pagination: PaginationInfo {
                page,
                page_size: size,
                total,
                total_pages: (total + size - 1) / size,
            },
        },
        "获取日志成功",
    )))
}

/// 日志目录下的日志文件，按文件名（即日期）倒序
async fn log_files(log_dir: &str, date: Option<NaiveDate>) -> Vec<std::path::PathBuf> {
    if log_dir.is_empty() {
        return Vec::new();
    }
    let mut dir = match tokio::fs::read_dir(Path::new(log_dir)).await {
        Ok(dir) => dir,
        Err(_) => return Vec::new(),
    };

    let wanted = date.map(|d| format!("{LOG_FILE_PREFIX}.{}", d.format("%Y-%m-%d")));
    let mut files = Vec::new();
    while let Ok(Some(entry)) = dir.next_entry().await {
        let name = entry.file_name().to_string_lossy().to_string();
        let matched = match &wanted {
            Some(wanted) => &name == wanted,
            None => name.starts_with(LOG_FILE_PREFIX),
        };
        if matched {
            files.push((name, entry.path()));
        }
    }
    files.sort_by(|a, b| b.0.cmp(&a.0));
    files.into_iter().map(|(_, path)| path).collect()
}

/// 跳过的条数，超大页码不会溢出
fn page_offset(page: i64, size: i64) -> usize {
    usize::try_from((page - 1).saturating_mul(size)).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::page_offset;

    #[test]
    fn test_page_offset_saturates() {
        assert_eq!(page_offset(1, 20), 0);
        assert_eq!(page_offset(3, 20), 40);
        let expected = usize::try_from(i64::MAX).unwrap_or(usize::MAX);
        assert_eq!(page_offset(i64::MAX, 100), expected);
    }
}
