use serde::Deserialize;
use ts_rs::TS;

use crate::models::common::PaginationQuery;

// 日志查询参数
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "admin.ts")]
pub struct LogQueryParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    /// YYYY-MM-DD，缺省时读取全部日志文件
    pub date: Option<String>,
    /// 日志级别（INFO / WARN / ERROR ...），大小写不敏感
    pub level: Option<String>,
}

// 恢复备份请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "admin.ts")]
pub struct RestoreRequest {
    pub filename: String,
}
