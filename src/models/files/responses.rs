use serde::Serialize;
use ts_rs::TS;

use super::entities::FileInfo;

// 文件预览响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "file.ts")]
pub struct FilePreviewResponse {
    #[serde(flatten)]
    #[ts(flatten)]
    pub info: FileInfo,
    pub preview_url: String,
}
