use serde::Deserialize;
use ts_rs::TS;

use super::entities::FileKind;

// 文件查询参数
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "file.ts")]
pub struct FileQuery {
    #[serde(rename = "type")]
    pub kind: FileKind,
}
