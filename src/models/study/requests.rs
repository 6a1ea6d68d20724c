use serde::Deserialize;
use ts_rs::TS;

// 更新章节学习进度请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "study.ts")]
pub struct UpdateStudyProgressRequest {
    pub progress: i32,
}
