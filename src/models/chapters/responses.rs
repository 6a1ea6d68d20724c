use serde::Serialize;
use ts_rs::TS;

use super::entities::{Chapter, ChapterResource};
use crate::models::study::entities::StudyRecord;

// 章节详情响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "chapter.ts")]
pub struct ChapterDetailResponse {
    pub chapter: Chapter,
    pub resources: Vec<ChapterResource>,
    /// 当前用户的学习记录（非学生或尚未学习时为空）
    pub study_record: Option<StudyRecord>,
}

// 章节列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "chapter.ts")]
pub struct ChapterListResponse {
    pub items: Vec<Chapter>,
}
