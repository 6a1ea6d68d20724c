use serde::Serialize;
use ts_rs::TS;

use super::entities::{StudyRecord, StudyStatus};

// 章节学习状态（无记录时为 not_started / 0）
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "study.ts")]
pub struct StudyStatusResponse {
    pub chapter_id: i64,
    pub status: StudyStatus,
    pub progress: i32,
    pub last_study_time: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl StudyStatusResponse {
    pub fn from_record(chapter_id: i64, record: Option<&StudyRecord>) -> Self {
        match record {
            Some(r) => Self {
                chapter_id,
                status: r.status,
                progress: r.progress,
                last_study_time: Some(r.last_study_time),
                completed_at: r.completed_at,
            },
            None => Self {
                chapter_id,
                status: StudyStatus::NotStarted,
                progress: 0,
                last_study_time: None,
                completed_at: None,
            },
        }
    }
}

// 学习操作结果：章节记录及重新计算后的选课进度
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "study.ts")]
pub struct StudyProgressResponse {
    pub record: StudyRecord,
    pub enrollment_progress: i32,
}

// 课程内单个章节的学习状态
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "study.ts")]
pub struct ChapterStudyStatus {
    pub chapter_id: i64,
    pub title: String,
    pub order: i32,
    pub status: StudyStatus,
    pub progress: i32,
    pub last_study_time: Option<chrono::DateTime<chrono::Utc>>,
}

// 课程学习统计
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "study.ts")]
pub struct CourseStudyStatsResponse {
    pub course_id: i64,
    pub total_chapters: i64,
    pub completed: i64,
    pub in_progress: i64,
    pub not_started: i64,
    pub progress: i32,
    pub last_study_time: Option<chrono::DateTime<chrono::Utc>>,
    pub chapters: Vec<ChapterStudyStatus>,
}
