use serde::{Deserialize, Serialize};
use ts_rs::TS;

define_string_enum! {
    /// 章节学习状态，只能单调前进
    StudyStatus, "学习状态", "study.ts" {
        NotStarted => "not_started",
        InProgress => "in_progress",
        Completed => "completed",
    }
}

// 学习记录，(student_id, chapter_id) 唯一
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "study.ts")]
pub struct StudyRecord {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub chapter_id: i64,
    pub status: StudyStatus,
    pub progress: i32,
    pub last_study_time: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
