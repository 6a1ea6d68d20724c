use serde::{Deserialize, Serialize};
use ts_rs::TS;

define_string_enum! {
    /// 作业状态
    AssignmentStatus, "作业状态", "assignment.ts" {
        Draft => "draft",
        Published => "published",
        Closed => "closed",
    }
}

impl AssignmentStatus {
    /// 允许的状态迁移：
    /// draft -> published, published -> closed, published -> draft, closed -> published
    pub fn can_transition_to(&self, next: AssignmentStatus) -> bool {
        matches!(
            (self, next),
            (AssignmentStatus::Draft, AssignmentStatus::Published)
                | (AssignmentStatus::Published, AssignmentStatus::Closed)
                | (AssignmentStatus::Published, AssignmentStatus::Draft)
                | (AssignmentStatus::Closed, AssignmentStatus::Published)
        )
    }
}

define_string_enum! {
    /// 提交状态
    SubmissionStatus, "提交状态", "assignment.ts" {
        Submitted => "submitted",
        Graded => "graded",
    }
}

// 作业实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct Assignment {
    pub id: i64,
    pub course_id: i64,
    pub created_by: i64,
    pub title: String,
    pub description: String,
    pub deadline: chrono::DateTime<chrono::Utc>,
    pub total_score: f64,
    pub status: AssignmentStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// 作业附件
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct AssignmentAttachment {
    pub id: i64,
    pub assignment_id: i64,
    pub title: String,
    pub url: String,
    pub file_type: String,
    pub file_name: String,
    pub size: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// 提交记录，(assignment_id, student_id) 唯一
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct Submission {
    pub id: i64,
    pub assignment_id: i64,
    pub student_id: i64,
    pub content: String,
    pub score: Option<f64>,
    pub comment: Option<String>,
    pub status: SubmissionStatus,
    pub graded_by: Option<i64>,
    pub submit_time: chrono::DateTime<chrono::Utc>,
    pub graded_at: Option<chrono::DateTime<chrono::Utc>>,
}

// 提交附件
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct SubmissionAttachment {
    pub id: i64,
    pub submission_id: i64,
    pub title: String,
    pub url: String,
    pub file_type: String,
    pub file_name: String,
    pub size: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
