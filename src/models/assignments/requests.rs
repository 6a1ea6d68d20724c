use serde::Deserialize;
use ts_rs::TS;

use super::entities::AssignmentStatus;
use crate::models::common::PaginationQuery;

// 作业列表查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct AssignmentListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub course_id: Option<i64>,
    pub status: Option<AssignmentStatus>,
    pub search: Option<String>,
}

// 作业列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct AssignmentListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub course_id: Option<i64>,
    pub status: Option<AssignmentStatus>,
    pub search: Option<String>,
    /// 仅列出该教师课程下的作业
    pub teacher_id: Option<i64>,
}

// 更新作业请求
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct UpdateAssignmentRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<chrono::DateTime<chrono::Utc>>,
    pub total_score: Option<f64>,
}

// 更新作业状态请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct UpdateAssignmentStatusRequest {
    pub status: AssignmentStatus,
}

// 批改请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct GradeSubmissionRequest {
    pub score: f64,
    pub comment: Option<String>,
}

// 存储层创建作业参数
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub course_id: i64,
    pub created_by: i64,
    pub title: String,
    pub description: String,
    pub deadline: chrono::DateTime<chrono::Utc>,
    pub total_score: f64,
}

// 存储层附件参数（作业附件与提交附件共用）
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub title: String,
    pub url: String,
    pub file_type: String,
    pub file_name: String,
    pub size: i64,
}

// 存储层提交参数
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub assignment_id: i64,
    pub student_id: i64,
    pub content: String,
    /// 为 Some 时替换全部已有附件
    pub attachment: Option<NewAttachment>,
}
