use serde::Serialize;
use ts_rs::TS;

use super::entities::{
    Assignment, AssignmentAttachment, Submission, SubmissionAttachment, SubmissionStatus,
};
use crate::models::common::PaginationInfo;
use crate::models::users::entities::UserBrief;

// 作业及附件
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct AssignmentWithAttachments {
    #[serde(flatten)]
    #[ts(flatten)]
    pub assignment: Assignment,
    pub attachments: Vec<AssignmentAttachment>,
}

// 提交及附件
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct SubmissionWithAttachments {
    #[serde(flatten)]
    #[ts(flatten)]
    pub submission: Submission,
    pub attachments: Vec<SubmissionAttachment>,
}

// 作业详情响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct AssignmentDetailResponse {
    pub assignment: AssignmentWithAttachments,
    pub course_title: String,
    /// 学生本人的提交
    pub my_submission: Option<SubmissionWithAttachments>,
}

// 作业列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct AssignmentListResponse {
    pub items: Vec<Assignment>,
    pub pagination: PaginationInfo,
}

// 学生视角的作业列表项
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct StudentAssignmentItem {
    pub assignment: Assignment,
    pub course_title: String,
    pub submission_status: Option<SubmissionStatus>,
    pub score: Option<f64>,
}

// 学生作业列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct StudentAssignmentListResponse {
    pub items: Vec<StudentAssignmentItem>,
}

// 提交结果
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct SubmitAssignmentResponse {
    pub submission: SubmissionWithAttachments,
    /// 是否为重新提交
    pub resubmitted: bool,
}

// 提交列表项
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct SubmissionListItem {
    pub submission: SubmissionWithAttachments,
    pub student: Option<UserBrief>,
}

// 提交统计
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct SubmissionStats {
    /// 应提交人数（课程 student_count）
    pub total: i64,
    pub submitted: i64,
    pub graded: i64,
    /// 已批改提交的平均分，没有时为 0
    pub average_score: f64,
}

// 作业提交列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct AssignmentSubmissionsResponse {
    pub items: Vec<SubmissionListItem>,
    pub stats: SubmissionStats,
}

// 选课详情中单个作业的提交情况
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "assignment.ts")]
pub struct AssignmentSubmissionStatus {
    pub assignment_id: i64,
    pub title: String,
    pub deadline: chrono::DateTime<chrono::Utc>,
    pub total_score: f64,
    pub status: Option<SubmissionStatus>,
    pub score: Option<f64>,
}
