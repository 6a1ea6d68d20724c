use serde::Deserialize;
use ts_rs::TS;

use super::entities::EnrollmentStatus;
use crate::models::common::PaginationQuery;

// 我的选课列表查询参数
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "enrollment.ts")]
pub struct EnrollmentListParams {
    pub status: Option<EnrollmentStatus>,
}

// 课程学生列表查询参数
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "enrollment.ts")]
pub struct CourseStudentListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub status: Option<EnrollmentStatus>,
}

// 更新选课状态请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "enrollment.ts")]
pub struct UpdateEnrollmentStatusRequest {
    pub status: EnrollmentStatus,
}

// 标记章节完成请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "enrollment.ts")]
pub struct UpdateEnrollmentProgressRequest {
    pub chapter_id: i64,
}
