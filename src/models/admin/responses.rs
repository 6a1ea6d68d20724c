use serde::Serialize;
use ts_rs::TS;

use crate::models::common::PaginationInfo;
use crate::models::courses::entities::Course;
use crate::models::enrollments::entities::Enrollment;
use crate::models::users::entities::User;

#[derive(Debug, Clone, Default, Serialize, TS)]
#[ts(export, export_to = "admin.ts")]
pub struct UserCounts {
    pub total: i64,
    pub students: i64,
    pub teachers: i64,
    pub admins: i64,
}

#[derive(Debug, Clone, Default, Serialize, TS)]
#[ts(export, export_to = "admin.ts")]
pub struct CourseCounts {
    pub total: i64,
    pub published: i64,
    pub draft: i64,
}

#[derive(Debug, Clone, Default, Serialize, TS)]
#[ts(export, export_to = "admin.ts")]
pub struct EnrollmentCounts {
    pub total: i64,
    pub active: i64,
    pub completed: i64,
}

#[derive(Debug, Clone, Default, Serialize, TS)]
#[ts(export, export_to = "admin.ts")]
pub struct AssignmentCounts {
    pub total: i64,
    pub submissions: i64,
    pub ungraded_submissions: i64,
}

// 系统统计
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "admin.ts")]
pub struct AdminStatistics {
    pub users: UserCounts,
    pub courses: CourseCounts,
    pub enrollments: EnrollmentCounts,
    pub assignments: AssignmentCounts,
    pub recent_users: Vec<User>,
    pub recent_courses: Vec<Course>,
    pub recent_enrollments: Vec<Enrollment>,
}

// 日志列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "admin.ts")]
pub struct LogListResponse {
    pub items: Vec<serde_json::Value>,
    pub pagination: PaginationInfo,
}

// 备份文件信息
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "admin.ts")]
pub struct BackupInfo {
    pub filename: String,
    pub size: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// 备份列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "admin.ts")]
pub struct BackupListResponse {
    pub items: Vec<BackupInfo>,
}

// 恢复结果
#[derive(Debug, Clone, Default, Serialize, TS)]
#[ts(export, export_to = "admin.ts")]
pub struct RestoreSummary {
    pub users: i64,
    pub courses: i64,
    pub chapters: i64,
    pub enrollments: i64,
    pub study_records: i64,
    pub assignments: i64,
    pub submissions: i64,
}
