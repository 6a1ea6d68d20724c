use serde::Serialize;
use ts_rs::TS;

use super::entities::{CompletedChapter, Enrollment};
use crate::models::assignments::responses::AssignmentSubmissionStatus;
use crate::models::common::PaginationInfo;
use crate::models::courses::entities::Course;
use crate::models::study::responses::ChapterStudyStatus;
use crate::models::users::entities::UserBrief;

// 选课记录及派生的已完成章节
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "enrollment.ts")]
pub struct EnrollmentView {
    #[serde(flatten)]
    #[ts(flatten)]
    pub enrollment: Enrollment,
    pub completed_chapters: Vec<CompletedChapter>,
}

// 我的选课列表项
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "enrollment.ts")]
pub struct MyEnrollmentItem {
    pub enrollment: EnrollmentView,
    pub course: Course,
    pub teacher_name: Option<String>,
}

// 我的选课列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "enrollment.ts")]
pub struct MyEnrollmentListResponse {
    pub items: Vec<MyEnrollmentItem>,
}

// 课程学生列表项
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "enrollment.ts")]
pub struct CourseStudentItem {
    pub enrollment: Enrollment,
    pub student: UserBrief,
    pub completed_chapters: i64,
    pub total_chapters: i64,
    pub completed_assignments: i64,
    pub total_assignments: i64,
}

// 课程学生列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "enrollment.ts")]
pub struct CourseStudentListResponse {
    pub items: Vec<CourseStudentItem>,
    pub pagination: PaginationInfo,
}

// 选课详情响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "enrollment.ts")]
pub struct EnrollmentDetailResponse {
    pub enrollment: EnrollmentView,
    pub course: Course,
    pub student: Option<UserBrief>,
    pub chapters: Vec<ChapterStudyStatus>,
    pub assignments: Vec<AssignmentSubmissionStatus>,
}
