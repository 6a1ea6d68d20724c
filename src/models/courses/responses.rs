use serde::Serialize;
use ts_rs::TS;

use super::entities::Course;
use crate::models::chapters::entities::Chapter;
use crate::models::common::PaginationInfo;
use crate::models::users::entities::UserBrief;

// 课程及授课教师
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct CourseWithTeacher {
    #[serde(flatten)]
    #[ts(flatten)]
    pub course: Course,
    pub teacher: Option<UserBrief>,
}

// 课程列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct CourseListResponse {
    pub items: Vec<CourseWithTeacher>,
    pub pagination: PaginationInfo,
}

// 课程详情响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct CourseDetailResponse {
    pub course: Course,
    pub teacher: Option<UserBrief>,
    pub chapters: Vec<Chapter>,
    /// 当前用户（学生）是否已选课
    pub enrolled: bool,
}
