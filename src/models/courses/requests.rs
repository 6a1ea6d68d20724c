use serde::Deserialize;
use ts_rs::TS;

use super::entities::{CourseCategory, CourseLevel, CourseStatus};
use crate::models::common::PaginationQuery;

// 课程列表查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct CourseListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub search: Option<String>,
    pub category: Option<CourseCategory>,
    pub level: Option<CourseLevel>,
    pub status: Option<CourseStatus>,
}

/// 课程可见范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseVisibility {
    /// 全部课程（管理员）
    All,
    /// 已发布课程（学生）
    PublishedOnly,
    /// 已发布课程及该教师自己的课程
    PublishedOrOwnedBy(i64),
}

// 课程列表查询参数（用于存储层）
#[derive(Debug, Clone)]
pub struct CourseListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub search: Option<String>,
    pub category: Option<CourseCategory>,
    pub level: Option<CourseLevel>,
    pub status: Option<CourseStatus>,
    pub visibility: CourseVisibility,
}

// 创建课程请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: String,
    pub category: CourseCategory,
    pub level: CourseLevel,
    pub price: Option<f64>,
}

// 更新课程请求
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<CourseCategory>,
    pub level: Option<CourseLevel>,
    pub price: Option<f64>,
}

// 更新课程状态请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct UpdateCourseStatusRequest {
    pub status: CourseStatus,
}

// 存储层创建课程参数
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub teacher_id: i64,
    pub title: String,
    pub description: String,
    pub category: CourseCategory,
    pub level: CourseLevel,
    pub price: f64,
}
