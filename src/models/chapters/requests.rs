use serde::Deserialize;
use ts_rs::TS;

use super::entities::ResourceType;

// 创建章节请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "chapter.ts")]
pub struct CreateChapterRequest {
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub duration: Option<i32>,
    /// 缺省时追加到末尾
    pub order: Option<i32>,
}

// 更新章节请求
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "chapter.ts")]
pub struct UpdateChapterRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub duration: Option<i32>,
    pub order: Option<i32>,
}

// 存储层创建章节资源参数
#[derive(Debug, Clone)]
pub struct NewChapterResource {
    pub title: String,
    pub url: String,
    pub resource_type: ResourceType,
    pub file_name: String,
    pub size: i64,
    pub duration: Option<i32>,
}
