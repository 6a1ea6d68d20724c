use serde::{Deserialize, Serialize};
use ts_rs::TS;

define_string_enum! {
    /// 章节资源类型
    ResourceType, "资源类型", "chapter.ts" {
        Video => "video",
        Image => "image",
        Document => "document",
        Other => "other",
    }
}

// 章节实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "chapter.ts")]
pub struct Chapter {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    /// 课程内排序，(course_id, order) 唯一
    pub order: i32,
    pub content: Option<String>,
    /// 时长（分钟）
    pub duration: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// 章节资源
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "chapter.ts")]
pub struct ChapterResource {
    pub id: i64,
    pub chapter_id: i64,
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub file_name: String,
    pub size: i64,
    pub duration: Option<i32>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
