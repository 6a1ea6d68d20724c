//! 章节资源实体

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chapter_resources")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub chapter_id: i64,
    pub title: String,
    pub url: String,
    pub resource_type: String,
    pub file_name: String,
    pub size: i64,
    pub duration: Option<i32>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::chapters::Entity",
        from = "Column::ChapterId",
        to = "super::chapters::Column::Id",
        on_delete = "Cascade"
    )]
    Chapter,
}

impl Related<super::chapters::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chapter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_resource(self) -> crate::models::chapters::entities::ChapterResource {
        use crate::models::chapters::entities::{ChapterResource, ResourceType};
        use chrono::{DateTime, Utc};

        ChapterResource {
            id: self.id,
            chapter_id: self.chapter_id,
            title: self.title,
            url: self.url,
            resource_type: self
                .resource_type
                .parse::<ResourceType>()
                .unwrap_or(ResourceType::Other),
            file_name: self.file_name,
            size: self.size,
            duration: self.duration,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
        }
    }
}
