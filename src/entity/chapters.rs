//! 章节实体

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chapters")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub sort_order: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
    pub duration: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::courses::Entity",
        from = "Column::CourseId",
        to = "super::courses::Column::Id",
        on_delete = "Cascade"
    )]
    Course,
    #[sea_orm(has_many = "super::chapter_resources::Entity")]
    Resources,
    #[sea_orm(has_many = "super::study_records::Entity")]
    StudyRecords,
}

impl Related<super::courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::chapter_resources::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resources.def()
    }
}

impl Related<super::study_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudyRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_chapter(self) -> crate::models::chapters::entities::Chapter {
        use crate::models::chapters::entities::Chapter;
        use chrono::{DateTime, Utc};

        Chapter {
            id: self.id,
            course_id: self.course_id,
            title: self.title,
            description: self.description,
            order: self.sort_order,
            content: self.content,
            duration: self.duration,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
