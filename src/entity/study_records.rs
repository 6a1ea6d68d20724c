//! 学习记录实体

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "study_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub chapter_id: i64,
    pub status: String,
    pub progress: i32,
    pub last_study_time: i64,
    pub completed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
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
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::StudentId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Student,
}

impl Related<super::chapters::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chapter.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_study_record(self) -> crate::models::study::entities::StudyRecord {
        use crate::models::study::entities::{StudyRecord, StudyStatus};
        use chrono::{DateTime, Utc};

        StudyRecord {
            id: self.id,
            student_id: self.student_id,
            course_id: self.course_id,
            chapter_id: self.chapter_id,
            status: self
                .status
                .parse::<StudyStatus>()
                .unwrap_or(StudyStatus::NotStarted),
            progress: self.progress,
            last_study_time: DateTime::<Utc>::from_timestamp(self.last_study_time, 0)
                .unwrap_or_default(),
            completed_at: self
                .completed_at
                .map(|ts| DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()),
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
