//! 课程实体

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub teacher_id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub cover_image: Option<String>,
    pub category: String,
    pub level: String,
    pub price: f64,
    pub status: String,
    pub student_count: i32,
    pub rating: f64,
    pub published_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::TeacherId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Teacher,
    #[sea_orm(has_many = "super::chapters::Entity")]
    Chapters,
    #[sea_orm(has_many = "super::assignments::Entity")]
    Assignments,
    #[sea_orm(has_many = "super::enrollments::Entity")]
    Enrollments,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl Related<super::chapters::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chapters.def()
    }
}

impl Related<super::assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignments.def()
    }
}

impl Related<super::enrollments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_course(self) -> crate::models::courses::entities::Course {
        use crate::models::courses::entities::{Course, CourseCategory, CourseLevel, CourseStatus};
        use chrono::{DateTime, Utc};

        Course {
            id: self.id,
            title: self.title,
            description: self.description,
            teacher_id: self.teacher_id,
            cover_image: self.cover_image,
            category: self
                .category
                .parse::<CourseCategory>()
                .unwrap_or(CourseCategory::Other),
            level: self
                .level
                .parse::<CourseLevel>()
                .unwrap_or(CourseLevel::Beginner),
            price: self.price,
            status: self
                .status
                .parse::<CourseStatus>()
                .unwrap_or(CourseStatus::Draft),
            student_count: self.student_count,
            rating: self.rating,
            published_at: self
                .published_at
                .map(|ts| DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()),
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
