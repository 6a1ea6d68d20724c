//! 提交附件实体

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submission_attachments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub submission_id: i64,
    pub title: String,
    pub url: String,
    pub file_type: String,
    pub file_name: String,
    pub size: i64,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::submissions::Entity",
        from = "Column::SubmissionId",
        to = "super::submissions::Column::Id",
        on_delete = "Cascade"
    )]
    Submission,
}

impl Related<super::submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submission.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_attachment(self) -> crate::models::assignments::entities::SubmissionAttachment {
        use crate::models::assignments::entities::SubmissionAttachment;
        use chrono::{DateTime, Utc};

        SubmissionAttachment {
            id: self.id,
            submission_id: self.submission_id,
            title: self.title,
            url: self.url,
            file_type: self.file_type,
            file_name: self.file_name,
            size: self.size,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
        }
    }
}
