//! 作业附件实体

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assignment_attachments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub assignment_id: i64,
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
        belongs_to = "super::assignments::Entity",
        from = "Column::AssignmentId",
        to = "super::assignments::Column::Id",
        on_delete = "Cascade"
    )]
    Assignment,
}

impl Related<super::assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_attachment(self) -> crate::models::assignments::entities::AssignmentAttachment {
        use crate::models::assignments::entities::AssignmentAttachment;
        use chrono::{DateTime, Utc};

        AssignmentAttachment {
            id: self.id,
            assignment_id: self.assignment_id,
            title: self.title,
            url: self.url,
            file_type: self.file_type,
            file_name: self.file_name,
            size: self.size,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
        }
    }
}
