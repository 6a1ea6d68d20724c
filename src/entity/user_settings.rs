//! 用户设置实体

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub user_id: i64,
    pub notify_email: bool,
    pub notify_assignment: bool,
    pub notify_exam: bool,
    pub theme: String,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_settings(self) -> crate::models::users::entities::UserSettings {
        use crate::models::users::entities::{NotificationSettings, Theme, UserSettings};

        UserSettings {
            notification: NotificationSettings {
                email: self.notify_email,
                assignment: self.notify_assignment,
                exam: self.notify_exam,
            },
            theme: self.theme.parse::<Theme>().unwrap_or(Theme::Light),
        }
    }
}
