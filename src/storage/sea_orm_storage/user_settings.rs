use super::{SeaOrmStorage, now_ts};
use crate::entity::user_settings::{ActiveModel, Column, Entity as UserSettingsEntity};
use crate::errors::{LearnHubError, Result, classify_db_err};
use crate::models::users::{entities::UserSettings, requests::UpdateSettingsRequest};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

impl SeaOrmStorage {
    /// 获取用户设置，尚未保存过时返回默认设置
    pub async fn get_user_settings_impl(&self, user_id: i64) -> Result<UserSettings> {
        let result = UserSettingsEntity::find()
            .filter(Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询用户设置失败: {e}")))?;

        Ok(result.map(|m| m.into_settings()).unwrap_or_default())
    }

    /// 更新用户设置，首次更新时创建设置记录
    pub async fn update_user_settings_impl(
        &self,
        user_id: i64,
        update: UpdateSettingsRequest,
    ) -> Result<UserSettings> {
        let existing = UserSettingsEntity::find()
            .filter(Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询用户设置失败: {e}")))?;

        let mut settings = existing
            .clone()
            .map(|m| m.into_settings())
            .unwrap_or_default();

        if let Some(patch) = update.notification {
            if let Some(email) = patch.email {
                settings.notification.email = email;
            }
            if let Some(assignment) = patch.assignment {
                settings.notification.assignment = assignment;
            }
            if let Some(exam) = patch.exam {
                settings.notification.exam = exam;
            }
        }
        if let Some(theme) = update.theme {
            settings.theme = theme;
        }

        let mut model: ActiveModel = match existing {
            Some(m) => m.into(),
            None => ActiveModel {
                user_id: Set(user_id),
                ..Default::default()
            },
        };
        model.notify_email = Set(settings.notification.email);
        model.notify_assignment = Set(settings.notification.assignment);
        model.notify_exam = Set(settings.notification.exam);
        model.theme = Set(settings.theme.to_string());
        model.updated_at = Set(now_ts());

        model
            .save(&self.db)
            .await
            .map_err(|e| classify_db_err(e, "保存用户设置失败"))?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::users::entities::{Theme, UserRole};
    use crate::models::users::requests::{NotificationSettingsPatch, UpdateSettingsRequest};
    use crate::test_support::{memory_storage, new_user};

    #[tokio::test]
    async fn test_settings_default_then_patch() {
        let storage = memory_storage().await;
        let user = storage
            .create_user_impl(new_user("erin", UserRole::Student))
            .await
            .unwrap();

        let defaults = storage.get_user_settings_impl(user.id).await.unwrap();
        assert!(defaults.notification.email);
        assert_eq!(defaults.theme, Theme::Light);

        let updated = storage
            .update_user_settings_impl(
                user.id,
                UpdateSettingsRequest {
                    notification: Some(NotificationSettingsPatch {
                        exam: Some(false),
                        ..Default::default()
                    }),
                    theme: Some(Theme::Dark),
                },
            )
            .await
            .unwrap();
        assert!(!updated.notification.exam);
        assert!(updated.notification.assignment);

        // 第二次更新走已有记录
        storage
            .update_user_settings_impl(
                user.id,
                UpdateSettingsRequest {
                    notification: Some(NotificationSettingsPatch {
                        email: Some(false),
                        ..Default::default()
                    }),
                    theme: None,
                },
            )
            .await
            .unwrap();

        let reloaded = storage.get_user_settings_impl(user.id).await.unwrap();
        assert!(!reloaded.notification.email);
        assert!(!reloaded.notification.exam);
        assert_eq!(reloaded.theme, Theme::Dark);
    }
}
