use super::{SeaOrmStorage, now_ts};
use crate::entity::users::{ActiveModel, Column, Entity as Users};
use crate::errors::{LearnHubError, Result, classify_db_err};
use crate::models::{
    PaginationInfo,
    users::{
        entities::{User, UserStatus},
        requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};
use crate::utils::contains_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};

impl SeaOrmStorage {
    /// 创建用户
    pub async fn create_user_impl(&self, req: CreateUserRequest) -> Result<User> {
        let now = now_ts();

        let model = ActiveModel {
            username: Set(req.username),
            email: Set(req.email),
            password_hash: Set(req.password),
            role: Set(req.role.to_string()),
            status: Set(UserStatus::Active.to_string()),
            name: Set(req.name),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| classify_db_err(e, "创建用户失败"))?;

        Ok(result.into_user())
    }

    /// 通过 ID 获取用户
    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let result = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过用户名获取用户
    pub async fn get_user_by_username_impl(&self, username: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过邮箱获取用户
    pub async fn get_user_by_email_impl(&self, email: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过用户名或邮箱获取用户
    pub async fn get_user_by_username_or_email_impl(
        &self,
        identifier: &str,
    ) -> Result<Option<User>> {
        let result = Users::find()
            .filter(
                Condition::any()
                    .add(Column::Username.eq(identifier))
                    .add(Column::Email.eq(identifier)),
            )
            .one(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 分页列出用户
    pub async fn list_users_with_pagination_impl(
        &self,
        query: UserListQuery,
    ) -> Result<UserListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Users::find();

        // 搜索条件
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            select = select.filter(
                Condition::any()
                    .add(Column::Username.like(contains_pattern(search.trim())))
                    .add(Column::Email.like(contains_pattern(search.trim())))
                    .add(Column::Name.like(contains_pattern(search.trim()))),
            );
        }

        // 角色筛选
        if let Some(ref role) = query.role {
            select = select.filter(Column::Role.eq(role.to_string()));
        }

        // 状态筛选
        if let Some(ref status) = query.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        select = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询用户总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询用户页数失败: {e}")))?;

        let users = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询用户列表失败: {e}")))?;

        Ok(UserListResponse {
            items: users.into_iter().map(|m| m.into_user()).collect(),
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        })
    }

    /// 更新用户最后登录时间
    pub async fn update_last_login_impl(&self, id: i64) -> Result<bool> {
        let now = now_ts();

        let result = Users::update_many()
            .col_expr(Column::LastLogin, sea_orm::sea_query::Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| {
                LearnHubError::database_operation(format!("更新最后登录时间失败: {e}"))
            })?;

        Ok(result.rows_affected > 0)
    }

    /// 更新用户信息
    pub async fn update_user_impl(
        &self,
        id: i64,
        update: UpdateUserRequest,
    ) -> Result<Option<User>> {
        // 先检查用户是否存在
        let existing = self.get_user_by_id_impl(id).await?;
        if existing.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(now_ts()),
            ..Default::default()
        };

        if let Some(email) = update.email {
            model.email = Set(email);
        }

        if let Some(password) = update.password {
            model.password_hash = Set(password);
        }

        if let Some(role) = update.role {
            model.role = Set(role.to_string());
        }

        if let Some(status) = update.status {
            model.status = Set(status.to_string());
        }

        if let Some(name) = update.name {
            model.name = Set(Some(name));
        }

        // Some(None) 表示清除头像
        if let Some(avatar_url) = update.avatar_url {
            model.avatar_url = Set(avatar_url);
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| classify_db_err(e, "更新用户失败"))?;

        self.get_user_by_id_impl(id).await
    }

    /// 删除用户
    pub async fn delete_user_impl(&self, id: i64) -> Result<bool> {
        let result = Users::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("删除用户失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::users::entities::UserRole;
    use crate::models::users::requests::{UpdateUserRequest, UserListQuery};
    use crate::test_support::{memory_storage, new_user};

    #[tokio::test]
    async fn test_create_and_lookup_user() {
        let storage = memory_storage().await;
        let user = storage
            .create_user_impl(new_user("alice", UserRole::Student))
            .await
            .unwrap();

        let by_name = storage.get_user_by_username_impl("alice").await.unwrap();
        assert_eq!(by_name.map(|u| u.id), Some(user.id));

        let by_email = storage
            .get_user_by_username_or_email_impl("alice@example.com")
            .await
            .unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn test_duplicate_username_is_conflict() {
        let storage = memory_storage().await;
        storage
            .create_user_impl(new_user("bob", UserRole::Student))
            .await
            .unwrap();

        let mut dup = new_user("bob", UserRole::Teacher);
        dup.email = "other@example.com".to_string();
        let err = storage.create_user_impl(dup).await.unwrap_err();
        assert_eq!(err.code(), "E012");
    }

    #[tokio::test]
    async fn test_list_users_filters_by_role_and_search() {
        let storage = memory_storage().await;
        for (name, role) in [
            ("stu_one", UserRole::Student),
            ("stu_two", UserRole::Student),
            ("teach_one", UserRole::Teacher),
        ] {
            storage.create_user_impl(new_user(name, role)).await.unwrap();
        }

        let students = storage
            .list_users_with_pagination_impl(UserListQuery {
                role: Some(UserRole::Student),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(students.pagination.total, 2);

        let search = storage
            .list_users_with_pagination_impl(UserListQuery {
                search: Some("teach".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(search.items.len(), 1);
        assert_eq!(search.items[0].username, "teach_one");
    }

    #[tokio::test]
    async fn test_update_user_clears_avatar() {
        let storage = memory_storage().await;
        let user = storage
            .create_user_impl(new_user("carol", UserRole::Student))
            .await
            .unwrap();

        let updated = storage
            .update_user_impl(
                user.id,
                UpdateUserRequest {
                    avatar_url: Some(Some("/api/uploads/avatars/a.png".to_string())),
                    name: Some("Carol".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name.as_deref(), Some("Carol"));
        assert!(updated.avatar_url.is_some());

        let cleared = storage
            .update_user_impl(
                user.id,
                UpdateUserRequest {
                    avatar_url: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(cleared.avatar_url.is_none());

        assert!(
            storage
                .update_user_impl(9999, UpdateUserRequest::default())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_last_login_and_delete() {
        let storage = memory_storage().await;
        let user = storage
            .create_user_impl(new_user("dave", UserRole::Student))
            .await
            .unwrap();
        assert!(user.last_login.is_none());

        assert!(storage.update_last_login_impl(user.id).await.unwrap());
        let reloaded = storage.get_user_by_id_impl(user.id).await.unwrap().unwrap();
        assert!(reloaded.last_login.is_some());

        assert!(storage.delete_user_impl(user.id).await.unwrap());
        assert!(!storage.delete_user_impl(user.id).await.unwrap());
    }
}
