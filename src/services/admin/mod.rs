pub mod backup;
pub mod logs;
pub mod statistics;
pub mod users;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::admin::requests::{LogQueryParams, RestoreRequest};
use crate::models::users::requests::{AdminUpdateUserRequest, UserListParams};
use crate::storage::Storage;

pub struct AdminService {
    storage: Option<Arc<dyn Storage>>,
}

impl AdminService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    // 用户管理
    pub async fn list_users(&self, request: &HttpRequest, query: UserListParams) -> ActixResult<HttpResponse> {
        users::list_users(self, request, query).await
    }

    pub async fn get_user(&self, request: &HttpRequest, user_id: i64) -> ActixResult<HttpResponse> {
        users::get_user(self, request, user_id).await
    }

    pub async fn update_user(
        &self,
        request: &HttpRequest,
        user_id: i64,
        update_data: AdminUpdateUserRequest,
    ) -> ActixResult<HttpResponse> {
        users::update_user(self, request, user_id, update_data).await
    }

    pub async fn delete_user(&self, request: &HttpRequest, user_id: i64) -> ActixResult<HttpResponse> {
        users::delete_user(self, request, user_id).await
    }

    pub async fn get_statistics(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        statistics::get_statistics(self, request).await
    }

    pub async fn list_logs(&self, request: &HttpRequest, query: LogQueryParams) -> ActixResult<HttpResponse> {
        logs::list_logs(request, query).await
    }

    // 备份与恢复
    pub async fn create_backup(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        backup::create_backup(self, request).await
    }

    pub async fn list_backups(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        backup::list_backups(request).await
    }

    pub async fn restore_backup(&self, request: &HttpRequest, restore: RestoreRequest) -> ActixResult<HttpResponse> {
        backup::restore_backup(self, request, restore).await
    }

    pub async fn delete_backup(&self, request: &HttpRequest, filename: String) -> ActixResult<HttpResponse> {
        backup::delete_backup(request, &filename).await
    }
}
