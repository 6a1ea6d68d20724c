pub mod avatar;
pub mod profile;
pub mod settings;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::users::requests::{UpdateProfileRequest, UpdateSettingsRequest};
use crate::storage::Storage;

pub struct UserService {
    storage: Option<Arc<dyn Storage>>,
}

impl UserService {
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

    pub async fn get_profile(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        profile::get_profile(self, request).await
    }

    pub async fn update_profile(
        &self,
        request: &HttpRequest,
        update: UpdateProfileRequest,
    ) -> ActixResult<HttpResponse> {
        profile::update_profile(self, request, update).await
    }

    pub async fn get_settings(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        settings::get_settings(self, request).await
    }

    pub async fn update_settings(
        &self,
        request: &HttpRequest,
        update: UpdateSettingsRequest,
    ) -> ActixResult<HttpResponse> {
        settings::update_settings(self, request, update).await
    }

    pub async fn upload_avatar(
        &self,
        request: &HttpRequest,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        avatar::upload_avatar(self, request, payload).await
    }

    pub async fn delete_avatar(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        avatar::delete_avatar(self, request).await
    }
}
