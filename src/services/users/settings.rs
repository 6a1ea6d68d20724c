use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::UserService;
use crate::models::ApiResponse;
use crate::models::users::requests::UpdateSettingsRequest;
use crate::services::common::current_user;
use crate::utils::error_response;

pub async fn get_settings(
    service: &UserService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);

    match storage.get_user_settings(actor.id).await {
        Ok(settings) => Ok(HttpResponse::Ok().json(ApiResponse::success(settings, "获取设置成功"))),
        Err(e) => Ok(error_response(request, &e)),
    }
}

pub async fn update_settings(
    service: &UserService,
    request: &HttpRequest,
    update: UpdateSettingsRequest,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);

    match storage.update_user_settings(actor.id, update).await {
        Ok(settings) => Ok(HttpResponse::Ok().json(ApiResponse::success(settings, "设置已保存"))),
        Err(e) => Ok(error_response(request, &e)),
    }
}
