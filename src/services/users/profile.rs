use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::UserService;
use crate::models::users::requests::{UpdateProfileRequest, UpdateUserRequest};
use crate::models::users::responses::UserResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{bad_request, current_user, invalidate_user, not_found};
use crate::utils::error_response;
use crate::utils::validate::validate_email;

pub async fn get_profile(
    service: &UserService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);

    match storage.get_user_by_id(actor.id).await {
        Ok(Some(user)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            UserResponse { user },
            "获取个人资料成功",
        ))),
        Ok(None) => Ok(not_found(ErrorCode::UserNotFound, "用户不存在")),
        Err(e) => Ok(error_response(request, &e)),
    }
}

pub async fn update_profile(
    service: &UserService,
    request: &HttpRequest,
    update: UpdateProfileRequest,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);

    let email = match update.email.map(|e| e.trim().to_lowercase()) {
        Some(email) => {
            if let Err(msg) = validate_email(&email) {
                return Ok(bad_request(ErrorCode::UserEmailInvalid, msg));
            }
            // 邮箱不能与其他用户重复
            match storage.get_user_by_email(&email).await {
                Ok(Some(existing)) if existing.id != actor.id => {
                    return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                        ErrorCode::UserEmailAlreadyExists,
                        "该邮箱已被使用",
                    )));
                }
                Ok(_) => Some(email),
                Err(e) => return Ok(error_response(request, &e)),
            }
        }
        None => None,
    };

    let storage_update = UpdateUserRequest {
        email,
        name: update.name.map(|n| n.trim().to_string()),
        avatar_url: update
            .avatar_url
            .map(|url| Some(url.trim().to_string()).filter(|u| !u.is_empty())),
        ..Default::default()
    };

    match storage.update_user(actor.id, storage_update).await {
        Ok(Some(user)) => {
            invalidate_user(request, actor.id).await;
            info!("User {} updated profile", actor.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                UserResponse { user },
                "个人资料更新成功",
            )))
        }
        Ok(None) => Ok(not_found(ErrorCode::UserNotFound, "用户不存在")),
        Err(e) => Ok(error_response(request, &e)),
    }
}
