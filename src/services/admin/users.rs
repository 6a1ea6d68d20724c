use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::AdminService;
use crate::config::get_config;
use crate::models::users::entities::{UserRole, UserStatus};
use crate::models::users::requests::{AdminUpdateUserRequest, UpdateUserRequest, UserListParams};
use crate::models::users::responses::UserResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{bad_request, current_user, invalidate_user, not_found};
use crate::utils::error_response;
use crate::utils::upload::remove_uploaded_files;
use crate::utils::validate::validate_email;

pub async fn list_users(
    service: &AdminService,
    request: &HttpRequest,
    query: UserListParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    match storage.list_users_with_pagination(query.into()).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list, "获取用户列表成功"))),
        Err(e) => Ok(error_response(request, &e)),
    }
}

pub async fn get_user(
    service: &AdminService,
    request: &HttpRequest,
    user_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            UserResponse { user },
            "获取用户信息成功",
        ))),
        Ok(None) => Ok(not_found(ErrorCode::UserNotFound, "用户不存在")),
        Err(e) => Ok(error_response(request, &e)),
    }
}

pub async fn update_user(
    service: &AdminService,
    request: &HttpRequest,
    user_id: i64,
    update_data: AdminUpdateUserRequest,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);

    // 管理员不能降级或禁用自己
    if user_id == actor.id
        && (update_data.role.is_some_and(|r| r != UserRole::Admin)
            || update_data.status.is_some_and(|s| s != UserStatus::Active))
    {
        return Ok(bad_request(ErrorCode::CannotModifySelf, "不能修改自己的角色或状态"));
    }

    let email = match update_data.email.map(|e| e.trim().to_lowercase()) {
        Some(email) => {
            if let Err(msg) = validate_email(&email) {
                return Ok(bad_request(ErrorCode::UserEmailInvalid, msg));
            }
            match storage.get_user_by_email(&email).await {
                Ok(Some(existing)) if existing.id != user_id => {
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
        name: update_data.name.map(|n| n.trim().to_string()),
        role: update_data.role,
        status: update_data.status,
        ..Default::default()
    };

    match storage.update_user(user_id, storage_update).await {
        Ok(Some(user)) => {
            invalidate_user(request, user_id).await;
            info!("Admin {} updated user {}", actor.id, user_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                UserResponse { user },
                "用户信息更新成功",
            )))
        }
        Ok(None) => Ok(not_found(ErrorCode::UserNotFound, "用户不存在")),
        Err(e) => Ok(error_response(request, &e)),
    }
}

pub async fn delete_user(
    service: &AdminService,
    request: &HttpRequest,
    user_id: i64,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);

    if user_id == actor.id {
        return Ok(bad_request(ErrorCode::CannotModifySelf, "不能删除当前登录的账号"));
    }

    let user = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(not_found(ErrorCode::UserNotFound, "用户不存在")),
        Err(e) => return Ok(error_response(request, &e)),
    };

    match storage.delete_user(user.id).await {
        Ok(true) => {
            invalidate_user(request, user.id).await;
            if let Some(avatar) = user.avatar_url {
                let config = get_config(request);
                remove_uploaded_files(&config.upload.dir, &[avatar]).await;
            }
            info!("Admin {} deleted user {} ({})", actor.id, user.id, user.username);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("用户已删除")))
        }
        Ok(false) => Ok(not_found(ErrorCode::UserNotFound, "用户不存在")),
        Err(e) => Ok(error_response(request, &e)),
    }
}
