use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use crate::config::get_config;
use crate::models::auth::UpdatePasswordRequest;
use crate::models::users::requests::UpdateUserRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{bad_request, current_user, invalidate_user, not_found};
use crate::utils::error_response;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::validate::validate_password;

use super::AuthService;

pub async fn handle_update_password(
    service: &AuthService,
    password_request: UpdatePasswordRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let config = get_config(request);

    // 缓存中的用户不含密码哈希，需要从存储层读取
    let user = match storage.get_user_by_id(actor.id).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(not_found(ErrorCode::UserNotFound, "用户不存在")),
        Err(e) => return Ok(error_response(request, &e)),
    };

    if !verify_password(&password_request.current_password, &user.password_hash) {
        return Ok(bad_request(ErrorCode::PasswordIncorrect, "当前密码错误"));
    }
    if let Err(msg) = validate_password(&password_request.new_password) {
        return Ok(bad_request(ErrorCode::UserPasswordInvalid, msg));
    }

    let password_hash = match hash_password(&config.argon2, &password_request.new_password) {
        Ok(hash) => hash,
        Err(e) => return Ok(error_response(request, &e)),
    };

    let update = UpdateUserRequest {
        password: Some(password_hash),
        ..Default::default()
    };
    match storage.update_user(user.id, update).await {
        Ok(Some(_)) => {
            invalidate_user(request, user.id).await;
            info!("User {} changed password", user.id);
            Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty("密码修改成功")))
        }
        Ok(None) => Ok(not_found(ErrorCode::UserNotFound, "用户不存在")),
        Err(e) => Ok(error_response(request, &e)),
    }
}
