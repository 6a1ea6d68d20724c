use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::get_config;
use crate::models::auth::RegisterRequest;
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode, users::requests::CreateUserRequest};
use crate::services::common::bad_request;
use crate::storage::Storage;
use crate::utils::error_response;
use crate::utils::password::hash_password;
use crate::utils::validate::{validate_email, validate_password, validate_username};

use super::AuthService;
use super::login::issue_tokens;

pub async fn handle_register(
    service: &AuthService,
    register_request: RegisterRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let config = get_config(request);

    let username = register_request.username.trim().to_string();
    let email = register_request.email.trim().to_lowercase();

    // 1. 字段校验
    if let Err(msg) = validate_username(&username) {
        return Ok(bad_request(ErrorCode::UserNameInvalid, msg));
    }
    if let Err(msg) = validate_email(&email) {
        return Ok(bad_request(ErrorCode::UserEmailInvalid, msg));
    }
    if let Err(msg) = validate_password(&register_request.password) {
        return Ok(bad_request(ErrorCode::UserPasswordInvalid, msg));
    }

    // 2. 只允许注册学生或教师
    let role = register_request.role.unwrap_or(UserRole::Student);
    if role == UserRole::Admin {
        return Ok(bad_request(ErrorCode::ValidationError, "不能注册管理员账号"));
    }

    // 3. 唯一性检查
    unwrap_or_respond!(check_username_exists(&storage, request, &username).await);
    unwrap_or_respond!(check_email_exists(&storage, request, &email).await);

    // 4. 哈希密码并创建用户
    let password_hash = match hash_password(&config.argon2, &register_request.password) {
        Ok(hash) => hash,
        Err(e) => return Ok(error_response(request, &e)),
    };

    let create_request = CreateUserRequest {
        username,
        email,
        password: password_hash,
        role,
        name: register_request
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
    };

    let mut user = match storage.create_user(create_request).await {
        Ok(user) => user,
        Err(e) => return Ok(error_response(request, &e)),
    };

    if let Err(e) = storage.update_last_login(user.id).await {
        warn!("Failed to update last login for user {}: {}", user.id, e);
    }
    user.last_login = Some(chrono::Utc::now());

    info!("User {} registered as {}", user.username, user.role);
    Ok(issue_tokens(
        &config,
        user,
        false,
        HttpResponse::Created(),
        "注册成功",
    ))
}

async fn check_username_exists(
    storage: &Arc<dyn Storage>,
    request: &HttpRequest,
    username: &str,
) -> Result<(), HttpResponse> {
    match storage.get_user_by_username(username).await {
        Ok(Some(_)) => Err(HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::UserNameAlreadyExists,
            "用户名已存在",
        ))),
        Ok(None) => Ok(()),
        Err(e) => Err(error_response(request, &e)),
    }
}

async fn check_email_exists(
    storage: &Arc<dyn Storage>,
    request: &HttpRequest,
    email: &str,
) -> Result<(), HttpResponse> {
    match storage.get_user_by_email(email).await {
        Ok(Some(_)) => Err(HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::UserEmailAlreadyExists,
            "邮箱已被注册",
        ))),
        Ok(None) => Ok(()),
        Err(e) => Err(error_response(request, &e)),
    }
}
