use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info, warn};

use crate::config::{AppConfig, get_config};
use crate::models::users::entities::User;
use crate::models::{
    ApiResponse, ErrorCode,
    auth::{LoginRequest, LoginResponse},
};
use crate::services::common::invalidate_user;
use crate::utils::error_response;
use crate::utils::jwt::JwtUtils;
use crate::utils::password::verify_password;

use super::AuthService;

pub async fn handle_login(
    service: &AuthService,
    login_request: LoginRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let config = get_config(request);

    // 1. 根据用户名或邮箱获取用户信息
    let user = match storage
        .get_user_by_username_or_email(login_request.username.trim())
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(auth_failed()),
        Err(e) => return Ok(error_response(request, &e)),
    };

    // 2. 验证密码
    if !verify_password(&login_request.password, &user.password_hash) {
        warn!("Failed login attempt for user {}", user.username);
        return Ok(auth_failed());
    }

    // 3. 被禁用的账号不允许登录
    if !user.is_active() {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::UserDisabled,
            "账号已被禁用",
        )));
    }

    // 4. 更新最后登录时间
    if let Err(e) = storage.update_last_login(user.id).await {
        warn!("Failed to update last login for user {}: {}", user.id, e);
    }
    invalidate_user(request, user.id).await;

    let mut user = user;
    user.last_login = Some(chrono::Utc::now());
    info!("User {} logged in successfully", user.username);
    Ok(issue_tokens(
        &config,
        user,
        login_request.remember_me,
        HttpResponse::Ok(),
        "登录成功",
    ))
}

/// 生成令牌对，access token 放在响应体中，refresh token 放在 HttpOnly cookie 中
pub(crate) fn issue_tokens(
    config: &AppConfig,
    user: User,
    remember_me: bool,
    mut builder: actix_web::HttpResponseBuilder,
    message: &str,
) -> HttpResponse {
    match JwtUtils::generate_token_pair(&config.jwt, user.id, user.role.as_str(), remember_me) {
        Ok(token_pair) => {
            let response = LoginResponse {
                access_token: token_pair.access_token,
                expires_in: config.jwt.access_token_expiry * 60, // 转换为秒
                user,
                created_at: chrono::Utc::now(),
            };
            let refresh_cookie = JwtUtils::create_refresh_token_cookie(
                &config.jwt,
                &token_pair.refresh_token,
                remember_me,
            );
            builder
                .cookie(refresh_cookie)
                .json(ApiResponse::success(response, message))
        }
        Err(e) => {
            error!("Failed to generate JWT token: {}", e);
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                "无法生成登录令牌",
            ))
        }
    }
}

fn auth_failed() -> HttpResponse {
    HttpResponse::Unauthorized().json(ApiResponse::error_empty(
        ErrorCode::AuthFailed,
        "用户名或密码错误",
    ))
}
