use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use crate::config::get_config;
use crate::models::auth::responses::RefreshTokenResponse;
use crate::models::users::responses::UserResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::current_user;
use crate::utils::jwt::JwtUtils;

use super::AuthService;

pub async fn handle_refresh_token(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let config = get_config(request);

    // 从 cookie 中提取 refresh token
    let Some(refresh_token) = JwtUtils::extract_refresh_token_from_cookie(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "未登录，请先登录",
        )));
    };

    let expired = || {
        // 清除无效的 refresh token cookie
        HttpResponse::Unauthorized()
            .cookie(JwtUtils::create_empty_refresh_token_cookie(&config.jwt))
            .json(ApiResponse::error_empty(
                ErrorCode::TokenInvalid,
                "登录已过期，请重新登录",
            ))
    };

    let claims = match JwtUtils::verify_refresh_token(&config.jwt, &refresh_token) {
        Ok(claims) => claims,
        Err(e) => {
            info!("Refresh token rejected: {}", e);
            return Ok(expired());
        }
    };
    let Some(user_id) = claims.user_id() else {
        return Ok(expired());
    };

    // 以最新的用户状态与角色签发新令牌
    let storage = service.get_storage(request);
    let user = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) if user.is_active() => user,
        Ok(_) => return Ok(expired()),
        Err(e) => {
            error!("Failed to load user {} for token refresh: {}", user_id, e);
            return Ok(expired());
        }
    };

    match JwtUtils::generate_access_token(&config.jwt, user.id, user.role.as_str()) {
        Ok(access_token) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            RefreshTokenResponse {
                access_token,
                expires_in: config.jwt.access_token_expiry * 60,
            },
            "令牌刷新成功",
        ))),
        Err(e) => {
            error!("Failed to generate access token: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "无法生成登录令牌",
                )),
            )
        }
    }
}

pub async fn handle_get_user(
    _service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = unwrap_or_respond!(current_user(request));
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        UserResponse { user },
        "获取用户信息成功",
    )))
}
