use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::config::get_config;
use crate::models::ApiResponse;
use crate::utils::jwt::JwtUtils;

/// 处理用户登出
/// 通过设置空的 refresh_token cookie 来清除客户端的登录状态
pub async fn handle_logout(request: &HttpRequest) -> ActixResult<HttpResponse> {
    let config = get_config(request);
    // max_age=0 会让浏览器删除该 cookie
    let empty_cookie = JwtUtils::create_empty_refresh_token_cookie(&config.jwt);

    Ok(HttpResponse::Ok()
        .cookie(empty_cookie)
        .json(ApiResponse::<()>::success_empty("登出成功")))
}
