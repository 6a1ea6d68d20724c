/*!
 * JWT 认证中间件
 *
 * 校验 `Authorization: Bearer <token>` 中的 access token，
 * 加载对应用户并放入请求扩展，供后续中间件与处理程序使用。
 *
 * ## 使用方法
 *
 * ```rust,ignore
 * web::scope("/api/courses")
 *     .wrap(RequireJWT)
 *     .route("", web::get().to(list_courses))
 * ```
 *
 * 处理程序中通过 `RequireJWT::extract_user_claims(&req)` 取得当前用户。
 *
 * ## 认证流程
 *
 * 1. 提取并验证 access token，得到用户 ID
 * 2. 先查缓存 `user:{id}`，未命中时从存储层读取并写回缓存
 * 3. 用户不存在返回 401，被禁用返回 403
 */

use crate::cache::{ObjectCache, user_cache_key};
use crate::config::get_config;
use crate::models::ErrorCode;
use crate::models::users::entities::User;
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, info, warn};

use super::create_error_response;

const BEARER_PREFIX: &str = "Bearer ";
const AUTHORIZATION_HEADER: &str = "Authorization";

#[derive(Clone)]
pub struct RequireJWT;

// 认证失败的原因
enum AuthFailure {
    Unauthorized(String),
    Disabled,
}

impl AuthFailure {
    fn into_response(self) -> HttpResponse {
        match self {
            AuthFailure::Unauthorized(message) => create_error_response(
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthorized,
                &format!("Unauthorized: {message}"),
            ),
            AuthFailure::Disabled => create_error_response(
                StatusCode::FORBIDDEN,
                ErrorCode::UserDisabled,
                "账号已被禁用",
            ),
        }
    }
}

// 辅助函数：提取并验证 JWT access token，返回当前用户
async fn extract_and_validate_jwt(req: &ServiceRequest) -> Result<User, AuthFailure> {
    let token = req
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .ok_or_else(|| AuthFailure::Unauthorized("缺少或无效的 Authorization 头".to_string()))?;

    let config = get_config(req.request());
    let claims = JwtUtils::verify_access_token(&config.jwt, token).map_err(|err| {
        info!("JWT token validation failed: {}", err);
        AuthFailure::Unauthorized("令牌无效或已过期".to_string())
    })?;
    let user_id = claims
        .user_id()
        .ok_or_else(|| AuthFailure::Unauthorized("令牌中的用户 ID 无效".to_string()))?;

    let cache = req
        .app_data::<web::Data<Arc<dyn ObjectCache>>>()
        .expect("Cache not found in app data")
        .get_ref()
        .clone();
    let cache_key = user_cache_key(user_id);

    let user = match cache.get_json::<User>(&cache_key).await {
        Some(user) => user,
        None => {
            debug!("User {} not found in cache, loading from storage", user_id);
            let storage = req
                .app_data::<web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone();

            let user = storage
                .get_user_by_id(user_id)
                .await
                .map_err(|e| {
                    warn!("Failed to load user {}: {}", user_id, e);
                    AuthFailure::Unauthorized("无法加载用户信息".to_string())
                })?
                .ok_or_else(|| AuthFailure::Unauthorized("用户不存在".to_string()))?;

            // 缓存中不含密码哈希
            cache
                .insert_json(cache_key, &user, config.cache.default_ttl)
                .await;
            user
        }
    };

    if !user.is_active() {
        return Err(AuthFailure::Disabled);
    }

    Ok(user)
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            // 预检请求直接放行给 CORS 处理
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(req.into_response(HttpResponse::NoContent().finish().map_into_right_body()));
            }

            match extract_and_validate_jwt(&req).await {
                Ok(user) => {
                    debug!("JWT authentication successful for ID: {}", user.id);
                    req.extensions_mut().insert(user);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(failure) => {
                    info!("JWT authentication failed for request to {}", req.path());
                    Ok(req.into_response(failure.into_response().map_into_right_body()))
                }
            }
        })
    }
}

// 辅助函数：从请求中提取用户信息
impl RequireJWT {
    /// 从请求扩展中提取当前用户
    /// 此函数应该在应用了RequireJWT中间件的路由处理程序中使用
    pub fn extract_user_claims(req: &actix_web::HttpRequest) -> Option<User> {
        req.extensions().get::<User>().cloned()
    }
}
