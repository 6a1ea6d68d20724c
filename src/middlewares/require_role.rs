/*!
 * 基于角色的访问控制中间件
 *
 * 必须在 RequireJWT 之后使用（即 `.wrap(RequireRole)` 写在 `.wrap(RequireJWT)` 之前）。
 *
 * ```rust,ignore
 * web::scope("/api/admin")
 *     .wrap(RequireRole::new(&UserRole::Admin))
 *     .wrap(RequireJWT)
 * ```
 *
 * 资源归属（课程教师、本人数据）不在这里判断，由 `policy` 模块负责。
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::info;

use crate::models::{
    ErrorCode,
    users::entities::{User, UserRole},
};

use super::create_error_response;

#[derive(Clone)]
pub struct RequireRole {
    allowed_roles: Rc<Vec<UserRole>>,
}

impl RequireRole {
    /// 只允许单一角色
    pub fn new(role: &UserRole) -> Self {
        Self {
            allowed_roles: Rc::new(vec![*role]),
        }
    }

    /// 允许任一角色
    pub fn new_any(roles: &[&UserRole]) -> Self {
        Self {
            allowed_roles: Rc::new(roles.iter().map(|r| **r).collect()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleMiddleware {
            service: Rc::new(service),
            allowed_roles: self.allowed_roles.clone(),
        }))
    }
}

pub struct RequireRoleMiddleware<S> {
    service: Rc<S>,
    allowed_roles: Rc<Vec<UserRole>>,
}

impl<S, B> Service<ServiceRequest> for RequireRoleMiddleware<S>
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
        let allowed_roles = self.allowed_roles.clone();

        Box::pin(async move {
            let role = req.extensions().get::<User>().map(|u| (u.id, u.role));

            match role {
                Some((_, role)) if allowed_roles.contains(&role) => {
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Some((user_id, role)) => {
                    info!(
                        "Access denied for user {} (role: {}). Allowed roles: {:?}",
                        user_id, role, allowed_roles
                    );
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::FORBIDDEN,
                            ErrorCode::Forbidden,
                            "当前角色无权访问",
                        )
                        .map_into_right_body(),
                    ))
                }
                None => {
                    info!("Role check failed: no user in request, RequireJWT must run first");
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            ErrorCode::Unauthorized,
                            "需要登录",
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserStatus;
    use actix_web::{App, HttpResponse, dev::Service as _, test, web};

    fn user(role: UserRole) -> User {
        let now = chrono::Utc::now();
        User {
            id: 7,
            username: "someone".into(),
            email: "someone@example.com".into(),
            password_hash: String::new(),
            role,
            status: UserStatus::Active,
            name: None,
            avatar_url: None,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[actix_web::test]
    async fn test_role_gate() {
        let app = test::init_service(
            App::new().service(
                web::scope("/t")
                    .wrap(RequireRole::new_any(UserRole::teacher_roles()))
                    .route("", web::get().to(HttpResponse::Ok)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/t").to_request();
        req.extensions_mut().insert(user(UserRole::Teacher));
        let resp = app.call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/t").to_request();
        req.extensions_mut().insert(user(UserRole::Student));
        let resp = app.call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get().uri("/t").to_request();
        let resp = app.call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
