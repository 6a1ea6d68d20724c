use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::auth::requests::{LoginRequest, RegisterRequest, UpdatePasswordRequest};
use crate::services::AuthService;

// 懒加载的全局 AuthService 实例
static AUTH_SERVICE: Lazy<AuthService> = Lazy::new(AuthService::new_lazy);

pub async fn login(
    req: HttpRequest,
    user_data: web::Json<LoginRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.login(user_data.into_inner(), &req).await
}

pub async fn register(
    req: HttpRequest,
    user_data: web::Json<RegisterRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.register(user_data.into_inner(), &req).await
}

pub async fn refresh_token(request: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.refresh_token(&request).await
}

pub async fn logout(request: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.logout(&request).await
}

pub async fn get_user(request: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.get_user(&request).await
}

pub async fn update_password(
    request: HttpRequest,
    password_data: web::Json<UpdatePasswordRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE
        .update_password(password_data.into_inner(), &request)
        .await
}

// 配置路由
pub fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .service(
                web::resource("/login")
                    .wrap(middlewares::RateLimit::login())
                    .route(web::post().to(login)),
            )
            .service(
                web::resource("/register")
                    .wrap(middlewares::RateLimit::register())
                    .route(web::post().to(register)),
            )
            .route("/refresh", web::post().to(refresh_token))
            .route("/logout", web::post().to(logout))
            .service(
                web::scope("")
                    .wrap(middlewares::RequireJWT)
                    .route("/me", web::get().to(get_user))
                    .route("/update-password", web::put().to(update_password)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::{UserRole, UserStatus};
    use crate::models::users::requests::UpdateUserRequest;
    use crate::test_support::{TestContext, read_json, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::json;

    #[actix_web::test]
    async fn test_register_then_me() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx, configure_auth_routes);

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "username": "alice",
                "email": "Alice@Example.com",
                "password": "secret1",
                "name": "Alice"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert!(resp.headers().get("set-cookie").is_some());
        let body = read_json(resp).await;
        assert_eq!(body["data"]["user"]["role"], "student");
        assert_eq!(body["data"]["user"]["email"], "alice@example.com");
        assert!(body["data"]["user"].get("password_hash").is_none());

        let token = body["data"]["access_token"].as_str().unwrap().to_string();
        let req = test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = read_json(resp).await;
        assert_eq!(body["data"]["user"]["username"], "alice");
    }

    #[actix_web::test]
    async fn test_register_rejects_duplicates_and_admin_role() {
        let ctx = TestContext::new().await;
        ctx.user("bob", UserRole::Student).await;
        let app = test_app!(ctx, configure_auth_routes);

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({"username": "bob", "email": "new@example.com", "password": "secret1"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "username": "mallory",
                "email": "mallory@example.com",
                "password": "secret1",
                "role": "admin"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_login_wrong_password_and_disabled_user() {
        let ctx = TestContext::new().await;
        let user = ctx.user("carol", UserRole::Teacher).await;
        let app = test_app!(ctx, configure_auth_routes);

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"username": "carol", "password": "wrong-password"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"username": "carol@example.com", "password": "password123"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = read_json(resp).await;
        assert!(body["data"]["user"]["last_login"].is_string());

        ctx.storage
            .update_user(
                user.id,
                UpdateUserRequest {
                    status: Some(UserStatus::Disabled),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"username": "carol", "password": "password123"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_refresh_with_cookie() {
        let ctx = TestContext::new().await;
        ctx.user("dave", UserRole::Student).await;
        let app = test_app!(ctx, configure_auth_routes);

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"username": "dave", "password": "password123"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == crate::utils::jwt::REFRESH_TOKEN_COOKIE)
            .unwrap()
            .into_owned();

        let req = test::TestRequest::post()
            .uri("/api/auth/refresh")
            .cookie(cookie)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/api/auth/refresh")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_update_password() {
        let ctx = TestContext::new().await;
        let user = ctx.user("erin", UserRole::Student).await;
        let app = test_app!(ctx, configure_auth_routes);

        let req = test::TestRequest::put()
            .uri("/api/auth/update-password")
            .insert_header(("Authorization", ctx.bearer(&user)))
            .set_json(json!({"current_password": "nope", "new_password": "newsecret"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put()
            .uri("/api/auth/update-password")
            .insert_header(("Authorization", ctx.bearer(&user)))
            .set_json(json!({"current_password": "password123", "new_password": "newsecret"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"username": "erin", "password": "newsecret"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_me_requires_token() {
        let ctx = TestContext::new().await;
        let app = test_app!(ctx, configure_auth_routes);
        let req = test::TestRequest::get().uri("/api/auth/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
