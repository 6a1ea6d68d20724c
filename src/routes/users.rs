use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::users::requests::{UpdateProfileRequest, UpdateSettingsRequest};
use crate::services::UserService;

// 懒加载的全局 USER_SERVICE 实例
static USER_SERVICE: Lazy<UserService> = Lazy::new(UserService::new_lazy);

pub async fn get_profile(req: HttpRequest) -> ActixResult<HttpResponse> {
    USER_SERVICE.get_profile(&req).await
}

pub async fn update_profile(
    req: HttpRequest,
    update: web::Json<UpdateProfileRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE.update_profile(&req, update.into_inner()).await
}

pub async fn get_settings(req: HttpRequest) -> ActixResult<HttpResponse> {
    USER_SERVICE.get_settings(&req).await
}

pub async fn update_settings(
    req: HttpRequest,
    update: web::Json<UpdateSettingsRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE.update_settings(&req, update.into_inner()).await
}

pub async fn upload_avatar(req: HttpRequest, payload: Multipart) -> ActixResult<HttpResponse> {
    USER_SERVICE.upload_avatar(&req, payload).await
}

pub async fn delete_avatar(req: HttpRequest) -> ActixResult<HttpResponse> {
    USER_SERVICE.delete_avatar(&req).await
}

// 配置路由：当前登录用户自己的资料与设置
pub fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/users")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("/profile")
                    .route(web::get().to(get_profile))
                    .route(web::put().to(update_profile)),
            )
            .service(
                web::resource("/settings")
                    .route(web::get().to(get_settings))
                    .route(web::put().to(update_settings)),
            )
            .service(
                web::resource("/avatar")
                    .route(web::post().to(upload_avatar))
                    .route(web::delete().to(delete_avatar)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::test_support::{MultipartBody, PNG_BYTES, TestContext, read_json, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::json;

    #[actix_web::test]
    async fn test_profile_email_must_stay_unique() {
        let ctx = TestContext::new().await;
        let alice = ctx.user("alice", UserRole::Student).await;
        ctx.user("bob", UserRole::Student).await;
        let app = test_app!(ctx, configure_user_routes);

        let req = test::TestRequest::put()
            .uri("/api/users/profile")
            .insert_header(("Authorization", ctx.bearer(&alice)))
            .set_json(json!({"email": "bob@example.com"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::put()
            .uri("/api/users/profile")
            .insert_header(("Authorization", ctx.bearer(&alice)))
            .set_json(json!({"name": "Alice A."}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = read_json(resp).await;
        assert_eq!(body["data"]["user"]["name"], "Alice A.");
    }

    #[actix_web::test]
    async fn test_settings_defaults_and_patch() {
        let ctx = TestContext::new().await;
        let user = ctx.user("carol", UserRole::Student).await;
        let app = test_app!(ctx, configure_user_routes);

        let req = test::TestRequest::get()
            .uri("/api/users/settings")
            .insert_header(("Authorization", ctx.bearer(&user)))
            .to_request();
        let body = read_json(test::call_service(&app, req).await).await;
        assert_eq!(body["data"]["theme"], "light");
        assert_eq!(body["data"]["notification"]["exam"], true);

        let req = test::TestRequest::put()
            .uri("/api/users/settings")
            .insert_header(("Authorization", ctx.bearer(&user)))
            .set_json(json!({"theme": "dark", "notification": {"email": false}}))
            .to_request();
        let body = read_json(test::call_service(&app, req).await).await;
        assert_eq!(body["data"]["theme"], "dark");
        assert_eq!(body["data"]["notification"]["email"], false);
        assert_eq!(body["data"]["notification"]["assignment"], true);
    }

    #[actix_web::test]
    async fn test_avatar_upload_replaces_file() {
        let ctx = TestContext::new().await;
        let user = ctx.user("dave", UserRole::Student).await;
        let app = test_app!(ctx, configure_user_routes);

        let upload = |name: &str| {
            let (content_type, body) = MultipartBody::new()
                .file("avatar", name, "image/png", PNG_BYTES)
                .finish();
            test::TestRequest::post()
                .uri("/api/users/avatar")
                .insert_header(("Authorization", ctx.bearer(&user)))
                .insert_header(("Content-Type", content_type))
                .set_payload(body)
                .to_request()
        };

        let body = read_json(test::call_service(&app, upload("me.png")).await).await;
        let first = body["data"]["avatar_url"].as_str().unwrap().to_string();
        assert!(first.starts_with("/api/uploads/avatars/"));
        let first_path =
            crate::utils::upload::path_from_url(&ctx.config.upload.dir, &first).unwrap();
        assert!(first_path.exists());

        // 认证缓存已失效，第二次上传能看到第一次的头像并清理它
        let body = read_json(test::call_service(&app, upload("me2.png")).await).await;
        let second = body["data"]["avatar_url"].as_str().unwrap().to_string();
        assert_ne!(first, second);
        assert!(!first_path.exists());
    }

    #[actix_web::test]
    async fn test_avatar_rejects_wrong_type() {
        let ctx = TestContext::new().await;
        let user = ctx.user("erin", UserRole::Student).await;
        let app = test_app!(ctx, configure_user_routes);

        let (content_type, body) = MultipartBody::new()
            .file("avatar", "notes.pdf", "application/pdf", b"%PDF-1.4")
            .finish();
        let req = test::TestRequest::post()
            .uri("/api/users/avatar")
            .insert_header(("Authorization", ctx.bearer(&user)))
            .insert_header(("Content-Type", content_type))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
