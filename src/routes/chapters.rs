use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Resource, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::chapters::requests::{CreateChapterRequest, UpdateChapterRequest};
use crate::models::users::entities::UserRole;
use crate::services::ChapterService;

// 懒加载的全局 CHAPTER_SERVICE 实例
static CHAPTER_SERVICE: Lazy<ChapterService> = Lazy::new(ChapterService::new_lazy);

pub async fn list_chapters(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    CHAPTER_SERVICE.list_chapters(&req, path.into_inner()).await
}

pub async fn create_chapter(
    req: HttpRequest,
    path: web::Path<i64>,
    chapter_data: web::Json<CreateChapterRequest>,
) -> ActixResult<HttpResponse> {
    CHAPTER_SERVICE
        .create_chapter(&req, path.into_inner(), chapter_data.into_inner())
        .await
}

pub async fn get_chapter(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    CHAPTER_SERVICE.get_chapter(&req, path.into_inner()).await
}

pub async fn update_chapter(
    req: HttpRequest,
    path: web::Path<i64>,
    update_data: web::Json<UpdateChapterRequest>,
) -> ActixResult<HttpResponse> {
    CHAPTER_SERVICE
        .update_chapter(&req, path.into_inner(), update_data.into_inner())
        .await
}

pub async fn delete_chapter(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    CHAPTER_SERVICE.delete_chapter(&req, path.into_inner()).await
}

pub async fn add_resource(
    req: HttpRequest,
    path: web::Path<i64>,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    CHAPTER_SERVICE
        .add_resource(&req, path.into_inner(), payload)
        .await
}

pub async fn delete_resource(
    req: HttpRequest,
    path: web::Path<(i64, i64)>,
) -> ActixResult<HttpResponse> {
    let (chapter_id, resource_id) = path.into_inner();
    CHAPTER_SERVICE
        .delete_resource(&req, chapter_id, resource_id)
        .await
}

/// `/api/courses/{course_id}/chapters`，挂在课程 scope 之下
pub fn course_chapters_resource() -> Resource {
    web::resource("/{course_id}/chapters")
        .route(web::get().to(list_chapters))
        .route(
            web::post()
                .to(create_chapter)
                .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles())),
        )
}

// 配置路由
pub fn configure_chapter_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/chapters")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_chapter))
                    .route(
                        web::put()
                            .to(update_chapter)
                            .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles())),
                    )
                    .route(
                        web::delete()
                            .to(delete_chapter)
                            .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles())),
                    ),
            )
            .service(
                web::resource("/{id}/resources")
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles()))
                    .route(web::post().to(add_resource)),
            )
            .service(
                web::resource("/{id}/resources/{resource_id}")
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles()))
                    .route(web::delete().to(delete_resource)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorCode;
    use crate::routes::courses::configure_course_routes;
    use crate::test_support::{MultipartBody, PDF_BYTES, TestContext, new_course, read_json, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::json;

    #[actix_web::test]
    async fn test_create_chapter_order_conflict() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let course = ctx
            .storage
            .create_course(new_course(teacher.id, "Rust"))
            .await
            .unwrap();
        let app = test_app!(ctx, configure_course_routes, configure_chapter_routes);

        let create = |body: serde_json::Value| {
            let req = test::TestRequest::post()
                .uri(&format!("/api/courses/{}/chapters", course.id))
                .insert_header(("Authorization", ctx.bearer(&teacher)))
                .set_json(body)
                .to_request();
            test::call_service(&app, req)
        };

        let resp = create(json!({"title": "第一章"})).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = read_json(resp).await;
        assert_eq!(body["data"]["order"], 1);
        assert_eq!(body["data"]["duration"], 30);

        let resp = create(json!({"title": "第二章"})).await;
        let body = read_json(resp).await;
        assert_eq!(body["data"]["order"], 2);

        let resp = create(json!({"title": "重复序号", "order": 2})).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body = read_json(resp).await;
        assert_eq!(body["code"], ErrorCode::ChapterOrderConflict as i32);

        let resp = create(json!({"title": "  "})).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_chapter_access_requires_enrollment() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let enrolled = ctx.user("enrolled", UserRole::Student).await;
        let outsider = ctx.user("outsider", UserRole::Student).await;
        let course = ctx.published_course(&teacher, "公开课").await;
        ctx.storage.enroll(course.id, enrolled.id).await.unwrap();
        let chapter = ctx.storage.list_chapters_by_course(course.id).await.unwrap()[0].clone();
        let app = test_app!(ctx, configure_course_routes, configure_chapter_routes);

        let list = |user| {
            let req = test::TestRequest::get()
                .uri(&format!("/api/courses/{}/chapters", course.id))
                .insert_header(("Authorization", ctx.bearer(user)))
                .to_request();
            test::call_service(&app, req)
        };
        assert_eq!(list(&enrolled).await.status(), StatusCode::OK);
        assert_eq!(list(&outsider).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri(&format!("/api/chapters/{}", chapter.id))
            .insert_header(("Authorization", ctx.bearer(&enrolled)))
            .to_request();
        let body = read_json(test::call_service(&app, req).await).await;
        assert_eq!(body["data"]["chapter"]["id"], chapter.id);
        assert!(body["data"]["study_record"].is_null());

        // 学生不能修改章节
        let req = test::TestRequest::put()
            .uri(&format!("/api/chapters/{}", chapter.id))
            .insert_header(("Authorization", ctx.bearer(&enrolled)))
            .set_json(json!({"title": "改名"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_resource_upload_and_delete() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let course = ctx.published_course(&teacher, "资源课").await;
        let chapter = ctx.storage.list_chapters_by_course(course.id).await.unwrap()[0].clone();
        let app = test_app!(ctx, configure_chapter_routes);

        let (content_type, payload) = MultipartBody::new()
            .text("title", "讲义")
            .text("type", "document")
            .file("file", "slides.pdf", "application/pdf", PDF_BYTES)
            .finish();
        let req = test::TestRequest::post()
            .uri(&format!("/api/chapters/{}/resources", chapter.id))
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .insert_header(("Content-Type", content_type))
            .set_payload(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = read_json(resp).await;
        assert_eq!(body["data"]["type"], "document");
        assert_eq!(body["data"]["file_name"], "slides.pdf");
        let resource_id = body["data"]["id"].as_i64().unwrap();
        let url = body["data"]["url"].as_str().unwrap().to_string();
        let path = crate::utils::upload::path_from_url(&ctx.config.upload.dir, &url).unwrap();
        assert!(path.exists());

        let req = test::TestRequest::delete()
            .uri(&format!("/api/chapters/{}/resources/{resource_id}", chapter.id))
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(!path.exists());

        let req = test::TestRequest::delete()
            .uri(&format!("/api/chapters/{}/resources/{resource_id}", chapter.id))
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_resource_rejects_bad_type() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let course = ctx.published_course(&teacher, "资源课").await;
        let chapter = ctx.storage.list_chapters_by_course(course.id).await.unwrap()[0].clone();
        let app = test_app!(ctx, configure_chapter_routes);

        let (content_type, payload) = MultipartBody::new()
            .text("type", "hologram")
            .file("file", "slides.pdf", "application/pdf", PDF_BYTES)
            .finish();
        let req = test::TestRequest::post()
            .uri(&format!("/api/chapters/{}/resources", chapter.id))
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .insert_header(("Content-Type", content_type))
            .set_payload(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // 失败的请求不留下文件
        let dir = std::path::Path::new(&ctx.config.upload.dir).join("resources");
        let leftover = std::fs::read_dir(&dir).map(|d| d.count()).unwrap_or(0);
        assert_eq!(leftover, 0);
    }
}
