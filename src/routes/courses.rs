use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::courses::requests::{
    CourseListParams, CreateCourseRequest, UpdateCourseRequest, UpdateCourseStatusRequest,
};
use crate::models::users::entities::UserRole;
use crate::services::CourseService;

// 懒加载的全局 COURSE_SERVICE 实例
static COURSE_SERVICE: Lazy<CourseService> = Lazy::new(CourseService::new_lazy);

pub async fn list_courses(
    req: HttpRequest,
    query: web::Query<CourseListParams>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.list_courses(&req, query.into_inner()).await
}

pub async fn get_course(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.get_course(&req, path.into_inner()).await
}

pub async fn create_course(
    req: HttpRequest,
    course_data: web::Json<CreateCourseRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .create_course(&req, course_data.into_inner())
        .await
}

pub async fn update_course(
    req: HttpRequest,
    path: web::Path<i64>,
    update_data: web::Json<UpdateCourseRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .update_course(&req, path.into_inner(), update_data.into_inner())
        .await
}

pub async fn update_course_status(
    req: HttpRequest,
    path: web::Path<i64>,
    status_data: web::Json<UpdateCourseStatusRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .update_course_status(&req, path.into_inner(), status_data.into_inner())
        .await
}

pub async fn upload_cover(
    req: HttpRequest,
    path: web::Path<i64>,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .upload_cover(&req, path.into_inner(), payload)
        .await
}

pub async fn delete_course(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.delete_course(&req, path.into_inner()).await
}

// 配置路由
pub fn configure_course_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/courses")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .route(web::get().to(list_courses))
                    .route(
                        web::post()
                            .to(create_course)
                            .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles())),
                    ),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_course))
                    .route(
                        web::put()
                            .to(update_course)
                            .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles())),
                    )
                    .route(
                        web::delete()
                            .to(delete_course)
                            .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles())),
                    ),
            )
            .service(
                web::resource("/{id}/status")
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles()))
                    .route(web::patch().to(update_course_status)),
            )
            .service(
                web::resource("/{id}/cover")
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles()))
                    .route(web::patch().to(upload_cover)),
            )
            .service(super::chapters::course_chapters_resource()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorCode;
    use crate::models::chapters::requests::CreateChapterRequest;
    use crate::test_support::{MultipartBody, PNG_BYTES, TestContext, new_course, read_json, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::json;

    #[actix_web::test]
    async fn test_list_visibility_by_role() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let other = ctx.user("other", UserRole::Teacher).await;
        let student = ctx.user("student", UserRole::Student).await;
        ctx.published_course(&teacher, "Rust 入门").await;
        ctx.storage
            .create_course(new_course(teacher.id, "草稿课程"))
            .await
            .unwrap();
        let app = test_app!(ctx, configure_course_routes);

        let list_as = |user| {
            let req = test::TestRequest::get()
                .uri("/api/courses?page=1&size=10")
                .insert_header(("Authorization", ctx.bearer(user)))
                .to_request();
            test::call_service(&app, req)
        };

        let body = read_json(list_as(&student).await).await;
        assert_eq!(body["data"]["pagination"]["total"], 1);
        assert_eq!(body["data"]["items"][0]["status"], "published");

        let body = read_json(list_as(&teacher).await).await;
        assert_eq!(body["data"]["pagination"]["total"], 2);

        let body = read_json(list_as(&other).await).await;
        assert_eq!(body["data"]["pagination"]["total"], 1);
    }

    #[actix_web::test]
    async fn test_create_course_and_duplicate_title() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let student = ctx.user("student", UserRole::Student).await;
        let app = test_app!(ctx, configure_course_routes);

        let payload = json!({
            "title": "Rust 入门",
            "description": "从零开始",
            "category": "programming",
            "level": "beginner",
            "price": 9.9
        });
        let req = test::TestRequest::post()
            .uri("/api/courses")
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = read_json(resp).await;
        assert_eq!(body["data"]["status"], "draft");
        assert_eq!(body["data"]["teacher_id"], teacher.id);

        let req = test::TestRequest::post()
            .uri("/api/courses")
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body = read_json(resp).await;
        assert_eq!(body["code"], ErrorCode::CourseAlreadyExists as i32);

        let req = test::TestRequest::post()
            .uri("/api/courses")
            .insert_header(("Authorization", ctx.bearer(&student)))
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_publish_requires_cover_and_chapter() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let course = ctx
            .storage
            .create_course(new_course(teacher.id, "待发布"))
            .await
            .unwrap();
        let app = test_app!(ctx, configure_course_routes);

        let publish = || {
            test::TestRequest::patch()
                .uri(&format!("/api/courses/{}/status", course.id))
                .insert_header(("Authorization", ctx.bearer(&teacher)))
                .set_json(json!({"status": "published"}))
                .to_request()
        };

        let resp = test::call_service(&app, publish()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = read_json(resp).await;
        assert_eq!(body["code"], ErrorCode::CoursePublishRequirement as i32);
        let message = body["message"].as_str().unwrap();
        assert!(message.contains("cover_image") && message.contains("chapters"));

        let (content_type, payload) = MultipartBody::new()
            .file("cover", "cover.png", "image/png", PNG_BYTES)
            .finish();
        let req = test::TestRequest::patch()
            .uri(&format!("/api/courses/{}/cover", course.id))
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .insert_header(("Content-Type", content_type))
            .set_payload(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        ctx.storage
            .create_chapter(
                course.id,
                CreateChapterRequest {
                    title: "第一章".into(),
                    description: None,
                    content: None,
                    duration: None,
                    order: None,
                },
            )
            .await
            .unwrap();

        let resp = test::call_service(&app, publish()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = read_json(resp).await;
        assert_eq!(body["data"]["status"], "published");
        assert!(body["data"]["published_at"].is_string());

        // 已发布课程不可编辑
        let req = test::TestRequest::put()
            .uri(&format!("/api/courses/{}", course.id))
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .set_json(json!({"title": "新标题"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = read_json(resp).await;
        assert_eq!(body["code"], ErrorCode::CoursePublishedReadOnly as i32);
    }

    #[actix_web::test]
    async fn test_invalid_status_transition() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let course = ctx
            .storage
            .create_course(new_course(teacher.id, "草稿"))
            .await
            .unwrap();
        let app = test_app!(ctx, configure_course_routes);

        let req = test::TestRequest::patch()
            .uri(&format!("/api/courses/{}/status", course.id))
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .set_json(json!({"status": "closed"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = read_json(resp).await;
        assert_eq!(body["code"], ErrorCode::CourseInvalidStatus as i32);
    }

    #[actix_web::test]
    async fn test_course_detail_visibility() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let other = ctx.user("other", UserRole::Teacher).await;
        let student = ctx.user("student", UserRole::Student).await;
        let draft = ctx
            .storage
            .create_course(new_course(teacher.id, "草稿"))
            .await
            .unwrap();
        let published = ctx.published_course(&teacher, "公开课").await;
        ctx.storage.enroll(published.id, student.id).await.unwrap();
        let app = test_app!(ctx, configure_course_routes);

        let get = |user, id: i64| {
            let req = test::TestRequest::get()
                .uri(&format!("/api/courses/{id}"))
                .insert_header(("Authorization", ctx.bearer(user)))
                .to_request();
            test::call_service(&app, req)
        };

        assert_eq!(get(&student, draft.id).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(get(&other, draft.id).await.status(), StatusCode::FORBIDDEN);
        assert_eq!(get(&teacher, draft.id).await.status(), StatusCode::OK);

        let body = read_json(get(&student, published.id).await).await;
        assert_eq!(body["data"]["enrolled"], true);
        assert_eq!(body["data"]["teacher"]["username"], "teacher");
        assert_eq!(body["data"]["chapters"].as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_delete_course_guards() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let other = ctx.user("other", UserRole::Teacher).await;
        let student = ctx.user("student", UserRole::Student).await;
        let course = ctx.published_course(&teacher, "有学生").await;
        ctx.storage.enroll(course.id, student.id).await.unwrap();
        let empty = ctx
            .storage
            .create_course(new_course(teacher.id, "空课程"))
            .await
            .unwrap();
        let app = test_app!(ctx, configure_course_routes);

        let delete = |user, id: i64| {
            let req = test::TestRequest::delete()
                .uri(&format!("/api/courses/{id}"))
                .insert_header(("Authorization", ctx.bearer(user)))
                .to_request();
            test::call_service(&app, req)
        };

        assert_eq!(delete(&other, empty.id).await.status(), StatusCode::FORBIDDEN);

        let resp = delete(&teacher, course.id).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = read_json(resp).await;
        assert_eq!(body["code"], ErrorCode::CourseHasEnrollments as i32);

        assert_eq!(delete(&teacher, empty.id).await.status(), StatusCode::OK);
        assert!(ctx.storage.get_course_by_id(empty.id).await.unwrap().is_none());
    }
}
