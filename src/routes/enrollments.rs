use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::enrollments::requests::{
    CourseStudentListParams, EnrollmentListParams, UpdateEnrollmentProgressRequest,
    UpdateEnrollmentStatusRequest,
};
use crate::models::users::entities::UserRole;
use crate::services::EnrollmentService;

// 懒加载的全局 ENROLLMENT_SERVICE 实例
static ENROLLMENT_SERVICE: Lazy<EnrollmentService> = Lazy::new(EnrollmentService::new_lazy);

pub async fn enroll(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE.enroll(&req, path.into_inner()).await
}

pub async fn list_my_enrollments(
    req: HttpRequest,
    query: web::Query<EnrollmentListParams>,
) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE
        .list_my_enrollments(&req, query.into_inner())
        .await
}

pub async fn update_status(
    req: HttpRequest,
    path: web::Path<i64>,
    status_data: web::Json<UpdateEnrollmentStatusRequest>,
) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE
        .update_status(&req, path.into_inner(), status_data.into_inner())
        .await
}

pub async fn update_progress(
    req: HttpRequest,
    path: web::Path<i64>,
    progress_data: web::Json<UpdateEnrollmentProgressRequest>,
) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE
        .update_progress(&req, path.into_inner(), progress_data.into_inner())
        .await
}

pub async fn list_course_students(
    req: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<CourseStudentListParams>,
) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE
        .list_course_students(&req, path.into_inner(), query.into_inner())
        .await
}

pub async fn get_detail(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    ENROLLMENT_SERVICE.get_detail(&req, path.into_inner()).await
}

// 配置路由
pub fn configure_enrollment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/enrollments")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::student_roles()))
                    .route(web::get().to(list_my_enrollments)),
            )
            .service(
                web::resource("/courses/{course_id}/enroll")
                    .wrap(middlewares::RequireRole::new_any(UserRole::student_roles()))
                    .route(web::post().to(enroll)),
            )
            .service(
                web::resource("/courses/{course_id}/students")
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles()))
                    .route(web::get().to(list_course_students)),
            )
            .route("/{id}/status", web::put().to(update_status))
            .service(
                web::resource("/{id}/progress")
                    .wrap(middlewares::RequireRole::new_any(UserRole::student_roles()))
                    .route(web::put().to(update_progress)),
            )
            .route("/{id}/detail", web::get().to(get_detail)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorCode;
    use crate::test_support::{TestContext, new_course, read_json, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::json;

    #[actix_web::test]
    async fn test_double_enroll_conflicts_without_touching_count() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let student = ctx.user("student", UserRole::Student).await;
        let course = ctx.published_course(&teacher, "Rust").await;
        let app = test_app!(ctx, configure_enrollment_routes);

        let enroll = || {
            test::TestRequest::post()
                .uri(&format!("/api/enrollments/courses/{}/enroll", course.id))
                .insert_header(("Authorization", ctx.bearer(&student)))
                .to_request()
        };

        let resp = test::call_service(&app, enroll()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = read_json(resp).await;
        assert_eq!(body["data"]["status"], "active");
        assert_eq!(body["data"]["progress"], 0);

        let resp = test::call_service(&app, enroll()).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body = read_json(resp).await;
        assert_eq!(body["code"], ErrorCode::AlreadyEnrolled as i32);

        let course = ctx.storage.get_course_by_id(course.id).await.unwrap().unwrap();
        assert_eq!(course.student_count, 1);

        let req = test::TestRequest::get()
            .uri("/api/enrollments")
            .insert_header(("Authorization", ctx.bearer(&student)))
            .to_request();
        let body = read_json(test::call_service(&app, req).await).await;
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_enroll_rejects_draft_and_teacher() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let student = ctx.user("student", UserRole::Student).await;
        let draft = ctx
            .storage
            .create_course(new_course(teacher.id, "草稿"))
            .await
            .unwrap();
        let app = test_app!(ctx, configure_enrollment_routes);

        let req = test::TestRequest::post()
            .uri(&format!("/api/enrollments/courses/{}/enroll", draft.id))
            .insert_header(("Authorization", ctx.bearer(&student)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/enrollments/courses/9999/enroll")
            .insert_header(("Authorization", ctx.bearer(&student)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri(&format!("/api/enrollments/courses/{}/enroll", draft.id))
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_drop_decrements_once_and_cannot_revive() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let student = ctx.user("student", UserRole::Student).await;
        let other = ctx.user("other", UserRole::Student).await;
        let course = ctx.published_course(&teacher, "Rust").await;
        let enrollment = ctx.storage.enroll(course.id, student.id).await.unwrap();
        let app = test_app!(ctx, configure_enrollment_routes);

        let set_status = |user, status: &str| {
            let req = test::TestRequest::put()
                .uri(&format!("/api/enrollments/{}/status", enrollment.id))
                .insert_header(("Authorization", ctx.bearer(user)))
                .set_json(json!({ "status": status }))
                .to_request();
            test::call_service(&app, req)
        };

        assert_eq!(set_status(&other, "dropped").await.status(), StatusCode::FORBIDDEN);

        assert_eq!(set_status(&student, "dropped").await.status(), StatusCode::OK);
        assert_eq!(set_status(&student, "dropped").await.status(), StatusCode::OK);
        let refreshed = ctx.storage.get_course_by_id(course.id).await.unwrap().unwrap();
        assert_eq!(refreshed.student_count, 0);

        let resp = set_status(&student, "active").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = read_json(resp).await;
        assert_eq!(body["code"], ErrorCode::EnrollmentInvalidStatus as i32);

        // 退课后可以重新选课
        let req = test::TestRequest::post()
            .uri(&format!("/api/enrollments/courses/{}/enroll", course.id))
            .insert_header(("Authorization", ctx.bearer(&student)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    #[actix_web::test]
    async fn test_progress_reaches_100_without_auto_completing() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let student = ctx.user("student", UserRole::Student).await;
        let course = ctx.published_course(&teacher, "两章课程").await;
        let second = ctx
            .storage
            .create_chapter(
                course.id,
                crate::models::chapters::requests::CreateChapterRequest {
                    title: "第二章".into(),
                    description: None,
                    content: None,
                    duration: None,
                    order: None,
                },
            )
            .await
            .unwrap();
        let first = ctx.storage.list_chapters_by_course(course.id).await.unwrap()[0].clone();
        let enrollment = ctx.storage.enroll(course.id, student.id).await.unwrap();
        let app = test_app!(ctx, configure_enrollment_routes);

        let complete = |chapter_id: i64| {
            let req = test::TestRequest::put()
                .uri(&format!("/api/enrollments/{}/progress", enrollment.id))
                .insert_header(("Authorization", ctx.bearer(&student)))
                .set_json(json!({ "chapter_id": chapter_id }))
                .to_request();
            test::call_service(&app, req)
        };

        let body = read_json(complete(first.id).await).await;
        assert_eq!(body["data"]["enrollment_progress"], 50);
        let body = read_json(complete(second.id).await).await;
        assert_eq!(body["data"]["enrollment_progress"], 100);

        let stored = ctx.storage.get_enrollment_by_id(enrollment.id).await.unwrap().unwrap();
        assert_eq!(stored.progress, 100);
        assert_eq!(stored.status.as_str(), "active");

        let req = test::TestRequest::get()
            .uri(&format!("/api/enrollments/{}/detail", enrollment.id))
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .to_request();
        let body = read_json(test::call_service(&app, req).await).await;
        assert_eq!(body["data"]["enrollment"]["completed_chapters"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"]["chapters"][1]["status"], "completed");

        let req = test::TestRequest::put()
            .uri(&format!("/api/enrollments/{}/status", enrollment.id))
            .insert_header(("Authorization", ctx.bearer(&student)))
            .set_json(json!({ "status": "completed" }))
            .to_request();
        let body = read_json(test::call_service(&app, req).await).await;
        assert_eq!(body["data"]["status"], "completed");
        assert_eq!(body["data"]["progress"], 100);
    }

    #[actix_web::test]
    async fn test_course_students_for_owner_only() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let other = ctx.user("other", UserRole::Teacher).await;
        let student = ctx.user("student", UserRole::Student).await;
        let course = ctx.published_course(&teacher, "Rust").await;
        ctx.storage.enroll(course.id, student.id).await.unwrap();
        let app = test_app!(ctx, configure_enrollment_routes);

        let req = test::TestRequest::get()
            .uri(&format!("/api/enrollments/courses/{}/students?page=1&size=10", course.id))
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = read_json(resp).await;
        assert_eq!(body["data"]["items"][0]["student"]["username"], "student");
        assert_eq!(body["data"]["items"][0]["total_chapters"], 1);

        let req = test::TestRequest::get()
            .uri(&format!("/api/enrollments/courses/{}/students", course.id))
            .insert_header(("Authorization", ctx.bearer(&other)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }
}
