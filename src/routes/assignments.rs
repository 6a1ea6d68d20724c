use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::assignments::requests::{
    AssignmentListParams, GradeSubmissionRequest, UpdateAssignmentRequest,
    UpdateAssignmentStatusRequest,
};
use crate::models::users::entities::UserRole;
use crate::services::AssignmentService;

// 懒加载的全局 ASSIGNMENT_SERVICE 实例
static ASSIGNMENT_SERVICE: Lazy<AssignmentService> = Lazy::new(AssignmentService::new_lazy);

pub async fn list_assignments(
    req: HttpRequest,
    query: web::Query<AssignmentListParams>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .list_assignments(&req, query.into_inner())
        .await
}

pub async fn list_student_assignments(req: HttpRequest) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.list_student_assignments(&req).await
}

pub async fn list_course_assignments(
    req: HttpRequest,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .list_course_assignments(&req, path.into_inner())
        .await
}

pub async fn create_assignment(
    req: HttpRequest,
    path: web::Path<i64>,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .create_assignment(&req, path.into_inner(), payload)
        .await
}

pub async fn get_assignment(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.get_assignment(&req, path.into_inner()).await
}

pub async fn update_assignment(
    req: HttpRequest,
    path: web::Path<i64>,
    update_data: web::Json<UpdateAssignmentRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .update_assignment(&req, path.into_inner(), update_data.into_inner())
        .await
}

pub async fn update_assignment_status(
    req: HttpRequest,
    path: web::Path<i64>,
    status_data: web::Json<UpdateAssignmentStatusRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .update_assignment_status(&req, path.into_inner(), status_data.into_inner())
        .await
}

pub async fn delete_assignment(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .delete_assignment(&req, path.into_inner())
        .await
}

pub async fn add_attachments(
    req: HttpRequest,
    path: web::Path<i64>,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .add_attachments(&req, path.into_inner(), payload)
        .await
}

pub async fn delete_attachment(
    req: HttpRequest,
    path: web::Path<(i64, i64)>,
) -> ActixResult<HttpResponse> {
    let (assignment_id, attachment_id) = path.into_inner();
    ASSIGNMENT_SERVICE
        .delete_attachment(&req, assignment_id, attachment_id)
        .await
}

pub async fn submit_assignment(
    req: HttpRequest,
    path: web::Path<i64>,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .submit(&req, path.into_inner(), payload)
        .await
}

pub async fn list_submissions(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .list_submissions(&req, path.into_inner())
        .await
}

pub async fn grade_submission(
    req: HttpRequest,
    path: web::Path<(i64, i64)>,
    grade_data: web::Json<GradeSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    let (assignment_id, submission_id) = path.into_inner();
    ASSIGNMENT_SERVICE
        .grade_submission(&req, assignment_id, submission_id, grade_data.into_inner())
        .await
}

// 配置路由
pub fn configure_assignment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/assignments")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles()))
                    .route(web::get().to(list_assignments)),
            )
            // 必须在 /{id} 之前注册
            .service(
                web::resource("/student")
                    .wrap(middlewares::RequireRole::new_any(UserRole::student_roles()))
                    .route(web::get().to(list_student_assignments)),
            )
            .service(
                web::resource("/course/{course_id}")
                    .route(web::get().to(list_course_assignments))
                    .route(
                        web::post()
                            .to(create_assignment)
                            .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles())),
                    ),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_assignment))
                    .route(
                        web::put()
                            .to(update_assignment)
                            .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles())),
                    )
                    .route(
                        web::delete()
                            .to(delete_assignment)
                            .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles())),
                    ),
            )
            .service(
                web::resource("/{id}/status")
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles()))
                    .route(web::patch().to(update_assignment_status)),
            )
            .service(
                web::resource("/{id}/attachments")
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles()))
                    .route(web::post().to(add_attachments)),
            )
            .service(
                web::resource("/{id}/attachments/{attachment_id}")
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles()))
                    .route(web::delete().to(delete_attachment)),
            )
            .service(
                web::resource("/{id}/submit")
                    .wrap(middlewares::RequireRole::new_any(UserRole::student_roles()))
                    .route(web::post().to(submit_assignment)),
            )
            .service(
                web::resource("/{id}/submissions")
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles()))
                    .route(web::get().to(list_submissions)),
            )
            .service(
                web::resource("/{id}/submissions/{submission_id}/grade")
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles()))
                    .route(web::put().to(grade_submission)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignments::entities::{Assignment, AssignmentStatus};
    use crate::models::courses::entities::Course;
    use crate::models::users::entities::User;
    use crate::test_support::{
        MultipartBody, PDF_BYTES, TestContext, new_assignment, new_attachment, read_json,
        test_app,
    };
    use crate::utils::upload::path_from_url;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::json;

    async fn published_assignment(ctx: &TestContext, course: &Course, teacher: &User) -> Assignment {
        let created = ctx
            .storage
            .create_assignment(new_assignment(course.id, teacher.id, "Lab 1"), vec![])
            .await
            .unwrap();
        ctx.storage
            .update_assignment_status(created.assignment.id, AssignmentStatus::Published)
            .await
            .unwrap()
            .unwrap()
    }

    fn submit_request(ctx: &TestContext, student: &User, assignment_id: i64, file: &str) -> test::TestRequest {
        let (content_type, body) = MultipartBody::new()
            .text("content", "my answer")
            .file("file", file, "application/pdf", PDF_BYTES)
            .finish();
        test::TestRequest::post()
            .uri(&format!("/api/assignments/{assignment_id}/submit"))
            .insert_header(("Authorization", ctx.bearer(student)))
            .insert_header(("Content-Type", content_type))
            .set_payload(body)
    }

    fn count_files(dir: std::path::PathBuf) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[actix_web::test]
    async fn test_create_with_attachments_then_publish_is_read_only() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let student = ctx.user("student", UserRole::Student).await;
        let course = ctx.published_course(&teacher, "Rust").await;
        ctx.storage.enroll(course.id, student.id).await.unwrap();
        let app = test_app!(ctx, configure_assignment_routes);

        let (content_type, body) = MultipartBody::new()
            .text("title", "Ownership drills")
            .text("description", "Borrow checker exercises")
            .text("deadline", "2030-01-01T00:00:00Z")
            .file("attachments", "brief.pdf", "application/pdf", PDF_BYTES)
            .finish();
        let req = test::TestRequest::post()
            .uri(&format!("/api/assignments/course/{}", course.id))
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .insert_header(("Content-Type", content_type))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = read_json(resp).await;
        assert_eq!(body["data"]["status"], "draft");
        assert_eq!(body["data"]["total_score"], 100.0);
        let id = body["data"]["id"].as_i64().unwrap();
        let url = body["data"]["attachments"][0]["url"].as_str().unwrap();
        assert!(path_from_url(&ctx.config.upload.dir, url).unwrap().exists());

        // 草稿对学生不可见
        let req = test::TestRequest::get()
            .uri(&format!("/api/assignments/course/{}", course.id))
            .insert_header(("Authorization", ctx.bearer(&student)))
            .to_request();
        let body = read_json(test::call_service(&app, req).await).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 0);

        let req = test::TestRequest::patch()
            .uri(&format!("/api/assignments/{id}/status"))
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .set_json(json!({"status": "closed"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::patch()
            .uri(&format!("/api/assignments/{id}/status"))
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .set_json(json!({"status": "published"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::put()
            .uri(&format!("/api/assignments/{id}"))
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .set_json(json!({"title": "Changed"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri(&format!("/api/assignments/{id}"))
            .insert_header(("Authorization", ctx.bearer(&student)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = read_json(resp).await;
        assert_eq!(body["data"]["course_title"], "Rust");
        assert!(body["data"]["my_submission"].is_null());
    }

    #[actix_web::test]
    async fn test_invalid_form_leaves_no_files() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let course = ctx.published_course(&teacher, "Rust").await;
        let app = test_app!(ctx, configure_assignment_routes);

        let (content_type, body) = MultipartBody::new()
            .text("title", "Ownership drills")
            .text("description", "Borrow checker exercises")
            .text("deadline", "next friday")
            .file("attachments", "brief.pdf", "application/pdf", PDF_BYTES)
            .finish();
        let req = test::TestRequest::post()
            .uri(&format!("/api/assignments/course/{}", course.id))
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .insert_header(("Content-Type", content_type))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let dir = std::path::Path::new(&ctx.config.upload.dir).join("attachments");
        assert_eq!(count_files(dir), 0);
    }

    #[actix_web::test]
    async fn test_resubmit_replaces_file_and_requires_enrollment() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let student = ctx.user("student", UserRole::Student).await;
        let outsider = ctx.user("outsider", UserRole::Student).await;
        let course = ctx.published_course(&teacher, "Rust").await;
        ctx.storage.enroll(course.id, student.id).await.unwrap();
        let assignment = published_assignment(&ctx, &course, &teacher).await;
        let app = test_app!(ctx, configure_assignment_routes);

        let resp = test::call_service(
            &app,
            submit_request(&ctx, &outsider, assignment.id, "a.pdf").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = test::call_service(
            &app,
            submit_request(&ctx, &student, assignment.id, "first.pdf").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = read_json(resp).await;
        assert_eq!(body["data"]["resubmitted"], false);
        let first_url = body["data"]["submission"]["attachments"][0]["url"]
            .as_str()
            .unwrap()
            .to_string();
        let first_path = path_from_url(&ctx.config.upload.dir, &first_url).unwrap();
        assert!(first_path.exists());

        let resp = test::call_service(
            &app,
            submit_request(&ctx, &student, assignment.id, "second.pdf").to_request(),
        )
        .await;
        let body = read_json(resp).await;
        assert_eq!(body["data"]["resubmitted"], true);
        assert_eq!(
            body["data"]["submission"]["attachments"]
                .as_array()
                .unwrap()
                .len(),
            1
        );
        assert!(!first_path.exists());
    }

    #[actix_web::test]
    async fn test_submit_to_draft_assignment_is_rejected() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let student = ctx.user("student", UserRole::Student).await;
        let course = ctx.published_course(&teacher, "Rust").await;
        ctx.storage.enroll(course.id, student.id).await.unwrap();
        let draft = ctx
            .storage
            .create_assignment(new_assignment(course.id, teacher.id, "Draft"), vec![])
            .await
            .unwrap();
        let app = test_app!(ctx, configure_assignment_routes);

        let resp = test::call_service(
            &app,
            submit_request(&ctx, &student, draft.assignment.id, "a.pdf").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let dir = std::path::Path::new(&ctx.config.upload.dir).join("submissions");
        assert_eq!(count_files(dir), 0);
    }

    #[actix_web::test]
    async fn test_grade_range_and_resubmit_clears_grade() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let other = ctx.user("other", UserRole::Teacher).await;
        let student = ctx.user("student", UserRole::Student).await;
        let course = ctx.published_course(&teacher, "Rust").await;
        ctx.storage.enroll(course.id, student.id).await.unwrap();
        let assignment = published_assignment(&ctx, &course, &teacher).await;
        let app = test_app!(ctx, configure_assignment_routes);

        let body = read_json(
            test::call_service(
                &app,
                submit_request(&ctx, &student, assignment.id, "a.pdf").to_request(),
            )
            .await,
        )
        .await;
        let sid = body["data"]["submission"]["id"].as_i64().unwrap();
        let grade_uri = format!("/api/assignments/{}/submissions/{sid}/grade", assignment.id);

        let req = test::TestRequest::put()
            .uri(&grade_uri)
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .set_json(json!({"score": 120.0}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let stored = ctx.storage.get_submission_by_id(sid).await.unwrap().unwrap();
        assert_eq!(stored.score, None);

        let req = test::TestRequest::put()
            .uri(&grade_uri)
            .insert_header(("Authorization", ctx.bearer(&other)))
            .set_json(json!({"score": 90.0}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::put()
            .uri(&grade_uri)
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .set_json(json!({"score": 95.0, "comment": "Nice work"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = read_json(resp).await;
        assert_eq!(body["data"]["status"], "graded");
        assert_eq!(body["data"]["score"], 95.0);

        let req = test::TestRequest::get()
            .uri(&format!("/api/assignments/{}/submissions", assignment.id))
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .to_request();
        let body = read_json(test::call_service(&app, req).await).await;
        assert_eq!(body["data"]["stats"]["graded"], 1);
        assert_eq!(body["data"]["stats"]["average_score"], 95.0);

        // 重新提交后成绩清空
        let body = read_json(
            test::call_service(
                &app,
                submit_request(&ctx, &student, assignment.id, "b.pdf").to_request(),
            )
            .await,
        )
        .await;
        assert_eq!(body["data"]["submission"]["status"], "submitted");
        assert!(body["data"]["submission"]["score"].is_null());
    }

    #[actix_web::test]
    async fn test_attachment_must_belong_to_assignment() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let course = ctx.published_course(&teacher, "Rust").await;
        let first = ctx
            .storage
            .create_assignment(
                new_assignment(course.id, teacher.id, "First"),
                vec![new_attachment("/api/uploads/attachments/1-a.pdf")],
            )
            .await
            .unwrap();
        let second = ctx
            .storage
            .create_assignment(new_assignment(course.id, teacher.id, "Second"), vec![])
            .await
            .unwrap();
        let app = test_app!(ctx, configure_assignment_routes);

        let attachment_id = first.attachments[0].id;
        let req = test::TestRequest::delete()
            .uri(&format!(
                "/api/assignments/{}/attachments/{attachment_id}",
                second.assignment.id
            ))
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::delete()
            .uri(&format!(
                "/api/assignments/{}/attachments/{attachment_id}",
                first.assignment.id
            ))
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_teacher_list_is_scoped_to_own_courses() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let other = ctx.user("other", UserRole::Teacher).await;
        let course = ctx.published_course(&teacher, "Rust").await;
        ctx.storage
            .create_assignment(new_assignment(course.id, teacher.id, "Mine"), vec![])
            .await
            .unwrap();
        let app = test_app!(ctx, configure_assignment_routes);

        let req = test::TestRequest::get()
            .uri("/api/assignments")
            .insert_header(("Authorization", ctx.bearer(&other)))
            .to_request();
        let body = read_json(test::call_service(&app, req).await).await;
        assert_eq!(body["data"]["pagination"]["total"], 0);

        let req = test::TestRequest::get()
            .uri("/api/assignments")
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .to_request();
        let body = read_json(test::call_service(&app, req).await).await;
        assert_eq!(body["data"]["items"][0]["title"], "Mine");
    }
}
