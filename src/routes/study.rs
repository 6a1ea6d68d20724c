use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::study::requests::UpdateStudyProgressRequest;
use crate::models::users::entities::UserRole;
use crate::services::StudyService;

// 懒加载的全局 STUDY_SERVICE 实例
static STUDY_SERVICE: Lazy<StudyService> = Lazy::new(StudyService::new_lazy);

pub async fn get_study_status(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    STUDY_SERVICE.get_study_status(&req, path.into_inner()).await
}

pub async fn start(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    STUDY_SERVICE.start(&req, path.into_inner()).await
}

pub async fn update_progress(
    req: HttpRequest,
    path: web::Path<i64>,
    progress_data: web::Json<UpdateStudyProgressRequest>,
) -> ActixResult<HttpResponse> {
    STUDY_SERVICE
        .update_progress(&req, path.into_inner(), progress_data.into_inner())
        .await
}

pub async fn complete(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    STUDY_SERVICE.complete(&req, path.into_inner()).await
}

pub async fn get_course_stats(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    STUDY_SERVICE.get_course_stats(&req, path.into_inner()).await
}

// 配置路由：学习记录只属于学生
pub fn configure_study_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/study")
            .wrap(middlewares::RequireRole::new_any(UserRole::student_roles()))
            .wrap(middlewares::RequireJWT)
            .route("/chapters/{id}/study-status", web::get().to(get_study_status))
            .route("/chapters/{id}/start", web::post().to(start))
            .route("/chapters/{id}/progress", web::put().to(update_progress))
            .route("/chapters/{id}/complete", web::post().to(complete))
            .route("/courses/{id}/study-stats", web::get().to(get_course_stats)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorCode;
    use crate::models::chapters::entities::Chapter;
    use crate::models::courses::entities::Course;
    use crate::models::users::entities::User;
    use crate::test_support::{TestContext, read_json, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::json;

    async fn enrolled_setup(ctx: &TestContext) -> (User, Course, Chapter) {
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let student = ctx.user("student", UserRole::Student).await;
        let course = ctx.published_course(&teacher, "Rust").await;
        let chapter = ctx.storage.list_chapters_by_course(course.id).await.unwrap()[0].clone();
        ctx.storage.enroll(course.id, student.id).await.unwrap();
        (student, course, chapter)
    }

    #[actix_web::test]
    async fn test_progress_requires_start_and_is_monotonic() {
        let ctx = TestContext::new().await;
        let (student, _, chapter) = enrolled_setup(&ctx).await;
        let app = test_app!(ctx, configure_study_routes);

        let progress = |value: i32| {
            let req = test::TestRequest::put()
                .uri(&format!("/api/study/chapters/{}/progress", chapter.id))
                .insert_header(("Authorization", ctx.bearer(&student)))
                .set_json(json!({ "progress": value }))
                .to_request();
            test::call_service(&app, req)
        };

        let resp = progress(10).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = read_json(resp).await;
        assert_eq!(body["code"], ErrorCode::StudyRecordNotFound as i32);

        let req = test::TestRequest::get()
            .uri(&format!("/api/study/chapters/{}/study-status", chapter.id))
            .insert_header(("Authorization", ctx.bearer(&student)))
            .to_request();
        let body = read_json(test::call_service(&app, req).await).await;
        assert_eq!(body["data"]["status"], "not_started");
        assert_eq!(body["data"]["progress"], 0);

        let req = test::TestRequest::post()
            .uri(&format!("/api/study/chapters/{}/start", chapter.id))
            .insert_header(("Authorization", ctx.bearer(&student)))
            .to_request();
        let body = read_json(test::call_service(&app, req).await).await;
        assert_eq!(body["data"]["status"], "in_progress");

        assert_eq!(progress(101).await.status(), StatusCode::BAD_REQUEST);

        let body = read_json(progress(60).await).await;
        assert_eq!(body["data"]["record"]["progress"], 60);
        // 进度不会回退
        let body = read_json(progress(30).await).await;
        assert_eq!(body["data"]["record"]["progress"], 60);

        let body = read_json(progress(100).await).await;
        assert_eq!(body["data"]["record"]["status"], "completed");
        assert!(body["data"]["record"]["completed_at"].is_string());
        assert_eq!(body["data"]["enrollment_progress"], 100);
    }

    #[actix_web::test]
    async fn test_study_requires_active_enrollment() {
        let ctx = TestContext::new().await;
        let (_, course, chapter) = enrolled_setup(&ctx).await;
        let outsider = ctx.user("outsider", UserRole::Student).await;
        let app = test_app!(ctx, configure_study_routes);

        let req = test::TestRequest::post()
            .uri(&format!("/api/study/chapters/{}/start", chapter.id))
            .insert_header(("Authorization", ctx.bearer(&outsider)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri(&format!("/api/study/courses/{}/study-stats", course.id))
            .insert_header(("Authorization", ctx.bearer(&outsider)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_complete_and_course_stats() {
        let ctx = TestContext::new().await;
        let (student, course, chapter) = enrolled_setup(&ctx).await;
        let app = test_app!(ctx, configure_study_routes);

        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri(&format!("/api/study/chapters/{}/complete", chapter.id))
                .insert_header(("Authorization", ctx.bearer(&student)))
                .to_request();
            let body = read_json(test::call_service(&app, req).await).await;
            assert_eq!(body["data"]["enrollment_progress"], 100);
        }

        let req = test::TestRequest::get()
            .uri(&format!("/api/study/courses/{}/study-stats", course.id))
            .insert_header(("Authorization", ctx.bearer(&student)))
            .to_request();
        let body = read_json(test::call_service(&app, req).await).await;
        assert_eq!(body["data"]["total_chapters"], 1);
        assert_eq!(body["data"]["completed"], 1);
        assert_eq!(body["data"]["not_started"], 0);
        assert_eq!(body["data"]["chapters"][0]["status"], "completed");
        assert!(body["data"]["last_study_time"].is_string());
    }
}
