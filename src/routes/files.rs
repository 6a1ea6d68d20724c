use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::files::requests::FileQuery;
use crate::services::FileService;

// 懒加载的全局 FileService 实例
static FILE_SERVICE: Lazy<FileService> = Lazy::new(FileService::new_lazy);

pub async fn get_file_info(
    request: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<FileQuery>,
) -> ActixResult<HttpResponse> {
    FILE_SERVICE
        .get_info(&request, path.into_inner(), query.into_inner())
        .await
}

pub async fn get_file_preview(
    request: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<FileQuery>,
) -> ActixResult<HttpResponse> {
    FILE_SERVICE
        .get_preview(&request, path.into_inner(), query.into_inner())
        .await
}

pub async fn download_file(
    request: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<FileQuery>,
) -> ActixResult<HttpResponse> {
    FILE_SERVICE
        .download(&request, path.into_inner(), query.into_inner())
        .await
}

pub async fn serve_upload(
    request: HttpRequest,
    path: web::Path<(String, String)>,
) -> ActixResult<HttpResponse> {
    let (category, file_name) = path.into_inner();
    FILE_SERVICE
        .serve_upload(&request, category, file_name)
        .await
}

// 配置路由
pub fn configure_file_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/files")
            .wrap(middlewares::RequireJWT)
            .route("/{file_id}/info", web::get().to(get_file_info))
            .route("/{file_id}/preview", web::get().to(get_file_preview))
            .route("/{file_id}/download", web::get().to(download_file)),
    )
    .service(
        web::resource("/api/uploads/{category}/{file_name}").route(web::get().to(serve_upload)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignments::requests::NewSubmission;
    use crate::models::assignments::entities::AssignmentStatus;
    use crate::models::users::entities::{User, UserRole};
    use crate::test_support::{
        PDF_BYTES, TestContext, new_assignment, new_attachment, new_resource, read_json, test_app,
    };
    use actix_web::http::{StatusCode, header};
    use actix_web::test;

    /// 在上传目录中写入真实文件，返回公开 URL
    async fn write_upload(ctx: &TestContext, category: &str, name: &str) -> String {
        let dir = std::path::Path::new(&ctx.config.upload.dir).join(category);
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join(name), PDF_BYTES).await.unwrap();
        format!("/api/uploads/{category}/{name}")
    }

    #[actix_web::test]
    async fn test_resource_download_requires_enrollment() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let student = ctx.user("student", UserRole::Student).await;
        let outsider = ctx.user("outsider", UserRole::Student).await;
        let course = ctx.published_course(&teacher, "Rust").await;
        ctx.storage.enroll(course.id, student.id).await.unwrap();
        let chapter = ctx.storage.list_chapters_by_course(course.id).await.unwrap()[0].clone();
        let url = write_upload(&ctx, "resources", "1700000000-abc.pdf").await;
        let resource = ctx
            .storage
            .add_chapter_resource(chapter.id, new_resource(&url))
            .await
            .unwrap();
        let app = test_app!(ctx, configure_file_routes);

        let req = test::TestRequest::get()
            .uri(&format!("/api/files/{}/download?type=resource", resource.id))
            .insert_header(("Authorization", ctx.bearer(&outsider)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri(&format!("/api/files/{}/download?type=resource", resource.id))
            .insert_header(("Authorization", ctx.bearer(&student)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert_eq!(disposition, "attachment; filename=\"slides.pdf\"");
        let body = test::read_body(resp).await;
        assert_eq!(&body[..], PDF_BYTES);

        let req = test::TestRequest::get()
            .uri(&format!("/api/files/{}/preview?type=resource", resource.id))
            .insert_header(("Authorization", ctx.bearer(&teacher)))
            .to_request();
        let body = read_json(test::call_service(&app, req).await).await;
        assert_eq!(body["data"]["preview_url"], url.as_str());
        assert_eq!(body["data"]["file_type"], "pdf");
    }

    #[actix_web::test]
    async fn test_submission_file_visible_to_submitter_and_owner() {
        let ctx = TestContext::new().await;
        let teacher = ctx.user("teacher", UserRole::Teacher).await;
        let other_teacher = ctx.user("other", UserRole::Teacher).await;
        let student = ctx.user("student", UserRole::Student).await;
        let classmate = ctx.user("classmate", UserRole::Student).await;
        let course = ctx.published_course(&teacher, "Rust").await;
        ctx.storage.enroll(course.id, student.id).await.unwrap();
        ctx.storage.enroll(course.id, classmate.id).await.unwrap();
        let assignment = ctx
            .storage
            .create_assignment(new_assignment(course.id, teacher.id, "Lab"), vec![])
            .await
            .unwrap();
        ctx.storage
            .update_assignment_status(assignment.assignment.id, AssignmentStatus::Published)
            .await
            .unwrap();
        let url = write_upload(&ctx, "submissions", "1700000000-def.pdf").await;
        let outcome = ctx
            .storage
            .submit_assignment(NewSubmission {
                assignment_id: assignment.assignment.id,
                student_id: student.id,
                content: "answer".to_string(),
                attachment: Some(new_attachment(&url)),
            })
            .await
            .unwrap();
        let file_id = outcome.submission.attachments[0].id;
        let app = test_app!(ctx, configure_file_routes);

        let status_for = |user: &User| {
            let req = test::TestRequest::get()
                .uri(&format!("/api/files/{file_id}/info?type=submission"))
                .insert_header(("Authorization", ctx.bearer(user)))
                .to_request();
            test::call_service(&app, req)
        };
        assert_eq!(status_for(&student).await.status(), StatusCode::OK);
        assert_eq!(status_for(&teacher).await.status(), StatusCode::OK);
        assert_eq!(status_for(&classmate).await.status(), StatusCode::FORBIDDEN);
        assert_eq!(status_for(&other_teacher).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_unknown_type_is_rejected() {
        let ctx = TestContext::new().await;
        let student = ctx.user("student", UserRole::Student).await;
        let app = test_app!(ctx, configure_file_routes);

        let req = test::TestRequest::get()
            .uri("/api/files/1/info?type=avatar")
            .insert_header(("Authorization", ctx.bearer(&student)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_public_upload_etag_and_traversal() {
        let ctx = TestContext::new().await;
        let url = write_upload(&ctx, "covers", "1700000000-cover.pdf").await;
        let app = test_app!(ctx, configure_file_routes);

        let req = test::TestRequest::get().uri(&url).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=86400"
        );
        let etag = resp.headers().get(header::ETAG).unwrap().clone();

        let req = test::TestRequest::get()
            .uri(&url)
            .insert_header((header::IF_NONE_MATCH, etag))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);

        for uri in [
            "/api/uploads/covers/..%2F..%2Fsecret",
            "/api/uploads/etc/passwd",
            "/api/uploads/covers/missing.png",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
        }
    }
}
