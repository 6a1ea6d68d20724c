use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::EnrollmentService;
use crate::models::ApiResponse;
use crate::models::enrollments::requests::{CourseStudentListParams, EnrollmentListParams};
use crate::services::common::{current_user, find_course, require_course_owner};
use crate::utils::error_response;

pub async fn list_my_enrollments(
    service: &EnrollmentService,
    request: &HttpRequest,
    query: EnrollmentListParams,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);

    match storage.list_student_enrollments(actor.id, query.status).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list, "获取选课列表成功"))),
        Err(e) => Ok(error_response(request, &e)),
    }
}

pub async fn list_course_students(
    service: &EnrollmentService,
    request: &HttpRequest,
    course_id: i64,
    query: CourseStudentListParams,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let course = unwrap_or_respond!(find_course(&storage, request, course_id).await);
    unwrap_or_respond!(require_course_owner(&actor, &course));

    match storage
        .list_course_students(
            course.id,
            query.pagination.page,
            query.pagination.size,
            query.status,
        )
        .await
    {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list, "获取课程学生成功"))),
        Err(e) => Ok(error_response(request, &e)),
    }
}
