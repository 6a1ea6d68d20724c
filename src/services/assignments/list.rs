use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AssignmentService;
use crate::models::ApiResponse;
use crate::models::assignments::entities::AssignmentStatus;
use crate::models::assignments::requests::{AssignmentListParams, AssignmentListQuery};
use crate::models::users::entities::UserRole;
use crate::policy::Action;
use crate::services::common::{current_user, find_course, require_course_content};
use crate::utils::error_response;

pub async fn list_assignments(
    service: &AssignmentService,
    request: &HttpRequest,
    query: AssignmentListParams,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);

    let list_query = AssignmentListQuery {
        page: Some(query.pagination.page),
        size: Some(query.pagination.size),
        course_id: query.course_id,
        status: query.status,
        search: query.search,
        // 教师只能看到自己课程下的作业
        teacher_id: (actor.role != UserRole::Admin).then_some(actor.id),
    };

    match storage.list_assignments_with_pagination(list_query).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list, "获取作业列表成功"))),
        Err(e) => Ok(error_response(request, &e)),
    }
}

pub async fn list_student_assignments(
    service: &AssignmentService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);

    match storage.list_student_assignments(actor.id).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list, "获取作业列表成功"))),
        Err(e) => Ok(error_response(request, &e)),
    }
}

pub async fn list_course_assignments(
    service: &AssignmentService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let course = unwrap_or_respond!(find_course(&storage, request, course_id).await);
    unwrap_or_respond!(require_course_content(&storage, request, &actor, &course, Action::Read).await);

    let statuses: &[AssignmentStatus] = if actor.role == UserRole::Student {
        &[AssignmentStatus::Published, AssignmentStatus::Closed]
    } else {
        AssignmentStatus::ALL
    };

    match storage.list_course_assignments(course.id, statuses).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(items, "获取课程作业成功"))),
        Err(e) => Ok(error_response(request, &e)),
    }
}
