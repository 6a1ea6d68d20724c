use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::CourseService;
use crate::models::ApiResponse;
use crate::models::courses::requests::{CourseListParams, CourseListQuery, CourseVisibility};
use crate::models::users::entities::UserRole;
use crate::services::common::current_user;
use crate::utils::error_response;

pub async fn list_courses(
    service: &CourseService,
    request: &HttpRequest,
    query: CourseListParams,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);

    let visibility = match actor.role {
        UserRole::Admin => CourseVisibility::All,
        UserRole::Teacher => CourseVisibility::PublishedOrOwnedBy(actor.id),
        UserRole::Student => CourseVisibility::PublishedOnly,
    };

    let list_query = CourseListQuery {
        page: Some(query.pagination.page),
        size: Some(query.pagination.size),
        search: query.search,
        category: query.category,
        level: query.level,
        status: query.status,
        visibility,
    };

    match storage.list_courses_with_pagination(list_query).await {
        Ok(courses) => Ok(HttpResponse::Ok().json(ApiResponse::success(courses, "获取课程列表成功"))),
        Err(e) => Ok(error_response(request, &e)),
    }
}
