use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::CourseService;
use crate::errors::LearnHubError;
use crate::models::courses::requests::{CreateCourseRequest, NewCourse};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{bad_request, current_user};
use crate::storage::Storage;
use crate::utils::validate::validate_course_fields;
use crate::utils::{error_response, error_response_with_code};

pub async fn create_course(
    service: &CourseService,
    request: &HttpRequest,
    course_data: CreateCourseRequest,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);

    let title = course_data.title.trim().to_string();
    let description = course_data.description.trim().to_string();
    let price = course_data.price.unwrap_or(0.0);
    if let Err(msg) = validate_course_fields(Some(&title), Some(&description), Some(price)) {
        return Ok(bad_request(ErrorCode::ValidationError, msg));
    }

    unwrap_or_respond!(check_title_available(&storage, request, actor.id, &title, None).await);

    let new_course = NewCourse {
        teacher_id: actor.id,
        title,
        description,
        category: course_data.category,
        level: course_data.level,
        price,
    };

    match storage.create_course(new_course).await {
        Ok(course) => {
            info!("Course {} created by user {}", course.id, actor.id);
            Ok(HttpResponse::Created().json(ApiResponse::success(course, "课程创建成功")))
        }
        // 并发创建时由唯一索引兜底
        Err(e @ LearnHubError::Conflict(_)) => Ok(error_response_with_code(
            request,
            &e,
            ErrorCode::CourseAlreadyExists,
        )),
        Err(e) => Ok(error_response(request, &e)),
    }
}

/// 同一教师名下课程标题不能重复
pub(super) async fn check_title_available(
    storage: &Arc<dyn Storage>,
    request: &HttpRequest,
    teacher_id: i64,
    title: &str,
    exclude_course: Option<i64>,
) -> Result<(), HttpResponse> {
    match storage.get_course_by_teacher_and_title(teacher_id, title).await {
        Ok(Some(existing)) if Some(existing.id) != exclude_course => {
            Err(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::CourseAlreadyExists,
                "已存在同名课程",
            )))
        }
        Ok(_) => Ok(()),
        Err(e) => Err(error_response(request, &e)),
    }
}
