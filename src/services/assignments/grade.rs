use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::AssignmentService;
use crate::models::assignments::requests::GradeSubmissionRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{
    bad_request, current_user, find_assignment, find_course, not_found, require_course_owner,
};
use crate::utils::error_response;
use crate::utils::validate::GRADE_COMMENT_MAX;

/// 批改提交，分数必须在 [0, 总分] 之间，越界时不做任何写入
pub async fn grade_submission(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    submission_id: i64,
    grade_data: GradeSubmissionRequest,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let assignment = unwrap_or_respond!(find_assignment(&storage, request, assignment_id).await);
    let course = unwrap_or_respond!(find_course(&storage, request, assignment.course_id).await);
    unwrap_or_respond!(require_course_owner(&actor, &course));

    let score = grade_data.score;
    if !(score.is_finite() && (0.0..=assignment.total_score).contains(&score)) {
        return Ok(bad_request(
            ErrorCode::ScoreOutOfRange,
            format!("分数必须在 0 到 {} 之间", assignment.total_score),
        ));
    }
    let comment = grade_data
        .comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    if comment
        .as_deref()
        .is_some_and(|c| c.chars().count() > GRADE_COMMENT_MAX)
    {
        return Ok(bad_request(ErrorCode::ValidationError, "评语不能超过 500 个字符"));
    }

    match storage.get_submission_by_id(submission_id).await {
        Ok(Some(submission)) if submission.assignment_id == assignment.id => {}
        Ok(_) => return Ok(not_found(ErrorCode::SubmissionNotFound, "提交记录不存在")),
        Err(e) => return Ok(error_response(request, &e)),
    }

    match storage
        .grade_submission(submission_id, score, comment, actor.id)
        .await
    {
        Ok(Some(submission)) => {
            info!(
                "Submission {} graded {} by user {}",
                submission.id, score, actor.id
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(submission, "批改成功")))
        }
        Ok(None) => Ok(not_found(ErrorCode::SubmissionNotFound, "提交记录不存在")),
        Err(e) => Ok(error_response(request, &e)),
    }
}

pub async fn list_submissions(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let assignment = unwrap_or_respond!(find_assignment(&storage, request, assignment_id).await);
    let course = unwrap_or_respond!(find_course(&storage, request, assignment.course_id).await);
    unwrap_or_respond!(require_course_owner(&actor, &course));

    match storage.list_assignment_submissions(assignment.id).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list, "获取提交列表成功"))),
        Err(e) => Ok(error_response(request, &e)),
    }
}
