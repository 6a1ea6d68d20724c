use std::collections::HashMap;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{EnrollmentService, find_enrollment};
use crate::models::ApiResponse;
use crate::models::assignments::entities::AssignmentStatus;
use crate::models::assignments::responses::AssignmentSubmissionStatus;
use crate::models::enrollments::responses::{EnrollmentDetailResponse, EnrollmentView};
use crate::models::study::entities::StudyStatus;
use crate::models::study::responses::ChapterStudyStatus;
use crate::services::common::{current_user, find_course, require_course_owner};
use crate::utils::error_response;

macro_rules! try_storage {
    ($request:expr, $expr:expr) => {
        match $expr.await {
            Ok(value) => value,
            Err(e) => return Ok(error_response($request, &e)),
        }
    };
}

pub async fn get_detail(
    service: &EnrollmentService,
    request: &HttpRequest,
    enrollment_id: i64,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let enrollment = unwrap_or_respond!(find_enrollment(&storage, request, enrollment_id).await);
    let course = unwrap_or_respond!(find_course(&storage, request, enrollment.course_id).await);

    // 本人、课程教师或管理员
    if enrollment.student_id != actor.id {
        unwrap_or_respond!(require_course_owner(&actor, &course));
    }

    let student_id = enrollment.student_id;
    let student = try_storage!(request, storage.get_user_by_id(student_id)).map(|u| u.brief());
    let completed_chapters =
        try_storage!(request, storage.list_completed_chapters(course.id, student_id));
    let chapters = try_storage!(request, storage.list_chapters_by_course(course.id));
    let records = try_storage!(request, storage.list_study_records(student_id, course.id));
    let assignments = try_storage!(
        request,
        storage.list_course_assignments(course.id, &[AssignmentStatus::Published])
    );
    let submissions = try_storage!(
        request,
        storage.list_student_course_submissions(student_id, course.id)
    );

    let records: HashMap<i64, _> = records.into_iter().map(|r| (r.chapter_id, r)).collect();
    let chapters = chapters
        .into_iter()
        .map(|chapter| {
            let record = records.get(&chapter.id);
            ChapterStudyStatus {
                chapter_id: chapter.id,
                title: chapter.title,
                order: chapter.order,
                status: record.map_or(StudyStatus::NotStarted, |r| r.status),
                progress: record.map_or(0, |r| r.progress),
                last_study_time: record.map(|r| r.last_study_time),
            }
        })
        .collect();

    let submissions: HashMap<i64, _> = submissions
        .into_iter()
        .map(|s| (s.assignment_id, s))
        .collect();
    let assignments = assignments
        .into_iter()
        .map(|assignment| {
            let submission = submissions.get(&assignment.id);
            AssignmentSubmissionStatus {
                assignment_id: assignment.id,
                title: assignment.title,
                deadline: assignment.deadline,
                total_score: assignment.total_score,
                status: submission.map(|s| s.status),
                score: submission.and_then(|s| s.score),
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        EnrollmentDetailResponse {
            enrollment: EnrollmentView {
                enrollment,
                completed_chapters,
            },
            course,
            student,
            chapters,
            assignments,
        },
        "获取选课详情成功",
    )))
}
