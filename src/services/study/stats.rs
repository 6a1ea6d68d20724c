use std::collections::HashMap;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::StudyService;
use crate::models::enrollments::entities::compute_progress;
use crate::models::study::entities::StudyStatus;
use crate::models::study::responses::{ChapterStudyStatus, CourseStudyStatsResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::common::{current_user, find_course, is_actively_enrolled};
use crate::utils::error_response;

pub async fn get_course_stats(
    service: &StudyService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let actor = unwrap_or_respond!(current_user(request));
    let storage = service.get_storage(request);
    let course = unwrap_or_respond!(find_course(&storage, request, course_id).await);
    if !unwrap_or_respond!(is_actively_enrolled(&storage, request, course.id, actor.id).await) {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::NotEnrolled,
            "未选修该课程或选课已结束",
        )));
    }

    let chapters = match storage.list_chapters_by_course(course.id).await {
        Ok(chapters) => chapters,
        Err(e) => return Ok(error_response(request, &e)),
    };
    let records = match storage.list_study_records(actor.id, course.id).await {
        Ok(records) => records,
        Err(e) => return Ok(error_response(request, &e)),
    };
    let records: HashMap<i64, _> = records.into_iter().map(|r| (r.chapter_id, r)).collect();

    let chapters: Vec<ChapterStudyStatus> = chapters
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

    let count = |status: StudyStatus| chapters.iter().filter(|c| c.status == status).count() as i64;
    let completed = count(StudyStatus::Completed);
    let in_progress = count(StudyStatus::InProgress);
    let not_started = count(StudyStatus::NotStarted);
    let total_chapters = chapters.len() as i64;
    let last_study_time = chapters.iter().filter_map(|c| c.last_study_time).max();

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        CourseStudyStatsResponse {
            course_id: course.id,
            total_chapters,
            completed,
            in_progress,
            not_started,
            progress: compute_progress(completed as u64, total_chapters as u64),
            last_study_time,
            chapters,
        },
        "获取学习统计成功",
    )))
}
