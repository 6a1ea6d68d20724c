//! 学习记录
//!
//! 学习记录是章节完成情况的唯一来源：选课进度与已完成章节都从已完成的
//! 学习记录推导，写学习记录与重算进度在同一事务内完成。

use super::{SeaOrmStorage, now_ts};
use crate::entity::prelude::{Chapters, Enrollments};
use crate::entity::study_records::{ActiveModel, Column, Entity as StudyRecords, Model};
use crate::entity::{chapters, enrollments};
use crate::errors::{LearnHubError, Result, classify_db_err};
use crate::models::{
    chapters::entities::Chapter,
    enrollments::entities::{EnrollmentStatus, compute_progress},
    study::{
        entities::{StudyRecord, StudyStatus},
        responses::StudyProgressResponse,
    },
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// 重算学生在课程中的选课进度
///
/// 只更新学习中的选课记录：已完成的保持 100，已退课的不再变化。
/// 返回学生当前未退课选课记录的进度。
pub(crate) async fn recompute_enrollment_progress<C: ConnectionTrait>(
    conn: &C,
    course_id: i64,
    student_id: i64,
) -> Result<i32> {
    let total = Chapters::find()
        .filter(chapters::Column::CourseId.eq(course_id))
        .count(conn)
        .await
        .map_err(|e| LearnHubError::database_operation(format!("统计章节数量失败: {e}")))?;

    let completed = StudyRecords::find()
        .filter(Column::CourseId.eq(course_id))
        .filter(Column::StudentId.eq(student_id))
        .filter(Column::Status.eq(StudyStatus::Completed.to_string()))
        .count(conn)
        .await
        .map_err(|e| LearnHubError::database_operation(format!("统计完成章节失败: {e}")))?;

    let progress = compute_progress(completed, total);

    Enrollments::update_many()
        .col_expr(enrollments::Column::Progress, Expr::value(progress))
        .col_expr(enrollments::Column::UpdatedAt, Expr::value(now_ts()))
        .filter(enrollments::Column::CourseId.eq(course_id))
        .filter(enrollments::Column::StudentId.eq(student_id))
        .filter(enrollments::Column::Status.eq(EnrollmentStatus::Active.to_string()))
        .exec(conn)
        .await
        .map_err(|e| LearnHubError::database_operation(format!("更新选课进度失败: {e}")))?;

    let live = Enrollments::find()
        .filter(enrollments::Column::CourseId.eq(course_id))
        .filter(enrollments::Column::StudentId.eq(student_id))
        .filter(enrollments::Column::Status.ne(EnrollmentStatus::Dropped.to_string()))
        .order_by_desc(enrollments::Column::Id)
        .one(conn)
        .await
        .map_err(|e| LearnHubError::database_operation(format!("查询选课记录失败: {e}")))?;

    Ok(live.map(|e| e.progress).unwrap_or(progress))
}

/// 重算课程下所有学习中学生的进度（章节增删后调用）
pub(crate) async fn recompute_course_progress<C: ConnectionTrait>(
    conn: &C,
    course_id: i64,
) -> Result<()> {
    let student_ids: Vec<i64> = Enrollments::find()
        .select_only()
        .column(enrollments::Column::StudentId)
        .filter(enrollments::Column::CourseId.eq(course_id))
        .filter(enrollments::Column::Status.eq(EnrollmentStatus::Active.to_string()))
        .distinct()
        .into_tuple()
        .all(conn)
        .await
        .map_err(|e| LearnHubError::database_operation(format!("查询选课学生失败: {e}")))?;

    for student_id in student_ids {
        recompute_enrollment_progress(conn, course_id, student_id).await?;
    }
    Ok(())
}

/// 刷新选课记录的最后学习时间
async fn touch_enrollment<C: ConnectionTrait>(
    conn: &C,
    course_id: i64,
    student_id: i64,
    now: i64,
) -> Result<()> {
    Enrollments::update_many()
        .col_expr(enrollments::Column::LastStudyTime, Expr::value(now))
        .filter(enrollments::Column::CourseId.eq(course_id))
        .filter(enrollments::Column::StudentId.eq(student_id))
        .filter(enrollments::Column::Status.ne(EnrollmentStatus::Dropped.to_string()))
        .exec(conn)
        .await
        .map_err(|e| LearnHubError::database_operation(format!("更新学习时间失败: {e}")))?;
    Ok(())
}

async fn find_record<C: ConnectionTrait>(
    conn: &C,
    student_id: i64,
    chapter_id: i64,
) -> Result<Option<Model>> {
    StudyRecords::find()
        .filter(Column::StudentId.eq(student_id))
        .filter(Column::ChapterId.eq(chapter_id))
        .one(conn)
        .await
        .map_err(|e| LearnHubError::database_operation(format!("查询学习记录失败: {e}")))
}

impl SeaOrmStorage {
    /// 获取学习记录
    pub async fn get_study_record_impl(
        &self,
        student_id: i64,
        chapter_id: i64,
    ) -> Result<Option<StudyRecord>> {
        Ok(find_record(&self.db, student_id, chapter_id)
            .await?
            .map(|m| m.into_study_record()))
    }

    /// 列出学生在课程中的学习记录
    pub async fn list_study_records_impl(
        &self,
        student_id: i64,
        course_id: i64,
    ) -> Result<Vec<StudyRecord>> {
        let result = StudyRecords::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::CourseId.eq(course_id))
            .all(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询学习记录失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_study_record()).collect())
    }

    /// 开始学习章节
    ///
    /// 不存在记录时创建为学习中；已完成的记录只刷新学习时间。
    pub async fn start_study_impl(&self, student_id: i64, chapter: &Chapter) -> Result<StudyRecord> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("开启事务失败: {e}")))?;

        let now = now_ts();
        let saved = match find_record(&txn, student_id, chapter.id).await? {
            Some(existing) => {
                let completed = existing.status == StudyStatus::Completed.to_string();
                let mut model: ActiveModel = existing.into();
                model.last_study_time = Set(now);
                model.updated_at = Set(now);
                if !completed {
                    model.status = Set(StudyStatus::InProgress.to_string());
                }
                model
                    .update(&txn)
                    .await
                    .map_err(|e| LearnHubError::database_operation(format!("更新学习记录失败: {e}")))?
            }
            None => ActiveModel {
                student_id: Set(student_id),
                course_id: Set(chapter.course_id),
                chapter_id: Set(chapter.id),
                status: Set(StudyStatus::InProgress.to_string()),
                progress: Set(0),
                last_study_time: Set(now),
                completed_at: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| classify_db_err(e, "创建学习记录失败"))?,
        };

        touch_enrollment(&txn, chapter.course_id, student_id, now).await?;

        txn.commit()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(saved.into_study_record())
    }

    /// 更新章节学习进度
    ///
    /// 进度只增不减；达到 100 时标记完成。记录不存在时返回 None。
    pub async fn update_study_progress_impl(
        &self,
        student_id: i64,
        chapter: &Chapter,
        progress: i32,
    ) -> Result<Option<StudyProgressResponse>> {
        if !(0..=100).contains(&progress) {
            return Err(LearnHubError::validation(format!(
                "学习进度必须在 0 到 100 之间: {progress}"
            )));
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("开启事务失败: {e}")))?;

        let Some(existing) = find_record(&txn, student_id, chapter.id).await? else {
            return Ok(None);
        };

        let now = now_ts();
        let was_completed = existing.status == StudyStatus::Completed.to_string();
        let next_progress = existing.progress.max(progress);
        let completed_at = existing.completed_at;

        let mut model: ActiveModel = existing.into();
        model.progress = Set(next_progress);
        model.last_study_time = Set(now);
        model.updated_at = Set(now);
        if was_completed || next_progress >= 100 {
            model.status = Set(StudyStatus::Completed.to_string());
            model.completed_at = Set(completed_at.or(Some(now)));
        } else {
            model.status = Set(StudyStatus::InProgress.to_string());
        }

        let saved = model
            .update(&txn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("更新学习记录失败: {e}")))?;

        touch_enrollment(&txn, chapter.course_id, student_id, now).await?;
        let enrollment_progress =
            recompute_enrollment_progress(&txn, chapter.course_id, student_id).await?;

        txn.commit()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(Some(StudyProgressResponse {
            record: saved.into_study_record(),
            enrollment_progress,
        }))
    }

    /// 完成章节（幂等）
    pub async fn complete_chapter_impl(
        &self,
        student_id: i64,
        chapter: &Chapter,
    ) -> Result<StudyProgressResponse> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("开启事务失败: {e}")))?;

        let now = now_ts();
        let saved = match find_record(&txn, student_id, chapter.id).await? {
            Some(existing) => {
                let completed_at = existing.completed_at;
                let mut model: ActiveModel = existing.into();
                model.status = Set(StudyStatus::Completed.to_string());
                model.progress = Set(100);
                model.completed_at = Set(completed_at.or(Some(now)));
                model.last_study_time = Set(now);
                model.updated_at = Set(now);
                model
                    .update(&txn)
                    .await
                    .map_err(|e| LearnHubError::database_operation(format!("更新学习记录失败: {e}")))?
            }
            None => ActiveModel {
                student_id: Set(student_id),
                course_id: Set(chapter.course_id),
                chapter_id: Set(chapter.id),
                status: Set(StudyStatus::Completed.to_string()),
                progress: Set(100),
                last_study_time: Set(now),
                completed_at: Set(Some(now)),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| classify_db_err(e, "创建学习记录失败"))?,
        };

        touch_enrollment(&txn, chapter.course_id, student_id, now).await?;
        let enrollment_progress =
            recompute_enrollment_progress(&txn, chapter.course_id, student_id).await?;

        txn.commit()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(StudyProgressResponse {
            record: saved.into_study_record(),
            enrollment_progress,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::models::enrollments::entities::EnrollmentStatus;
    use crate::models::study::entities::StudyStatus;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::test_support::{
        add_chapter, memory_storage, new_course, new_user, publish_course,
    };

    async fn enrolled_course(
        chapters: usize,
    ) -> (
        SeaOrmStorage,
        i64,
        Vec<crate::models::chapters::entities::Chapter>,
        i64,
    ) {
        let storage = memory_storage().await;
        let teacher = storage
            .create_user_impl(new_user("teacher", UserRole::Teacher))
            .await
            .unwrap();
        let student = storage
            .create_user_impl(new_user("student", UserRole::Student))
            .await
            .unwrap();
        let course = storage
            .create_course_impl(new_course(teacher.id, "Course"))
            .await
            .unwrap();
        let mut list = Vec::new();
        for i in 0..chapters {
            list.push(add_chapter(&storage, course.id, &format!("Chapter {i}")).await);
        }
        publish_course(&storage, course.id).await;
        let enrollment = storage.enroll_impl(course.id, student.id).await.unwrap();
        (storage, student.id, list, enrollment.id)
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_completes_at_100() {
        let (storage, student_id, chapters, _) = enrolled_course(1).await;
        let chapter = &chapters[0];

        // 未开始学习时不能更新进度
        assert!(
            storage
                .update_study_progress_impl(student_id, chapter, 10)
                .await
                .unwrap()
                .is_none()
        );

        let started = storage.start_study_impl(student_id, chapter).await.unwrap();
        assert_eq!(started.status, StudyStatus::InProgress);

        let r = storage
            .update_study_progress_impl(student_id, chapter, 60)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(r.record.progress, 60);

        // 回退的进度被忽略
        let r = storage
            .update_study_progress_impl(student_id, chapter, 30)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(r.record.progress, 60);
        assert_eq!(r.record.status, StudyStatus::InProgress);

        let r = storage
            .update_study_progress_impl(student_id, chapter, 100)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(r.record.status, StudyStatus::Completed);
        assert!(r.record.completed_at.is_some());
        assert_eq!(r.enrollment_progress, 100);

        // 完成后再次开始学习只刷新时间
        let again = storage.start_study_impl(student_id, chapter).await.unwrap();
        assert_eq!(again.status, StudyStatus::Completed);
        assert_eq!(again.progress, 100);
    }

    #[tokio::test]
    async fn test_progress_out_of_range_rejected() {
        let (storage, student_id, chapters, _) = enrolled_course(1).await;
        storage.start_study_impl(student_id, &chapters[0]).await.unwrap();
        let err = storage
            .update_study_progress_impl(student_id, &chapters[0], 101)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E006");
        let err = storage
            .update_study_progress_impl(student_id, &chapters[0], -1)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E006");
    }

    #[tokio::test]
    async fn test_two_chapter_scenario_never_auto_completes() {
        let (storage, student_id, chapters, enrollment_id) = enrolled_course(2).await;

        let first = storage
            .complete_chapter_impl(student_id, &chapters[0])
            .await
            .unwrap();
        assert_eq!(first.enrollment_progress, 50);

        // 重复完成是幂等的
        let repeat = storage
            .complete_chapter_impl(student_id, &chapters[0])
            .await
            .unwrap();
        assert_eq!(repeat.enrollment_progress, 50);
        assert_eq!(repeat.record.completed_at, first.record.completed_at);

        let second = storage
            .complete_chapter_impl(student_id, &chapters[1])
            .await
            .unwrap();
        assert_eq!(second.enrollment_progress, 100);

        let enrollment = storage
            .get_enrollment_by_id_impl(enrollment_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(enrollment.progress, 100);
        assert_eq!(enrollment.status, EnrollmentStatus::Active);

        let completed = storage
            .list_completed_chapters_impl(chapters[0].course_id, student_id)
            .await
            .unwrap();
        assert_eq!(completed.len(), 2);
    }

    #[tokio::test]
    async fn test_new_chapter_lowers_progress() {
        let (storage, student_id, chapters, enrollment_id) = enrolled_course(1).await;
        storage
            .complete_chapter_impl(student_id, &chapters[0])
            .await
            .unwrap();

        add_chapter(&storage, chapters[0].course_id, "Extra").await;
        let enrollment = storage
            .get_enrollment_by_id_impl(enrollment_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(enrollment.progress, 50);

        let extra = storage
            .list_chapters_by_course_impl(chapters[0].course_id)
            .await
            .unwrap();
        storage.start_study_impl(student_id, &extra[1]).await.unwrap();
        let r = storage
            .update_study_progress_impl(student_id, &extra[1], 20)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(r.enrollment_progress, 50);

        let enrollment = storage
            .get_enrollment_by_id_impl(enrollment_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(enrollment.progress, 50);
    }
}
