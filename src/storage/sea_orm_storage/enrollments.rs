use std::collections::HashMap;

use super::study_records::recompute_enrollment_progress;
use super::{SeaOrmStorage, now_ts};
use crate::entity::enrollments::{ActiveModel, Column, Entity as Enrollments};
use crate::entity::prelude::{Assignments, Chapters, Courses, StudyRecords, Submissions};
use crate::entity::{assignments, chapters, courses, study_records, submissions};
use crate::errors::{LearnHubError, Result, classify_db_err};
use crate::models::{
    PaginationInfo,
    assignments::entities::AssignmentStatus,
    courses::entities::CourseStatus,
    enrollments::{
        entities::{CompletedChapter, Enrollment, EnrollmentStatus},
        responses::{
            CourseStudentItem, CourseStudentListResponse, EnrollmentView, MyEnrollmentItem,
            MyEnrollmentListResponse,
        },
    },
    study::entities::StudyStatus,
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

impl SeaOrmStorage {
    /// 选课
    ///
    /// 同一事务内：校验课程已发布、不存在未退课记录，写入选课记录并递增选课人数。
    /// (course_id, student_id) 唯一，退课后重新选课会重新激活原记录，
    /// 之前的学习记录会计入进度。并发插入撞上唯一索引时返回冲突。
    pub async fn enroll_impl(&self, course_id: i64, student_id: i64) -> Result<Enrollment> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("开启事务失败: {e}")))?;

        let course = Courses::find_by_id(course_id)
            .one(&txn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询课程失败: {e}")))?
            .ok_or_else(|| LearnHubError::not_found(format!("课程不存在: {course_id}")))?;

        if course.status != CourseStatus::Published.to_string() {
            return Err(LearnHubError::invalid_state("课程未发布，无法选课"));
        }

        let existing = Enrollments::find()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::StudentId.eq(student_id))
            .one(&txn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询选课记录失败: {e}")))?;

        let now = now_ts();
        let enrollment_id = match existing {
            Some(model) if model.status != EnrollmentStatus::Dropped.to_string() => {
                return Err(LearnHubError::conflict("已选修该课程"));
            }
            Some(model) => {
                // 只有仍处于退课状态时才激活，并发的重新选课只有一个能成功
                let result = Enrollments::update_many()
                    .col_expr(Column::Status, Expr::value(EnrollmentStatus::Active.to_string()))
                    .col_expr(Column::Progress, Expr::value(0))
                    .col_expr(Column::LastStudyTime, Expr::value(now))
                    .col_expr(Column::CompletedAt, Expr::value(Option::<i64>::None))
                    .col_expr(Column::CreatedAt, Expr::value(now))
                    .col_expr(Column::UpdatedAt, Expr::value(now))
                    .filter(Column::Id.eq(model.id))
                    .filter(Column::Status.eq(EnrollmentStatus::Dropped.to_string()))
                    .exec(&txn)
                    .await
                    .map_err(|e| {
                        LearnHubError::database_operation(format!("重新选课失败: {e}"))
                    })?;
                if result.rows_affected == 0 {
                    return Err(LearnHubError::conflict("已选修该课程"));
                }
                model.id
            }
            None => {
                let model = ActiveModel {
                    course_id: Set(course_id),
                    student_id: Set(student_id),
                    status: Set(EnrollmentStatus::Active.to_string()),
                    progress: Set(0),
                    last_study_time: Set(now),
                    completed_at: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                model
                    .insert(&txn)
                    .await
                    .map_err(|e| classify_db_err(e, "已选修该课程"))?
                    .id
            }
        };

        recompute_enrollment_progress(&txn, course_id, student_id).await?;

        Courses::update_many()
            .col_expr(
                courses::Column::StudentCount,
                Expr::cust("student_count + 1"),
            )
            .filter(courses::Column::Id.eq(course_id))
            .exec(&txn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("更新选课人数失败: {e}")))?;

        let enrollment = Enrollments::find_by_id(enrollment_id)
            .one(&txn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询选课记录失败: {e}")))?
            .ok_or_else(|| LearnHubError::not_found(format!("选课记录不存在: {enrollment_id}")))?;

        txn.commit()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(enrollment.into_enrollment())
    }

    /// 通过 ID 获取选课记录
    pub async fn get_enrollment_by_id_impl(&self, id: i64) -> Result<Option<Enrollment>> {
        let result = Enrollments::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询选课记录失败: {e}")))?;

        Ok(result.map(|m| m.into_enrollment()))
    }

    /// 获取学生在课程中未退课的选课记录
    pub async fn get_live_enrollment_impl(
        &self,
        course_id: i64,
        student_id: i64,
    ) -> Result<Option<Enrollment>> {
        let result = Enrollments::find()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::Status.ne(EnrollmentStatus::Dropped.to_string()))
            .order_by_desc(Column::Id)
            .one(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询选课记录失败: {e}")))?;

        Ok(result.map(|m| m.into_enrollment()))
    }

    /// 列出学生的选课记录（附课程摘要与教师姓名）
    pub async fn list_student_enrollments_impl(
        &self,
        student_id: i64,
        status: Option<EnrollmentStatus>,
    ) -> Result<MyEnrollmentListResponse> {
        let mut select = Enrollments::find().filter(Column::StudentId.eq(student_id));
        if let Some(status) = status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        let enrollments = select
            .order_by_desc(Column::UpdatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询选课列表失败: {e}")))?;

        let course_ids: Vec<i64> = enrollments.iter().map(|e| e.course_id).collect();
        let courses: HashMap<i64, courses::Model> = if course_ids.is_empty() {
            HashMap::new()
        } else {
            Courses::find()
                .filter(courses::Column::Id.is_in(course_ids))
                .all(&self.db)
                .await
                .map_err(|e| LearnHubError::database_operation(format!("查询课程失败: {e}")))?
                .into_iter()
                .map(|c| (c.id, c))
                .collect()
        };

        let teacher_ids: Vec<i64> = courses.values().map(|c| c.teacher_id).collect();
        let teachers = self.load_user_briefs(&teacher_ids).await?;

        let mut items = Vec::with_capacity(enrollments.len());
        for model in enrollments {
            // 课程被删除的选课记录不展示
            let Some(course) = courses.get(&model.course_id).cloned() else {
                continue;
            };
            let completed_chapters = self
                .list_completed_chapters_impl(model.course_id, student_id)
                .await?;
            let teacher_name = teachers
                .get(&course.teacher_id)
                .map(|t| t.name.clone().unwrap_or_else(|| t.username.clone()));

            items.push(MyEnrollmentItem {
                enrollment: EnrollmentView {
                    enrollment: model.into_enrollment(),
                    completed_chapters,
                },
                course: course.into_course(),
                teacher_name,
            });
        }

        Ok(MyEnrollmentListResponse { items })
    }

    /// 更新选课状态
    ///
    /// - 退课时递减选课人数（不会低于 0），重复退课不影响人数
    /// - 已退课的记录不能恢复
    /// - 标记完成时进度强制为 100
    pub async fn update_enrollment_status_impl(
        &self,
        id: i64,
        status: EnrollmentStatus,
    ) -> Result<Option<Enrollment>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("开启事务失败: {e}")))?;

        let Some(existing) = Enrollments::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询选课记录失败: {e}")))?
        else {
            return Ok(None);
        };

        let current = existing.clone().into_enrollment();
        if current.is_dropped() {
            if status == EnrollmentStatus::Dropped {
                return Ok(Some(current));
            }
            return Err(LearnHubError::invalid_state(
                "已退课的选课记录无法恢复，请重新选课",
            ));
        }
        if current.status == status {
            return Ok(Some(current));
        }

        let now = now_ts();
        let mut model: ActiveModel = existing.into();
        model.status = Set(status.to_string());
        model.updated_at = Set(now);

        match status {
            EnrollmentStatus::Dropped => {
                model
                    .update(&txn)
                    .await
                    .map_err(|e| LearnHubError::database_operation(format!("退课失败: {e}")))?;

                Courses::update_many()
                    .col_expr(
                        courses::Column::StudentCount,
                        Expr::cust("student_count - 1"),
                    )
                    .filter(courses::Column::Id.eq(current.course_id))
                    .filter(courses::Column::StudentCount.gt(0))
                    .exec(&txn)
                    .await
                    .map_err(|e| {
                        LearnHubError::database_operation(format!("更新选课人数失败: {e}"))
                    })?;
            }
            EnrollmentStatus::Completed => {
                model.progress = Set(100);
                model.completed_at = Set(Some(now));
                model.update(&txn).await.map_err(|e| {
                    LearnHubError::database_operation(format!("更新选课状态失败: {e}"))
                })?;
            }
            EnrollmentStatus::Active => {
                model.completed_at = Set(None);
                model.update(&txn).await.map_err(|e| {
                    LearnHubError::database_operation(format!("更新选课状态失败: {e}"))
                })?;
                recompute_enrollment_progress(&txn, current.course_id, current.student_id)
                    .await?;
            }
        }

        let updated = Enrollments::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询选课记录失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(updated.map(|m| m.into_enrollment()))
    }

    /// 分页列出课程学生及其章节、作业完成情况
    pub async fn list_course_students_impl(
        &self,
        course_id: i64,
        page: i64,
        size: i64,
        status: Option<EnrollmentStatus>,
    ) -> Result<CourseStudentListResponse> {
        let page = page.max(1) as u64;
        let size = size.clamp(1, 100) as u64;

        let mut select = Enrollments::find().filter(Column::CourseId.eq(course_id));
        if let Some(status) = status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }
        select = select.order_by_desc(Column::CreatedAt).order_by_desc(Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询选课总数失败: {e}")))?;
        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询选课页数失败: {e}")))?;
        let enrollments = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询选课列表失败: {e}")))?;

        let total_chapters = Chapters::find()
            .filter(chapters::Column::CourseId.eq(course_id))
            .count(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("统计章节数量失败: {e}")))?;

        // 草稿作业不计入
        let assignment_ids: Vec<i64> = Assignments::find()
            .select_only()
            .column(assignments::Column::Id)
            .filter(assignments::Column::CourseId.eq(course_id))
            .filter(assignments::Column::Status.ne(AssignmentStatus::Draft.to_string()))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询作业失败: {e}")))?;

        let student_ids: Vec<i64> = enrollments.iter().map(|e| e.student_id).collect();
        let students = self.load_user_briefs(&student_ids).await?;

        let mut items = Vec::with_capacity(enrollments.len());
        for model in enrollments {
            let Some(student) = students.get(&model.student_id).cloned() else {
                continue;
            };

            let completed_chapters = StudyRecords::find()
                .filter(study_records::Column::CourseId.eq(course_id))
                .filter(study_records::Column::StudentId.eq(model.student_id))
                .filter(study_records::Column::Status.eq(StudyStatus::Completed.to_string()))
                .count(&self.db)
                .await
                .map_err(|e| {
                    LearnHubError::database_operation(format!("统计完成章节失败: {e}"))
                })?;

            let completed_assignments = if assignment_ids.is_empty() {
                0
            } else {
                Submissions::find()
                    .filter(submissions::Column::StudentId.eq(model.student_id))
                    .filter(submissions::Column::AssignmentId.is_in(assignment_ids.clone()))
                    .count(&self.db)
                    .await
                    .map_err(|e| {
                        LearnHubError::database_operation(format!("统计完成作业失败: {e}"))
                    })?
            };

            items.push(CourseStudentItem {
                enrollment: model.into_enrollment(),
                student,
                completed_chapters: completed_chapters as i64,
                total_chapters: total_chapters as i64,
                completed_assignments: completed_assignments as i64,
                total_assignments: assignment_ids.len() as i64,
            });
        }

        Ok(CourseStudentListResponse {
            items,
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        })
    }

    /// 已完成章节，由学习记录推导
    pub async fn list_completed_chapters_impl(
        &self,
        course_id: i64,
        student_id: i64,
    ) -> Result<Vec<CompletedChapter>> {
        let records = StudyRecords::find()
            .filter(study_records::Column::CourseId.eq(course_id))
            .filter(study_records::Column::StudentId.eq(student_id))
            .filter(study_records::Column::Status.eq(StudyStatus::Completed.to_string()))
            .order_by_asc(study_records::Column::CompletedAt)
            .all(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询学习记录失败: {e}")))?;

        Ok(records
            .into_iter()
            .map(|r| CompletedChapter {
                chapter_id: r.chapter_id,
                completed_at: r
                    .completed_at
                    .map(|ts| DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::models::enrollments::entities::EnrollmentStatus;
    use crate::models::users::entities::UserRole;
    use crate::test_support::{
        add_chapter, memory_storage, new_course, new_user, publish_course,
    };

    async fn setup() -> (crate::storage::sea_orm_storage::SeaOrmStorage, i64, i64) {
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
        add_chapter(&storage, course.id, "One").await;
        add_chapter(&storage, course.id, "Two").await;
        publish_course(&storage, course.id).await;
        (storage, course.id, student.id)
    }

    async fn student_count(
        storage: &crate::storage::sea_orm_storage::SeaOrmStorage,
        course_id: i64,
    ) -> i32 {
        storage
            .get_course_by_id_impl(course_id)
            .await
            .unwrap()
            .unwrap()
            .student_count
    }

    #[tokio::test]
    async fn test_double_enroll_conflicts_without_touching_counter() {
        let (storage, course_id, student_id) = setup().await;

        let enrollment = storage.enroll_impl(course_id, student_id).await.unwrap();
        assert_eq!(enrollment.status, EnrollmentStatus::Active);
        assert_eq!(enrollment.progress, 0);
        assert_eq!(student_count(&storage, course_id).await, 1);

        let err = storage.enroll_impl(course_id, student_id).await.unwrap_err();
        assert_eq!(err.code(), "E012");
        assert_eq!(student_count(&storage, course_id).await, 1);

        let mine = storage
            .list_student_enrollments_impl(student_id, None)
            .await
            .unwrap();
        assert_eq!(mine.items.len(), 1);
        assert_eq!(mine.items[0].teacher_name.as_deref(), Some("teacher"));
    }

    #[tokio::test]
    async fn test_second_enrollment_row_hits_unique_index() {
        use crate::entity::enrollments::ActiveModel;
        use crate::errors::{LearnHubError, classify_db_err};
        use sea_orm::{ActiveModelTrait, Set};

        let (storage, course_id, student_id) = setup().await;
        storage.enroll_impl(course_id, student_id).await.unwrap();

        let err = ActiveModel {
            course_id: Set(course_id),
            student_id: Set(student_id),
            status: Set(EnrollmentStatus::Active.to_string()),
            progress: Set(0),
            last_study_time: Set(0),
            completed_at: Set(None),
            created_at: Set(0),
            updated_at: Set(0),
            ..Default::default()
        }
        .insert(&storage.db)
        .await
        .unwrap_err();
        assert!(matches!(
            classify_db_err(err, "已选修该课程"),
            LearnHubError::Conflict(_)
        ));
        assert_eq!(student_count(&storage, course_id).await, 1);
    }

    #[tokio::test]
    async fn test_enroll_requires_published_course() {
        let storage = memory_storage().await;
        let teacher = storage
            .create_user_impl(new_user("teacher", UserRole::Teacher))
            .await
            .unwrap();
        let course = storage
            .create_course_impl(new_course(teacher.id, "Draft"))
            .await
            .unwrap();

        let err = storage.enroll_impl(course.id, 99).await.unwrap_err();
        assert_eq!(err.code(), "E013");
        let err = storage.enroll_impl(12345, 99).await.unwrap_err();
        assert_eq!(err.code(), "E007");
    }

    #[tokio::test]
    async fn test_drop_decrements_exactly_once() {
        let (storage, course_id, student_id) = setup().await;
        let enrollment = storage.enroll_impl(course_id, student_id).await.unwrap();

        let dropped = storage
            .update_enrollment_status_impl(enrollment.id, EnrollmentStatus::Dropped)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(dropped.status, EnrollmentStatus::Dropped);
        assert_eq!(student_count(&storage, course_id).await, 0);

        // 重复退课不影响人数
        storage
            .update_enrollment_status_impl(enrollment.id, EnrollmentStatus::Dropped)
            .await
            .unwrap();
        assert_eq!(student_count(&storage, course_id).await, 0);

        // 已退课不能恢复
        let err = storage
            .update_enrollment_status_impl(enrollment.id, EnrollmentStatus::Active)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E013");

        // 重新选课激活原记录
        let again = storage.enroll_impl(course_id, student_id).await.unwrap();
        assert_eq!(again.id, enrollment.id);
        assert_eq!(again.status, EnrollmentStatus::Active);
        assert_eq!(student_count(&storage, course_id).await, 1);
    }

    #[tokio::test]
    async fn test_explicit_completion_forces_full_progress() {
        let (storage, course_id, student_id) = setup().await;
        let enrollment = storage.enroll_impl(course_id, student_id).await.unwrap();

        let completed = storage
            .update_enrollment_status_impl(enrollment.id, EnrollmentStatus::Completed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(completed.progress, 100);
        assert!(completed.completed_at.is_some());

        // 回到学习中时进度从学习记录重新推导
        let active = storage
            .update_enrollment_status_impl(enrollment.id, EnrollmentStatus::Active)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(active.progress, 0);
        assert!(active.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_course_students_counts() {
        let (storage, course_id, student_id) = setup().await;
        storage.enroll_impl(course_id, student_id).await.unwrap();
        let chapters = storage.list_chapters_by_course_impl(course_id).await.unwrap();
        storage
            .complete_chapter_impl(student_id, &chapters[0])
            .await
            .unwrap();

        let students = storage
            .list_course_students_impl(course_id, 1, 10, None)
            .await
            .unwrap();
        assert_eq!(students.pagination.total, 1);
        let item = &students.items[0];
        assert_eq!(item.student.id, student_id);
        assert_eq!(item.completed_chapters, 1);
        assert_eq!(item.total_chapters, 2);
        assert_eq!(item.total_assignments, 0);
    }
}
