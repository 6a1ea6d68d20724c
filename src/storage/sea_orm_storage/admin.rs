use std::collections::HashSet;

use super::SeaOrmStorage;
use crate::entity::prelude::{
    AssignmentAttachments, Assignments, ChapterResources, Chapters, Courses, Enrollments,
    StudyRecords, SubmissionAttachments, Submissions, UserSettingsEntity, Users,
};
use crate::entity::{courses, enrollments, submissions, user_settings, users};
use crate::errors::{LearnHubError, Result};
use crate::models::{
    admin::{
        entities::BackupData,
        responses::{
            AdminStatistics, AssignmentCounts, CourseCounts, EnrollmentCounts, RestoreSummary,
            UserCounts,
        },
    },
    assignments::entities::SubmissionStatus,
    courses::entities::CourseStatus,
    enrollments::entities::EnrollmentStatus,
    users::entities::UserRole,
};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};

const RECENT_LIMIT: u64 = 5;

/// 恢复时按原主键写回的表
const RESTORED_TABLES: [&str; 11] = [
    "users",
    "user_settings",
    "courses",
    "chapters",
    "chapter_resources",
    "enrollments",
    "study_records",
    "assignments",
    "assignment_attachments",
    "submissions",
    "submission_attachments",
];

/// 把 PostgreSQL 的自增序列推进到表中最大主键之后
fn sequence_reset_sql(table: &str) -> String {
    format!(
        "SELECT setval(pg_get_serial_sequence('{table}', 'id'), \
         COALESCE((SELECT MAX(id) FROM {table}), 0) + 1, false)"
    )
}

/// 显式写入主键不会推进 PostgreSQL 序列，恢复后需要手动同步
async fn reset_id_sequences<C: ConnectionTrait>(conn: &C) -> Result<()> {
    if conn.get_database_backend() != DbBackend::Postgres {
        return Ok(());
    }
    for table in RESTORED_TABLES {
        conn.execute_unprepared(&sequence_reset_sql(table))
            .await
            .map_err(|e| {
                LearnHubError::database_operation(format!("同步 {table} 主键序列失败: {e}"))
            })?;
    }
    Ok(())
}

/// 按原主键逐行写回
async fn insert_rows<C, A>(conn: &C, rows: Vec<A>, context: &str) -> Result<i64>
where
    C: ConnectionTrait,
    A: ActiveModelTrait + ActiveModelBehavior + Send + 'static,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    let count = rows.len() as i64;
    for row in rows {
        row.reset_all()
            .insert(conn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("{context}: {e}")))?;
    }
    Ok(count)
}

impl SeaOrmStorage {
    /// 系统统计
    pub async fn get_statistics_impl(&self) -> Result<AdminStatistics> {
        let db = &self.db;
        let count_err = |e: sea_orm::DbErr| {
            LearnHubError::database_operation(format!("统计数据查询失败: {e}"))
        };

        let user_count = |role: Option<UserRole>| {
            let mut select = Users::find();
            if let Some(role) = role {
                select = select.filter(users::Column::Role.eq(role.to_string()));
            }
            select.count(db)
        };
        let users = UserCounts {
            total: user_count(None).await.map_err(count_err)? as i64,
            students: user_count(Some(UserRole::Student)).await.map_err(count_err)? as i64,
            teachers: user_count(Some(UserRole::Teacher)).await.map_err(count_err)? as i64,
            admins: user_count(Some(UserRole::Admin)).await.map_err(count_err)? as i64,
        };

        let course_count = |status: Option<CourseStatus>| {
            let mut select = Courses::find();
            if let Some(status) = status {
                select = select.filter(courses::Column::Status.eq(status.to_string()));
            }
            select.count(db)
        };
        let courses = CourseCounts {
            total: course_count(None).await.map_err(count_err)? as i64,
            published: course_count(Some(CourseStatus::Published))
                .await
                .map_err(count_err)? as i64,
            draft: course_count(Some(CourseStatus::Draft)).await.map_err(count_err)? as i64,
        };

        let enrollment_count = |status: Option<EnrollmentStatus>| {
            let mut select = Enrollments::find();
            if let Some(status) = status {
                select = select.filter(enrollments::Column::Status.eq(status.to_string()));
            }
            select.count(db)
        };
        let enrollments = EnrollmentCounts {
            total: enrollment_count(None).await.map_err(count_err)? as i64,
            active: enrollment_count(Some(EnrollmentStatus::Active))
                .await
                .map_err(count_err)? as i64,
            completed: enrollment_count(Some(EnrollmentStatus::Completed))
                .await
                .map_err(count_err)? as i64,
        };

        let assignments = AssignmentCounts {
            total: Assignments::find().count(db).await.map_err(count_err)? as i64,
            submissions: Submissions::find().count(db).await.map_err(count_err)? as i64,
            ungraded_submissions: Submissions::find()
                .filter(submissions::Column::Status.eq(SubmissionStatus::Submitted.to_string()))
                .count(db)
                .await
                .map_err(count_err)? as i64,
        };

        let recent_users = Users::find()
            .order_by_desc(users::Column::CreatedAt)
            .order_by_desc(users::Column::Id)
            .limit(RECENT_LIMIT)
            .all(db)
            .await
            .map_err(count_err)?
            .into_iter()
            .map(|m| m.into_user())
            .collect();

        let recent_courses = Courses::find()
            .filter(courses::Column::Status.eq(CourseStatus::Published.to_string()))
            .order_by_desc(courses::Column::CreatedAt)
            .order_by_desc(courses::Column::Id)
            .limit(RECENT_LIMIT)
            .all(db)
            .await
            .map_err(count_err)?
            .into_iter()
            .map(|m| m.into_course())
            .collect();

        let recent_enrollments = Enrollments::find()
            .order_by_desc(enrollments::Column::CreatedAt)
            .order_by_desc(enrollments::Column::Id)
            .limit(RECENT_LIMIT)
            .all(db)
            .await
            .map_err(count_err)?
            .into_iter()
            .map(|m| m.into_enrollment())
            .collect();

        Ok(AdminStatistics {
            users,
            courses,
            enrollments,
            assignments,
            recent_users,
            recent_courses,
            recent_enrollments,
        })
    }

    /// 导出全部业务数据
    pub async fn export_backup_data_impl(&self) -> Result<BackupData> {
        let db = &self.db;
        let err = |e: sea_orm::DbErr| LearnHubError::database_operation(format!("导出数据失败: {e}"));

        Ok(BackupData {
            users: Users::find().all(db).await.map_err(err)?,
            courses: Courses::find().all(db).await.map_err(err)?,
            chapters: Chapters::find().all(db).await.map_err(err)?,
            assignments: Assignments::find().all(db).await.map_err(err)?,
            submissions: Submissions::find().all(db).await.map_err(err)?,
            enrollments: Enrollments::find().all(db).await.map_err(err)?,
            study_records: StudyRecords::find().all(db).await.map_err(err)?,
            chapter_resources: ChapterResources::find().all(db).await.map_err(err)?,
            assignment_attachments: AssignmentAttachments::find().all(db).await.map_err(err)?,
            submission_attachments: SubmissionAttachments::find().all(db).await.map_err(err)?,
            user_settings: UserSettingsEntity::find().all(db).await.map_err(err)?,
        })
    }

    /// 从备份恢复
    ///
    /// 单个事务内先删除除管理员外的全部数据，再写回备份内容。备份中的管理员账号
    /// 以及与现有管理员冲突的账号会被跳过，引用了被跳过记录的行一并跳过。
    pub async fn restore_backup_data_impl(&self, data: BackupData) -> Result<RestoreSummary> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("开启事务失败: {e}")))?;
        let err = |e: sea_orm::DbErr| LearnHubError::database_operation(format!("清理数据失败: {e}"));

        let admin_role = UserRole::Admin.to_string();
        let admins = Users::find()
            .filter(users::Column::Role.eq(admin_role.clone()))
            .all(&txn)
            .await
            .map_err(err)?;
        let admin_ids: HashSet<i64> = admins.iter().map(|u| u.id).collect();
        let admin_names: HashSet<String> = admins.iter().map(|u| u.username.clone()).collect();
        let admin_emails: HashSet<String> = admins.iter().map(|u| u.email.clone()).collect();

        // 子表在前，父表在后
        SubmissionAttachments::delete_many().exec(&txn).await.map_err(err)?;
        Submissions::delete_many().exec(&txn).await.map_err(err)?;
        AssignmentAttachments::delete_many().exec(&txn).await.map_err(err)?;
        Assignments::delete_many().exec(&txn).await.map_err(err)?;
        StudyRecords::delete_many().exec(&txn).await.map_err(err)?;
        Enrollments::delete_many().exec(&txn).await.map_err(err)?;
        ChapterResources::delete_many().exec(&txn).await.map_err(err)?;
        Chapters::delete_many().exec(&txn).await.map_err(err)?;
        Courses::delete_many().exec(&txn).await.map_err(err)?;
        if admin_ids.is_empty() {
            UserSettingsEntity::delete_many().exec(&txn).await.map_err(err)?;
        } else {
            UserSettingsEntity::delete_many()
                .filter(user_settings::Column::UserId.is_not_in(admin_ids.iter().copied()))
                .exec(&txn)
                .await
                .map_err(err)?;
        }
        Users::delete_many()
            .filter(users::Column::Role.ne(admin_role.clone()))
            .exec(&txn)
            .await
            .map_err(err)?;

        let restored_users: Vec<users::Model> = data
            .users
            .into_iter()
            .filter(|u| {
                u.role != admin_role
                    && !admin_ids.contains(&u.id)
                    && !admin_names.contains(&u.username)
                    && !admin_emails.contains(&u.email)
            })
            .collect();
        let mut user_ids = admin_ids.clone();
        user_ids.extend(restored_users.iter().map(|u| u.id));

        let restored_courses: Vec<courses::Model> = data
            .courses
            .into_iter()
            .filter(|c| user_ids.contains(&c.teacher_id))
            .collect();
        let course_ids: HashSet<i64> = restored_courses.iter().map(|c| c.id).collect();

        let restored_chapters: Vec<_> = data
            .chapters
            .into_iter()
            .filter(|c| course_ids.contains(&c.course_id))
            .collect();
        let chapter_ids: HashSet<i64> = restored_chapters.iter().map(|c| c.id).collect();

        let restored_assignments: Vec<_> = data
            .assignments
            .into_iter()
            .filter(|a| course_ids.contains(&a.course_id))
            .collect();
        let assignment_ids: HashSet<i64> = restored_assignments.iter().map(|a| a.id).collect();

        let restored_submissions: Vec<_> = data
            .submissions
            .into_iter()
            .filter(|s| assignment_ids.contains(&s.assignment_id) && user_ids.contains(&s.student_id))
            .collect();
        let submission_ids: HashSet<i64> = restored_submissions.iter().map(|s| s.id).collect();

        let mut summary = RestoreSummary {
            users: insert_rows(
                &txn,
                restored_users
                    .into_iter()
                    .map(|m| m.into_active_model())
                    .collect(),
                "恢复用户失败",
            )
            .await?,
            ..Default::default()
        };

        insert_rows(
            &txn,
            data.user_settings
                .into_iter()
                .filter(|s| user_ids.contains(&s.user_id) && !admin_ids.contains(&s.user_id))
                .map(|m| m.into_active_model())
                .collect(),
            "恢复用户设置失败",
        )
        .await?;

        summary.courses = insert_rows(
            &txn,
            restored_courses
                .into_iter()
                .map(|m| m.into_active_model())
                .collect(),
            "恢复课程失败",
        )
        .await?;

        summary.chapters = insert_rows(
            &txn,
            restored_chapters
                .into_iter()
                .map(|m| m.into_active_model())
                .collect(),
            "恢复章节失败",
        )
        .await?;

        insert_rows(
            &txn,
            data.chapter_resources
                .into_iter()
                .filter(|r| chapter_ids.contains(&r.chapter_id))
                .map(|m| m.into_active_model())
                .collect(),
            "恢复章节资源失败",
        )
        .await?;

        summary.enrollments = insert_rows(
            &txn,
            data.enrollments
                .into_iter()
                .filter(|e| course_ids.contains(&e.course_id) && user_ids.contains(&e.student_id))
                .map(|m| m.into_active_model())
                .collect(),
            "恢复选课记录失败",
        )
        .await?;

        summary.study_records = insert_rows(
            &txn,
            data.study_records
                .into_iter()
                .filter(|r| {
                    chapter_ids.contains(&r.chapter_id)
                        && course_ids.contains(&r.course_id)
                        && user_ids.contains(&r.student_id)
                })
                .map(|m| m.into_active_model())
                .collect(),
            "恢复学习记录失败",
        )
        .await?;

        summary.assignments = insert_rows(
            &txn,
            restored_assignments
                .into_iter()
                .map(|m| m.into_active_model())
                .collect(),
            "恢复作业失败",
        )
        .await?;

        insert_rows(
            &txn,
            data.assignment_attachments
                .into_iter()
                .filter(|a| assignment_ids.contains(&a.assignment_id))
                .map(|m| m.into_active_model())
                .collect(),
            "恢复作业附件失败",
        )
        .await?;

        summary.submissions = insert_rows(
            &txn,
            restored_submissions
                .into_iter()
                .map(|m| m.into_active_model())
                .collect(),
            "恢复作业提交失败",
        )
        .await?;

        insert_rows(
            &txn,
            data.submission_attachments
                .into_iter()
                .filter(|a| submission_ids.contains(&a.submission_id))
                .map(|m| m.into_active_model())
                .collect(),
            "恢复提交附件失败",
        )
        .await?;

        reset_id_sequences(&txn).await?;

        txn.commit()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::assignments::entities::AssignmentStatus;
    use crate::models::assignments::requests::NewSubmission;
    use crate::models::users::entities::UserRole;
    use crate::test_support::{
        add_chapter, memory_storage, new_assignment, new_course, new_user, publish_course,
    };

    #[tokio::test]
    async fn test_statistics_counts() {
        let storage = memory_storage().await;
        storage
            .create_user_impl(new_user("admin", UserRole::Admin))
            .await
            .unwrap();
        let teacher = storage
            .create_user_impl(new_user("teacher", UserRole::Teacher))
            .await
            .unwrap();
        let student = storage
            .create_user_impl(new_user("student", UserRole::Student))
            .await
            .unwrap();
        let published = storage
            .create_course_impl(new_course(teacher.id, "Published"))
            .await
            .unwrap();
        storage
            .create_course_impl(new_course(teacher.id, "Draft"))
            .await
            .unwrap();
        add_chapter(&storage, published.id, "One").await;
        publish_course(&storage, published.id).await;
        storage.enroll_impl(published.id, student.id).await.unwrap();

        let stats = storage.get_statistics_impl().await.unwrap();
        assert_eq!(stats.users.total, 3);
        assert_eq!(stats.users.admins, 1);
        assert_eq!(stats.users.teachers, 1);
        assert_eq!(stats.users.students, 1);
        assert_eq!(stats.courses.total, 2);
        assert_eq!(stats.courses.published, 1);
        assert_eq!(stats.courses.draft, 1);
        assert_eq!(stats.enrollments.active, 1);
        assert_eq!(stats.recent_users.len(), 3);
        assert_eq!(stats.recent_courses.len(), 1);
        assert_eq!(stats.recent_enrollments.len(), 1);
    }

    #[tokio::test]
    async fn test_backup_and_restore_keeps_admins() {
        let storage = memory_storage().await;
        let admin = storage
            .create_user_impl(new_user("admin", UserRole::Admin))
            .await
            .unwrap();
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
        let chapter = add_chapter(&storage, course.id, "One").await;
        publish_course(&storage, course.id).await;
        storage.enroll_impl(course.id, student.id).await.unwrap();
        storage
            .complete_chapter_impl(student.id, &chapter)
            .await
            .unwrap();
        let assignment = storage
            .create_assignment_impl(new_assignment(course.id, teacher.id, "HW"), vec![])
            .await
            .unwrap();
        storage
            .update_assignment_status_impl(assignment.assignment.id, AssignmentStatus::Published)
            .await
            .unwrap();
        storage
            .submit_assignment_impl(NewSubmission {
                assignment_id: assignment.assignment.id,
                student_id: student.id,
                content: "answer".into(),
                attachment: None,
            })
            .await
            .unwrap();

        let backup = storage.export_backup_data_impl().await.unwrap();
        assert_eq!(backup.users.len(), 3);

        // 备份之后的改动会被恢复覆盖
        storage
            .create_user_impl(new_user("late", UserRole::Student))
            .await
            .unwrap();

        let summary = storage.restore_backup_data_impl(backup).await.unwrap();
        assert_eq!(summary.users, 2);
        assert_eq!(summary.courses, 1);
        assert_eq!(summary.chapters, 1);
        assert_eq!(summary.enrollments, 1);
        assert_eq!(summary.study_records, 1);
        assert_eq!(summary.assignments, 1);
        assert_eq!(summary.submissions, 1);

        assert!(storage.get_user_by_id_impl(admin.id).await.unwrap().is_some());
        assert!(
            storage
                .get_user_by_username_impl("late")
                .await
                .unwrap()
                .is_none()
        );
        let restored = storage.get_course_by_id_impl(course.id).await.unwrap().unwrap();
        assert_eq!(restored.student_count, 1);
        let enrollment = storage
            .get_live_enrollment_impl(course.id, student.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(enrollment.progress, 100);

        // 恢复后继续新建记录，主键不会与恢复的数据冲突
        let fresh = storage
            .create_user_impl(new_user("fresh", UserRole::Teacher))
            .await
            .unwrap();
        assert!(fresh.id > student.id);
        let fresh_course = storage
            .create_course_impl(new_course(fresh.id, "Fresh"))
            .await
            .unwrap();
        assert!(fresh_course.id > course.id);
    }

    #[test]
    fn test_sequence_reset_sql_targets_table() {
        let sql = super::sequence_reset_sql("courses");
        assert!(sql.contains("pg_get_serial_sequence('courses', 'id')"));
        assert!(sql.contains("SELECT MAX(id) FROM courses"));
        assert!(sql.ends_with("false)"));
        assert_eq!(super::RESTORED_TABLES.len(), 11);
    }
}
