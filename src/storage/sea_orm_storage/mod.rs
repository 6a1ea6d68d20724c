//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。
//! 涉及多张表的写操作（选课与人数、学习记录与进度、提交与附件、备份恢复）
//! 都在单个事务中完成。

mod admin;
mod assignments;
mod chapters;
mod courses;
mod enrollments;
mod study_records;
mod submissions;
mod user_settings;
mod users;

use crate::config::AppConfig;
use crate::errors::{LearnHubError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async(config: &AppConfig) -> Result<Self> {
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| LearnHubError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory")
            .pragma("wal_autocheckpoint", "1000");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(None)
            .connect_with(opt)
            .await
            .map_err(|e| LearnHubError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| LearnHubError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(LearnHubError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

/// 当前 Unix 时间戳（秒）
pub(crate) fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

// Storage trait 实现
use crate::models::{
    admin::{
        entities::BackupData,
        responses::{AdminStatistics, RestoreSummary},
    },
    assignments::{
        entities::{
            Assignment, AssignmentAttachment, AssignmentStatus, Submission, SubmissionAttachment,
        },
        requests::{
            AssignmentListQuery, NewAssignment, NewAttachment, NewSubmission,
            UpdateAssignmentRequest,
        },
        responses::{
            AssignmentListResponse, AssignmentSubmissionsResponse, AssignmentWithAttachments,
            StudentAssignmentListResponse, SubmissionWithAttachments,
        },
    },
    chapters::{
        entities::{Chapter, ChapterResource},
        requests::{CreateChapterRequest, NewChapterResource, UpdateChapterRequest},
    },
    courses::{
        entities::{Course, CourseStatus},
        requests::{CourseListQuery, NewCourse, UpdateCourseRequest},
        responses::CourseListResponse,
    },
    enrollments::{
        entities::{CompletedChapter, Enrollment, EnrollmentStatus},
        responses::{CourseStudentListResponse, MyEnrollmentListResponse},
    },
    study::{entities::StudyRecord, responses::StudyProgressResponse},
    users::{
        entities::{User, UserSettings},
        requests::{CreateUserRequest, UpdateSettingsRequest, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};
use crate::storage::{Storage, SubmitOutcome};
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(&self, user: CreateUserRequest) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.get_user_by_username_impl(username).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_by_email_impl(email).await
    }

    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>> {
        self.get_user_by_username_or_email_impl(identifier).await
    }

    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse> {
        self.list_users_with_pagination_impl(query).await
    }

    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>> {
        self.update_user_impl(id, update).await
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        self.delete_user_impl(id).await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn get_user_settings(&self, user_id: i64) -> Result<UserSettings> {
        self.get_user_settings_impl(user_id).await
    }

    async fn update_user_settings(
        &self,
        user_id: i64,
        update: UpdateSettingsRequest,
    ) -> Result<UserSettings> {
        self.update_user_settings_impl(user_id, update).await
    }

    // 课程模块
    async fn create_course(&self, course: NewCourse) -> Result<Course> {
        self.create_course_impl(course).await
    }

    async fn get_course_by_id(&self, id: i64) -> Result<Option<Course>> {
        self.get_course_by_id_impl(id).await
    }

    async fn get_course_by_teacher_and_title(
        &self,
        teacher_id: i64,
        title: &str,
    ) -> Result<Option<Course>> {
        self.get_course_by_teacher_and_title_impl(teacher_id, title)
            .await
    }

    async fn list_courses_with_pagination(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse> {
        self.list_courses_with_pagination_impl(query).await
    }

    async fn update_course(
        &self,
        id: i64,
        update: UpdateCourseRequest,
    ) -> Result<Option<Course>> {
        self.update_course_impl(id, update).await
    }

    async fn update_course_status(&self, id: i64, status: CourseStatus) -> Result<Option<Course>> {
        self.update_course_status_impl(id, status).await
    }

    async fn update_course_cover(
        &self,
        id: i64,
        cover: Option<String>,
    ) -> Result<Option<Course>> {
        self.update_course_cover_impl(id, cover).await
    }

    async fn delete_course(&self, id: i64) -> Result<Option<Vec<String>>> {
        self.delete_course_impl(id).await
    }

    // 章节模块
    async fn create_chapter(
        &self,
        course_id: i64,
        chapter: CreateChapterRequest,
    ) -> Result<Chapter> {
        self.create_chapter_impl(course_id, chapter).await
    }

    async fn get_chapter_by_id(&self, id: i64) -> Result<Option<Chapter>> {
        self.get_chapter_by_id_impl(id).await
    }

    async fn list_chapters_by_course(&self, course_id: i64) -> Result<Vec<Chapter>> {
        self.list_chapters_by_course_impl(course_id).await
    }

    async fn count_chapters_by_course(&self, course_id: i64) -> Result<u64> {
        self.count_chapters_by_course_impl(course_id).await
    }

    async fn update_chapter(
        &self,
        id: i64,
        update: UpdateChapterRequest,
    ) -> Result<Option<Chapter>> {
        self.update_chapter_impl(id, update).await
    }

    async fn delete_chapter(&self, id: i64) -> Result<Option<Vec<String>>> {
        self.delete_chapter_impl(id).await
    }

    async fn add_chapter_resource(
        &self,
        chapter_id: i64,
        resource: NewChapterResource,
    ) -> Result<ChapterResource> {
        self.add_chapter_resource_impl(chapter_id, resource).await
    }

    async fn list_chapter_resources(&self, chapter_id: i64) -> Result<Vec<ChapterResource>> {
        self.list_chapter_resources_impl(chapter_id).await
    }

    async fn get_chapter_resource(&self, id: i64) -> Result<Option<ChapterResource>> {
        self.get_chapter_resource_impl(id).await
    }

    async fn delete_chapter_resource(&self, id: i64) -> Result<bool> {
        self.delete_chapter_resource_impl(id).await
    }

    // 选课模块
    async fn enroll(&self, course_id: i64, student_id: i64) -> Result<Enrollment> {
        self.enroll_impl(course_id, student_id).await
    }

    async fn get_enrollment_by_id(&self, id: i64) -> Result<Option<Enrollment>> {
        self.get_enrollment_by_id_impl(id).await
    }

    async fn get_live_enrollment(
        &self,
        course_id: i64,
        student_id: i64,
    ) -> Result<Option<Enrollment>> {
        self.get_live_enrollment_impl(course_id, student_id).await
    }

    async fn list_student_enrollments(
        &self,
        student_id: i64,
        status: Option<EnrollmentStatus>,
    ) -> Result<MyEnrollmentListResponse> {
        self.list_student_enrollments_impl(student_id, status).await
    }

    async fn update_enrollment_status(
        &self,
        id: i64,
        status: EnrollmentStatus,
    ) -> Result<Option<Enrollment>> {
        self.update_enrollment_status_impl(id, status).await
    }

    async fn list_course_students(
        &self,
        course_id: i64,
        page: i64,
        size: i64,
        status: Option<EnrollmentStatus>,
    ) -> Result<CourseStudentListResponse> {
        self.list_course_students_impl(course_id, page, size, status)
            .await
    }

    async fn list_completed_chapters(
        &self,
        course_id: i64,
        student_id: i64,
    ) -> Result<Vec<CompletedChapter>> {
        self.list_completed_chapters_impl(course_id, student_id)
            .await
    }

    // 学习记录模块
    async fn get_study_record(
        &self,
        student_id: i64,
        chapter_id: i64,
    ) -> Result<Option<StudyRecord>> {
        self.get_study_record_impl(student_id, chapter_id).await
    }

    async fn list_study_records(
        &self,
        student_id: i64,
        course_id: i64,
    ) -> Result<Vec<StudyRecord>> {
        self.list_study_records_impl(student_id, course_id).await
    }

    async fn start_study(&self, student_id: i64, chapter: &Chapter) -> Result<StudyRecord> {
        self.start_study_impl(student_id, chapter).await
    }

    async fn update_study_progress(
        &self,
        student_id: i64,
        chapter: &Chapter,
        progress: i32,
    ) -> Result<Option<StudyProgressResponse>> {
        self.update_study_progress_impl(student_id, chapter, progress)
            .await
    }

    async fn complete_chapter(
        &self,
        student_id: i64,
        chapter: &Chapter,
    ) -> Result<StudyProgressResponse> {
        self.complete_chapter_impl(student_id, chapter).await
    }

    // 作业模块
    async fn create_assignment(
        &self,
        assignment: NewAssignment,
        attachments: Vec<NewAttachment>,
    ) -> Result<AssignmentWithAttachments> {
        self.create_assignment_impl(assignment, attachments).await
    }

    async fn get_assignment_by_id(&self, id: i64) -> Result<Option<Assignment>> {
        self.get_assignment_by_id_impl(id).await
    }

    async fn get_assignment_with_attachments(
        &self,
        id: i64,
    ) -> Result<Option<AssignmentWithAttachments>> {
        self.get_assignment_with_attachments_impl(id).await
    }

    async fn list_assignments_with_pagination(
        &self,
        query: AssignmentListQuery,
    ) -> Result<AssignmentListResponse> {
        self.list_assignments_with_pagination_impl(query).await
    }

    async fn list_course_assignments(
        &self,
        course_id: i64,
        statuses: &[AssignmentStatus],
    ) -> Result<Vec<Assignment>> {
        self.list_course_assignments_impl(course_id, statuses).await
    }

    async fn list_student_assignments(
        &self,
        student_id: i64,
    ) -> Result<StudentAssignmentListResponse> {
        self.list_student_assignments_impl(student_id).await
    }

    async fn update_assignment(
        &self,
        id: i64,
        update: UpdateAssignmentRequest,
    ) -> Result<Option<Assignment>> {
        self.update_assignment_impl(id, update).await
    }

    async fn update_assignment_status(
        &self,
        id: i64,
        status: AssignmentStatus,
    ) -> Result<Option<Assignment>> {
        self.update_assignment_status_impl(id, status).await
    }

    async fn delete_assignment(&self, id: i64) -> Result<Option<Vec<String>>> {
        self.delete_assignment_impl(id).await
    }

    async fn add_assignment_attachments(
        &self,
        assignment_id: i64,
        attachments: Vec<NewAttachment>,
    ) -> Result<Vec<AssignmentAttachment>> {
        self.add_assignment_attachments_impl(assignment_id, attachments)
            .await
    }

    async fn get_assignment_attachment(&self, id: i64) -> Result<Option<AssignmentAttachment>> {
        self.get_assignment_attachment_impl(id).await
    }

    async fn delete_assignment_attachment(&self, id: i64) -> Result<bool> {
        self.delete_assignment_attachment_impl(id).await
    }

    // 提交模块
    async fn submit_assignment(&self, submission: NewSubmission) -> Result<SubmitOutcome> {
        self.submit_assignment_impl(submission).await
    }

    async fn get_submission_by_id(&self, id: i64) -> Result<Option<Submission>> {
        self.get_submission_by_id_impl(id).await
    }

    async fn get_student_submission(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<SubmissionWithAttachments>> {
        self.get_student_submission_impl(assignment_id, student_id)
            .await
    }

    async fn list_student_course_submissions(
        &self,
        student_id: i64,
        course_id: i64,
    ) -> Result<Vec<Submission>> {
        self.list_student_course_submissions_impl(student_id, course_id)
            .await
    }

    async fn grade_submission(
        &self,
        id: i64,
        score: f64,
        comment: Option<String>,
        grader_id: i64,
    ) -> Result<Option<Submission>> {
        self.grade_submission_impl(id, score, comment, grader_id)
            .await
    }

    async fn list_assignment_submissions(
        &self,
        assignment_id: i64,
    ) -> Result<AssignmentSubmissionsResponse> {
        self.list_assignment_submissions_impl(assignment_id).await
    }

    async fn get_submission_attachment(&self, id: i64) -> Result<Option<SubmissionAttachment>> {
        self.get_submission_attachment_impl(id).await
    }

    // 系统管理模块
    async fn get_statistics(&self) -> Result<AdminStatistics> {
        self.get_statistics_impl().await
    }

    async fn export_backup_data(&self) -> Result<BackupData> {
        self.export_backup_data_impl().await
    }

    async fn restore_backup_data(&self, data: BackupData) -> Result<RestoreSummary> {
        self.restore_backup_data_impl(data).await
    }
}
