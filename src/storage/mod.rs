use std::sync::Arc;

use crate::config::AppConfig;
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

use crate::errors::Result;

pub mod sea_orm_storage;

/// 提交作业的结果
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub submission: SubmissionWithAttachments,
    /// 是否为重新提交
    pub resubmitted: bool,
    /// 被替换的旧附件 URL，需在提交后删除
    pub replaced_files: Vec<String>,
}

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过用户名获取用户信息
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    // 通过邮箱获取用户信息
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 通过用户名或邮箱获取用户信息
    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>>;
    // 列出用户
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    // 更新用户信息
    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>>;
    // 删除用户
    async fn delete_user(&self, id: i64) -> Result<bool>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 获取用户设置（不存在时返回默认值）
    async fn get_user_settings(&self, user_id: i64) -> Result<UserSettings>;
    // 更新用户设置（不存在时创建）
    async fn update_user_settings(
        &self,
        user_id: i64,
        update: UpdateSettingsRequest,
    ) -> Result<UserSettings>;

    /// 课程管理方法
    async fn create_course(&self, course: NewCourse) -> Result<Course>;
    async fn get_course_by_id(&self, id: i64) -> Result<Option<Course>>;
    // 同一教师下按标题查找课程
    async fn get_course_by_teacher_and_title(
        &self,
        teacher_id: i64,
        title: &str,
    ) -> Result<Option<Course>>;
    async fn list_courses_with_pagination(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse>;
    async fn update_course(&self, id: i64, update: UpdateCourseRequest)
    -> Result<Option<Course>>;
    async fn update_course_status(&self, id: i64, status: CourseStatus) -> Result<Option<Course>>;
    async fn update_course_cover(&self, id: i64, cover: Option<String>)
    -> Result<Option<Course>>;
    // 删除课程及其全部内容，返回需要清理的文件 URL；存在选课记录时拒绝
    async fn delete_course(&self, id: i64) -> Result<Option<Vec<String>>>;

    /// 章节管理方法
    async fn create_chapter(&self, course_id: i64, chapter: CreateChapterRequest)
    -> Result<Chapter>;
    async fn get_chapter_by_id(&self, id: i64) -> Result<Option<Chapter>>;
    async fn list_chapters_by_course(&self, course_id: i64) -> Result<Vec<Chapter>>;
    async fn count_chapters_by_course(&self, course_id: i64) -> Result<u64>;
    async fn update_chapter(&self, id: i64, update: UpdateChapterRequest)
    -> Result<Option<Chapter>>;
    // 删除章节并重算该课程所有选课进度，返回需要清理的资源文件 URL
    async fn delete_chapter(&self, id: i64) -> Result<Option<Vec<String>>>;
    async fn add_chapter_resource(
        &self,
        chapter_id: i64,
        resource: NewChapterResource,
    ) -> Result<ChapterResource>;
    async fn list_chapter_resources(&self, chapter_id: i64) -> Result<Vec<ChapterResource>>;
    async fn get_chapter_resource(&self, id: i64) -> Result<Option<ChapterResource>>;
    async fn delete_chapter_resource(&self, id: i64) -> Result<bool>;

    /// 选课方法
    // 选课：课程必须已发布，且不存在未退课的选课记录；同一事务内递增选课人数
    async fn enroll(&self, course_id: i64, student_id: i64) -> Result<Enrollment>;
    async fn get_enrollment_by_id(&self, id: i64) -> Result<Option<Enrollment>>;
    // 获取学生在课程中未退课的选课记录
    async fn get_live_enrollment(
        &self,
        course_id: i64,
        student_id: i64,
    ) -> Result<Option<Enrollment>>;
    async fn list_student_enrollments(
        &self,
        student_id: i64,
        status: Option<EnrollmentStatus>,
    ) -> Result<MyEnrollmentListResponse>;
    // 更新选课状态：同一事务内维护选课人数
    async fn update_enrollment_status(
        &self,
        id: i64,
        status: EnrollmentStatus,
    ) -> Result<Option<Enrollment>>;
    async fn list_course_students(
        &self,
        course_id: i64,
        page: i64,
        size: i64,
        status: Option<EnrollmentStatus>,
    ) -> Result<CourseStudentListResponse>;
    // 由学习记录推导的已完成章节
    async fn list_completed_chapters(
        &self,
        course_id: i64,
        student_id: i64,
    ) -> Result<Vec<CompletedChapter>>;

    /// 学习记录方法
    async fn get_study_record(&self, student_id: i64, chapter_id: i64)
    -> Result<Option<StudyRecord>>;
    async fn list_study_records(&self, student_id: i64, course_id: i64)
    -> Result<Vec<StudyRecord>>;
    async fn start_study(&self, student_id: i64, chapter: &Chapter) -> Result<StudyRecord>;
    // 记录不存在时返回 None
    async fn update_study_progress(
        &self,
        student_id: i64,
        chapter: &Chapter,
        progress: i32,
    ) -> Result<Option<StudyProgressResponse>>;
    async fn complete_chapter(
        &self,
        student_id: i64,
        chapter: &Chapter,
    ) -> Result<StudyProgressResponse>;

    /// 作业管理方法
    async fn create_assignment(
        &self,
        assignment: NewAssignment,
        attachments: Vec<NewAttachment>,
    ) -> Result<AssignmentWithAttachments>;
    async fn get_assignment_by_id(&self, id: i64) -> Result<Option<Assignment>>;
    async fn get_assignment_with_attachments(
        &self,
        id: i64,
    ) -> Result<Option<AssignmentWithAttachments>>;
    async fn list_assignments_with_pagination(
        &self,
        query: AssignmentListQuery,
    ) -> Result<AssignmentListResponse>;
    async fn list_course_assignments(
        &self,
        course_id: i64,
        statuses: &[AssignmentStatus],
    ) -> Result<Vec<Assignment>>;
    async fn list_student_assignments(&self, student_id: i64)
    -> Result<StudentAssignmentListResponse>;
    async fn update_assignment(
        &self,
        id: i64,
        update: UpdateAssignmentRequest,
    ) -> Result<Option<Assignment>>;
    async fn update_assignment_status(
        &self,
        id: i64,
        status: AssignmentStatus,
    ) -> Result<Option<Assignment>>;
    // 删除作业及其提交，返回需要清理的文件 URL
    async fn delete_assignment(&self, id: i64) -> Result<Option<Vec<String>>>;
    async fn add_assignment_attachments(
        &self,
        assignment_id: i64,
        attachments: Vec<NewAttachment>,
    ) -> Result<Vec<AssignmentAttachment>>;
    async fn get_assignment_attachment(&self, id: i64) -> Result<Option<AssignmentAttachment>>;
    async fn delete_assignment_attachment(&self, id: i64) -> Result<bool>;

    /// 作业提交方法
    // 提交或重新提交作业（同一事务内替换内容与附件）
    async fn submit_assignment(&self, submission: NewSubmission) -> Result<SubmitOutcome>;
    async fn get_submission_by_id(&self, id: i64) -> Result<Option<Submission>>;
    async fn get_student_submission(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<SubmissionWithAttachments>>;
    async fn list_student_course_submissions(
        &self,
        student_id: i64,
        course_id: i64,
    ) -> Result<Vec<Submission>>;
    async fn grade_submission(
        &self,
        id: i64,
        score: f64,
        comment: Option<String>,
        grader_id: i64,
    ) -> Result<Option<Submission>>;
    async fn list_assignment_submissions(
        &self,
        assignment_id: i64,
    ) -> Result<AssignmentSubmissionsResponse>;
    async fn get_submission_attachment(&self, id: i64) -> Result<Option<SubmissionAttachment>>;

    /// 系统管理方法
    async fn get_statistics(&self) -> Result<AdminStatistics>;
    async fn export_backup_data(&self) -> Result<BackupData>;
    // 在单个事务内恢复备份，保留现有管理员账号
    async fn restore_backup_data(&self, data: BackupData) -> Result<RestoreSummary>;
}

pub async fn create_storage(config: &AppConfig) -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async(config).await?;
    Ok(Arc::new(storage))
}
