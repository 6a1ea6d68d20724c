use std::collections::HashMap;

use super::{SeaOrmStorage, now_ts};
use crate::entity::courses::{ActiveModel, Column, Entity as Courses};
use crate::entity::prelude::{
    AssignmentAttachments, Assignments, ChapterResources, Chapters, Enrollments, StudyRecords,
    SubmissionAttachments, Submissions, Users,
};
use crate::entity::{
    assignment_attachments, assignments, chapter_resources, chapters, enrollments, study_records,
    submission_attachments, submissions, users,
};
use crate::errors::{LearnHubError, Result, classify_db_err};
use crate::models::{
    PaginationInfo,
    courses::{
        entities::{Course, CourseStatus},
        requests::{CourseListQuery, CourseVisibility, NewCourse, UpdateCourseRequest},
        responses::{CourseListResponse, CourseWithTeacher},
    },
    users::entities::UserBrief,
};
use crate::utils::contains_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

impl SeaOrmStorage {
    /// 创建课程（草稿，选课人数为 0）
    pub async fn create_course_impl(&self, req: NewCourse) -> Result<Course> {
        let now = now_ts();

        let model = ActiveModel {
            teacher_id: Set(req.teacher_id),
            title: Set(req.title),
            description: Set(req.description),
            cover_image: Set(None),
            category: Set(req.category.to_string()),
            level: Set(req.level.to_string()),
            price: Set(req.price),
            status: Set(CourseStatus::Draft.to_string()),
            student_count: Set(0),
            rating: Set(0.0),
            published_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| classify_db_err(e, "创建课程失败"))?;

        Ok(result.into_course())
    }

    /// 通过 ID 获取课程
    pub async fn get_course_by_id_impl(&self, id: i64) -> Result<Option<Course>> {
        let result = Courses::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询课程失败: {e}")))?;

        Ok(result.map(|m| m.into_course()))
    }

    /// 同一教师下按标题查找课程
    pub async fn get_course_by_teacher_and_title_impl(
        &self,
        teacher_id: i64,
        title: &str,
    ) -> Result<Option<Course>> {
        let result = Courses::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .filter(Column::Title.eq(title))
            .one(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询课程失败: {e}")))?;

        Ok(result.map(|m| m.into_course()))
    }

    /// 分页列出课程，按可见性过滤
    pub async fn list_courses_with_pagination_impl(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Courses::find();

        select = match query.visibility {
            CourseVisibility::All => select,
            CourseVisibility::PublishedOnly => {
                select.filter(Column::Status.eq(CourseStatus::Published.to_string()))
            }
            CourseVisibility::PublishedOrOwnedBy(teacher_id) => select.filter(
                Condition::any()
                    .add(Column::Status.eq(CourseStatus::Published.to_string()))
                    .add(Column::TeacherId.eq(teacher_id)),
            ),
        };

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            select = select.filter(
                Condition::any()
                    .add(Column::Title.like(contains_pattern(search.trim())))
                    .add(Column::Description.like(contains_pattern(search.trim()))),
            );
        }

        if let Some(category) = query.category {
            select = select.filter(Column::Category.eq(category.to_string()));
        }

        if let Some(level) = query.level {
            select = select.filter(Column::Level.eq(level.to_string()));
        }

        if let Some(status) = query.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        select = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询课程总数失败: {e}")))?;
        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询课程页数失败: {e}")))?;
        let courses = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询课程列表失败: {e}")))?;

        let teacher_ids: Vec<i64> = courses.iter().map(|c| c.teacher_id).collect();
        let teachers = self.load_user_briefs(&teacher_ids).await?;

        let items = courses
            .into_iter()
            .map(|m| {
                let teacher = teachers.get(&m.teacher_id).cloned();
                CourseWithTeacher {
                    course: m.into_course(),
                    teacher,
                }
            })
            .collect();

        Ok(CourseListResponse {
            items,
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        })
    }

    /// 批量加载用户摘要
    pub(crate) async fn load_user_briefs(&self, ids: &[i64]) -> Result<HashMap<i64, UserBrief>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let models = Users::find()
            .filter(users::Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(models
            .into_iter()
            .map(|m| {
                let user = m.into_user();
                (user.id, user.brief())
            })
            .collect())
    }

    /// 更新课程信息
    pub async fn update_course_impl(
        &self,
        id: i64,
        update: UpdateCourseRequest,
    ) -> Result<Option<Course>> {
        if self.get_course_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(now_ts()),
            ..Default::default()
        };

        if let Some(title) = update.title {
            model.title = Set(title);
        }
        if let Some(description) = update.description {
            model.description = Set(description);
        }
        if let Some(category) = update.category {
            model.category = Set(category.to_string());
        }
        if let Some(level) = update.level {
            model.level = Set(level.to_string());
        }
        if let Some(price) = update.price {
            model.price = Set(price);
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| classify_db_err(e, "更新课程失败"))?;

        self.get_course_by_id_impl(id).await
    }

    /// 更新课程状态，首次发布时记录发布时间
    pub async fn update_course_status_impl(
        &self,
        id: i64,
        status: CourseStatus,
    ) -> Result<Option<Course>> {
        let Some(existing) = self.get_course_by_id_impl(id).await? else {
            return Ok(None);
        };

        let now = now_ts();
        let mut model = ActiveModel {
            id: Set(id),
            status: Set(status.to_string()),
            updated_at: Set(now),
            ..Default::default()
        };
        if status == CourseStatus::Published && existing.published_at.is_none() {
            model.published_at = Set(Some(now));
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("更新课程状态失败: {e}")))?;

        self.get_course_by_id_impl(id).await
    }

    /// 更新课程封面
    pub async fn update_course_cover_impl(
        &self,
        id: i64,
        cover: Option<String>,
    ) -> Result<Option<Course>> {
        let result = Courses::update_many()
            .col_expr(Column::CoverImage, sea_orm::sea_query::Expr::value(cover))
            .col_expr(Column::UpdatedAt, sea_orm::sea_query::Expr::value(now_ts()))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("更新课程封面失败: {e}")))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.get_course_by_id_impl(id).await
    }

    /// 删除课程
    ///
    /// 存在任何选课记录（包括已退课）时拒绝删除；否则在同一事务内删除章节、资源、
    /// 学习记录、作业、提交及附件，返回需要清理的文件 URL。
    pub async fn delete_course_impl(&self, id: i64) -> Result<Option<Vec<String>>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("开启事务失败: {e}")))?;

        let Some(course) = Courses::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询课程失败: {e}")))?
        else {
            return Ok(None);
        };

        let enrollment_count = Enrollments::find()
            .filter(enrollments::Column::CourseId.eq(id))
            .count(&txn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("统计选课记录失败: {e}")))?;
        if enrollment_count > 0 {
            return Err(LearnHubError::invalid_state(format!(
                "课程已有 {enrollment_count} 条选课记录，无法删除"
            )));
        }

        let mut files: Vec<String> = course.cover_image.into_iter().collect();

        let chapter_ids: Vec<i64> = Chapters::find()
            .select_only()
            .column(chapters::Column::Id)
            .filter(chapters::Column::CourseId.eq(id))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询章节失败: {e}")))?;

        let assignment_ids: Vec<i64> = Assignments::find()
            .select_only()
            .column(assignments::Column::Id)
            .filter(assignments::Column::CourseId.eq(id))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询作业失败: {e}")))?;

        files.extend(delete_assignment_tree(&txn, &assignment_ids).await?);

        if !chapter_ids.is_empty() {
            let resources = ChapterResources::find()
                .filter(chapter_resources::Column::ChapterId.is_in(chapter_ids.clone()))
                .all(&txn)
                .await
                .map_err(|e| LearnHubError::database_operation(format!("查询章节资源失败: {e}")))?;
            files.extend(resources.into_iter().map(|r| r.url));

            ChapterResources::delete_many()
                .filter(chapter_resources::Column::ChapterId.is_in(chapter_ids))
                .exec(&txn)
                .await
                .map_err(|e| LearnHubError::database_operation(format!("删除章节资源失败: {e}")))?;
        }

        StudyRecords::delete_many()
            .filter(study_records::Column::CourseId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("删除学习记录失败: {e}")))?;

        Chapters::delete_many()
            .filter(chapters::Column::CourseId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("删除章节失败: {e}")))?;

        Courses::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("删除课程失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(Some(files))
    }
}

/// 删除一组作业及其附件、提交、提交附件，返回这些附件的文件 URL
pub(crate) async fn delete_assignment_tree<C: ConnectionTrait>(
    conn: &C,
    assignment_ids: &[i64],
) -> Result<Vec<String>> {
    if assignment_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();

    let submission_ids: Vec<i64> = Submissions::find()
        .select_only()
        .column(submissions::Column::Id)
        .filter(submissions::Column::AssignmentId.is_in(assignment_ids.to_vec()))
        .into_tuple()
        .all(conn)
        .await
        .map_err(|e| LearnHubError::database_operation(format!("查询作业提交失败: {e}")))?;

    if !submission_ids.is_empty() {
        let attachments = SubmissionAttachments::find()
            .filter(submission_attachments::Column::SubmissionId.is_in(submission_ids.clone()))
            .all(conn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询提交附件失败: {e}")))?;
        files.extend(attachments.into_iter().map(|a| a.url));

        SubmissionAttachments::delete_many()
            .filter(submission_attachments::Column::SubmissionId.is_in(submission_ids))
            .exec(conn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("删除提交附件失败: {e}")))?;
    }

    Submissions::delete_many()
        .filter(submissions::Column::AssignmentId.is_in(assignment_ids.to_vec()))
        .exec(conn)
        .await
        .map_err(|e| LearnHubError::database_operation(format!("删除作业提交失败: {e}")))?;

    let attachments = AssignmentAttachments::find()
        .filter(assignment_attachments::Column::AssignmentId.is_in(assignment_ids.to_vec()))
        .all(conn)
        .await
        .map_err(|e| LearnHubError::database_operation(format!("查询作业附件失败: {e}")))?;
    files.extend(attachments.into_iter().map(|a| a.url));

    AssignmentAttachments::delete_many()
        .filter(assignment_attachments::Column::AssignmentId.is_in(assignment_ids.to_vec()))
        .exec(conn)
        .await
        .map_err(|e| LearnHubError::database_operation(format!("删除作业附件失败: {e}")))?;

    Assignments::delete_many()
        .filter(assignments::Column::Id.is_in(assignment_ids.to_vec()))
        .exec(conn)
        .await
        .map_err(|e| LearnHubError::database_operation(format!("删除作业失败: {e}")))?;

    Ok(files)
}
