use std::collections::HashMap;

use super::courses::delete_assignment_tree;
use super::{SeaOrmStorage, now_ts};
use crate::entity::assignments::{ActiveModel, Column, Entity as Assignments};
use crate::entity::prelude::{AssignmentAttachments, Courses, Enrollments, Submissions};
use crate::entity::{assignment_attachments, courses, enrollments, submissions};
use crate::errors::{LearnHubError, Result};
use crate::models::{
    PaginationInfo,
    assignments::{
        entities::{Assignment, AssignmentAttachment, AssignmentStatus},
        requests::{AssignmentListQuery, NewAssignment, NewAttachment, UpdateAssignmentRequest},
        responses::{
            AssignmentListResponse, AssignmentWithAttachments, StudentAssignmentItem,
            StudentAssignmentListResponse,
        },
    },
    enrollments::entities::EnrollmentStatus,
};
use crate::utils::contains_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// 插入作业附件
async fn insert_attachments<C: ConnectionTrait>(
    conn: &C,
    assignment_id: i64,
    attachments: Vec<NewAttachment>,
) -> Result<Vec<AssignmentAttachment>> {
    let now = now_ts();
    let mut saved = Vec::with_capacity(attachments.len());
    for attachment in attachments {
        let model = assignment_attachments::ActiveModel {
            assignment_id: Set(assignment_id),
            title: Set(attachment.title),
            url: Set(attachment.url),
            file_type: Set(attachment.file_type),
            file_name: Set(attachment.file_name),
            size: Set(attachment.size),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(|e| LearnHubError::database_operation(format!("保存作业附件失败: {e}")))?;
        saved.push(model.into_attachment());
    }
    Ok(saved)
}

impl SeaOrmStorage {
    /// 创建作业（草稿），作业与附件在同一事务内写入
    pub async fn create_assignment_impl(
        &self,
        req: NewAssignment,
        attachments: Vec<NewAttachment>,
    ) -> Result<AssignmentWithAttachments> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("开启事务失败: {e}")))?;

        let now = now_ts();
        let assignment = ActiveModel {
            course_id: Set(req.course_id),
            created_by: Set(req.created_by),
            title: Set(req.title),
            description: Set(req.description),
            deadline: Set(req.deadline.timestamp()),
            total_score: Set(req.total_score),
            status: Set(AssignmentStatus::Draft.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| LearnHubError::database_operation(format!("创建作业失败: {e}")))?;

        let attachments = insert_attachments(&txn, assignment.id, attachments).await?;

        txn.commit()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(AssignmentWithAttachments {
            assignment: assignment.into_assignment(),
            attachments,
        })
    }

    /// 通过 ID 获取作业
    pub async fn get_assignment_by_id_impl(&self, id: i64) -> Result<Option<Assignment>> {
        let result = Assignments::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询作业失败: {e}")))?;

        Ok(result.map(|m| m.into_assignment()))
    }

    /// 获取作业及其附件
    pub async fn get_assignment_with_attachments_impl(
        &self,
        id: i64,
    ) -> Result<Option<AssignmentWithAttachments>> {
        let Some(assignment) = self.get_assignment_by_id_impl(id).await? else {
            return Ok(None);
        };

        let attachments = AssignmentAttachments::find()
            .filter(assignment_attachments::Column::AssignmentId.eq(id))
            .order_by_asc(assignment_attachments::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询作业附件失败: {e}")))?;

        Ok(Some(AssignmentWithAttachments {
            assignment,
            attachments: attachments.into_iter().map(|m| m.into_attachment()).collect(),
        }))
    }

    /// 分页列出作业
    pub async fn list_assignments_with_pagination_impl(
        &self,
        query: AssignmentListQuery,
    ) -> Result<AssignmentListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;

        let mut select = Assignments::find();

        // 教师只能看到自己课程下的作业
        if let Some(teacher_id) = query.teacher_id {
            let course_ids: Vec<i64> = Courses::find()
                .select_only()
                .column(courses::Column::Id)
                .filter(courses::Column::TeacherId.eq(teacher_id))
                .into_tuple()
                .all(&self.db)
                .await
                .map_err(|e| LearnHubError::database_operation(format!("查询课程失败: {e}")))?;

            if course_ids.is_empty() {
                return Ok(AssignmentListResponse {
                    items: Vec::new(),
                    pagination: PaginationInfo {
                        page: page as i64,
                        page_size: size as i64,
                        total: 0,
                        total_pages: 0,
                    },
                });
            }
            select = select.filter(Column::CourseId.is_in(course_ids));
        }

        if let Some(course_id) = query.course_id {
            select = select.filter(Column::CourseId.eq(course_id));
        }

        if let Some(status) = query.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            select = select.filter(Column::Title.like(contains_pattern(search.trim())));
        }

        select = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询作业总数失败: {e}")))?;
        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询作业页数失败: {e}")))?;
        let assignments = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询作业列表失败: {e}")))?;

        Ok(AssignmentListResponse {
            items: assignments
                .into_iter()
                .map(|m| m.into_assignment())
                .collect(),
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        })
    }

    /// 列出课程下指定状态的作业
    pub async fn list_course_assignments_impl(
        &self,
        course_id: i64,
        statuses: &[AssignmentStatus],
    ) -> Result<Vec<Assignment>> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        let result = Assignments::find()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::Status.is_in(statuses))
            .order_by_asc(Column::Deadline)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询作业列表失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_assignment()).collect())
    }

    /// 学生作业列表：已选课程下已发布的作业及本人提交情况
    pub async fn list_student_assignments_impl(
        &self,
        student_id: i64,
    ) -> Result<StudentAssignmentListResponse> {
        let course_ids: Vec<i64> = Enrollments::find()
            .select_only()
            .column(enrollments::Column::CourseId)
            .filter(enrollments::Column::StudentId.eq(student_id))
            .filter(enrollments::Column::Status.eq(EnrollmentStatus::Active.to_string()))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询选课记录失败: {e}")))?;

        if course_ids.is_empty() {
            return Ok(StudentAssignmentListResponse { items: Vec::new() });
        }

        let course_titles: HashMap<i64, String> = Courses::find()
            .filter(courses::Column::Id.is_in(course_ids.clone()))
            .all(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询课程失败: {e}")))?
            .into_iter()
            .map(|c| (c.id, c.title))
            .collect();

        let assignments = Assignments::find()
            .filter(Column::CourseId.is_in(course_ids))
            .filter(Column::Status.eq(AssignmentStatus::Published.to_string()))
            .order_by_asc(Column::Deadline)
            .all(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询作业列表失败: {e}")))?;

        let assignment_ids: Vec<i64> = assignments.iter().map(|a| a.id).collect();
        let submissions: HashMap<i64, submissions::Model> = if assignment_ids.is_empty() {
            HashMap::new()
        } else {
            Submissions::find()
                .filter(submissions::Column::StudentId.eq(student_id))
                .filter(submissions::Column::AssignmentId.is_in(assignment_ids))
                .all(&self.db)
                .await
                .map_err(|e| {
                    LearnHubError::database_operation(format!("查询作业提交失败: {e}"))
                })?
                .into_iter()
                .map(|s| (s.assignment_id, s))
                .collect()
        };

        let items = assignments
            .into_iter()
            .map(|m| {
                let submission = submissions.get(&m.id).cloned().map(|s| s.into_submission());
                let course_title = course_titles.get(&m.course_id).cloned().unwrap_or_default();
                StudentAssignmentItem {
                    assignment: m.into_assignment(),
                    course_title,
                    submission_status: submission.as_ref().map(|s| s.status),
                    score: submission.and_then(|s| s.score),
                }
            })
            .collect();

        Ok(StudentAssignmentListResponse { items })
    }

    /// 更新作业
    pub async fn update_assignment_impl(
        &self,
        id: i64,
        update: UpdateAssignmentRequest,
    ) -> Result<Option<Assignment>> {
        if self.get_assignment_by_id_impl(id).await?.is_none() {
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
        if let Some(deadline) = update.deadline {
            model.deadline = Set(deadline.timestamp());
        }
        if let Some(total_score) = update.total_score {
            model.total_score = Set(total_score);
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("更新作业失败: {e}")))?;

        self.get_assignment_by_id_impl(id).await
    }

    /// 更新作业状态
    pub async fn update_assignment_status_impl(
        &self,
        id: i64,
        status: AssignmentStatus,
    ) -> Result<Option<Assignment>> {
        let result = Assignments::update_many()
            .col_expr(
                Column::Status,
                sea_orm::sea_query::Expr::value(status.to_string()),
            )
            .col_expr(Column::UpdatedAt, sea_orm::sea_query::Expr::value(now_ts()))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("更新作业状态失败: {e}")))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.get_assignment_by_id_impl(id).await
    }

    /// 删除作业，提交与附件在同一事务内删除，返回需要清理的文件 URL
    pub async fn delete_assignment_impl(&self, id: i64) -> Result<Option<Vec<String>>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("开启事务失败: {e}")))?;

        let exists = Assignments::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询作业失败: {e}")))?
            .is_some();
        if !exists {
            return Ok(None);
        }

        let files = delete_assignment_tree(&txn, &[id]).await?;

        txn.commit()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(Some(files))
    }

    /// 追加作业附件
    pub async fn add_assignment_attachments_impl(
        &self,
        assignment_id: i64,
        attachments: Vec<NewAttachment>,
    ) -> Result<Vec<AssignmentAttachment>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("开启事务失败: {e}")))?;

        let saved = insert_attachments(&txn, assignment_id, attachments).await?;

        txn.commit()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(saved)
    }

    /// 通过 ID 获取作业附件
    pub async fn get_assignment_attachment_impl(
        &self,
        id: i64,
    ) -> Result<Option<AssignmentAttachment>> {
        let result = AssignmentAttachments::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询作业附件失败: {e}")))?;

        Ok(result.map(|m| m.into_attachment()))
    }

    /// 删除作业附件
    pub async fn delete_assignment_attachment_impl(&self, id: i64) -> Result<bool> {
        let result = AssignmentAttachments::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("删除作业附件失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}
