use std::collections::HashMap;

use super::{SeaOrmStorage, now_ts};
use crate::entity::prelude::{Assignments, Courses, SubmissionAttachments};
use crate::entity::submissions::{ActiveModel, Column, Entity as Submissions};
use crate::entity::{assignments, submission_attachments};
use crate::errors::{LearnHubError, Result, classify_db_err};
use crate::models::assignments::{
    entities::{AssignmentStatus, Submission, SubmissionAttachment, SubmissionStatus},
    requests::{NewAttachment, NewSubmission},
    responses::{
        AssignmentSubmissionsResponse, SubmissionListItem, SubmissionStats,
        SubmissionWithAttachments,
    },
};
use crate::storage::SubmitOutcome;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

async fn insert_submission_attachment<C: ConnectionTrait>(
    conn: &C,
    submission_id: i64,
    attachment: NewAttachment,
) -> Result<()> {
    submission_attachments::ActiveModel {
        submission_id: Set(submission_id),
        title: Set(attachment.title),
        url: Set(attachment.url),
        file_type: Set(attachment.file_type),
        file_name: Set(attachment.file_name),
        size: Set(attachment.size),
        created_at: Set(now_ts()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(|e| LearnHubError::database_operation(format!("保存提交附件失败: {e}")))?;
    Ok(())
}

async fn load_submission_attachments<C: ConnectionTrait>(
    conn: &C,
    submission_ids: &[i64],
) -> Result<HashMap<i64, Vec<SubmissionAttachment>>> {
    let mut grouped: HashMap<i64, Vec<SubmissionAttachment>> = HashMap::new();
    if submission_ids.is_empty() {
        return Ok(grouped);
    }

    let attachments = SubmissionAttachments::find()
        .filter(submission_attachments::Column::SubmissionId.is_in(submission_ids.to_vec()))
        .order_by_asc(submission_attachments::Column::Id)
        .all(conn)
        .await
        .map_err(|e| LearnHubError::database_operation(format!("查询提交附件失败: {e}")))?;

    for attachment in attachments {
        grouped
            .entry(attachment.submission_id)
            .or_default()
            .push(attachment.into_attachment());
    }
    Ok(grouped)
}

impl SeaOrmStorage {
    /// 提交或重新提交作业
    ///
    /// 每个学生每个作业只保留一条提交。重新提交会覆盖内容并清空批改结果，
    /// 带新附件时替换全部旧附件，旧附件 URL 通过 `replaced_files` 返回。
    pub async fn submit_assignment_impl(&self, req: NewSubmission) -> Result<SubmitOutcome> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("开启事务失败: {e}")))?;

        let assignment = Assignments::find_by_id(req.assignment_id)
            .one(&txn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询作业失败: {e}")))?
            .ok_or_else(|| LearnHubError::not_found("作业不存在"))?;

        if assignment.status != AssignmentStatus::Published.to_string() {
            return Err(LearnHubError::invalid_state("作业未发布，无法提交"));
        }

        let existing = Submissions::find()
            .filter(Column::AssignmentId.eq(req.assignment_id))
            .filter(Column::StudentId.eq(req.student_id))
            .one(&txn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询作业提交失败: {e}")))?;

        let now = now_ts();
        let mut replaced_files = Vec::new();
        let resubmitted = existing.is_some();

        let submission = match existing {
            Some(existing) => {
                let submission_id = existing.id;
                let mut model: ActiveModel = existing.into();
                model.content = Set(req.content);
                model.status = Set(SubmissionStatus::Submitted.to_string());
                model.score = Set(None);
                model.comment = Set(None);
                model.graded_by = Set(None);
                model.graded_at = Set(None);
                model.submit_time = Set(now);
                let updated = model.update(&txn).await.map_err(|e| {
                    LearnHubError::database_operation(format!("更新作业提交失败: {e}"))
                })?;

                if req.attachment.is_some() {
                    let old = SubmissionAttachments::find()
                        .filter(submission_attachments::Column::SubmissionId.eq(submission_id))
                        .all(&txn)
                        .await
                        .map_err(|e| {
                            LearnHubError::database_operation(format!("查询提交附件失败: {e}"))
                        })?;
                    replaced_files.extend(old.into_iter().map(|a| a.url));

                    SubmissionAttachments::delete_many()
                        .filter(submission_attachments::Column::SubmissionId.eq(submission_id))
                        .exec(&txn)
                        .await
                        .map_err(|e| {
                            LearnHubError::database_operation(format!("删除提交附件失败: {e}"))
                        })?;
                }
                updated
            }
            None => ActiveModel {
                assignment_id: Set(req.assignment_id),
                student_id: Set(req.student_id),
                content: Set(req.content),
                score: Set(None),
                comment: Set(None),
                status: Set(SubmissionStatus::Submitted.to_string()),
                graded_by: Set(None),
                submit_time: Set(now),
                graded_at: Set(None),
                ..Default::default()
            }
            .insert(&txn)
            .await
            // 并发重复提交由唯一索引兜底
            .map_err(|e| classify_db_err(e, "作业已提交"))?,
        };

        if let Some(attachment) = req.attachment {
            insert_submission_attachment(&txn, submission.id, attachment).await?;
        }

        let mut attachments = load_submission_attachments(&txn, &[submission.id]).await?;

        txn.commit()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("提交事务失败: {e}")))?;

        let attachments = attachments.remove(&submission.id).unwrap_or_default();
        Ok(SubmitOutcome {
            submission: SubmissionWithAttachments {
                submission: submission.into_submission(),
                attachments,
            },
            resubmitted,
            replaced_files,
        })
    }

    /// 通过 ID 获取提交
    pub async fn get_submission_by_id_impl(&self, id: i64) -> Result<Option<Submission>> {
        let result = Submissions::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询作业提交失败: {e}")))?;

        Ok(result.map(|m| m.into_submission()))
    }

    /// 获取学生在某个作业下的提交
    pub async fn get_student_submission_impl(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<SubmissionWithAttachments>> {
        let Some(submission) = Submissions::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .filter(Column::StudentId.eq(student_id))
            .one(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询作业提交失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut attachments = load_submission_attachments(&self.db, &[submission.id]).await?;
        let attachments = attachments.remove(&submission.id).unwrap_or_default();

        Ok(Some(SubmissionWithAttachments {
            submission: submission.into_submission(),
            attachments,
        }))
    }

    /// 学生在某课程下的全部提交
    pub async fn list_student_course_submissions_impl(
        &self,
        student_id: i64,
        course_id: i64,
    ) -> Result<Vec<Submission>> {
        let assignment_ids: Vec<i64> = Assignments::find()
            .select_only()
            .column(assignments::Column::Id)
            .filter(assignments::Column::CourseId.eq(course_id))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询作业失败: {e}")))?;

        if assignment_ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = Submissions::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::AssignmentId.is_in(assignment_ids))
            .all(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询作业提交失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_submission()).collect())
    }

    /// 批改提交，分数范围由调用方校验
    pub async fn grade_submission_impl(
        &self,
        id: i64,
        score: f64,
        comment: Option<String>,
        grader_id: i64,
    ) -> Result<Option<Submission>> {
        let Some(existing) = Submissions::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询作业提交失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.score = Set(Some(score));
        model.comment = Set(comment);
        model.status = Set(SubmissionStatus::Graded.to_string());
        model.graded_by = Set(Some(grader_id));
        model.graded_at = Set(Some(now_ts()));

        let updated = model
            .update(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("批改作业失败: {e}")))?;

        Ok(Some(updated.into_submission()))
    }

    /// 作业的提交列表与统计
    pub async fn list_assignment_submissions_impl(
        &self,
        assignment_id: i64,
    ) -> Result<AssignmentSubmissionsResponse> {
        let assignment = Assignments::find_by_id(assignment_id)
            .one(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询作业失败: {e}")))?
            .ok_or_else(|| LearnHubError::not_found("作业不存在"))?;

        let expected = Courses::find_by_id(assignment.course_id)
            .one(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询课程失败: {e}")))?
            .map(|c| c.student_count as i64)
            .unwrap_or(0);

        let submissions = Submissions::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .order_by_desc(Column::SubmitTime)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询作业提交失败: {e}")))?;

        let submission_ids: Vec<i64> = submissions.iter().map(|s| s.id).collect();
        let mut attachments = load_submission_attachments(&self.db, &submission_ids).await?;

        let student_ids: Vec<i64> = submissions.iter().map(|s| s.student_id).collect();
        let students = self.load_user_briefs(&student_ids).await?;

        let graded_scores: Vec<f64> = submissions
            .iter()
            .filter(|s| s.status == SubmissionStatus::Graded.to_string())
            .filter_map(|s| s.score)
            .collect();
        let average_score = if graded_scores.is_empty() {
            0.0
        } else {
            graded_scores.iter().sum::<f64>() / graded_scores.len() as f64
        };

        let stats = SubmissionStats {
            total: expected,
            submitted: submissions.len() as i64,
            graded: graded_scores.len() as i64,
            average_score,
        };

        let items = submissions
            .into_iter()
            .map(|s| SubmissionListItem {
                student: students.get(&s.student_id).cloned(),
                submission: SubmissionWithAttachments {
                    attachments: attachments.remove(&s.id).unwrap_or_default(),
                    submission: s.into_submission(),
                },
            })
            .collect();

        Ok(AssignmentSubmissionsResponse { items, stats })
    }

    /// 通过 ID 获取提交附件
    pub async fn get_submission_attachment_impl(
        &self,
        id: i64,
    ) -> Result<Option<SubmissionAttachment>> {
        let result = SubmissionAttachments::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询提交附件失败: {e}")))?;

        Ok(result.map(|m| m.into_attachment()))
    }
}
