use super::study_records::recompute_course_progress;
use super::{SeaOrmStorage, now_ts};
use crate::entity::chapters::{ActiveModel, Column, Entity as Chapters};
use crate::entity::prelude::{ChapterResources, StudyRecords};
use crate::entity::{chapter_resources, study_records};
use crate::errors::{LearnHubError, Result, classify_db_err};
use crate::models::chapters::{
    entities::{Chapter, ChapterResource},
    requests::{CreateChapterRequest, NewChapterResource, UpdateChapterRequest},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

/// 章节默认时长（分钟）
const DEFAULT_CHAPTER_DURATION: i32 = 30;

impl SeaOrmStorage {
    /// 创建章节，未指定序号时追加到末尾
    pub async fn create_chapter_impl(
        &self,
        course_id: i64,
        req: CreateChapterRequest,
    ) -> Result<Chapter> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("开启事务失败: {e}")))?;

        let order = match req.order {
            Some(order) => order,
            None => {
                let last = Chapters::find()
                    .filter(Column::CourseId.eq(course_id))
                    .order_by_desc(Column::SortOrder)
                    .one(&txn)
                    .await
                    .map_err(|e| {
                        LearnHubError::database_operation(format!("查询章节序号失败: {e}"))
                    })?;
                last.map(|c| c.sort_order + 1).unwrap_or(1)
            }
        };

        let now = now_ts();
        let model = ActiveModel {
            course_id: Set(course_id),
            title: Set(req.title),
            description: Set(req.description),
            sort_order: Set(order),
            content: Set(req.content),
            duration: Set(req.duration.unwrap_or(DEFAULT_CHAPTER_DURATION)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&txn)
            .await
            .map_err(|e| classify_db_err(e, "创建章节失败"))?;

        // 新章节会拉低已选课学生的进度
        recompute_course_progress(&txn, course_id).await?;

        txn.commit()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(result.into_chapter())
    }

    /// 通过 ID 获取章节
    pub async fn get_chapter_by_id_impl(&self, id: i64) -> Result<Option<Chapter>> {
        let result = Chapters::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询章节失败: {e}")))?;

        Ok(result.map(|m| m.into_chapter()))
    }

    /// 按序号列出课程章节
    pub async fn list_chapters_by_course_impl(&self, course_id: i64) -> Result<Vec<Chapter>> {
        let result = Chapters::find()
            .filter(Column::CourseId.eq(course_id))
            .order_by_asc(Column::SortOrder)
            .all(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询章节列表失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_chapter()).collect())
    }

    /// 统计课程章节数
    pub async fn count_chapters_by_course_impl(&self, course_id: i64) -> Result<u64> {
        Chapters::find()
            .filter(Column::CourseId.eq(course_id))
            .count(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("统计章节数量失败: {e}")))
    }

    /// 更新章节
    pub async fn update_chapter_impl(
        &self,
        id: i64,
        update: UpdateChapterRequest,
    ) -> Result<Option<Chapter>> {
        if self.get_chapter_by_id_impl(id).await?.is_none() {
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
            model.description = Set(Some(description));
        }
        if let Some(content) = update.content {
            model.content = Set(Some(content));
        }
        if let Some(duration) = update.duration {
            model.duration = Set(duration);
        }
        if let Some(order) = update.order {
            model.sort_order = Set(order);
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| classify_db_err(e, "更新章节失败"))?;

        self.get_chapter_by_id_impl(id).await
    }

    /// 删除章节
    ///
    /// 同一事务内删除资源与学习记录，并重算该课程所有在学学生的进度。
    pub async fn delete_chapter_impl(&self, id: i64) -> Result<Option<Vec<String>>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("开启事务失败: {e}")))?;

        let Some(chapter) = Chapters::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询章节失败: {e}")))?
        else {
            return Ok(None);
        };

        let resources = ChapterResources::find()
            .filter(chapter_resources::Column::ChapterId.eq(id))
            .all(&txn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询章节资源失败: {e}")))?;
        let files: Vec<String> = resources.into_iter().map(|r| r.url).collect();

        ChapterResources::delete_many()
            .filter(chapter_resources::Column::ChapterId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("删除章节资源失败: {e}")))?;

        StudyRecords::delete_many()
            .filter(study_records::Column::ChapterId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("删除学习记录失败: {e}")))?;

        Chapters::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("删除章节失败: {e}")))?;

        recompute_course_progress(&txn, chapter.course_id).await?;

        txn.commit()
            .await
            .map_err(|e| LearnHubError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(Some(files))
    }

    /// 添加章节资源
    pub async fn add_chapter_resource_impl(
        &self,
        chapter_id: i64,
        req: NewChapterResource,
    ) -> Result<ChapterResource> {
        let model = chapter_resources::ActiveModel {
            chapter_id: Set(chapter_id),
            title: Set(req.title),
            url: Set(req.url),
            resource_type: Set(req.resource_type.to_string()),
            file_name: Set(req.file_name),
            size: Set(req.size),
            duration: Set(req.duration),
            created_at: Set(now_ts()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("添加章节资源失败: {e}")))?;

        Ok(result.into_resource())
    }

    /// 列出章节资源
    pub async fn list_chapter_resources_impl(
        &self,
        chapter_id: i64,
    ) -> Result<Vec<ChapterResource>> {
        let result = ChapterResources::find()
            .filter(chapter_resources::Column::ChapterId.eq(chapter_id))
            .order_by_asc(chapter_resources::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询章节资源失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_resource()).collect())
    }

    /// 通过 ID 获取章节资源
    pub async fn get_chapter_resource_impl(&self, id: i64) -> Result<Option<ChapterResource>> {
        let result = ChapterResources::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("查询章节资源失败: {e}")))?;

        Ok(result.map(|m| m.into_resource()))
    }

    /// 删除章节资源
    pub async fn delete_chapter_resource_impl(&self, id: i64) -> Result<bool> {
        let result = ChapterResources::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| LearnHubError::database_operation(format!("删除章节资源失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::chapters::requests::{CreateChapterRequest, UpdateChapterRequest};
    use crate::models::users::entities::UserRole;
    use crate::test_support::{
        add_chapter, memory_storage, new_course, new_resource, new_user, publish_course,
    };

    fn chapter_request(title: &str, order: Option<i32>) -> CreateChapterRequest {
        CreateChapterRequest {
            title: title.to_string(),
            description: None,
            content: None,
            duration: None,
            order,
        }
    }

    #[tokio::test]
    async fn test_chapter_order_appends_and_conflicts() {
        let storage = memory_storage().await;
        let teacher = storage
            .create_user_impl(new_user("t1", UserRole::Teacher))
            .await
            .unwrap();
        let course = storage
            .create_course_impl(new_course(teacher.id, "Course"))
            .await
            .unwrap();

        let first = storage
            .create_chapter_impl(course.id, chapter_request("One", None))
            .await
            .unwrap();
        let second = storage
            .create_chapter_impl(course.id, chapter_request("Two", None))
            .await
            .unwrap();
        assert_eq!(first.order, 1);
        assert_eq!(second.order, 2);
        assert_eq!(first.duration, 30);

        let err = storage
            .create_chapter_impl(course.id, chapter_request("Dup", Some(2)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E012");

        let err = storage
            .update_chapter_impl(
                second.id,
                UpdateChapterRequest {
                    order: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E012");

        let listed = storage.list_chapters_by_course_impl(course.id).await.unwrap();
        assert_eq!(
            listed.iter().map(|c| c.title.as_str()).collect::<Vec<_>>(),
            vec!["One", "Two"]
        );
    }

    #[tokio::test]
    async fn test_resources_have_stable_ids() {
        let storage = memory_storage().await;
        let teacher = storage
            .create_user_impl(new_user("t1", UserRole::Teacher))
            .await
            .unwrap();
        let course = storage
            .create_course_impl(new_course(teacher.id, "Course"))
            .await
            .unwrap();
        let chapter = add_chapter(&storage, course.id, "Intro").await;

        let a = storage
            .add_chapter_resource_impl(chapter.id, new_resource("/api/uploads/resources/a.pdf"))
            .await
            .unwrap();
        let b = storage
            .add_chapter_resource_impl(chapter.id, new_resource("/api/uploads/resources/b.pdf"))
            .await
            .unwrap();

        assert!(storage.delete_chapter_resource_impl(a.id).await.unwrap());
        let remaining = storage.list_chapter_resources_impl(chapter.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, b.id);
        assert!(storage.get_chapter_resource_impl(a.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_chapter_recomputes_progress() {
        let storage = memory_storage().await;
        let teacher = storage
            .create_user_impl(new_user("t1", UserRole::Teacher))
            .await
            .unwrap();
        let student = storage
            .create_user_impl(new_user("s1", UserRole::Student))
            .await
            .unwrap();
        let course = storage
            .create_course_impl(new_course(teacher.id, "Course"))
            .await
            .unwrap();
        let ch1 = add_chapter(&storage, course.id, "One").await;
        let ch2 = add_chapter(&storage, course.id, "Two").await;
        publish_course(&storage, course.id).await;
        let enrollment = storage.enroll_impl(course.id, student.id).await.unwrap();

        let progress = storage.complete_chapter_impl(student.id, &ch1).await.unwrap();
        assert_eq!(progress.enrollment_progress, 50);

        // 删除未完成的章节后，唯一剩余章节已完成
        let files = storage.delete_chapter_impl(ch2.id).await.unwrap().unwrap();
        assert!(files.is_empty());

        let reloaded = storage
            .get_enrollment_by_id_impl(enrollment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.progress, 100);
    }
}
