//! 按文件来源定位文件并检查访问权限
//!
//! - resource / attachment：课程教师、管理员或已选课学生
//! - submission：提交者本人、课程教师或管理员

use std::path::Path;
use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse};

use crate::models::ErrorCode;
use crate::models::assignments::entities::AssignmentStatus;
use crate::models::files::entities::{FileInfo, FileKind};
use crate::models::users::entities::{User, UserRole};
use crate::policy::Action;
use crate::services::common::{
    find_assignment, find_chapter, find_course, not_found, require_course_content,
    require_course_owner,
};
use crate::storage::Storage;
use crate::utils::error_response;

fn file_not_found() -> HttpResponse {
    not_found(ErrorCode::FileNotFound, "文件不存在")
}

fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default()
}

pub(crate) async fn locate_file(
    storage: &Arc<dyn Storage>,
    request: &HttpRequest,
    actor: &User,
    kind: FileKind,
    file_id: i64,
) -> Result<FileInfo, HttpResponse> {
    match kind {
        FileKind::Resource => {
            let resource = match storage.get_chapter_resource(file_id).await {
                Ok(Some(resource)) => resource,
                Ok(None) => return Err(file_not_found()),
                Err(e) => return Err(error_response(request, &e)),
            };
            let chapter = find_chapter(storage, request, resource.chapter_id).await?;
            let course = find_course(storage, request, chapter.course_id).await?;
            require_course_content(storage, request, actor, &course, Action::Read).await?;

            Ok(FileInfo {
                id: resource.id,
                kind,
                file_type: extension_of(&resource.file_name),
                title: resource.title,
                file_name: resource.file_name,
                url: resource.url,
                size: resource.size,
                created_at: resource.created_at,
            })
        }
        FileKind::Attachment => {
            let attachment = match storage.get_assignment_attachment(file_id).await {
                Ok(Some(attachment)) => attachment,
                Ok(None) => return Err(file_not_found()),
                Err(e) => return Err(error_response(request, &e)),
            };
            let assignment = find_assignment(storage, request, attachment.assignment_id).await?;
            let course = find_course(storage, request, assignment.course_id).await?;
            require_course_content(storage, request, actor, &course, Action::Read).await?;
            if actor.role == UserRole::Student && assignment.status == AssignmentStatus::Draft {
                return Err(file_not_found());
            }

            Ok(FileInfo {
                id: attachment.id,
                kind,
                title: attachment.title,
                file_name: attachment.file_name,
                url: attachment.url,
                file_type: attachment.file_type,
                size: attachment.size,
                created_at: attachment.created_at,
            })
        }
        FileKind::Submission => {
            let attachment = match storage.get_submission_attachment(file_id).await {
                Ok(Some(attachment)) => attachment,
                Ok(None) => return Err(file_not_found()),
                Err(e) => return Err(error_response(request, &e)),
            };
            let submission = match storage.get_submission_by_id(attachment.submission_id).await {
                Ok(Some(submission)) => submission,
                Ok(None) => return Err(file_not_found()),
                Err(e) => return Err(error_response(request, &e)),
            };
            if submission.student_id != actor.id {
                let assignment =
                    find_assignment(storage, request, submission.assignment_id).await?;
                let course = find_course(storage, request, assignment.course_id).await?;
                require_course_owner(actor, &course)?;
            }

            Ok(FileInfo {
                id: attachment.id,
                kind,
                title: attachment.title,
                file_name: attachment.file_name,
                url: attachment.url,
                file_type: attachment.file_type,
                size: attachment.size,
                created_at: attachment.created_at,
            })
        }
    }
}
