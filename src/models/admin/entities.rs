use serde::{Deserialize, Serialize};

use crate::entity::{
    assignment_attachments, assignments, chapter_resources, chapters, courses, enrollments,
    study_records, submission_attachments, submissions, user_settings, users,
};

/// 备份文件内容
///
/// `{ timestamp, data: { users, courses, chapters, assignments, submissions, enrollments, studyRecords, ... } }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupFile {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub data: BackupData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupData {
    pub users: Vec<users::Model>,
    pub courses: Vec<courses::Model>,
    pub chapters: Vec<chapters::Model>,
    pub assignments: Vec<assignments::Model>,
    pub submissions: Vec<submissions::Model>,
    pub enrollments: Vec<enrollments::Model>,
    #[serde(rename = "studyRecords")]
    pub study_records: Vec<study_records::Model>,
    #[serde(default)]
    pub chapter_resources: Vec<chapter_resources::Model>,
    #[serde(default)]
    pub assignment_attachments: Vec<assignment_attachments::Model>,
    #[serde(default)]
    pub submission_attachments: Vec<submission_attachments::Model>,
    #[serde(default)]
    pub user_settings: Vec<user_settings::Model>,
}
