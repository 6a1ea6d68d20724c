use serde::{Deserialize, Serialize};
use ts_rs::TS;

define_string_enum! {
    /// 可查询的文件来源
    FileKind, "文件类型", "file.ts" {
        Resource => "resource",
        Attachment => "attachment",
        Submission => "submission",
    }
}

/// 上传目录分类，对应 uploads/ 下的子目录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadCategory {
    Avatars,
    Covers,
    Resources,
    Attachments,
    Submissions,
}

impl UploadCategory {
    pub const ALL: &'static [UploadCategory] = &[
        UploadCategory::Avatars,
        UploadCategory::Covers,
        UploadCategory::Resources,
        UploadCategory::Attachments,
        UploadCategory::Submissions,
    ];

    pub fn dir_name(&self) -> &'static str {
        match self {
            UploadCategory::Avatars => "avatars",
            UploadCategory::Covers => "covers",
            UploadCategory::Resources => "resources",
            UploadCategory::Attachments => "attachments",
            UploadCategory::Submissions => "submissions",
        }
    }

    pub fn from_dir_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.dir_name() == name)
    }

    /// 允许的扩展名（包含点号）
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        const IMAGES: &[&str] = &[".jpg", ".jpeg", ".png", ".gif"];
        match self {
            UploadCategory::Avatars | UploadCategory::Covers => IMAGES,
            UploadCategory::Resources => &[
                ".pdf", ".doc", ".docx", ".ppt", ".pptx", ".mp4", ".zip", ".rar", ".jpg",
                ".jpeg", ".png", ".gif",
            ],
            UploadCategory::Attachments => &[".pdf", ".doc", ".docx", ".ppt", ".pptx"],
            UploadCategory::Submissions => &[
                ".pdf", ".doc", ".docx", ".ppt", ".pptx", ".zip", ".rar", ".txt",
            ],
        }
    }
}

// 文件元信息
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "file.ts")]
pub struct FileInfo {
    pub id: i64,
    pub kind: FileKind,
    pub title: String,
    pub file_name: String,
    pub url: String,
    pub file_type: String,
    pub size: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip_names() {
        for category in UploadCategory::ALL {
            assert_eq!(
                UploadCategory::from_dir_name(category.dir_name()),
                Some(*category)
            );
        }
        assert_eq!(UploadCategory::from_dir_name("../etc"), None);
    }

    #[test]
    fn test_avatar_only_images() {
        let exts = UploadCategory::Avatars.allowed_extensions();
        assert!(exts.contains(&".png"));
        assert!(!exts.contains(&".pdf"));
    }
}
