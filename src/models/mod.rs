//! 数据模型定义
//!
//! 每个业务域按 entities / requests / responses 拆分，统一响应结构与错误码在此定义。

/// 定义以小写蛇形字符串表示的枚举
///
/// 自动生成：
/// - 带 Serialize / TS 的 enum 定义
/// - 手写的 Deserialize（给出可读的错误提示）
/// - Display / FromStr / as_str()
macro_rules! define_string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal, $export:tt {
            $($variant:ident => $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, ts_rs::TS)]
        #[serde(rename_all = "snake_case")]
        #[ts(export, export_to = $export)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                s.parse::<$name>().map_err(serde::de::Error::custom)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)+
                    _ => Err(format!(
                        "无效的{}: '{}'. 支持: {}",
                        $label,
                        s,
                        [$($value,)+].join(", ")
                    )),
                }
            }
        }
    };
}

pub mod admin;
pub mod assignments;
pub mod auth;
pub mod chapters;
pub mod common;
pub mod courses;
pub mod enrollments;
pub mod files;
pub mod study;
pub mod users;

pub use common::pagination::{PaginationInfo, PaginationQuery};
pub use common::response::ApiResponse;

/// 业务错误码
///
/// - 0 成功
/// - 1xxx 认证
/// - 2xxx 用户
/// - 3xxx 课程、章节、选课与学习记录
/// - 4xxx 文件与上传
/// - 5xxx 参数校验
/// - 6xxx 作业与提交
/// - 9xxx 系统
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,

    // 认证
    Unauthorized = 1000,
    AuthFailed = 1001,
    TokenInvalid = 1002,
    Forbidden = 1003,
    UserDisabled = 1004,
    RateLimitExceeded = 1005,
    PasswordIncorrect = 1006,

    // 用户
    UserNotFound = 2000,
    UserNameAlreadyExists = 2001,
    UserEmailAlreadyExists = 2002,
    UserNameInvalid = 2003,
    UserEmailInvalid = 2004,
    UserPasswordInvalid = 2005,
    UserUpdateFailed = 2006,
    RegisterFailed = 2007,
    CannotModifySelf = 2008,

    // 课程
    CourseNotFound = 3000,
    CourseAlreadyExists = 3001,
    CourseInvalidStatus = 3002,
    CoursePublishRequirement = 3003,
    CourseHasEnrollments = 3004,
    CoursePublishedReadOnly = 3005,
    // 章节
    ChapterNotFound = 3100,
    ChapterOrderConflict = 3101,
    ResourceNotFound = 3102,
    // 选课
    EnrollmentNotFound = 3200,
    AlreadyEnrolled = 3201,
    EnrollmentInvalidStatus = 3202,
    NotEnrolled = 3203,
    // 学习记录
    StudyRecordNotFound = 3300,
    StudyProgressInvalid = 3301,

    // 文件
    FileNotFound = 4000,
    FileUploadFailed = 4001,
    FileTypeNotAllowed = 4002,
    FileSizeExceeded = 4003,
    MultifileUploadNotAllowed = 4004,

    // 参数校验
    ValidationError = 5000,
    BadRequest = 5001,
    InvalidState = 5002,

    // 作业
    AssignmentNotFound = 6000,
    AssignmentInvalidStatus = 6001,
    AssignmentPublishedReadOnly = 6002,
    AlreadySubmitted = 6003,
    SubmissionNotFound = 6004,
    ScoreOutOfRange = 6005,
    AttachmentNotFound = 6006,

    // 系统
    InternalServerError = 9000,
    NotFound = 9001,
    Conflict = 9002,
    BackupNotFound = 9003,
    BackupFailed = 9004,
    RestoreFailed = 9005,
}
