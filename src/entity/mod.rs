//! SeaORM 实体定义
//!
//! 这些实体用于数据库操作，与 models 模块中的业务实体分离。
//! Storage 层使用这些实体进行 CRUD 操作，然后转换为 models 中的业务实体。
//! 所有时间字段以 Unix 时间戳（秒）存储。

pub mod prelude;

pub mod assignment_attachments;
pub mod assignments;
pub mod chapter_resources;
pub mod chapters;
pub mod courses;
pub mod enrollments;
pub mod study_records;
pub mod submission_attachments;
pub mod submissions;
pub mod user_settings;
pub mod users;
