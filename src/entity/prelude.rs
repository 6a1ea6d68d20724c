//! 预导入模块，方便使用

pub use super::assignment_attachments::{
    ActiveModel as AssignmentAttachmentActiveModel, Entity as AssignmentAttachments,
    Model as AssignmentAttachmentModel,
};
pub use super::assignments::{
    ActiveModel as AssignmentActiveModel, Entity as Assignments, Model as AssignmentModel,
};
pub use super::chapter_resources::{
    ActiveModel as ChapterResourceActiveModel, Entity as ChapterResources,
    Model as ChapterResourceModel,
};
pub use super::chapters::{ActiveModel as ChapterActiveModel, Entity as Chapters, Model as ChapterModel};
pub use super::courses::{ActiveModel as CourseActiveModel, Entity as Courses, Model as CourseModel};
pub use super::enrollments::{
    ActiveModel as EnrollmentActiveModel, Entity as Enrollments, Model as EnrollmentModel,
};
pub use super::study_records::{
    ActiveModel as StudyRecordActiveModel, Entity as StudyRecords, Model as StudyRecordModel,
};
pub use super::submission_attachments::{
    ActiveModel as SubmissionAttachmentActiveModel, Entity as SubmissionAttachments,
    Model as SubmissionAttachmentModel,
};
pub use super::submissions::{
    ActiveModel as SubmissionActiveModel, Entity as Submissions, Model as SubmissionModel,
};
pub use super::user_settings::{
    ActiveModel as UserSettingsActiveModel, Entity as UserSettingsEntity,
    Model as UserSettingsModel,
};
pub use super::users::{ActiveModel as UserActiveModel, Entity as Users, Model as UserModel};
