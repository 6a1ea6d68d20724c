/// 取出 `Result<T, HttpResponse>` 中的值，出错时直接把响应返回给客户端
macro_rules! unwrap_or_respond {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(response) => return Ok(response),
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

pub use admin::AdminService;
pub use assignments::AssignmentService;
pub use auth::AuthService;
pub use chapters::ChapterService;
pub use courses::CourseService;
pub use enrollments::EnrollmentService;
pub use files::FileService;
pub use study::StudyService;
pub use users::UserService;
