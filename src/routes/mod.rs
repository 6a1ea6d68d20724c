pub mod admin;

pub mod assignments;

pub mod auth;

pub mod chapters;

pub mod courses;

pub mod enrollments;

pub mod files;

pub mod study;

pub mod users;

pub use admin::configure_admin_routes;
pub use assignments::configure_assignment_routes;
pub use auth::configure_auth_routes;
pub use chapters::configure_chapter_routes;
pub use courses::configure_course_routes;
pub use enrollments::configure_enrollment_routes;
pub use files::configure_file_routes;
pub use study::configure_study_routes;
pub use users::configure_user_routes;
