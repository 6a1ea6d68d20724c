pub mod error_response;
pub mod file_magic;
pub mod jwt;
pub mod parameter_error_handler;
pub mod password;
pub mod random_code;
pub mod sql;
pub mod upload;
pub mod validate;

pub use error_response::{error_response, error_response_with_code};
pub use file_magic::validate_magic_bytes;
pub use parameter_error_handler::json_error_handler;
pub use parameter_error_handler::path_error_handler;
pub use parameter_error_handler::query_error_handler;
pub use sql::{contains_pattern, escape_like_pattern};
