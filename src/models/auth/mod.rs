pub mod requests;
pub mod responses;

pub use requests::{LoginRequest, RegisterRequest, UpdatePasswordRequest};
pub use responses::{LoginResponse, RefreshTokenResponse};
