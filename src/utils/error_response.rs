//! 存储层错误到 HTTP 响应的唯一转换点

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, http::StatusCode, web};
use tracing::error;

use crate::config::AppConfig;
use crate::errors::LearnHubError;
use crate::models::{ApiResponse, ErrorCode};

/// 错误类型对应的 HTTP 状态码与默认业务码
fn classify(err: &LearnHubError) -> (StatusCode, ErrorCode) {
    match err {
        LearnHubError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
        LearnHubError::Conflict(_) => (StatusCode::CONFLICT, ErrorCode::Conflict),
        LearnHubError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::ValidationError),
        LearnHubError::InvalidState(_) => (StatusCode::BAD_REQUEST, ErrorCode::InvalidState),
        LearnHubError::Upload(_) => (StatusCode::BAD_REQUEST, ErrorCode::FileUploadFailed),
        LearnHubError::Authentication(_) => (StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized),
        LearnHubError::Authorization(_) => (StatusCode::FORBIDDEN, ErrorCode::Forbidden),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
        ),
    }
}

fn is_production(request: &HttpRequest) -> bool {
    request
        .app_data::<web::Data<Arc<AppConfig>>>()
        .map(|config| config.is_production())
        // 取不到配置时按生产环境处理，不泄露细节
        .unwrap_or(true)
}

/// 按错误类型生成响应
pub fn error_response(request: &HttpRequest, err: &LearnHubError) -> HttpResponse {
    let (_, code) = classify(err);
    error_response_with_code(request, err, code)
}

/// 与 [`error_response`] 相同，但使用调用方指定的业务码
pub fn error_response_with_code(
    request: &HttpRequest,
    err: &LearnHubError,
    code: ErrorCode,
) -> HttpResponse {
    let (status, _) = classify(err);

    let message = if err.is_internal() {
        error!(
            code = err.code(),
            path = %request.path(),
            "Request failed: {}",
            err
        );
        if is_production(request) {
            "服务器内部错误".to_string()
        } else {
            err.format_simple()
        }
    } else {
        err.message().to_string()
    };

    HttpResponse::build(status).json(ApiResponse::error_empty(code, message))
}
