//! 请求参数解析失败时返回统一的 JSON 错误

use actix_web::{
    HttpRequest, HttpResponse,
    error::{InternalError, JsonPayloadError, PathError, QueryPayloadError},
};
use tracing::debug;

use crate::models::{ApiResponse, ErrorCode};

fn bad_request(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, message))
}

pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!("Invalid JSON body for {}: {}", req.path(), err);
    let message = format!("请求体格式错误: {err}");
    InternalError::from_response(err, bad_request(message)).into()
}

pub fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!("Invalid query for {}: {}", req.path(), err);
    let message = format!("查询参数错误: {err}");
    InternalError::from_response(err, bad_request(message)).into()
}

pub fn path_error_handler(err: PathError, req: &HttpRequest) -> actix_web::Error {
    debug!("Invalid path for {}: {}", req.path(), err);
    let message = format!("路径参数错误: {err}");
    InternalError::from_response(err, bad_request(message)).into()
}
