use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AdminService;
use crate::models::ApiResponse;
use crate::utils::error_response;

pub async fn get_statistics(
    service: &AdminService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    match storage.get_statistics().await {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(stats, "获取统计信息成功"))),
        Err(e) => Ok(error_response(request, &e)),
    }
}
