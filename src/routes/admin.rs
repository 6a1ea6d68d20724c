use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::admin::requests::{LogQueryParams, RestoreRequest};
use crate::models::users::entities::UserRole;
use crate::models::users::requests::{AdminUpdateUserRequest, UserListParams};
use crate::services::AdminService;

// 懒加载的全局 ADMIN_SERVICE 实例
static ADMIN_SERVICE: Lazy<AdminService> = Lazy::new(AdminService::new_lazy);

pub async fn list_users(
    req: HttpRequest,
    query: web::Query<UserListParams>,
) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.list_users(&req, query.into_inner()).await
}

pub async fn get_user(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.get_user(&req, path.into_inner()).await
}

pub async fn update_user(
    req: HttpRequest,
    path: web::Path<i64>,
    update_data: web::Json<AdminUpdateUserRequest>,
) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE
        .update_user(&req, path.into_inner(), update_data.into_inner())
        .await
}

pub async fn delete_user(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.delete_user(&req, path.into_inner()).await
}

pub async fn get_statistics(req: HttpRequest) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.get_statistics(&req).await
}

pub async fn list_logs(
    req: HttpRequest,
    query: web::Query<LogQueryParams>,
) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.list_logs(&req, query.into_inner()).await
}

pub async fn create_backup(req: HttpRequest) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.create_backup(&req).await
}

pub async fn list_backups(req: HttpRequest) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.list_backups(&req).await
}

pub async fn restore_backup(
    req: HttpRequest,
    restore: web::Json<RestoreRequest>,
) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.restore_backup(&req, restore.into_inner()).await
}

pub async fn delete_backup(req: HttpRequest, path: web::Path<String>) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.delete_backup(&req, path.into_inner()).await
}

// 配置路由：全部需要管理员角色
pub fn configure_admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/admin")
            .wrap(middlewares::RequireRole::new(&UserRole::Admin))
            .wrap(middlewares::RequireJWT)
            .route("/users", web::get().to(list_users))
            .service(
                web::resource("/users/{id}")
                    .route(web::get().to(get_user))
                    .route(web::put().to(update_user))
                    .route(web::delete().to(delete_user)),
            )
            .route("/statistics", web::get().to(get_statistics))
            .route("/logs", web::get().to(list_logs))
            .route("/system/backup", web::post().to(create_backup))
            .route("/system/restore", web::post().to(restore_backup))
            .route("/backups", web::get().to(list_backups))
            .route("/backups/{filename}", web::delete().to(delete_backup)),
    );
}
