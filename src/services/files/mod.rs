pub mod access;
pub mod download;
pub mod info;
pub mod uploads;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::files::requests::FileQuery;
use crate::storage::Storage;

pub struct FileService {
    storage: Option<Arc<dyn Storage>>,
}

impl FileService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub async fn get_info(
        &self,
        request: &HttpRequest,
        file_id: i64,
        query: FileQuery,
    ) -> ActixResult<HttpResponse> {
        info::get_info(self, request, file_id, query).await
    }

    pub async fn get_preview(
        &self,
        request: &HttpRequest,
        file_id: i64,
        query: FileQuery,
    ) -> ActixResult<HttpResponse> {
        info::get_preview(self, request, file_id, query).await
    }

    pub async fn download(
        &self,
        request: &HttpRequest,
        file_id: i64,
        query: FileQuery,
    ) -> ActixResult<HttpResponse> {
        download::download(self, request, file_id, query).await
    }

    // 公开的上传文件访问，不需要登录
    pub async fn serve_upload(
        &self,
        request: &HttpRequest,
        category: String,
        file_name: String,
    ) -> ActixResult<HttpResponse> {
        uploads::serve_upload(request, &category, &file_name).await
    }
}

/// 按扩展名推断 Content-Type
pub(crate) fn content_type_for(file_name: &str) -> &'static str {
    let ext = std::path::Path::new(file_name)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "mp4" => "video/mp4",
        "zip" => "application/zip",
        "rar" => "application/vnd.rar",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("1-abc.PNG"), "image/png");
        assert_eq!(content_type_for("notes.pdf"), "application/pdf");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
