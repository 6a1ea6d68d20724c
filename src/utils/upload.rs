//! 上传文件的接收、落盘与清理
//!
//! 文件保存在 `{upload_dir}/{category}/<unix-ts>-<uuid><ext>`，
//! 对外 URL 为 `/api/uploads/{category}/{stored}`。

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use actix_multipart::Multipart;
use futures_util::TryStreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::errors::LearnHubError;
use crate::models::files::entities::UploadCategory;
use crate::utils::file_magic::MAGIC_HEADER_LEN;
use crate::utils::validate_magic_bytes;

pub const UPLOAD_URL_PREFIX: &str = "/api/uploads/";

// 普通文本字段的长度上限
const MAX_TEXT_FIELD: usize = 64 * 1024;

/// 各分类的单文件大小上限
pub fn max_size_for(category: UploadCategory, limits: &UploadConfig) -> usize {
    match category {
        UploadCategory::Avatars => limits.avatar_max_size,
        UploadCategory::Covers => limits.cover_max_size,
        UploadCategory::Resources => limits.resource_max_size,
        UploadCategory::Attachments => limits.attachment_max_size,
        UploadCategory::Submissions => limits.submission_max_size,
    }
}

/// 表单中某个文件字段的接收规则
#[derive(Debug, Clone, Copy)]
pub struct FileRule {
    pub field: &'static str,
    pub category: UploadCategory,
    pub multiple: bool,
}

impl FileRule {
    pub const fn single(field: &'static str, category: UploadCategory) -> Self {
        Self {
            field,
            category,
            multiple: false,
        }
    }

    pub const fn multiple(field: &'static str, category: UploadCategory) -> Self {
        Self {
            field,
            category,
            multiple: true,
        }
    }
}

/// 已落盘的上传文件
#[derive(Debug, Clone)]
pub struct SavedFile {
    pub field: String,
    pub original_name: String,
    pub stored_name: String,
    /// 不含点号的小写扩展名
    pub extension: String,
    pub content_type: String,
    pub size: i64,
    pub url: String,
    pub path: PathBuf,
}

/// 解析后的 multipart 表单
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<SavedFile>,
}

impl UploadForm {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.as_str())
    }

    /// 非空白的文本字段
    pub fn non_empty(&self, name: &str) -> Option<String> {
        self.text(name)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn take_file(&mut self, field: &str) -> Option<SavedFile> {
        let index = self.files.iter().position(|f| f.field == field)?;
        Some(self.files.remove(index))
    }

    pub fn take_files(&mut self, field: &str) -> Vec<SavedFile> {
        let (taken, rest) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|f| f.field == field);
        self.files = rest;
        taken
    }

    /// 删除本次请求保存的全部文件，用于校验失败后的回滚
    pub async fn discard(self) {
        for file in self.files {
            remove_path(&file.path).await;
        }
    }
}

fn upload_error(message: impl Into<String>) -> LearnHubError {
    LearnHubError::upload(message)
}

/// 先攒够文件头再做内容校验，分块再小也不会误判
struct MagicGate {
    extension: String,
    file_name: String,
    header: Vec<u8>,
    passed: bool,
}

impl MagicGate {
    fn new(extension: &str, file_name: &str) -> Self {
        Self {
            extension: extension.to_string(),
            file_name: file_name.to_string(),
            header: Vec::with_capacity(MAGIC_HEADER_LEN),
            passed: false,
        }
    }

    /// 返回可以写盘的字节；文件头还不够长时返回 None
    fn feed<'a>(&mut self, chunk: &'a [u8]) -> Result<Option<Cow<'a, [u8]>>, LearnHubError> {
        if self.passed {
            return Ok(Some(Cow::Borrowed(chunk)));
        }
        self.header.extend_from_slice(chunk);
        if self.header.len() < MAGIC_HEADER_LEN {
            return Ok(None);
        }
        self.release().map(Some)
    }

    /// 文件比文件头还短时，在结束时校验剩下的字节
    fn finish<'a>(&mut self) -> Result<Option<Cow<'a, [u8]>>, LearnHubError> {
        if self.passed || self.header.is_empty() {
            return Ok(None);
        }
        self.release().map(Some)
    }

    fn release<'a>(&mut self) -> Result<Cow<'a, [u8]>, LearnHubError> {
        if !validate_magic_bytes(&self.header, &self.extension) {
            return Err(upload_error(format!(
                "文件内容与扩展名不匹配: {}",
                self.file_name
            )));
        }
        self.passed = true;
        Ok(Cow::Owned(std::mem::take(&mut self.header)))
    }
}

/// 小写扩展名（含点号）
fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

/// 只保留路径中的文件名部分
fn sanitize_file_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file")
        .to_string()
}

/// 读取 multipart 表单
///
/// 文本字段收集到 `fields`，`rules` 中列出的文件字段逐块写盘并校验扩展名、
/// 魔术字节与大小。任一步骤失败时，已写入的文件全部删除。
pub async fn collect_multipart(
    mut payload: Multipart,
    limits: &UploadConfig,
    rules: &[FileRule],
) -> Result<UploadForm, LearnHubError> {
    let mut form = UploadForm::default();

    match read_fields(&mut payload, limits, rules, &mut form).await {
        Ok(()) => Ok(form),
        Err(e) => {
            form.discard().await;
            Err(e)
        }
    }
}

async fn read_fields(
    payload: &mut Multipart,
    limits: &UploadConfig,
    rules: &[FileRule],
    form: &mut UploadForm,
) -> Result<(), LearnHubError> {
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| upload_error(format!("表单解析失败: {e}")))?
    {
        let content_disposition = field.content_disposition().cloned();
        let name = content_disposition
            .as_ref()
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();
        let file_name = content_disposition
            .as_ref()
            .and_then(|cd| cd.get_filename())
            .map(sanitize_file_name);

        let Some(rule) = rules.iter().find(|r| r.field == name) else {
            if file_name.is_some() {
                return Err(upload_error(format!("不支持的文件字段: {name}")));
            }
            let mut value = Vec::new();
            while let Some(chunk) = field
                .try_next()
                .await
                .map_err(|e| upload_error(format!("表单解析失败: {e}")))?
            {
                if value.len() + chunk.len() > MAX_TEXT_FIELD {
                    return Err(upload_error(format!("字段 {name} 过长")));
                }
                value.extend_from_slice(&chunk);
            }
            let value = String::from_utf8(value)
                .map_err(|_| upload_error(format!("字段 {name} 不是有效的 UTF-8 文本")))?;
            form.fields.insert(name, value);
            continue;
        };

        let original_name = file_name.unwrap_or_default();
        if original_name.is_empty() {
            // 浏览器对未选择文件的字段会发送空文件名
            while field
                .try_next()
                .await
                .map_err(|e| upload_error(format!("表单解析失败: {e}")))?
                .is_some()
            {}
            continue;
        }

        if !rule.multiple && form.files.iter().any(|f| f.field == rule.field) {
            return Err(upload_error(format!("字段 {} 只能上传一个文件", rule.field)));
        }

        let extension = extension_of(&original_name);
        if !rule.category.allowed_extensions().contains(&extension.as_str()) {
            return Err(upload_error(format!(
                "不支持的文件类型: {original_name}，允许: {}",
                rule.category.allowed_extensions().join(", ")
            )));
        }

        let content_type = field
            .content_type()
            .map(|ct| ct.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let category_dir = Path::new(&limits.dir).join(rule.category.dir_name());
        tokio::fs::create_dir_all(&category_dir)
            .await
            .map_err(|e| LearnHubError::file_operation(format!("创建上传目录失败: {e}")))?;

        let stored_name = format!(
            "{}-{}{}",
            chrono::Utc::now().timestamp(),
            Uuid::new_v4(),
            extension
        );
        let path = category_dir.join(&stored_name);
        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| LearnHubError::file_operation(format!("创建文件失败: {e}")))?;

        // 先登记，出错时由 discard 统一删除
        form.files.push(SavedFile {
            field: rule.field.to_string(),
            original_name: original_name.clone(),
            stored_name: stored_name.clone(),
            extension: extension.trim_start_matches('.').to_string(),
            content_type,
            size: 0,
            url: format!(
                "{UPLOAD_URL_PREFIX}{}/{}",
                rule.category.dir_name(),
                stored_name
            ),
            path,
        });

        let max_size = max_size_for(rule.category, limits);
        let mut total_size: usize = 0;
        let mut gate = MagicGate::new(&extension, &original_name);
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| upload_error(format!("文件接收失败: {e}")))?
        {
            total_size += chunk.len();
            if total_size > max_size {
                return Err(upload_error(format!(
                    "文件大小超过限制 ({} MiB): {original_name}",
                    max_size / (1024 * 1024)
                )));
            }
            if let Some(ready) = gate.feed(&chunk)? {
                file.write_all(&ready)
                    .await
                    .map_err(|e| LearnHubError::file_operation(format!("写入文件失败: {e}")))?;
            }
        }
        if let Some(rest) = gate.finish()? {
            file.write_all(&rest)
                .await
                .map_err(|e| LearnHubError::file_operation(format!("写入文件失败: {e}")))?;
        }
        file.flush()
            .await
            .map_err(|e| LearnHubError::file_operation(format!("写入文件失败: {e}")))?;

        if total_size == 0 {
            return Err(upload_error(format!("文件为空: {original_name}")));
        }
        if let Some(saved) = form.files.last_mut() {
            saved.size = total_size as i64;
        }
        debug!("Saved upload {} ({} bytes)", stored_name, total_size);
    }
    Ok(())
}

/// 将 `/api/uploads/{category}/{file}` 解析为磁盘路径，拒绝路径穿越
pub fn resolve_upload_path(upload_dir: &str, category: &str, file_name: &str) -> Option<PathBuf> {
    let category = UploadCategory::from_dir_name(category)?;
    let valid_name = !file_name.is_empty()
        && !file_name.starts_with('.')
        && file_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid_name || file_name.contains("..") {
        return None;
    }
    Some(Path::new(upload_dir).join(category.dir_name()).join(file_name))
}

/// 由公开 URL 得到磁盘路径
pub fn path_from_url(upload_dir: &str, url: &str) -> Option<PathBuf> {
    let rest = url.strip_prefix(UPLOAD_URL_PREFIX)?;
    let (category, file_name) = rest.split_once('/')?;
    resolve_upload_path(upload_dir, category, file_name)
}

async fn remove_path(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed file {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove file {}: {}", path.display(), e),
    }
}

/// 尽力删除一组上传文件，失败只记录日志
pub async fn remove_uploaded_files(upload_dir: &str, urls: &[String]) {
    for url in urls {
        match path_from_url(upload_dir, url) {
            Some(path) => remove_path(&path).await,
            None => warn!("Skip removing file with unexpected url: {}", url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_and_name_sanitizing() {
        assert_eq!(extension_of("Report.PDF"), ".pdf");
        assert_eq!(extension_of("noext"), "");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:/tmp/a.png"), "a.png");
    }

    #[test]
    fn test_magic_gate_waits_for_full_header() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, 0x49];
        let mut gate = MagicGate::new(".png", "a.png");
        assert!(gate.feed(&png[..3]).unwrap().is_none());
        assert!(gate.feed(&png[3..6]).unwrap().is_none());
        let ready = gate.feed(&png[6..]).unwrap().unwrap();
        assert_eq!(&ready[..], &png[..]);
        assert_eq!(&gate.feed(b"tail").unwrap().unwrap()[..], b"tail");
        assert!(gate.finish().unwrap().is_none());

        let mut gate = MagicGate::new(".png", "fake.png");
        assert!(gate.feed(b"%PDF").unwrap().is_none());
        assert!(gate.feed(b"-1.7 body").is_err());
    }

    #[test]
    fn test_magic_gate_checks_short_files_on_finish() {
        let mut gate = MagicGate::new(".pdf", "short.pdf");
        assert!(gate.feed(b"%PDF").unwrap().is_none());
        assert_eq!(&gate.finish().unwrap().unwrap()[..], b"%PDF");

        let mut gate = MagicGate::new(".pdf", "short.pdf");
        assert!(gate.feed(b"nope").unwrap().is_none());
        assert!(gate.finish().is_err());
    }

    #[test]
    fn test_category_rules() {
        assert!(
            UploadCategory::Avatars
                .allowed_extensions()
                .contains(&".png")
        );
        assert!(
            !UploadCategory::Attachments
                .allowed_extensions()
                .contains(&".zip")
        );
        assert!(
            UploadCategory::Resources
                .allowed_extensions()
                .contains(&".mp4")
        );
        let limits = crate::config::AppConfig::default().upload;
        assert_eq!(max_size_for(UploadCategory::Covers, &limits), 5 * 1024 * 1024);
        assert_eq!(
            UploadCategory::from_dir_name("submissions"),
            Some(UploadCategory::Submissions)
        );
        assert_eq!(UploadCategory::from_dir_name("../etc"), None);
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        assert_eq!(
            resolve_upload_path("uploads", "covers", "1-abc.png"),
            Some(Path::new("uploads").join("covers").join("1-abc.png"))
        );
        assert!(resolve_upload_path("uploads", "covers", "../secret").is_none());
        assert!(resolve_upload_path("uploads", "covers", "..").is_none());
        assert!(resolve_upload_path("uploads", "covers", ".hidden").is_none());
        assert!(resolve_upload_path("uploads", "private", "a.png").is_none());
        assert!(path_from_url("uploads", "/api/uploads/avatars/a.png").is_some());
        assert!(path_from_url("uploads", "https://cdn.example.com/a.png").is_none());
    }

    #[tokio::test]
    async fn test_remove_uploaded_files_is_best_effort() {
        let dir = std::env::temp_dir().join(format!("learnhub-upload-{}", Uuid::new_v4()));
        let covers = dir.join("covers");
        tokio::fs::create_dir_all(&covers).await.unwrap();
        tokio::fs::write(covers.join("1-a.png"), b"x").await.unwrap();

        let upload_dir = dir.to_string_lossy().to_string();
        remove_uploaded_files(
            &upload_dir,
            &[
                "/api/uploads/covers/1-a.png".to_string(),
                "/api/uploads/covers/missing.png".to_string(),
                "not-a-url".to_string(),
            ],
        )
        .await;

        assert!(!covers.join("1-a.png").exists());
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
