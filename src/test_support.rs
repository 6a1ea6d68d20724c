//! 测试辅助：内存数据库、HTTP 测试上下文与常用测试数据

use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use crate::cache::{ObjectCache, create_cache};
use crate::config::AppConfig;
use crate::models::assignments::requests::{NewAssignment, NewAttachment};
use crate::models::chapters::entities::{Chapter, ResourceType};
use crate::models::chapters::requests::{CreateChapterRequest, NewChapterResource};
use crate::models::courses::entities::{Course, CourseCategory, CourseLevel, CourseStatus};
use crate::models::courses::requests::NewCourse;
use crate::models::users::entities::{User, UserRole};
use crate::models::users::requests::CreateUserRequest;
use crate::storage::Storage;
use crate::storage::sea_orm_storage::SeaOrmStorage;
use crate::utils::jwt::JwtUtils;
use crate::utils::password::hash_password;

/// 测试用配置：内存 SQLite，单连接
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = ":memory:".to_string();
    config.database.pool_size = 1;
    config.jwt.secret = "learnhub-test-secret".to_string();
    // 降低哈希成本
    config.argon2.memory_cost = 1024;
    config.argon2.time_cost = 1;
    config
}

pub async fn memory_storage() -> SeaOrmStorage {
    SeaOrmStorage::new_async(&test_config())
        .await
        .expect("内存数据库初始化失败")
}

/// 存储层直接保存 password 字段作为哈希值
pub fn new_user(username: &str, role: UserRole) -> CreateUserRequest {
    CreateUserRequest {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: "not-a-real-hash".to_string(),
        role,
        name: None,
    }
}

pub fn new_course(teacher_id: i64, title: &str) -> NewCourse {
    NewCourse {
        teacher_id,
        title: title.to_string(),
        description: format!("{title} description"),
        category: CourseCategory::Programming,
        level: CourseLevel::Beginner,
        price: 0.0,
    }
}

pub async fn add_chapter(storage: &SeaOrmStorage, course_id: i64, title: &str) -> Chapter {
    storage
        .create_chapter_impl(
            course_id,
            CreateChapterRequest {
                title: title.to_string(),
                description: None,
                content: Some(format!("{title} content")),
                duration: None,
                order: None,
            },
        )
        .await
        .expect("创建章节失败")
}

/// 跳过发布前置条件，直接发布课程
pub async fn publish_course(storage: &SeaOrmStorage, course_id: i64) {
    storage
        .update_course_status_impl(course_id, CourseStatus::Published)
        .await
        .expect("发布课程失败")
        .expect("课程不存在");
}

pub fn new_resource(url: &str) -> NewChapterResource {
    NewChapterResource {
        title: "Slides".to_string(),
        url: url.to_string(),
        resource_type: ResourceType::Document,
        file_name: "slides.pdf".to_string(),
        size: 1024,
        duration: None,
    }
}

pub fn new_assignment(course_id: i64, created_by: i64, title: &str) -> NewAssignment {
    NewAssignment {
        course_id,
        created_by,
        title: title.to_string(),
        description: format!("{title} description"),
        deadline: chrono::Utc::now() + chrono::Duration::days(7),
        total_score: 100.0,
    }
}

pub fn new_attachment(url: &str) -> NewAttachment {
    NewAttachment {
        title: "file".to_string(),
        url: url.to_string(),
        file_type: "pdf".to_string(),
        file_name: "file.pdf".to_string(),
        size: 2048,
    }
}

/// HTTP 测试上下文：存储、缓存与配置，与生产环境一样以 `web::Data` 注入
pub struct TestContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
    pub config: Arc<AppConfig>,
    pub root: PathBuf,
}

impl TestContext {
    pub async fn new() -> Self {
        let root = std::env::temp_dir().join(format!("learnhub-test-{}", Uuid::new_v4()));
        let mut config = test_config();
        config.upload.dir = root.join("uploads").to_string_lossy().to_string();
        config.backup.dir = root.join("backups").to_string_lossy().to_string();
        config.app.log_dir = root.join("logs").to_string_lossy().to_string();

        let storage: Arc<dyn Storage> = Arc::new(
            SeaOrmStorage::new_async(&config)
                .await
                .expect("内存数据库初始化失败"),
        );
        let cache = create_cache(&config).await;
        Self {
            storage,
            cache,
            config: Arc::new(config),
            root,
        }
    }

    /// 直接在存储层创建用户，密码为 `password123`
    pub async fn user(&self, username: &str, role: UserRole) -> User {
        let mut request = new_user(username, role);
        request.password =
            hash_password(&self.config.argon2, "password123").expect("密码哈希失败");
        self.storage
            .create_user(request)
            .await
            .expect("创建用户失败")
    }

    /// `Authorization` 头的值
    pub fn bearer(&self, user: &User) -> String {
        let token = JwtUtils::generate_access_token(&self.config.jwt, user.id, user.role.as_str())
            .expect("生成令牌失败");
        format!("Bearer {token}")
    }

    /// 已发布、有一个章节的课程
    pub async fn published_course(&self, teacher: &User, title: &str) -> Course {
        let course = self
            .storage
            .create_course(new_course(teacher.id, title))
            .await
            .expect("创建课程失败");
        self.storage
            .create_chapter(
                course.id,
                CreateChapterRequest {
                    title: "第一章".to_string(),
                    description: None,
                    content: None,
                    duration: None,
                    order: None,
                },
            )
            .await
            .expect("创建章节失败");
        self.storage
            .update_course_status(course.id, CourseStatus::Published)
            .await
            .expect("发布课程失败")
            .expect("课程不存在")
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

/// 用上下文中的依赖与给定路由构建测试服务
macro_rules! test_app {
    ($ctx:expr, $($configure:expr),+ $(,)?) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($ctx.storage.clone()))
                .app_data(actix_web::web::Data::new($ctx.cache.clone()))
                .app_data(actix_web::web::Data::new($ctx.config.clone()))
                .app_data(
                    actix_web::web::JsonConfig::default()
                        .error_handler($crate::utils::json_error_handler),
                )
                .app_data(
                    actix_web::web::QueryConfig::default()
                        .error_handler($crate::utils::query_error_handler),
                )
                .app_data(
                    actix_web::web::PathConfig::default()
                        .error_handler($crate::utils::path_error_handler),
                )
                $(.configure($configure))+,
        )
        .await
    };
}
pub(crate) use test_app;

/// 手工拼装 multipart/form-data 请求体
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: format!("----learnhub{}", Uuid::new_v4().simple()),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// 返回 `(Content-Type 头, 请求体)`
    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}

pub const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n%test document\n";

/// 读取响应体 JSON
pub async fn read_json<B>(resp: actix_web::dev::ServiceResponse<B>) -> serde_json::Value
where
    B: actix_web::body::MessageBody,
{
    let body = actix_web::test::read_body(resp).await;
    serde_json::from_slice(&body).expect("响应不是合法 JSON")
}
