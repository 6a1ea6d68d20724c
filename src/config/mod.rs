//! 配置管理
//!
//! 配置在启动时加载一次，以 `Arc<AppConfig>` 的形式注入到 `web::Data` 中，
//! 服务、中间件与存储层都从请求上下文中读取，不存在进程级全局配置。

mod r#impl;
mod structs;

pub use structs::*;

use actix_web::HttpRequest;
use std::sync::Arc;

const MIB: usize = 1024 * 1024;

/// 滚动日志文件名前缀，实际文件为 `learnhub.log.YYYY-MM-DD`
pub const LOG_FILE_PREFIX: &str = "learnhub.log";

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSettings {
                system_name: "LearnHub".to_string(),
                environment: "development".to_string(),
                log_level: "info".to_string(),
                log_dir: "logs".to_string(),
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                unix_socket_path: String::new(),
                workers: 0,
                max_workers: 16,
                timeouts: TimeoutConfig {
                    client_request: 5000,
                    client_disconnect: 1000,
                    keep_alive: 30,
                },
                limits: LimitConfig {
                    max_payload_size: 50 * MIB,
                },
            },
            jwt: JwtConfig {
                secret: String::new(),
                access_token_expiry: 60,
                refresh_token_expiry: 7,
                refresh_token_remember_me_expiry: 30,
                secure_cookie: false,
            },
            argon2: Argon2Config {
                memory_cost: 19456,
                time_cost: 2,
                parallelism: 1,
            },
            database: DatabaseConfig {
                url: "learnhub.db".to_string(),
                pool_size: 10,
                timeout: 30,
            },
            cache: CacheConfig {
                cache_type: "moka".to_string(),
                default_ttl: 300,
                redis: RedisConfig {
                    url: "redis://127.0.0.1:6379".to_string(),
                    key_prefix: "learnhub:".to_string(),
                },
                memory: MemoryConfig {
                    max_capacity: 10_000,
                },
            },
            cors: CorsConfig {
                allowed_origins: vec!["*".to_string()],
                max_age: 3600,
            },
            upload: UploadConfig {
                dir: "uploads".to_string(),
                max_size: 50 * MIB,
                avatar_max_size: 2 * MIB,
                cover_max_size: 5 * MIB,
                resource_max_size: 50 * MIB,
                attachment_max_size: 20 * MIB,
                submission_max_size: 50 * MIB,
            },
            backup: BackupConfig {
                dir: "backups".to_string(),
            },
        }
    }
}

/// 从请求上下文中获取配置
pub fn get_config(request: &HttpRequest) -> Arc<AppConfig> {
    request
        .app_data::<actix_web::web::Data<Arc<AppConfig>>>()
        .expect("AppConfig not found in app data")
        .get_ref()
        .clone()
}
