use config::{Config, ConfigError, Environment, File};
use tracing::warn;

use super::AppConfig;
use crate::utils::random_code::generate_random_code;

impl AppConfig {
    /// 加载配置
    ///
    /// 优先级（从低到高）：内置默认值、config.toml、config.{APP_ENV}.toml、
    /// LEARNHUB_ 前缀的环境变量、约定的独立环境变量。
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // 内置默认值
            .add_source(Config::try_from(&AppConfig::default())?)
            // 然后加载默认配置文件
            .add_source(File::with_name("config").required(false))
            // 然后根据环境加载特定配置文件
            .add_source(
                File::with_name(&format!(
                    "config.{}",
                    std::env::var("APP_ENV").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // 最后加载环境变量覆盖
            .add_source(
                Environment::with_prefix("LEARNHUB")
                    .separator("_")
                    .try_parsing(true),
            );

        // 支持从环境变量加载
        builder = builder
            .set_override_option("app.environment", std::env::var("APP_ENV").ok())?
            .set_override_option("app.log_level", std::env::var("RUST_LOG").ok())?
            .set_override_option("app.log_dir", std::env::var("LOG_DIR").ok())?
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("server.unix_socket_path", std::env::var("UNIX_SOCKET").ok())?
            .set_override_option("server.workers", std::env::var("CPU_COUNT").ok())?
            .set_override_option("jwt.secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("cache.redis.url", std::env::var("REDIS_URL").ok())?
            .set_override_option("upload.dir", std::env::var("UPLOAD_DIR").ok())?
            .set_override_option("backup.dir", std::env::var("BACKUP_DIR").ok())?;

        let config = builder.build()?;
        let mut app_config: AppConfig = config.try_deserialize()?;

        // CORS_ORIGIN 支持逗号分隔的多个来源
        if let Ok(origins) = std::env::var("CORS_ORIGIN") {
            let origins: Vec<String> = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
            if !origins.is_empty() {
                app_config.cors.allowed_origins = origins;
            }
        }

        // 处理工作线程数
        if app_config.server.workers == 0 {
            app_config.server.workers = num_cpus::get().min(app_config.server.max_workers);
        }

        Ok(app_config)
    }

    /// 确保 JWT 密钥可用
    ///
    /// 生产环境下密钥为空视为配置错误；开发环境下生成随机密钥，
    /// 重启后已签发的令牌全部失效。需要在日志初始化之后调用。
    pub fn resolve_jwt_secret(&mut self) -> Result<(), ConfigError> {
        if !self.jwt.secret.is_empty() {
            return Ok(());
        }
        if self.is_production() {
            return Err(ConfigError::Message(
                "JWT secret must be set in production (JWT_SECRET)".to_string(),
            ));
        }
        self.jwt.secret = generate_random_code(64);
        warn!("JWT_SECRET not set, using a randomly generated secret for this process");
        Ok(())
    }

    /// 检查是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }

    /// 检查是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }

    /// 获取服务器绑定地址
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 获取 Unix 套接字路径 (如果配置了)
    #[cfg(unix)]
    pub fn unix_socket_path(&self) -> Option<&str> {
        if self.server.unix_socket_path.is_empty() {
            None
        } else {
            Some(&self.server.unix_socket_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_upload_limits() {
        let config = AppConfig::default();
        assert_eq!(config.upload.avatar_max_size, 2 * 1024 * 1024);
        assert_eq!(config.upload.cover_max_size, 5 * 1024 * 1024);
        assert_eq!(config.upload.attachment_max_size, 20 * 1024 * 1024);
        assert_eq!(config.upload.max_size, 50 * 1024 * 1024);
        assert_eq!(config.backup.dir, "backups");
    }

    #[test]
    fn test_resolve_jwt_secret_in_development() {
        let mut config = AppConfig::default();
        config.resolve_jwt_secret().unwrap();
        assert_eq!(config.jwt.secret.len(), 64);

        // 已配置的密钥保持不变
        let existing = config.jwt.secret.clone();
        config.resolve_jwt_secret().unwrap();
        assert_eq!(config.jwt.secret, existing);
    }

    #[test]
    fn test_resolve_jwt_secret_in_production() {
        let mut config = AppConfig::default();
        config.app.environment = "production".to_string();
        assert!(config.resolve_jwt_secret().is_err());
    }

    #[test]
    fn test_bind_address() {
        let config = AppConfig::default();
        assert_eq!(config.server_bind_address(), "127.0.0.1:8080");
    }
}
