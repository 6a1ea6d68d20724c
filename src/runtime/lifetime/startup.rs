use crate::cache::{ObjectCache, create_cache};
use crate::config::AppConfig;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::{CreateUserRequest, UserListQuery};
use crate::storage::{Storage, create_storage};
use crate::utils::password::hash_password;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
}

/// 生成随机密码
fn generate_random_password(length: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// 初始化默认管理员账号
/// 数据库中没有任何管理员时创建 admin 账号
pub async fn seed_admin(storage: &Arc<dyn Storage>, config: &AppConfig) {
    let query = UserListQuery {
        page: Some(1),
        size: Some(1),
        role: Some(UserRole::Admin),
        ..Default::default()
    };
    match storage.list_users_with_pagination(query).await {
        Ok(list) if list.pagination.total > 0 => {
            debug!(
                "Database already has {} admin(s), skipping admin seed",
                list.pagination.total
            );
            return;
        }
        Ok(_) => {
            info!("No admin found in database, creating default admin account...");
        }
        Err(e) => {
            warn!("Failed to query admins: {}, skipping admin seed", e);
            return;
        }
    }

    // 获取密码：优先从环境变量，否则生成随机密码
    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
        let pwd = generate_random_password(16);
        warn!("==========================================================");
        warn!("  ADMIN PASSWORD NOT SET - USING GENERATED PASSWORD");
        warn!("  Generated admin password: {}", pwd);
        warn!("  Please save this password or set ADMIN_PASSWORD env var");
        warn!("==========================================================");
        pwd
    });

    let password_hash = match hash_password(&config.argon2, &password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Failed to hash admin password: {}", e);
            return;
        }
    };

    let admin_request = CreateUserRequest {
        username: "admin".to_string(),
        email: "admin@localhost.com".to_string(),
        password: password_hash,
        role: UserRole::Admin,
        name: Some("Administrator".to_string()),
    };

    match storage.create_user(admin_request).await {
        Ok(user) => {
            info!(
                "Default admin account created successfully (ID: {}, username: {})",
                user.id, user.username
            );
        }
        Err(e) => {
            warn!("Failed to create admin account: {}", e);
        }
    }
}

/// 准备服务器启动的上下文：存储（含迁移）、默认管理员与缓存
pub async fn prepare_server_startup(config: &AppConfig) -> StartupContext {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let storage = create_storage(config)
        .await
        .expect("Failed to create storage backend");
    warn!("Storage backend initialized and migrations completed");

    seed_admin(&storage, config).await;

    let cache = create_cache(config).await;
    warn!("Cache backend initialized ({})", config.cache.cache_type);

    StartupContext { storage, cache }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestContext;

    #[test]
    fn test_generated_password_length() {
        let pwd = generate_random_password(16);
        assert_eq!(pwd.chars().count(), 16);
    }

    #[tokio::test]
    async fn test_seed_admin_only_once() {
        let ctx = TestContext::new().await;
        seed_admin(&ctx.storage, &ctx.config).await;
        seed_admin(&ctx.storage, &ctx.config).await;

        let admins = ctx
            .storage
            .list_users_with_pagination(UserListQuery {
                role: Some(UserRole::Admin),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(admins.pagination.total, 1);
        assert_eq!(admins.items[0].username, "admin");
    }
}
