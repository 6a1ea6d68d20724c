//! 缓存层
//!
//! 以字符串形式存取 JSON 序列化后的对象，后端可选 Moka（进程内）或 Redis。
//! Redis 不可用时回退到 Moka。

pub mod object_cache;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::config::AppConfig;
use object_cache::{moka::MokaCacheWrapper, redis::RedisObjectCache};

/// 缓存查询结果
#[derive(Debug, Clone, PartialEq)]
pub enum CacheResult<T> {
    Found(T),
    NotFound,
    /// 后端出错，无法判断键是否存在
    ExistsButNoValue,
}

#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn get_raw(&self, key: &str) -> CacheResult<String>;
    /// ttl 为 0 时使用默认 TTL
    async fn insert_raw(&self, key: String, value: String, ttl: u64);
    async fn remove(&self, key: &str);
    async fn invalidate_all(&self);
}

impl dyn ObjectCache {
    /// 读取并反序列化，反序列化失败的条目会被移除
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.get_raw(key).await {
            CacheResult::Found(json) => match serde_json::from_str::<T>(&json) {
                Ok(value) => Some(value),
                Err(e) => {
                    debug!("Failed to deserialize cached value for {}: {}", key, e);
                    self.remove(key).await;
                    None
                }
            },
            _ => None,
        }
    }

    pub async fn insert_json<T: Serialize + Sync>(&self, key: String, value: &T, ttl: u64) {
        match serde_json::to_string(value) {
            Ok(json) => self.insert_raw(key, json, ttl).await,
            Err(e) => warn!("Failed to serialize value for cache key {}: {}", key, e),
        }
    }
}

/// 已认证用户的缓存键
pub fn user_cache_key(user_id: i64) -> String {
    format!("user:{user_id}")
}

/// 按配置创建缓存后端
pub async fn create_cache(config: &AppConfig) -> Arc<dyn ObjectCache> {
    match config.cache.cache_type.as_str() {
        "redis" => match RedisObjectCache::new(config).await {
            Ok(cache) => return Arc::new(cache),
            Err(e) => warn!("Redis cache unavailable, falling back to moka: {}", e),
        },
        "moka" => {}
        other => warn!("Unknown cache type '{}', using moka", other),
    }
    Arc::new(MokaCacheWrapper::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_config;

    #[tokio::test]
    async fn test_json_helpers_round_trip_user() {
        let cache = create_cache(&test_config()).await;
        cache
            .insert_json(user_cache_key(7), &vec![1, 2, 3], 0)
            .await;
        assert_eq!(
            cache.get_json::<Vec<i32>>(&user_cache_key(7)).await,
            Some(vec![1, 2, 3])
        );

        cache.remove(&user_cache_key(7)).await;
        assert!(cache.get_json::<Vec<i32>>(&user_cache_key(7)).await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_dropped() {
        let cache = create_cache(&test_config()).await;
        cache
            .insert_raw("user:1".to_string(), "not json".to_string(), 0)
            .await;
        assert!(cache.get_json::<Vec<i32>>("user:1").await.is_none());
        assert_eq!(cache.get_raw("user:1").await, CacheResult::NotFound);
    }
}
