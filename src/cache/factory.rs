use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::cache::{MemoryCache, RedisCache, VerdictCache};
use crate::config::CacheConfig;
use crate::errors::Result;

/// 根据配置创建唯一的缓存后端
///
/// 配置了 `cache.redis` 时使用 Redis，否则使用进程内缓存。
pub async fn create_cache(config: &CacheConfig) -> Result<Arc<dyn VerdictCache>> {
    let ttl = Duration::from_secs(config.ttl);

    let cache: Arc<dyn VerdictCache> = match config.redis {
        Some(ref redis_config) => Arc::new(RedisCache::new(redis_config, ttl).await?),
        None => Arc::new(MemoryCache::new(ttl, config.memory.max_capacity)),
    };

    info!(
        "Verdict cache: using {} backend (TTL: {}s)",
        cache.backend_name(),
        config.ttl
    );
    Ok(cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RedisConfig;
    use crate::errors::GeofenceError;

    #[tokio::test]
    async fn test_memory_backend_by_default() {
        let cache = create_cache(&CacheConfig::default()).await.unwrap();
        assert_eq!(cache.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_redis_backend_selected_when_configured() {
        let config = CacheConfig {
            redis: Some(RedisConfig {
                addr: "127.0.0.1:1".to_string(),
                ..RedisConfig::default()
            }),
            ..CacheConfig::default()
        };

        // 选择了 Redis 后端，连接失败时不会退回内存缓存
        let result = create_cache(&config).await;
        assert!(matches!(result, Err(GeofenceError::Cache(_))));
    }
}
