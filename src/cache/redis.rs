use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, trace, warn};

use crate::cache::VerdictCache;
use crate::config::RedisConfig;
use crate::errors::{GeofenceError, Result};

/// Redis 判定缓存
///
/// Redis 会把 false 存成 "0"，与 key 不存在难以区分，
/// 所以判定以 "true" / "false" 文本形式存储。
pub struct RedisCache {
    client: redis::Client,
    /// 持久化连接，使用 RwLock 保护
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
    key_prefix: String,
    ttl: Duration,
}

impl RedisCache {
    /// 建立连接并 PING 一次，失败则构造失败
    pub async fn new(redis_config: &RedisConfig, ttl: Duration) -> Result<Self> {
        let url = connection_url(redis_config);
        let client = redis::Client::open(url.as_str()).map_err(|e| {
            GeofenceError::invalid_configuration(format!(
                "Invalid Redis address '{}': {}",
                redis_config.addr, e
            ))
        })?;

        let mut conn = client.get_multiplexed_async_connection().await.map_err(|e| {
            error!(
                "Failed to connect to Redis server: {}. Check Redis server status and address: {}",
                e, redis_config.addr
            );
            GeofenceError::cache(format!("Redis connection failed: {e}"))
        })?;

        let response: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| GeofenceError::cache(format!("Redis ping failed: {e}")))?;
        debug!("Redis connection test successful: {}", response);

        debug!(
            "RedisCache created with prefix: '{}', db: {}, TTL: {:?}",
            redis_config.key_prefix, redis_config.db, ttl
        );

        Ok(Self {
            client,
            connection: Arc::new(RwLock::new(Some(conn))),
            key_prefix: redis_config.key_prefix.clone(),
            ttl,
        })
    }

    /// 获取或建立持久连接
    async fn get_connection(&self) -> Result<MultiplexedConnection> {
        {
            let conn_guard = self.connection.read().await;
            if let Some(ref conn) = *conn_guard {
                return Ok(conn.clone());
            }
        }

        let mut conn_guard = self.connection.write().await;

        // 双重检查，避免竞态条件
        if let Some(ref conn) = *conn_guard {
            return Ok(conn.clone());
        }

        let new_conn = self.client.get_multiplexed_async_connection().await?;
        *conn_guard = Some(new_conn.clone());
        debug!("Redis connection re-established");

        Ok(new_conn)
    }

    /// 重置连接（在连接错误时调用）
    async fn reset_connection(&self) {
        let mut conn_guard = self.connection.write().await;
        *conn_guard = None;
        debug!("Redis connection reset due to error");
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// 由配置拼出连接 URL，用户名和密码做百分号编码
///
/// `addr` 本身已是完整 URL（含 `://`）时原样使用。
pub fn connection_url(redis_config: &RedisConfig) -> String {
    if redis_config.addr.contains("://") {
        return redis_config.addr.clone();
    }

    let auth = match (&redis_config.username, &redis_config.password) {
        (Some(user), Some(pass)) => format!(
            "{}:{}@",
            urlencoding::encode(user),
            urlencoding::encode(pass)
        ),
        (None, Some(pass)) => format!(":{}@", urlencoding::encode(pass)),
        (Some(user), None) => format!("{}@", urlencoding::encode(user)),
        (None, None) => String::new(),
    };

    format!("redis://{}{}/{}", auth, redis_config.addr, redis_config.db)
}

pub fn encode_verdict(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

pub fn parse_verdict(raw: &str) -> Option<bool> {
    match raw {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[async_trait]
impl VerdictCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<bool>> {
        let redis_key = self.make_key(key);
        let mut conn = self.get_connection().await?;

        let result: redis::RedisResult<Option<String>> = conn.get(&redis_key).await;

        match result {
            Ok(Some(data)) => match parse_verdict(&data) {
                Some(value) => {
                    trace!("Successfully retrieved key: {}", key);
                    Ok(Some(value))
                }
                None => {
                    warn!("Unexpected value under key '{}': {:?}", redis_key, data);
                    Err(GeofenceError::cache(format!(
                        "Corrupt verdict under key '{}': {:?}",
                        redis_key, data
                    )))
                }
            },
            Ok(None) => {
                trace!("Key not found in cache: {}", key);
                Ok(None)
            }
            Err(e) => {
                error!("Failed to get key '{}': {}", key, e);
                // 连接可能已断开，重置连接
                self.reset_connection().await;
                Err(e.into())
            }
        }
    }

    async fn set(&self, key: &str, value: bool) -> Result<()> {
        let redis_key = self.make_key(key);
        let mut conn = self.get_connection().await?;
        let encoded = encode_verdict(value);

        // TTL 为 0 表示永不过期
        let result: redis::RedisResult<()> = if self.ttl.is_zero() {
            conn.set(&redis_key, encoded).await
        } else {
            conn.set_ex(&redis_key, encoded, self.ttl.as_secs().max(1))
                .await
        };

        match result {
            Ok(()) => {
                trace!("Successfully inserted key into cache: {}", key);
                Ok(())
            }
            Err(e) => {
                error!("Failed to insert key '{}' into cache: {}", key, e);
                self.reset_connection().await;
                Err(e.into())
            }
        }
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
