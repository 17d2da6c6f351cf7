use serde::{Deserialize, Serialize};

use crate::errors::{GeofenceError, Result};
use crate::services::geofence::Proximity;

/// 默认配置文件路径（可选，不存在时使用默认值）
pub const DEFAULT_CONFIG_PATH: &str = "geofence.toml";

/// 环境变量前缀，例如 GEOFENCE__CACHE__TTL=60
pub const ENV_PREFIX: &str = "GEOFENCE";

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - geofence: 锚点地址、半径或精度、私有地址放行
/// - provider: 地理位置服务地址和 token
/// - cache: 判定缓存（内存或 Redis）
/// - logging: 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub geofence: GeofenceConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > 配置文件 > 默认值
    /// ENV 前缀：GEOFENCE，分隔符：__
    /// 显式传入的路径必须存在，默认路径缺失时忽略。
    pub fn load(path: Option<&str>) -> Result<Self> {
        use config::{Config, Environment, File};

        let (path, required) = match path {
            Some(p) => (p, true),
            None => (DEFAULT_CONFIG_PATH, false),
        };

        let settings = Config::builder()
            .add_source(File::with_name(path).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: StaticConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置并返回邻近判定方式
    pub fn validate(&self) -> Result<Proximity> {
        if self.provider.timeout_secs == 0 {
            return Err(GeofenceError::invalid_configuration(
                "provider.timeout_secs must be greater than 0",
            ));
        }
        if let Some(ref redis) = self.cache.redis
            && redis.addr.trim().is_empty()
        {
            return Err(GeofenceError::invalid_configuration(
                "cache.redis.addr must not be empty",
            ));
        }
        self.geofence.proximity()
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self {
            geofence: GeofenceConfig {
                radius_km: Some(25.0),
                ..GeofenceConfig::default()
            },
            ..Self::default()
        };
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }
}

/// 围栏配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeofenceConfig {
    /// 锚点 IP，留空表示使用本机公网地址
    #[serde(default)]
    pub ip_address: Option<String>,
    /// 半径（公里），与 sensitivity 二选一
    #[serde(default)]
    pub radius_km: Option<f64>,
    /// 坐标小数位精度 0-5（旧版比较方式），与 radius_km 二选一
    #[serde(default)]
    pub sensitivity: Option<u8>,
    /// 私有 / 回环地址直接判定为附近
    #[serde(default)]
    pub allow_private: bool,
}

impl GeofenceConfig {
    pub fn proximity(&self) -> Result<Proximity> {
        match (self.radius_km, self.sensitivity) {
            (Some(km), None) => Proximity::radius(km),
            (None, Some(sensitivity)) => Proximity::precision(sensitivity),
            (Some(_), Some(_)) => Err(GeofenceError::invalid_configuration(
                "geofence.radius_km and geofence.sensitivity are mutually exclusive",
            )),
            (None, None) => Err(GeofenceError::invalid_configuration(
                "either geofence.radius_km or geofence.sensitivity must be set",
            )),
        }
    }

    /// 锚点地址，空字符串视为未设置
    pub fn anchor_ip(&self) -> Option<&str> {
        self.ip_address
            .as_deref()
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
    }
}

/// 地理位置服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

/// 判定缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 条目 TTL（秒），0 表示永不过期
    #[serde(default = "default_cache_ttl")]
    pub ttl: u64,
    #[serde(default)]
    pub memory: MemoryConfig,
    /// 配置后使用 Redis 后端
    #[serde(default)]
    pub redis: Option<RedisConfig>,
}

/// Redis 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_addr")]
    pub addr: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub db: i64,
    #[serde(default = "default_redis_key_prefix")]
    pub key_prefix: String,
}

/// 内存缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_capacity")]
    pub max_capacity: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
}

// ============================================================
// Default value functions
// ============================================================

fn default_provider_base_url() -> String {
    "https://api.ipbase.com/v2".to_string()
}

fn default_provider_timeout() -> u64 {
    5
}

fn default_cache_ttl() -> u64 {
    7 * 24 * 3600
}

fn default_redis_addr() -> String {
    "127.0.0.1:6379".to_string()
}

fn default_redis_key_prefix() -> String {
    "geofence:".to_string()
}

fn default_memory_capacity() -> u64 {
    10000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_base_url(),
            token: String::new(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: default_cache_ttl(),
            memory: MemoryConfig::default(),
            redis: None,
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            addr: default_redis_addr(),
            username: None,
            password: None,
            db: 0,
            key_prefix: default_redis_key_prefix(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_memory_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn radius_config(km: f64) -> StaticConfig {
        StaticConfig {
            geofence: GeofenceConfig {
                radius_km: Some(km),
                ..GeofenceConfig::default()
            },
            ..StaticConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = StaticConfig::default();
        assert_eq!(config.cache.ttl, 604800);
        assert!(config.cache.redis.is_none());
        assert_eq!(config.provider.base_url, "https://api.ipbase.com/v2");
        assert!(!config.geofence.allow_private);
    }

    #[test]
    fn test_validate_radius() {
        let proximity = radius_config(10.0).validate().unwrap();
        assert_eq!(proximity, Proximity::Radius { km: 10.0 });
    }

    #[test]
    fn test_validate_requires_one_mode() {
        let err = StaticConfig::default().validate().unwrap_err();
        assert!(matches!(err, GeofenceError::InvalidConfiguration(_)));

        let mut both = radius_config(1.0);
        both.geofence.sensitivity = Some(3);
        assert!(matches!(
            both.validate(),
            Err(GeofenceError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = radius_config(1.0);
        config.provider.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_redis_addr() {
        let mut config = radius_config(1.0);
        config.cache.redis = Some(RedisConfig {
            addr: "  ".to_string(),
            ..RedisConfig::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_anchor_ip_blank_means_self() {
        let mut geofence = GeofenceConfig::default();
        assert_eq!(geofence.anchor_ip(), None);

        geofence.ip_address = Some("   ".to_string());
        assert_eq!(geofence.anchor_ip(), None);

        geofence.ip_address = Some("8.8.8.8".to_string());
        assert_eq!(geofence.anchor_ip(), Some("8.8.8.8"));
    }

    #[test]
    fn test_sample_config_round_trips() {
        let sample = StaticConfig::generate_sample_config();
        let parsed: StaticConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.geofence.radius_km, Some(25.0));
        assert!(parsed.validate().is_ok());
    }
}
