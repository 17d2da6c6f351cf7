use std::sync::Arc;

use tracing::{debug, info, trace};

use super::address::{is_private_or_loopback, parse_ip};
use super::proximity::Proximity;
use crate::cache::{VerdictCache, create_cache};
use crate::config::StaticConfig;
use crate::errors::Result;
use crate::services::geoip::{Coordinates, ExternalApiProvider, GeoLocator};

/// IP 地理围栏
///
/// 构造时确定锚点坐标和缓存后端，之后不再变化，可通过 `Arc` 在任务间共享。
/// 判定结果按 IP 缓存；并发 miss 时同一 IP 可能被重复查询，后写者覆盖。
pub struct Geofence {
    anchor: Coordinates,
    proximity: Proximity,
    allow_private: bool,
    cache: Arc<dyn VerdictCache>,
    locator: Arc<dyn GeoLocator>,
}

impl Geofence {
    /// 根据配置创建围栏
    ///
    /// 校验配置、创建缓存后端，并对锚点执行一次远程查询
    /// （未配置 `ip_address` 时查询本机公网地址）。
    pub async fn new(config: &StaticConfig) -> Result<Self> {
        let proximity = config.validate()?;
        let locator: Arc<dyn GeoLocator> = Arc::new(ExternalApiProvider::new(&config.provider));
        let cache = create_cache(&config.cache).await?;

        Self::from_parts(
            config.geofence.anchor_ip(),
            proximity,
            config.geofence.allow_private,
            cache,
            locator,
        )
        .await
    }

    /// 使用外部注入的缓存和查询实现创建围栏
    pub async fn from_parts(
        anchor_ip: Option<&str>,
        proximity: Proximity,
        allow_private: bool,
        cache: Arc<dyn VerdictCache>,
        locator: Arc<dyn GeoLocator>,
    ) -> Result<Self> {
        if let Some(ip) = anchor_ip {
            parse_ip(ip)?;
        }

        let lookup = locator.locate(anchor_ip).await?;
        let anchor = lookup.coordinates();

        info!(
            "Geofence anchored at {} ({}) using {}, {} provider, {} cache",
            anchor,
            anchor_ip.unwrap_or("self"),
            proximity,
            locator.name(),
            cache.backend_name()
        );

        Ok(Self {
            anchor,
            proximity,
            allow_private,
            cache,
            locator,
        })
    }

    /// 判断 IP 是否在锚点附近
    ///
    /// 顺序：校验地址 → 私有地址放行 → 读缓存 → 远程查询 → 比较 → 写缓存。
    /// 缓存读写失败会中止操作并返回错误，不会退化为仅远程查询。
    /// 缓存键是地址的规范形式，同一地址的不同写法（大小写、IPv6 压缩）共用一条缓存。
    ///
    /// 丢弃返回的 future 即取消判定，不会写缓存；但已发出的 HTTP 请求在阻塞线程上
    /// 继续执行，直到完成或达到 `provider.timeout_secs`。
    pub async fn is_near(&self, ip: &str) -> Result<bool> {
        let addr = parse_ip(ip)?;

        if self.allow_private && is_private_or_loopback(addr) {
            trace!("{} is private or loopback, treated as near", ip);
            return Ok(true);
        }

        let key = addr.to_string();
        if let Some(verdict) = self.cache.get(&key).await? {
            trace!("Verdict cache hit for {}: {}", key, verdict);
            return Ok(verdict);
        }

        trace!("Verdict cache miss for {}, querying {}", key, self.locator.name());
        let lookup = self.locator.locate(Some(&key)).await?;
        let verdict = self.proximity.is_near(self.anchor, lookup.coordinates());

        debug!(
            "{} located at {} ({:?}), near: {}",
            key,
            lookup.coordinates(),
            lookup.city,
            verdict
        );

        self.cache.set(&key, verdict).await?;
        Ok(verdict)
    }

    pub fn anchor(&self) -> Coordinates {
        self.anchor
    }

    pub fn proximity(&self) -> Proximity {
        self.proximity
    }

    pub fn allow_private(&self) -> bool {
        self.allow_private
    }

    /// 当前使用的缓存后端名称
    pub fn cache_backend(&self) -> &'static str {
        self.cache.backend_name()
    }
}
