use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::cache::VerdictCache;
use crate::errors::Result;

/// 过期条目的清理周期，与条目 TTL 无关
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// 进程内判定缓存
///
/// TTL 为 0 表示永不过期。读取时 moka 会惰性检查过期，
/// 后台任务按 [`SWEEP_INTERVAL`] 周期清理已过期条目。
pub struct MemoryCache {
    inner: Cache<String, bool>,
    ttl: Duration,
    sweeper: Option<JoinHandle<()>>,
}

impl MemoryCache {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        Self::with_sweep_interval(ttl, max_capacity, SWEEP_INTERVAL)
    }

    pub fn with_sweep_interval(ttl: Duration, max_capacity: u64, interval: Duration) -> Self {
        let mut builder = Cache::<String, bool>::builder().max_capacity(max_capacity);
        if !ttl.is_zero() {
            builder = builder.time_to_live(ttl);
        }
        let inner: Cache<String, bool> = builder.build();

        // 没有 tokio runtime 时不启动清理任务，仍依赖读取时的惰性过期
        let sweeper = tokio::runtime::Handle::try_current().ok().map(|handle| {
            let cache = inner.clone();
            handle.spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                // 第一次 tick 立即返回
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    cache.run_pending_tasks().await;
                    trace!(
                        "MemoryCache sweep finished, {} entries remain",
                        cache.entry_count()
                    );
                }
            })
        });

        debug!(
            "MemoryCache initialized with max capacity: {}, TTL: {:?}, sweep: {}",
            max_capacity,
            ttl,
            if sweeper.is_some() { "enabled" } else { "disabled" }
        );

        Self {
            inner,
            ttl,
            sweeper,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeper.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for MemoryCache {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl VerdictCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<bool>> {
        let value = self.inner.get(key).await;
        trace!("MemoryCache get '{}': {:?}", key, value);
        Ok(value)
    }

    async fn set(&self, key: &str, value: bool) -> Result<()> {
        self.inner.insert(key.to_string(), value).await;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
