use async_trait::async_trait;

use crate::errors::Result;

/// IP → 判定结果（是否在附近）的缓存接口
///
/// - `Ok(Some(v))`：命中
/// - `Ok(None)`：没有缓存的判定，不是错误
/// - `Err(_)`：后端故障（连接、序列化等）
///
/// Get 与 Set 之间不要求原子性，并发 miss 时允许重复查询，后写者覆盖。
#[async_trait]
pub trait VerdictCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<bool>>;

    async fn set(&self, key: &str, value: bool) -> Result<()>;

    /// 后端名称（用于日志）
    fn backend_name(&self) -> &'static str;
}
