pub mod factory;
pub mod memory;
pub mod redis;
pub mod traits;

pub use factory::create_cache;
pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;
pub use traits::VerdictCache;
