//! GeoIP 服务模块
//!
//! 提供 IP 地址地理位置查询功能，默认实现为外部 HTTP API。

mod external_api;
mod provider;

pub use external_api::ExternalApiProvider;
pub use provider::{Coordinates, GeoLocator, GeoLookup};
