//! 地理围栏服务
//!
//! 判断 IP 是否位于锚点的指定范围内，结果写入判定缓存。

pub mod address;
mod engine;
pub mod proximity;

pub use address::{is_private_or_loopback, parse_ip};
pub use engine::Geofence;
pub use proximity::{Proximity, format_coordinate, haversine_km};
