//! 邻近判定算法
//!
//! - 半径模式：两点大圆距离（haversine，公里）不超过半径即为附近
//! - 精度模式（旧版）：经纬度分别保留 N 位小数后逐字比较
//!
//! 精度对应的网格大小：
//! 0 - 111 km, 1 - 11.1 km, 2 - 1.11 km, 3 - 111 m, 4 - 11.1 m, 5 - 1.11 m

use crate::errors::{GeofenceError, Result};
use crate::services::geoip::Coordinates;

/// 地球平均半径（公里）
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// 精度模式允许的最大小数位
pub const MAX_SENSITIVITY: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Proximity {
    /// 距离不超过 `km` 公里
    Radius { km: f64 },
    /// 坐标保留 `sensitivity` 位小数后相等
    Precision { sensitivity: u8 },
}

impl Proximity {
    pub fn radius(km: f64) -> Result<Self> {
        if !km.is_finite() || km < 0.0 {
            return Err(GeofenceError::invalid_configuration(format!(
                "invalid radius {}. value must be a non-negative number of kilometers",
                km
            )));
        }
        Ok(Proximity::Radius { km })
    }

    pub fn precision(sensitivity: u8) -> Result<Self> {
        if sensitivity > MAX_SENSITIVITY {
            return Err(GeofenceError::invalid_configuration(
                "invalid sensitivity. value must be between 0 - 5",
            ));
        }
        Ok(Proximity::Precision { sensitivity })
    }

    pub fn is_near(&self, anchor: Coordinates, other: Coordinates) -> bool {
        match *self {
            Proximity::Radius { km } => haversine_km(anchor, other) <= km,
            Proximity::Precision { sensitivity } => {
                format_coordinate(sensitivity, anchor.latitude)
                    == format_coordinate(sensitivity, other.latitude)
                    && format_coordinate(sensitivity, anchor.longitude)
                        == format_coordinate(sensitivity, other.longitude)
            }
        }
    }
}

impl std::fmt::Display for Proximity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Proximity::Radius { km } => write!(f, "radius {} km", km),
            Proximity::Precision { sensitivity } => write!(f, "precision {}", sensitivity),
        }
    }
}

/// 大圆距离（公里）
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // 近对跖点时舍入误差可能使 h 略大于 1
    let h = h.clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// 坐标保留指定小数位的字符串形式
pub fn format_coordinate(sensitivity: u8, value: f64) -> String {
    format!("{:.*}", sensitivity as usize, value)
}
