//! GeoIP 查询抽象层

use async_trait::async_trait;

use crate::errors::Result;

/// 经纬度坐标（十进制度）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// 单次查询结果，除坐标外的字段仅用于日志和展示
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoLookup {
    pub ip: String,
    pub latitude: f64,
    pub longitude: f64,
    /// ISO 3166-1 alpha-2 国家代码 (e.g., "CN", "US")
    pub country_code: Option<String>,
    pub country_name: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub time_zone: Option<String>,
}

impl GeoLookup {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// GeoIP 查询 trait
#[async_trait]
pub trait GeoLocator: Send + Sync {
    /// 查询 IP 地址的地理位置，`None` 表示查询本机公网地址
    async fn locate(&self, ip: Option<&str>) -> Result<GeoLookup>;

    /// 获取 provider 名称（用于日志）
    fn name(&self) -> &'static str;
}
