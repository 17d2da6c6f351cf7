//! 外部 GeoIP API 实现
//!
//! 使用 ipbase 风格的 HTTP API 查询 IP 地理位置：
//! `GET {base_url}/info?ip=<ip>&apikey=<token>`，省略 `ip` 时查询调用方自身的公网地址。
//! 不带缓存，缓存由上层判定缓存负责。

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, trace, warn};
use ureq::Agent;

use super::provider::{GeoLocator, GeoLookup};
use crate::config::ProviderConfig;
use crate::errors::{GeofenceError, Result};

#[derive(Debug, Deserialize)]
struct InfoResponse {
    data: InfoData,
}

#[derive(Debug, Deserialize)]
struct InfoData {
    #[serde(default)]
    ip: String,
    location: InfoLocation,
    #[serde(default)]
    timezone: Option<InfoTimezone>,
}

#[derive(Debug, Deserialize)]
struct InfoLocation {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    country: Option<InfoCountry>,
    #[serde(default)]
    region: Option<InfoNamed>,
    #[serde(default)]
    city: Option<InfoNamed>,
}

#[derive(Debug, Deserialize)]
struct InfoCountry {
    #[serde(default)]
    alpha2: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InfoNamed {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InfoTimezone {
    #[serde(default)]
    id: Option<String>,
}

/// 服务端返回的错误体
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl From<InfoResponse> for GeoLookup {
    fn from(resp: InfoResponse) -> Self {
        let InfoData {
            ip,
            location,
            timezone,
        } = resp.data;
        let (country_code, country_name) = match location.country {
            Some(c) => (c.alpha2, c.name),
            None => (None, None),
        };

        GeoLookup {
            ip,
            latitude: location.latitude,
            longitude: location.longitude,
            country_code,
            country_name,
            region: location.region.and_then(|r| r.name),
            city: location.city.and_then(|c| c.name),
            time_zone: timezone.and_then(|t| t.id),
        }
    }
}

/// 非 2xx 响应转为 Provider 错误，优先使用服务端 message 原文
fn decode_error(status: u16, body: &str) -> GeofenceError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) => GeofenceError::provider(err.message),
        Err(_) => GeofenceError::provider(format!("HTTP {}", status)),
    }
}

/// 外部 API GeoIP Provider
pub struct ExternalApiProvider {
    agent: Agent,
    info_url: String,
    token: String,
}

impl ExternalApiProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        // 非 2xx 不作为传输错误，需要读取错误体
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            info_url: format!("{}/info", config.base_url.trim_end_matches('/')),
            token: config.token.clone(),
        }
    }

    /// 同步请求（在 spawn_blocking 中调用）
    fn fetch_sync(
        agent: Agent,
        url: String,
        token: String,
        ip: Option<String>,
    ) -> Result<GeoLookup> {
        let mut request = agent
            .get(&url)
            .header("Accept", "application/json")
            .query("apikey", &token);
        if let Some(ref ip) = ip {
            request = request.query("ip", ip);
        }

        let mut resp = request.call().map_err(|e| {
            warn!("GeoIP API request to \"{}\" failed: {}", url, e);
            GeofenceError::from(e)
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.body_mut().read_to_string().unwrap_or_default();
            let err = decode_error(status.as_u16(), &body);
            debug!("GeoIP API returned {} for {:?}: {}", status, ip, err.message());
            return Err(err);
        }

        let parsed: InfoResponse = resp.into_body().read_json().map_err(|e| {
            warn!("GeoIP API response from \"{}\" parse failed: {}", url, e);
            GeofenceError::provider(format!("Malformed provider response: {}", e))
        })?;

        let lookup = GeoLookup::from(parsed);
        trace!(
            "External API lookup for {:?}: ({}, {}) country={:?}, city={:?}",
            ip, lookup.latitude, lookup.longitude, lookup.country_code, lookup.city
        );
        Ok(lookup)
    }
}

#[async_trait]
impl GeoLocator for ExternalApiProvider {
    async fn locate(&self, ip: Option<&str>) -> Result<GeoLookup> {
        let agent = self.agent.clone();
        let url = self.info_url.clone();
        let token = self.token.clone();
        let ip = ip.map(String::from);

        // 使用 spawn_blocking 在线程池中执行同步 HTTP 请求
        tokio::task::spawn_blocking(move || Self::fetch_sync(agent, url, token, ip))
            .await
            .map_err(|e| {
                warn!("GeoIP spawn_blocking failed: {}", e);
                GeofenceError::provider(format!("Lookup task failed: {}", e))
            })?
    }

    fn name(&self) -> &'static str {
        "ExternalAPI"
    }
}
