//! External geolocation API tests against a local mock HTTP server

use geofence_ip::config::{GeofenceConfig, ProviderConfig, StaticConfig};
use geofence_ip::errors::GeofenceError;
use geofence_ip::services::{ExternalApiProvider, GeoLocator, Geofence};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "fakeApiToken";

fn info_body(ip: &str, lat: f64, lon: f64) -> serde_json::Value {
    json!({
        "data": {
            "ip": ip,
            "hostname": null,
            "type": "v4",
            "location": {
                "latitude": lat,
                "longitude": lon,
                "zip": "67025",
                "country": {"alpha2": "US", "name": "United States"},
                "region": {"name": "Kansas"},
                "city": {"name": "Cheney"}
            },
            "timezone": {"id": "America/Chicago"}
        }
    })
}

fn provider_config(server: &MockServer) -> ProviderConfig {
    ProviderConfig {
        base_url: format!("{}/v2", server.uri()),
        token: TOKEN.to_string(),
        timeout_secs: 5,
    }
}

async fn mock_ip(server: &MockServer, ip: &str, lat: f64, lon: f64, times: u64) {
    Mock::given(method("GET"))
        .and(path("/v2/info"))
        .and(query_param("ip", ip))
        .and(query_param("apikey", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(info_body(ip, lat, lon)))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_lookup_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/info"))
        .and(query_param("ip", "8.8.8.8"))
        .and(query_param("apikey", TOKEN))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(info_body("8.8.8.8", 37.751, -97.822)))
        .expect(1)
        .mount(&server)
        .await;

    let provider = ExternalApiProvider::new(&provider_config(&server));
    let lookup = provider.locate(Some("8.8.8.8")).await.unwrap();

    assert_eq!(lookup.ip, "8.8.8.8");
    assert_eq!(lookup.latitude, 37.751);
    assert_eq!(lookup.longitude, -97.822);
    assert_eq!(lookup.country_code.as_deref(), Some("US"));
    assert_eq!(lookup.city.as_deref(), Some("Cheney"));
}

#[tokio::test]
async fn test_self_lookup_omits_ip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/info"))
        .and(query_param_is_missing("ip"))
        .and(query_param("apikey", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(info_body("203.0.113.9", 51.5, -0.12)))
        .expect(1)
        .mount(&server)
        .await;

    let provider = ExternalApiProvider::new(&provider_config(&server));
    let lookup = provider.locate(None).await.unwrap();

    assert_eq!(lookup.ip, "203.0.113.9");
    assert_eq!(lookup.latitude, 51.5);
}

#[tokio::test]
async fn test_error_message_is_surfaced_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/info"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"message": "Invalid authentication credentials"})),
        )
        .mount(&server)
        .await;

    let provider = ExternalApiProvider::new(&provider_config(&server));
    let err = provider.locate(Some("8.8.8.8")).await.unwrap_err();

    assert_eq!(
        err,
        GeofenceError::Provider("Invalid authentication credentials".to_string())
    );
}

#[tokio::test]
async fn test_error_without_message_uses_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/info"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let provider = ExternalApiProvider::new(&provider_config(&server));
    let err = provider.locate(Some("8.8.8.8")).await.unwrap_err();

    assert_eq!(err, GeofenceError::Provider("HTTP 503".to_string()));
}

#[tokio::test]
async fn test_malformed_body_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"ip": "8.8.8.8"}})))
        .mount(&server)
        .await;

    let provider = ExternalApiProvider::new(&provider_config(&server));
    let err = provider.locate(Some("8.8.8.8")).await.unwrap_err();

    assert!(matches!(err, GeofenceError::Provider(_)));
}

#[tokio::test]
async fn test_unreachable_provider_is_provider_error() {
    let provider = ExternalApiProvider::new(&ProviderConfig {
        base_url: "http://127.0.0.1:1/v2".to_string(),
        token: TOKEN.to_string(),
        timeout_secs: 2,
    });
    let err = provider.locate(Some("8.8.8.8")).await.unwrap_err();

    assert!(matches!(err, GeofenceError::Provider(_)));
}

fn geofence_config(server: &MockServer, radius_km: f64) -> StaticConfig {
    StaticConfig {
        geofence: GeofenceConfig {
            ip_address: Some("8.8.8.8".to_string()),
            radius_km: Some(radius_km),
            ..GeofenceConfig::default()
        },
        provider: provider_config(server),
        ..StaticConfig::default()
    }
}

#[tokio::test]
async fn test_geofence_near() {
    let server = MockServer::start().await;
    mock_ip(&server, "8.8.8.8", 37.751, -97.822, 1).await;
    mock_ip(&server, "8.8.4.4", 37.751, -97.822, 1).await;

    let geofence = Geofence::new(&geofence_config(&server, 0.0)).await.unwrap();

    assert_eq!(geofence.cache_backend(), "memory");
    assert!(geofence.is_near("8.8.4.4").await.unwrap());
    // 第二次命中缓存，mock 的 expect(1) 在 server drop 时校验
    assert!(geofence.is_near("8.8.4.4").await.unwrap());
}

#[tokio::test]
async fn test_geofence_not_near() {
    let server = MockServer::start().await;
    mock_ip(&server, "8.8.8.8", 37.751, -97.822, 1).await;
    mock_ip(&server, "1.1.1.1", 37.751, -98.822, 1).await;

    let geofence = Geofence::new(&geofence_config(&server, 0.0)).await.unwrap();

    assert!(!geofence.is_near("1.1.1.1").await.unwrap());
    assert!(!geofence.is_near("1.1.1.1").await.unwrap());
}

#[tokio::test]
async fn test_geofence_construction_fails_on_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/info"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({"message": "Rate limit exceeded"})))
        .mount(&server)
        .await;

    let result = Geofence::new(&geofence_config(&server, 10.0)).await;

    assert_eq!(
        result.err(),
        Some(GeofenceError::Provider("Rate limit exceeded".to_string()))
    );
}

#[tokio::test]
async fn test_geofence_construction_rejects_bad_sensitivity() {
    let server = MockServer::start().await;
    let mut config = geofence_config(&server, 10.0);
    config.geofence.radius_km = None;
    config.geofence.sensitivity = Some(6);

    let result = Geofence::new(&config).await;

    assert!(matches!(result, Err(GeofenceError::InvalidConfiguration(_))));
    // 配置错误时不发起任何请求
    assert!(server.received_requests().await.unwrap().is_empty());
}
