//! Aggregation behavior against a mocked OpenWeather host.

use serde_json::json;
use skycast_core::{FetchError, WeatherService};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service(server: &MockServer) -> WeatherService {
    let http = skycast_core::http_client().expect("http client");
    WeatherService::with_base_url(http, "test-key", server.uri())
}

fn current_body() -> serde_json::Value {
    json!({
        "name": "Dubai",
        "coord": { "lat": 25.26, "lon": 55.3 },
        "main": { "temp": 35.0, "humidity": 40, "temp_min": 33.0, "temp_max": 36.0 },
        "weather": [{ "main": "Clear", "description": "clear sky" }],
        "wind": { "speed": 4.1 },
        "sys": { "country": "AE", "sunrise": 1_700_000_000i64, "sunset": 1_700_040_000i64 },
        "visibility": 10000,
        "timezone": 14400
    })
}

fn forecast_body(samples: &[(f64, f64, f64)]) -> serde_json::Value {
    let list: Vec<serde_json::Value> = samples
        .iter()
        .map(|(temp, temp_min, temp_max)| {
            json!({
                "main": {
                    "temp": temp,
                    "humidity": 45,
                    "temp_min": temp_min,
                    "temp_max": temp_max
                },
                "weather": [{ "main": "Clear", "description": "clear sky" }]
            })
        })
        .collect();

    json!({ "list": list })
}

/// Eight 3-hourly samples with the highest max at index 2 and the lowest
/// min at index 7.
fn dubai_window() -> Vec<(f64, f64, f64)> {
    let mut samples = vec![(30.0, 27.0, 32.0); 8];
    samples[2] = (34.0, 31.0, 35.0);
    samples[7] = (26.0, 24.0, 31.0);
    samples
}

async fn mount_current(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_forecast(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_air_quality(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/data/2.5/air_pollution"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetch_merges_current_forecast_and_air_quality() {
    let server = MockServer::start().await;
    mount_current(&server, 200, current_body()).await;
    mount_forecast(&server, 200, forecast_body(&dubai_window())).await;
    mount_air_quality(&server, 200, json!({ "list": [{ "main": { "aqi": 3 } }] })).await;

    let snapshot = service(&server).fetch("Dubai").await.expect("fetch");

    assert_eq!(snapshot.city, "Dubai");
    assert_eq!(snapshot.country, "AE");
    assert_eq!(snapshot.current_temp, 35.0);
    assert_eq!(snapshot.condition, "Clear");
    assert_eq!(snapshot.humidity, 40);
    assert_eq!(snapshot.aqi, 3);

    assert_eq!(snapshot.max_temp, 35.0);
    assert_eq!(snapshot.min_temp, 24.0);
    assert!(snapshot.max_temp >= snapshot.min_temp);

    assert_eq!(snapshot.visibility_km, 10.0);
    assert_eq!(snapshot.sunrise, "2:13 AM");
    assert_eq!(snapshot.sunset, "1:20 PM");
    assert_eq!(snapshot.day_length, "11h 6m");

    assert_eq!(snapshot.day_parts.len(), 3);
    assert_eq!(snapshot.day_parts[0].name, "Morning");
    assert_eq!(snapshot.day_parts[1].name, "Afternoon");
    assert_eq!(snapshot.day_parts[2].name, "Evening");
    assert_eq!(snapshot.day_parts[1].temp, 34.0);
}

#[tokio::test]
async fn unknown_city_is_not_found_and_skips_air_quality() {
    let server = MockServer::start().await;
    mount_current(&server, 404, json!({ "cod": "404", "message": "city not found" })).await;
    mount_forecast(&server, 200, forecast_body(&dubai_window())).await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/air_pollution"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = service(&server).fetch("Narnia").await.unwrap_err();
    assert!(matches!(err, FetchError::CityNotFound(city) if city == "Narnia"));
}

#[tokio::test]
async fn empty_city_never_reaches_the_network() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = service(&server).fetch("   ").await.unwrap_err();
    assert!(matches!(err, FetchError::CityNotFound(_)));
}

#[tokio::test]
async fn air_quality_failure_degrades_to_the_neutral_index() {
    let server = MockServer::start().await;
    mount_current(&server, 200, current_body()).await;
    mount_forecast(&server, 200, forecast_body(&dubai_window())).await;
    mount_air_quality(&server, 500, json!({ "error": "boom" })).await;

    let snapshot = service(&server).fetch("Dubai").await.expect("fetch");
    assert_eq!(snapshot.aqi, 1);
}

#[tokio::test]
async fn air_quality_without_samples_degrades_to_the_neutral_index() {
    let server = MockServer::start().await;
    mount_current(&server, 200, current_body()).await;
    mount_forecast(&server, 200, forecast_body(&dubai_window())).await;
    mount_air_quality(&server, 200, json!({ "list": [] })).await;

    let snapshot = service(&server).fetch("Dubai").await.expect("fetch");
    assert_eq!(snapshot.aqi, 1);
}

#[tokio::test]
async fn short_forecast_window_means_no_day_parts() {
    let server = MockServer::start().await;
    mount_current(&server, 200, current_body()).await;
    mount_forecast(&server, 200, forecast_body(&[(30.0, 27.0, 32.0); 4])).await;
    mount_air_quality(&server, 200, json!({ "list": [{ "main": { "aqi": 2 } }] })).await;

    let snapshot = service(&server).fetch("Dubai").await.expect("fetch");
    assert!(snapshot.day_parts.is_empty());
}

#[tokio::test]
async fn empty_forecast_list_falls_back_to_current_bounds() {
    let server = MockServer::start().await;
    mount_current(&server, 200, current_body()).await;
    mount_forecast(&server, 200, json!({ "list": [] })).await;
    mount_air_quality(&server, 200, json!({ "list": [{ "main": { "aqi": 2 } }] })).await;

    let snapshot = service(&server).fetch("Dubai").await.expect("fetch");

    assert_eq!(snapshot.max_temp, 36.0);
    assert_eq!(snapshot.min_temp, 33.0);
    assert!(snapshot.day_parts.is_empty());
}

#[tokio::test]
async fn forecast_failure_fails_the_whole_fetch() {
    let server = MockServer::start().await;
    mount_current(&server, 200, current_body()).await;
    mount_forecast(&server, 500, json!({ "error": "boom" })).await;

    let err = service(&server).fetch("Dubai").await.unwrap_err();
    assert!(matches!(err, FetchError::Network(_)));
}

#[tokio::test]
async fn current_payload_missing_required_fields_is_malformed() {
    let server = MockServer::start().await;
    mount_current(&server, 200, json!({ "name": "Dubai" })).await;
    mount_forecast(&server, 200, forecast_body(&dubai_window())).await;

    let err = service(&server).fetch("Dubai").await.unwrap_err();
    assert!(matches!(err, FetchError::Malformed(_)));
}

#[tokio::test]
async fn city_name_is_forwarded_to_the_provider() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "São Paulo"))
        .and(query_param("appid", "test-key"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
        .expect(1)
        .mount(&server)
        .await;
    mount_forecast(&server, 200, forecast_body(&dubai_window())).await;
    mount_air_quality(&server, 200, json!({ "list": [{ "main": { "aqi": 2 } }] })).await;

    service(&server).fetch("São Paulo").await.expect("fetch");
}
