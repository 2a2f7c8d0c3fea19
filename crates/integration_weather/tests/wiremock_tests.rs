//! Integration tests for the OpenWeatherMap client using wiremock
//!
//! These tests verify the weather client's behavior against a mock HTTP server,
//! ensuring proper handling of various response scenarios.

use integration_weather::{OpenWeatherMapClient, WeatherClient, WeatherConfig, WeatherError};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn sample_current_response() -> serde_json::Value {
    serde_json::json!({
        "coord": {"lon": 37.6173, "lat": 55.7558},
        "weather": [{"id": 804, "main": "Clouds", "description": "overcast clouds", "icon": "04d"}],
        "base": "stations",
        "main": {
            "temp": 5.5,
            "feels_like": 2.1,
            "temp_min": 4.0,
            "temp_max": 6.8,
            "pressure": 1013,
            "humidity": 75
        },
        "visibility": 10000,
        "wind": {"speed": 4.2, "deg": 225},
        "clouds": {"all": 90},
        "dt": 1_705_320_000,
        "sys": {"country": "RU", "sunrise": 1_705_296_000, "sunset": 1_705_324_000},
        "timezone": 10800,
        "id": 524_901,
        "name": "Moscow",
        "cod": 200
    })
}

fn sample_forecast_response() -> serde_json::Value {
    serde_json::json!({
        "cod": "200",
        "message": 0,
        "cnt": 3,
        "list": [
            {
                "dt": 1_705_330_800,
                "main": {"temp": 4.0, "feels_like": 1.0, "pressure": 1012, "humidity": 80},
                "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds"}],
                "wind": {"speed": 3.0}
            },
            {
                "dt": 1_705_341_600,
                "main": {"temp": 3.0, "feels_like": 0.0, "pressure": 1011, "humidity": 90},
                "weather": [{"id": 500, "main": "Rain", "description": "light rain"}],
                "wind": {"speed": 5.5}
            },
            {
                "dt": 1_705_352_400,
                "main": {"temp": 2.5, "feels_like": -1.0, "pressure": 1010, "humidity": 92},
                "weather": [{"id": 600, "main": "Snow", "description": "light snow"}],
                "wind": {"speed": 6.1}
            }
        ],
        "city": {"name": "Moscow", "timezone": 10800}
    })
}

fn config_for(server: &MockServer) -> WeatherConfig {
    WeatherConfig {
        api_key: "test-key".to_string(),
        base_url: server.uri(),
        geo_base_url: format!("{}/geo", server.uri()),
        timeout_secs: 5,
    }
}

fn client_for(server: &MockServer) -> OpenWeatherMapClient {
    OpenWeatherMapClient::new(config_for(server)).expect("client creation should succeed")
}

#[tokio::test]
async fn get_current_weather_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "55.7558"))
        .and(query_param("lon", "37.6173"))
        .and(query_param("appid", "test-key"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_current_response()))
        .expect(1)
        .mount(&server)
        .await;

    let weather = client_for(&server)
        .get_current(55.7558, 37.6173)
        .await
        .expect("should get current weather");

    assert_eq!(weather.name, "Moscow");
    assert_eq!(weather.family, "Clouds");
    assert_eq!(weather.description, "overcast clouds");
    assert!((weather.temperature - 5.5).abs() < f64::EPSILON);
    assert_eq!(weather.humidity, 75);
    assert_eq!(weather.pressure, 1013);
    assert_eq!(weather.cloudiness, Some(90));
    assert_eq!(weather.timezone_offset, 10800);
    assert_eq!(weather.sunrise.map(|t| t.timestamp()), Some(1_705_296_000));
}

#[tokio::test]
async fn get_forecast_preserves_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_forecast_response()))
        .mount(&server)
        .await;

    let steps = client_for(&server)
        .get_forecast(55.7558, 37.6173)
        .await
        .expect("should get forecast");

    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0].family, "Clouds");
    assert_eq!(steps[1].family, "Rain");
    assert_eq!(steps[1].description, "light rain");
    assert!(steps[0].time < steps[1].time);
    assert!((steps[2].wind_speed - 6.1).abs() < f64::EPSILON);
}

#[tokio::test]
async fn geocode_returns_first_match() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/direct"))
        .and(query_param("q", "Berlin"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"name": "Berlin", "lat": 52.517_036_5, "lon": 13.388_859_9, "country": "DE", "state": "Berlin"}
        ])))
        .mount(&server)
        .await;

    let place = client_for(&server).geocode("Berlin").await.expect("should geocode");
    assert_eq!(place.name, "Berlin");
    assert_eq!(place.country.as_deref(), Some("DE"));
    assert!((place.latitude - 52.517_036_5).abs() < 1e-9);
}

#[tokio::test]
async fn geocode_empty_result_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/direct"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let result = client_for(&server).geocode("Atlantis").await;
    assert!(matches!(result, Err(WeatherError::NotFound(q)) if q == "Atlantis"));
}

#[tokio::test]
async fn get_air_pollution_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/air_pollution"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "coord": {"lon": 50.0, "lat": 50.0},
            "list": [{
                "main": {"aqi": 2},
                "components": {
                    "co": 201.94, "no": 0.02, "no2": 0.77, "o3": 68.66,
                    "so2": 0.64, "pm2_5": 0.5, "pm10": 0.54, "nh3": 0.12
                },
                "dt": 1_705_320_000
            }]
        })))
        .mount(&server)
        .await;

    let air = client_for(&server)
        .get_air_pollution(50.0, 50.0)
        .await
        .expect("should get air pollution");
    assert_eq!(air.aqi, 2);
    assert_eq!(air.o3, Some(68.66));
    assert_eq!(air.co, Some(201.94));
}

#[tokio::test]
async fn rate_limit_is_mapped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let result = client_for(&server).get_current(1.0, 1.0).await;
    assert!(matches!(result, Err(WeatherError::RateLimitExceeded)));
}

#[tokio::test]
async fn unauthorized_is_mapped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "cod": 401, "message": "Invalid API key"
        })))
        .mount(&server)
        .await;

    let result = client_for(&server).get_forecast(1.0, 1.0).await;
    assert!(matches!(result, Err(WeatherError::Unauthorized)));
}

#[tokio::test]
async fn server_error_is_service_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = client_for(&server).get_current(1.0, 1.0).await;
    assert!(matches!(result, Err(WeatherError::ServiceUnavailable(_))));
}

#[tokio::test]
async fn client_error_is_request_failed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = client_for(&server).get_current(1.0, 1.0).await;
    assert!(matches!(result, Err(WeatherError::RequestFailed(_))));
}

#[tokio::test]
async fn missing_fields_are_parse_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "coord": {"lon": 1.0, "lat": 1.0},
            "dt": 1_705_320_000
        })))
        .mount(&server)
        .await;

    let result = client_for(&server).get_current(1.0, 1.0).await;
    assert!(matches!(result, Err(WeatherError::ParseError(_))));
}

#[tokio::test]
async fn invalid_coordinates_skip_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = client_for(&server).get_current(95.0, 0.0).await;
    assert!(matches!(result, Err(WeatherError::InvalidCoordinates)));
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(sample_current_response())
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = OpenWeatherMapClient::new(WeatherConfig {
        timeout_secs: 1,
        ..config_for(&server)
    })
    .expect("client creation should succeed");

    let result = client.get_current(55.7558, 37.6173).await;
    assert!(matches!(result, Err(WeatherError::RequestFailed(_))));
}

#[tokio::test]
async fn connection_error_hides_api_key() {
    let client = OpenWeatherMapClient::new(WeatherConfig {
        api_key: "SECRET_OWM_KEY".to_string(),
        base_url: "http://127.0.0.1:9".to_string(),
        geo_base_url: "http://127.0.0.1:9".to_string(),
        timeout_secs: 2,
    })
    .expect("client creation should succeed");

    let err = client.get_current(52.5, 13.4).await.unwrap_err();

    assert!(matches!(err, WeatherError::RequestFailed(_)));
    assert!(!err.to_string().contains("SECRET_OWM_KEY"));
}

#[tokio::test]
async fn parse_error_hides_api_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = OpenWeatherMapClient::new(WeatherConfig {
        api_key: "SECRET_OWM_KEY".to_string(),
        ..config_for(&server)
    })
    .expect("client creation should succeed");

    let err = client.get_current(52.5, 13.4).await.unwrap_err();

    assert!(matches!(err, WeatherError::ParseError(_)));
    assert!(!err.to_string().contains("SECRET_OWM_KEY"));
}
