//! End-to-end tests for the adapters against mock HTTP servers
//!
//! Wires the real OpenWeatherMap and Telegram adapters into the
//! application services and checks what ends up on the wire.

use std::sync::Arc;

use application::ports::{IncomingUpdate, MessengerPort, WeatherPort};
use application::services::{ChatService, NotificationService, UserRegistry};
use chrono::DateTime;
use domain::value_objects::{ChatId, GeoLocation};
use infrastructure::{TelegramMessengerAdapter, WeatherAdapter};
use integration_telegram::TelegramConfig;
use integration_weather::WeatherConfig;
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "42:secret";

fn current_payload(temp: f64) -> serde_json::Value {
    json!({
        "coord": {"lon": 37.6173, "lat": 55.7558},
        "weather": [{"id": 804, "main": "Clouds", "description": "overcast clouds"}],
        "main": {"temp": temp, "feels_like": temp - 3.0, "pressure": 1013, "humidity": 75},
        "wind": {"speed": 4.2},
        "clouds": {"all": 90},
        "dt": 1_705_320_000,
        "sys": {"sunrise": 1_705_296_000, "sunset": 1_705_324_000},
        "timezone": 10800,
        "name": "Moscow"
    })
}

fn forecast_payload() -> serde_json::Value {
    json!({
        "list": [
            {
                "dt": 1_705_330_800,
                "main": {"temp": 4.0, "feels_like": 1.0, "pressure": 1012, "humidity": 80},
                "weather": [{"main": "Clouds", "description": "broken clouds"}],
                "wind": {"speed": 3.0}
            },
            {
                "dt": 1_705_341_600,
                "main": {"temp": 3.0, "feels_like": 0.0, "pressure": 1011, "humidity": 90},
                "weather": [{"main": "Rain", "description": "light rain"}],
                "wind": {"speed": 5.5}
            }
        ]
    })
}

fn sent_message() -> serde_json::Value {
    json!({
        "ok": true,
        "result": {"message_id": 1, "chat": {"id": 7, "type": "private"}, "date": 0}
    })
}

async fn weather_server(temp: f64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/weather"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_payload(temp)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_payload()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/geo/direct"))
        .and(query_param("q", "Moscow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "Moscow", "lat": 55.7558, "lon": 37.6173, "country": "RU"}
        ])))
        .mount(&server)
        .await;
    server
}

fn weather_adapter(server: &MockServer) -> Arc<dyn WeatherPort> {
    Arc::new(
        WeatherAdapter::with_config(WeatherConfig {
            api_key: "test-key".to_string(),
            base_url: format!("{}/data", server.uri()),
            geo_base_url: format!("{}/geo", server.uri()),
            timeout_secs: 5,
        })
        .unwrap(),
    )
}

fn messenger(server: &MockServer) -> Arc<dyn MessengerPort> {
    Arc::new(
        TelegramMessengerAdapter::new(TelegramConfig {
            bot_token: TOKEN.to_string(),
            api_base_url: server.uri(),
            poll_timeout_secs: 0,
            request_timeout_secs: 5,
        })
        .unwrap(),
    )
}

fn subscribed_registry() -> Arc<UserRegistry> {
    let registry = Arc::new(UserRegistry::new());
    registry.set_location(ChatId::new(7), GeoLocation::new(55.7558, 37.6173).unwrap());
    registry.set_subscription(ChatId::new(7), true);
    registry
}

#[tokio::test]
async fn first_tick_sends_temperature_and_rain_once() {
    let weather = weather_server(5.5).await;
    let telegram = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .and(body_string_contains("5.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sent_message()))
        .expect(1)
        .mount(&telegram)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .and(body_string_contains("umbrella"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sent_message()))
        .expect(1)
        .mount(&telegram)
        .await;

    let registry = subscribed_registry();
    let service = NotificationService::new(
        weather_adapter(&weather),
        messenger(&telegram),
        Arc::clone(&registry),
    );
    let now = DateTime::from_timestamp(1_705_320_000, 0).unwrap();

    let first = service.run_tick(now).await;
    assert_eq!(first.notifications_sent, 2);
    assert_eq!(first.delivery_failures, 0);

    // Same temperature, rain still expected: nothing new to say
    let second = service.run_tick(now).await;
    assert_eq!(second.notifications_sent, 0);

    let record = registry.get(ChatId::new(7)).unwrap();
    assert_eq!(record.last_observed_temperature(), Some(5.5));
    assert!(record.rain_alerted());
}

#[tokio::test]
async fn provider_outage_degrades_without_messages() {
    let weather = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&weather)
        .await;
    let telegram = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sent_message()))
        .expect(0)
        .mount(&telegram)
        .await;

    let registry = subscribed_registry();
    let service = NotificationService::new(
        weather_adapter(&weather),
        messenger(&telegram),
        Arc::clone(&registry),
    );

    let report = service
        .run_tick(DateTime::from_timestamp(1_705_320_000, 0).unwrap())
        .await;

    assert_eq!(report.users_degraded, 1);
    assert_eq!(report.notifications_sent, 0);
    let record = registry.get(ChatId::new(7)).unwrap();
    assert_eq!(record.last_observed_temperature(), None);
    assert!(!record.rain_alerted());
}

#[tokio::test]
async fn blocked_chat_counts_as_delivery_failure() {
    let weather = weather_server(5.5).await;
    let telegram = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "ok": false, "error_code": 403, "description": "Forbidden: bot was blocked by the user"
        })))
        .mount(&telegram)
        .await;

    let registry = subscribed_registry();
    let service = NotificationService::new(
        weather_adapter(&weather),
        messenger(&telegram),
        Arc::clone(&registry),
    );

    let report = service
        .run_tick(DateTime::from_timestamp(1_705_320_000, 0).unwrap())
        .await;

    assert_eq!(report.notifications_sent, 0);
    assert_eq!(report.delivery_failures, 2);
    // State still advances so the next tick does not repeat the rain warning
    assert!(registry.get(ChatId::new(7)).unwrap().rain_alerted());
}

#[tokio::test]
async fn weather_command_resolves_city_and_replies() {
    let weather = weather_server(5.5).await;
    let telegram = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .and(body_partial_json(json!({"chat_id": 7})))
        .and(body_string_contains("Moscow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sent_message()))
        .expect(1)
        .mount(&telegram)
        .await;

    let registry = Arc::new(UserRegistry::new());
    let chat = ChatService::new(
        weather_adapter(&weather),
        messenger(&telegram),
        Arc::clone(&registry),
    );

    chat.handle_update(IncomingUpdate::Text {
        chat_id: ChatId::new(7),
        text: "/weather Moscow".into(),
    })
    .await
    .unwrap();

    let record = registry.get(ChatId::new(7)).unwrap();
    assert_eq!(record.city(), Some("Moscow"));
    assert!(record.location().is_some());
}
