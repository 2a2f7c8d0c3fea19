//! Chat service - Handles incoming chat updates
//!
//! Parses commands, updates the user registry, calls the weather provider
//! and replies through the messenger. Provider failures turn into friendly
//! replies; only delivery failures are returned to the caller.

use std::sync::Arc;

use chrono::NaiveDate;
use domain::value_objects::{AirQualityReport, ChatId, GeoLocation};
use tracing::{debug, info, instrument, warn};

use crate::error::ApplicationError;
use crate::ports::{
    CurrentConditions, ForecastEntry, IncomingUpdate, InlineButton, MenuButton, MessengerPort,
    UserSnapshotStore, WeatherPort,
};
use crate::services::user_registry::UserRegistry;
use crate::services::weather_report::{self, FORECAST_DAYS};

/// Callback data for enabling notifications
pub const NOTIFY_ON: &str = "notif:on";
/// Callback data for disabling notifications
pub const NOTIFY_OFF: &str = "notif:off";
/// Callback data prefix for picking a forecast day, followed by `YYYY-MM-DD`
pub const DAY_PREFIX: &str = "day:";
/// Callback data for returning to the forecast day list
pub const BACK_TO_DAYS: &str = "back:days";

const SHARE_LOCATION_LABEL: &str = "📍 Share location";

const HELP_TEXT: &str = "Hi! I'm a weather bot. Here is what I can do:\n\
/weather <city> - current weather in a city (and remember it)\n\
/weather - current weather at your saved location\n\
/forecast - 5 day forecast for your saved location, pick a day for details\n\
/forecast YYYY-MM-DD - 3-hour details for one day\n\
/compare <city1>, <city2> - compare two cities\n\
/air [city] - extended report with air quality\n\
/notify - push notifications about temperature changes and rain\n\n\
Press \"📍 Share location\" below to save where you are.";

const NO_LOCATION_TEXT: &str =
    "Share your location or ask for /weather <city> first so I know where you are.";

const FALLBACK_TEXT: &str = "I didn't understand that. Send /help to see what I can do.";

/// Parsed chat command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Weather(Option<String>),
    Forecast(Option<String>),
    Compare(String),
    Air(Option<String>),
    Notify(Option<String>),
    Unknown,
}

impl Command {
    /// Parse message text, accepting `/cmd@botname` forms
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let Some(rest) = text.strip_prefix('/') else {
            return Self::Unknown;
        };
        let (head, args) = rest
            .split_once(char::is_whitespace)
            .map_or((rest, ""), |(head, args)| (head, args.trim()));
        let name = head.split('@').next().unwrap_or(head).to_lowercase();
        let arg = (!args.is_empty()).then(|| args.to_string());

        match name.as_str() {
            "start" | "help" => Self::Help,
            "weather" => Self::Weather(arg),
            "forecast" => Self::Forecast(arg),
            "compare" => Self::Compare(args.to_string()),
            "air" => Self::Air(arg),
            "notify" => Self::Notify(arg),
            _ => Self::Unknown,
        }
    }
}

/// Keyboard attached to a reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Keyboard {
    #[default]
    Empty,
    /// Inline buttons under the message
    Buttons(Vec<InlineButton>),
    /// Persistent menu replacing the phone keyboard
    Menu(Vec<MenuButton>),
}

/// A message to send back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Keyboard,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Keyboard::Empty,
        }
    }

    fn with_buttons(text: impl Into<String>, buttons: Vec<InlineButton>) -> Self {
        Self {
            text: text.into(),
            keyboard: Keyboard::Buttons(buttons),
        }
    }
}

/// Service answering chat updates
pub struct ChatService {
    weather: Arc<dyn WeatherPort>,
    messenger: Arc<dyn MessengerPort>,
    registry: Arc<UserRegistry>,
    store: Option<Arc<dyn UserSnapshotStore>>,
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("has_store", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

impl ChatService {
    /// Create a new chat service
    #[must_use]
    pub fn new(
        weather: Arc<dyn WeatherPort>,
        messenger: Arc<dyn MessengerPort>,
        registry: Arc<UserRegistry>,
    ) -> Self {
        Self {
            weather,
            messenger,
            registry,
            store: None,
        }
    }

    /// Persist registry changes through `store`
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn UserSnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Handle one incoming update
    #[instrument(skip(self, update), fields(chat_id = %update.chat_id()))]
    pub async fn handle_update(&self, update: IncomingUpdate) -> Result<(), ApplicationError> {
        match update {
            IncomingUpdate::Text { chat_id, text } => {
                self.registry.get_or_create(chat_id);
                let reply = self.handle_command(chat_id, Command::parse(&text)).await;
                self.send(chat_id, reply).await
            },
            IncomingUpdate::Location { chat_id, location } => {
                let reply = self.handle_location(chat_id, location).await;
                self.send(chat_id, reply).await
            },
            IncomingUpdate::Callback {
                chat_id,
                message_id,
                callback_id,
                data,
            } => {
                self.handle_callback(chat_id, message_id, &callback_id, &data)
                    .await
            },
        }
    }

    /// Produce the reply for a command
    pub async fn handle_command(&self, chat_id: ChatId, command: Command) -> Reply {
        debug!(?command, "Handling command");
        match command {
            Command::Help => Reply {
                text: HELP_TEXT.to_string(),
                keyboard: Keyboard::Menu(main_menu()),
            },
            Command::Weather(Some(city)) => self.weather_for_city(chat_id, &city).await,
            Command::Weather(None) => self.weather_at_saved_location(chat_id).await,
            Command::Forecast(day) => self.forecast(chat_id, day.as_deref()).await,
            Command::Compare(args) => self.compare(&args).await,
            Command::Air(city) => self.air(chat_id, city.as_deref()).await,
            Command::Notify(None) => self.notify_status(chat_id),
            Command::Notify(Some(arg)) => match arg.to_lowercase().as_str() {
                "on" => Reply::text(self.set_notifications(chat_id, true).await),
                "off" => Reply::text(self.set_notifications(chat_id, false).await),
                _ => Reply::text("Use /notify on or /notify off."),
            },
            Command::Unknown => Reply::text(FALLBACK_TEXT),
        }
    }

    async fn handle_location(&self, chat_id: ChatId, location: GeoLocation) -> Reply {
        self.registry.set_location(chat_id, location);
        info!(%location, "Location saved");
        self.persist().await;

        match self.weather.current_conditions(&location).await {
            Ok(conditions) => Reply::text(format!(
                "Location saved. Current weather:\n\n{}",
                weather_report::current_report(&conditions)
            )),
            Err(e) => Reply::text(format!("Location saved. {}", failure_text(&e))),
        }
    }

    async fn handle_callback(
        &self,
        chat_id: ChatId,
        message_id: Option<i64>,
        callback_id: &str,
        data: &str,
    ) -> Result<(), ApplicationError> {
        match data {
            NOTIFY_ON | NOTIFY_OFF => {
                let toast = self.set_notifications(chat_id, data == NOTIFY_ON).await;
                self.messenger.answer_callback(callback_id, &toast).await?;
                if let Some(message_id) = message_id {
                    // Best effort, the toggle is already applied
                    if let Err(e) = self.messenger.clear_buttons(chat_id, message_id).await {
                        debug!(error = %e, "Could not clear notification buttons");
                    }
                }
                Ok(())
            },
            BACK_TO_DAYS => {
                let reply = self.forecast(chat_id, None).await;
                self.show_in_place(chat_id, message_id, callback_id, reply)
                    .await
            },
            other => match other.strip_prefix(DAY_PREFIX) {
                Some(day) => {
                    let reply = self.forecast(chat_id, Some(day)).await;
                    self.show_in_place(chat_id, message_id, callback_id, reply)
                        .await
                },
                None => {
                    warn!(data = other, "Unknown callback data");
                    self.messenger
                        .answer_callback(callback_id, "Unknown action")
                        .await
                },
            },
        }
    }

    /// Acknowledge a button press and show `reply` in the pressed message
    async fn show_in_place(
        &self,
        chat_id: ChatId,
        message_id: Option<i64>,
        callback_id: &str,
        reply: Reply,
    ) -> Result<(), ApplicationError> {
        self.messenger.answer_callback(callback_id, "").await?;
        let buttons = match reply.keyboard {
            Keyboard::Buttons(buttons) => buttons,
            Keyboard::Empty | Keyboard::Menu(_) => Vec::new(),
        };
        match message_id {
            Some(message_id) => {
                self.messenger
                    .edit_message(chat_id, message_id, &reply.text, buttons)
                    .await
            },
            None => {
                self.send(chat_id, Reply::with_buttons(reply.text, buttons))
                    .await
            },
        }
    }

    async fn weather_for_city(&self, chat_id: ChatId, city: &str) -> Reply {
        let place = match self.weather.resolve_city(city).await {
            Ok(place) => place,
            Err(e) => return Reply::text(failure_text(&e)),
        };
        self.registry
            .set_city_location(chat_id, &place.name, place.location);
        self.persist().await;

        match self.weather.current_conditions(&place.location).await {
            Ok(conditions) => Reply::text(weather_report::current_report(&conditions)),
            Err(e) => Reply::text(failure_text(&e)),
        }
    }

    async fn weather_at_saved_location(&self, chat_id: ChatId) -> Reply {
        let Some(location) = self.saved_location(chat_id) else {
            return Reply::text(NO_LOCATION_TEXT);
        };
        match self.weather.current_conditions(&location).await {
            Ok(conditions) => Reply::text(weather_report::current_report(&conditions)),
            Err(e) => Reply::text(failure_text(&e)),
        }
    }

    async fn forecast(&self, chat_id: ChatId, day: Option<&str>) -> Reply {
        let Some(location) = self.saved_location(chat_id) else {
            return Reply::text(NO_LOCATION_TEXT);
        };
        let day = match day.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d")).transpose() {
            Ok(day) => day,
            Err(_) => return Reply::text("Dates look like 2025-06-01. Try /forecast YYYY-MM-DD."),
        };

        match self.weather.forecast(&location).await {
            Ok(entries) => match day {
                Some(day) => Reply::with_buttons(
                    weather_report::day_details(day, &entries),
                    vec![InlineButton::new("⬅️ Back", BACK_TO_DAYS)],
                ),
                None => Reply::with_buttons(
                    weather_report::forecast_overview(&entries),
                    day_buttons(&entries),
                ),
            },
            Err(e) => Reply::text(failure_text(&e)),
        }
    }

    async fn compare(&self, args: &str) -> Reply {
        let cities: Vec<&str> = args
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect();
        if cities.len() != 2 {
            return Reply::text(
                "Give exactly two cities separated by a comma, e.g. /compare Moscow, Saint Petersburg",
            );
        }

        let mut rows = Vec::with_capacity(cities.len());
        for city in cities {
            rows.push((city.to_string(), self.city_conditions(city).await));
        }
        Reply::text(weather_report::comparison_table(&rows))
    }

    async fn city_conditions(&self, city: &str) -> Option<CurrentConditions> {
        let place = self
            .weather
            .resolve_city(city)
            .await
            .inspect_err(|e| debug!(city, error = %e, "City lookup failed"))
            .ok()?;
        self.weather
            .current_conditions(&place.location)
            .await
            .inspect_err(|e| debug!(city, error = %e, "Conditions lookup failed"))
            .ok()
    }

    async fn air(&self, chat_id: ChatId, city: Option<&str>) -> Reply {
        let location = match city {
            Some(city) => match self.weather.resolve_city(city).await {
                Ok(place) => place.location,
                Err(e) => return Reply::text(failure_text(&e)),
            },
            None => match self.saved_location(chat_id) {
                Some(location) => location,
                None => return Reply::text("No data: give a city or share your location first."),
            },
        };

        let conditions = match self.weather.current_conditions(&location).await {
            Ok(conditions) => conditions,
            Err(e) => return Reply::text(failure_text(&e)),
        };
        let air = match self.weather.air_pollution(&location).await {
            Ok(readings) => AirQualityReport::analyze(&readings),
            Err(e) => {
                warn!(error = %e, "Air pollution unavailable");
                None
            },
        };
        Reply::text(weather_report::extended_report(&conditions, air.as_ref()))
    }

    fn notify_status(&self, chat_id: ChatId) -> Reply {
        let record = self.registry.get_or_create(chat_id);
        let status = if record.notify_enabled() { "on" } else { "off" };
        Reply::with_buttons(
            format!("Notifications are {status}. Turn them on or off?"),
            vec![
                InlineButton::new("Enable", NOTIFY_ON),
                InlineButton::new("Disable", NOTIFY_OFF),
            ],
        )
    }

    async fn set_notifications(&self, chat_id: ChatId, enabled: bool) -> String {
        self.registry.set_subscription(chat_id, enabled);
        info!(%chat_id, enabled, "Notification subscription changed");
        self.persist().await;

        if !enabled {
            return "Notifications disabled".to_string();
        }
        if self.saved_location(chat_id).is_none() {
            return format!("Notifications enabled. {NO_LOCATION_TEXT}");
        }
        "Notifications enabled".to_string()
    }

    fn saved_location(&self, chat_id: ChatId) -> Option<GeoLocation> {
        self.registry.get(chat_id).and_then(|r| r.location())
    }

    async fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.save(self.registry.snapshot()).await {
            warn!(error = %e, "Failed to persist user snapshot");
        }
    }

    async fn send(&self, chat_id: ChatId, reply: Reply) -> Result<(), ApplicationError> {
        match reply.keyboard {
            Keyboard::Buttons(buttons) if !buttons.is_empty() => {
                self.messenger
                    .send_with_buttons(chat_id, &reply.text, buttons)
                    .await
            },
            Keyboard::Menu(menu) if !menu.is_empty() => {
                self.messenger
                    .send_with_menu(chat_id, &reply.text, menu)
                    .await
            },
            _ => self.messenger.send_text(chat_id, &reply.text).await,
        }
    }
}

fn main_menu() -> Vec<MenuButton> {
    vec![
        MenuButton::location(SHARE_LOCATION_LABEL),
        MenuButton::text("/weather"),
        MenuButton::text("/forecast"),
        MenuButton::text("/notify"),
        MenuButton::text("/air"),
        MenuButton::text("/help"),
    ]
}

/// One `day:YYYY-MM-DD` button per forecast day shown in the overview
fn day_buttons(entries: &[ForecastEntry]) -> Vec<InlineButton> {
    weather_report::group_by_day(entries)
        .keys()
        .take(FORECAST_DAYS)
        .map(|day| {
            InlineButton::new(
                day.format("%a %d.%m").to_string(),
                format!("{DAY_PREFIX}{}", day.format("%Y-%m-%d")),
            )
        })
        .collect()
}

fn failure_text(error: &ApplicationError) -> String {
    match error {
        ApplicationError::LocationNotFound(place) => {
            format!("I couldn't find \"{place}\". Check the spelling and try again.")
        },
        e if e.is_provider_failure() => {
            "Couldn't get the weather right now. Please try again later.".to_string()
        },
        _ => "Something went wrong. Please try again later.".to_string(),
    }
}
