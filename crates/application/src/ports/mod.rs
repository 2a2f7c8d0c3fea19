//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod messenger_port;
mod user_store;
mod weather_port;

#[cfg(test)]
pub use messenger_port::MockMessengerPort;
pub use messenger_port::{IncomingUpdate, InlineButton, MenuButton, MessengerPort, UpdateBatch};
#[cfg(test)]
pub use user_store::MockUserSnapshotStore;
pub use user_store::{UserSnapshot, UserSnapshotStore};
#[cfg(test)]
pub use weather_port::MockWeatherPort;
pub use weather_port::{
    CurrentConditions, ForecastEntry, PollutantConcentrations, ResolvedPlace, WeatherPort,
};
