//! In-memory registry of user records
//!
//! Shared between chat handling and the notification tick. Every read-modify
//! of a record happens under a single lock acquisition and the lock is never
//! held across an `.await`.

use std::collections::HashMap;

use domain::entities::UserRecord;
use domain::value_objects::{ChatId, GeoLocation};
use parking_lot::Mutex;
use tracing::warn;

use crate::ports::UserSnapshot;

/// A subscribed user with a saved location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchedUser {
    pub chat_id: ChatId,
    pub location: GeoLocation,
}

/// Registry of all users known to this process
#[derive(Debug, Default)]
pub struct UserRegistry {
    users: Mutex<HashMap<ChatId, UserRecord>>,
}

impl UserRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the registry from persisted snapshots
    ///
    /// Snapshots with out-of-range coordinates keep their subscription but
    /// lose the location.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<UserSnapshot>) -> Self {
        let users = snapshots
            .into_iter()
            .map(|snapshot| {
                let location = match (snapshot.latitude, snapshot.longitude) {
                    (Some(lat), Some(lon)) => GeoLocation::new(lat, lon)
                        .inspect_err(|e| {
                            warn!(chat_id = %snapshot.chat_id, error = %e, "Dropping invalid saved location");
                        })
                        .ok(),
                    _ => None,
                };
                let record = UserRecord::restore(
                    snapshot.chat_id,
                    location,
                    snapshot.city,
                    snapshot.notify_enabled,
                );
                (snapshot.chat_id, record)
            })
            .collect();

        Self {
            users: Mutex::new(users),
        }
    }

    /// Number of known users
    pub fn len(&self) -> usize {
        self.users.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.lock().is_empty()
    }

    /// Copy of a user's record, creating it on first contact
    pub fn get_or_create(&self, chat_id: ChatId) -> UserRecord {
        self.users
            .lock()
            .entry(chat_id)
            .or_insert_with(|| UserRecord::new(chat_id))
            .clone()
    }

    /// Copy of a user's record, if known
    pub fn get(&self, chat_id: ChatId) -> Option<UserRecord> {
        self.users.lock().get(&chat_id).cloned()
    }

    /// Save a shared geolocation
    pub fn set_location(&self, chat_id: ChatId, location: GeoLocation) {
        self.upsert(chat_id, |record| record.set_location(location));
    }

    /// Save a location resolved from a city name
    pub fn set_city_location(&self, chat_id: ChatId, city: &str, location: GeoLocation) {
        self.upsert(chat_id, |record| record.set_city_location(city, location));
    }

    /// Turn periodic notifications on or off
    pub fn set_subscription(&self, chat_id: ChatId, enabled: bool) {
        self.upsert(chat_id, |record| record.set_notify_enabled(enabled));
    }

    /// Mutate an existing record under the lock
    ///
    /// Returns `None` if the user is unknown.
    pub fn with_record<R>(&self, chat_id: ChatId, f: impl FnOnce(&mut UserRecord) -> R) -> Option<R> {
        self.users.lock().get_mut(&chat_id).map(f)
    }

    /// Subscribed users with a location, ordered by chat id
    pub fn watched_users(&self) -> Vec<WatchedUser> {
        let mut watched: Vec<WatchedUser> = self
            .users
            .lock()
            .values()
            .filter_map(|record| {
                record.watched_location().map(|location| WatchedUser {
                    chat_id: record.chat_id(),
                    location,
                })
            })
            .collect();
        watched.sort_by_key(|user| user.chat_id);
        watched
    }

    /// Durable part of every record, ordered by chat id
    pub fn snapshot(&self) -> Vec<UserSnapshot> {
        let mut snapshots: Vec<UserSnapshot> = self
            .users
            .lock()
            .values()
            .map(|record| UserSnapshot {
                chat_id: record.chat_id(),
                city: record.city().map(ToOwned::to_owned),
                latitude: record.location().map(|l| l.latitude()),
                longitude: record.location().map(|l| l.longitude()),
                notify_enabled: record.notify_enabled(),
            })
            .collect();
        snapshots.sort_by_key(|s| s.chat_id);
        snapshots
    }

    fn upsert(&self, chat_id: ChatId, f: impl FnOnce(&mut UserRecord)) {
        let mut users = self.users.lock();
        f(users.entry(chat_id).or_insert_with(|| UserRecord::new(chat_id)));
    }
}
