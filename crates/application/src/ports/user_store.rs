//! User snapshot store port
//!
//! Persists the durable part of each user record so locations and
//! subscriptions survive a restart.

use async_trait::async_trait;
use domain::value_objects::ChatId;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;

/// Flat, persisted view of one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub chat_id: ChatId,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub notify_enabled: bool,
}

/// Port for loading and saving user snapshots
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserSnapshotStore: Send + Sync {
    /// Load all persisted users; an absent store yields an empty list
    async fn load(&self) -> Result<Vec<UserSnapshot>, ApplicationError>;

    /// Replace the persisted users with `users`
    async fn save(&self, users: Vec<UserSnapshot>) -> Result<(), ApplicationError>;
}
