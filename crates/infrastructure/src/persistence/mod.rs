//! Persistence module
//!
//! JSON snapshot storage for user locations and subscriptions.

mod json_user_store;

pub use json_user_store::JsonUserStore;
