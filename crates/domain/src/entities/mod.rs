//! Domain entities - Objects with identity and lifecycle

mod user_record;

pub use user_record::{RainAlertState, UserRecord};
