// Observer implementations registered at startup

pub mod notification_trigger;

pub use notification_trigger::*;
