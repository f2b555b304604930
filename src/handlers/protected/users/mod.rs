// handlers/protected/users/mod.rs - Profile self-service

mod me;
mod password;
mod stats;

pub use me::{me_delete, me_get, me_update};
pub use password::change_password;
pub use stats::stats;
