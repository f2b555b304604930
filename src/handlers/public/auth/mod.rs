// handlers/public/auth/mod.rs - Account creation and token lifecycle

mod login;
mod logout;
mod refresh;
mod register;

pub use login::login;
pub use logout::logout;
pub use refresh::refresh;
pub use register::register;
