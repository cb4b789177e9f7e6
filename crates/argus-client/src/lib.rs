pub mod chrome;
pub mod health;
pub mod locator;

pub use chrome::{ChromeConfig, ChromePage, ChromeSession};
pub use health::wait_for_server;
