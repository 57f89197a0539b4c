//! Headless browser implementations.

mod chrome;

pub use chrome::{find_chrome_binary, ChromeLauncher, ChromeSession, DEFAULT_USER_AGENT};
