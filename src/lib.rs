pub mod calendar;
pub mod client;
pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod paths;
pub mod session;
pub mod state;
pub mod sync;

#[cfg(feature = "tui")]
pub mod tui;
