pub mod config;
pub mod logging;

pub mod api;
pub mod control;
pub mod coordinator;
pub mod error;
pub mod progress;
pub mod transport;
