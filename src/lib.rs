pub mod config;
pub mod connection;
pub mod error;
pub mod kickstand;
pub mod logging;
pub mod metrics;
pub mod session;
pub mod status;
pub mod telemetry;
pub mod utils;

pub use kickstand::Kickstand;
