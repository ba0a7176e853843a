//! Bike price API: session-gated price queries over a listing collection

pub mod config;
pub mod http_server;
pub mod session;
pub mod store;
pub mod utils;

pub use config::Config;
