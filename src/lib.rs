pub mod config;
pub mod dashboard;
pub mod feeds;
pub mod models;
pub mod signals;
pub mod telemetry;
