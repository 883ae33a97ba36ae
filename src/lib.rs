pub mod alerts;
pub mod api;
pub mod config;
pub mod device;
pub mod error;
pub mod export;
pub mod models;
pub mod monitor;
pub mod reading_store;
pub mod schedule;
pub mod status;
pub mod threshold;
