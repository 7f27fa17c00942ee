//! Service Configuration Module
//!
//! ## Loading Order
//!
//! 1. `FORECAST_VOLUMES_CONFIG` environment variable (path to TOML file)
//! 2. `forecast_volumes.toml` in the current working directory
//! 3. Built-in defaults
//!
//! `FORECAST_SERVER_ADDR` and `FORECAST_DAILY_YEAR_LIMIT` are applied on top.
//!
//! The `[volumes]` section is held in an [`arc_swap::ArcSwap`] by the
//! service and can be swapped at runtime; the rest is read once at startup.

mod service_config;
pub mod defaults;

pub use service_config::*;
