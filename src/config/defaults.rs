//! Service-wide default constants.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Config Discovery
// ============================================================================

/// Env var holding the path of the TOML config file.
pub const CONFIG_ENV_VAR: &str = "FORECAST_VOLUMES_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "forecast_volumes.toml";

/// Overrides `server.addr`.
pub const SERVER_ADDR_ENV_VAR: &str = "FORECAST_SERVER_ADDR";

/// Overrides `volumes.daily_year_limit`.
pub const YEAR_LIMIT_ENV_VAR: &str = "FORECAST_DAILY_YEAR_LIMIT";

// ============================================================================
// Server
// ============================================================================

pub const SERVER_ADDR: &str = "0.0.0.0:8080";

// ============================================================================
// Store
// ============================================================================

/// Sled database directory.
pub const STORE_PATH: &str = "./data/forecast_volumes";

// ============================================================================
// Volumes
// ============================================================================

/// Wells per page when `take` is not given.
pub const DEFAULT_TAKE: usize = 25;

/// Largest accepted `take`.
pub const MAX_TAKE: usize = 200;
