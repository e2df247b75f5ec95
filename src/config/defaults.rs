/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// HTTP defaults
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("iptv-catalog/", env!("CARGO_PKG_VERSION"));

// Probe defaults
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_MAX_CONCURRENT_PROBES: usize = 64;

// Storage defaults
pub const DEFAULT_STATE_PATH: &str = "./data/state.json";

// Catalog defaults
pub const DEFAULT_PLACEHOLDER_LOGO: &str = "https://buddytv.netlify.app/img/no-logo.png";
pub const DEFAULT_HISTORY_LIMIT: usize = 5;
