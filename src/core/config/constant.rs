// default app settings
pub const SENTINEL_VERSION: &str = "v1";
pub const DEFAULT_APP_NAME: &str = "unknown_service";
pub const APP_NAME_ENV_KEY: &str = "SENTINEL_APP_NAME";
pub const CONF_FILE_PATH_ENV_KEY: &str = "SENTINEL_CONFIG_FILE_PATH";
pub const CONFIG_FILENAME: &str = "USE_DEFAULT_CONFIGURATION";

// default circuit settings, the same as the Hystrix command defaults
pub const DEFAULT_REQUEST_VOLUME_THRESHOLD: u64 = 20;
pub const DEFAULT_ERROR_THRESHOLD_PERCENTAGE: u32 = 50;
pub const DEFAULT_SLEEP_WINDOW_MS: u64 = 5000;
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: u32 = 10;
pub const DEFAULT_ROLLING_WINDOW_MS: u64 = 10000;

// default log settings
pub const DEFAULT_LOG_LEVEL: &str = "warn";
pub const LOG_CONFIG_FILE: &str = "testdata/config/log4rs.yaml";
