pub const DEFAULT_API_BASE_URL: &str = "https://api.guidor.fr";
pub const LOGIN_PATH: &str = "/v1/auth/login";
pub const USER_AGENT: &str = "aviation-hazards/1.0";

pub const DEFAULT_DEVICE_ID: &str = "000-000-000";
pub const DEFAULT_DEVICE_NAME: &str = "aviation-hazards";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_LOOKBACK_HOURS: u32 = 6;
pub const MAX_LOOKBACK_HOURS: u32 = 168;

pub const GEOJSON_FORMAT: &str = "geojson";
pub const GLOBAL_AREA_NAME: &str = "global";
pub const WSI_FORECAST_COUNT: u32 = 8;

pub const PROBE_STEP_SECONDS: i64 = 3600;
pub const CURRENT_HOUR_FORMAT: &str = "%Y-%m-%dT%H:00:00Z";
pub const PROBE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S+00:00";
