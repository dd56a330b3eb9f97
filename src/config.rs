//! Runtime configuration (§3A): defaults with environment-variable overrides,
//! read once at startup and then handed around as managed Rocket state.

use crate::rate_limit::RateLimitConfig;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub storage_path: String,
    pub room_cleanup_interval: Duration,
    pub room_inactive_threshold: Duration,
    pub message_history_limit: usize,
    pub rate_limit: RateLimitConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            port: 8000,
            allowed_origins: vec!["*".to_string()],
            storage_path: "data/classroom.json".to_string(),
            room_cleanup_interval: Duration::from_millis(5 * 60 * 1000),
            room_inactive_threshold: Duration::from_millis(30 * 60 * 1000),
            message_history_limit: 100,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = env::var("PORT")
            && let Ok(port) = val.parse::<u16>()
        {
            config.port = port;
        }
        if let Ok(val) = env::var("ALLOWED_ORIGINS") {
            config.allowed_origins = val.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(val) = env::var("STORAGE_PATH") {
            config.storage_path = val;
        }
        if let Ok(val) = env::var("ROOM_CLEANUP_INTERVAL_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            config.room_cleanup_interval = Duration::from_millis(ms);
        }
        if let Ok(val) = env::var("ROOM_INACTIVE_THRESHOLD_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            config.room_inactive_threshold = Duration::from_millis(ms);
        }
        if let Ok(val) = env::var("MESSAGE_HISTORY_LIMIT")
            && let Ok(n) = val.parse::<usize>()
        {
            config.message_history_limit = n;
        }

        config.rate_limit = RateLimitConfig::from_env();
        config
    }
}
