use std::env;
use std::time::Duration;

use shared_types::ViewportCenter;

use crate::error::ConfigError;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const DEFAULT_RADIUS_METERS: u32 = 800;
/// Downtown San José.
pub const DEFAULT_CENTER: ViewportCenter = ViewportCenter {
    long: -121.8863,
    lat: 37.3382,
};

/// Process-wide settings, resolved once at startup and handed to the engine.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub style_url: String,
    pub api_base: String,
    pub maptiler_key: Option<String>,
    pub initial_center: ViewportCenter,
    pub initial_zoom: f64,
    pub locate_zoom: f64,
    pub radius_meters: u32,
    /// Quiet period after the last move before a fetch goes out.
    pub settle_delay: Duration,
    pub pan_settle_delay: Duration,
    pub reminder_tick: Duration,
    pub request_timeout: Duration,
    /// Drop responses older than the newest one already applied.
    pub discard_stale_responses: bool,
}

impl SyncConfig {
    pub fn new(style_url: impl Into<String>) -> Self {
        Self {
            style_url: style_url.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            maptiler_key: None,
            initial_center: DEFAULT_CENTER,
            initial_zoom: 14.0,
            locate_zoom: 15.0,
            radius_meters: DEFAULT_RADIUS_METERS,
            settle_delay: Duration::from_millis(150),
            pan_settle_delay: Duration::from_millis(200),
            reminder_tick: Duration::from_secs(1),
            request_timeout: Duration::from_secs(10),
            discard_stale_responses: true,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`SyncConfig::from_env`] but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let style_url = non_blank("MAP_STYLE_URL").ok_or(ConfigError::Missing("MAP_STYLE_URL"))?;
        let mut config = Self::new(style_url.trim());

        if let Some(api_base) = non_blank("PARKING_API_BASE") {
            config.api_base = api_base.trim().trim_end_matches('/').to_string();
        }
        config.maptiler_key = non_blank("MAPTILER_KEY");
        if let Some(radius) = non_blank("PARKING_RADIUS_METERS") {
            config.radius_meters =
                radius
                    .trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                        key: "PARKING_RADIUS_METERS",
                        reason: e.to_string(),
                    })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.style_url.trim().is_empty() {
            return Err(ConfigError::Missing("MAP_STYLE_URL"));
        }
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "PARKING_API_BASE",
                reason: format!("`{}` is not an http(s) url", self.api_base),
            });
        }
        if self.radius_meters == 0 {
            return Err(ConfigError::Invalid {
                key: "PARKING_RADIUS_METERS",
                reason: "radius must be greater than zero".to_string(),
            });
        }
        if self.reminder_tick.is_zero() {
            return Err(ConfigError::Invalid {
                key: "reminder_tick",
                reason: "tick must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
