//! Limiter configuration.
//!
//! A limiter is described by a refill window and the number of submissions
//! admitted per window. Both are fixed at construction and validated up front:
//! an invalid configuration never exists as a value.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Error returned when limiter configuration validation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Capacity must be greater than zero
    #[error("capacity must be greater than 0")]
    ZeroCapacity,
    /// Custom window duration must be greater than zero
    #[error("window duration must be greater than 0")]
    ZeroWindow,
}

/// Period after which tokens are replenished to full capacity.
///
/// Deserializes from `"second"`, `"minute"`, `"hour"`, `"day"` or
/// `{"custom": {"secs": 5, "nanos": 0}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    /// One second
    Second,
    /// One minute
    Minute,
    /// One hour
    Hour,
    /// One day
    Day,
    /// Arbitrary non-zero duration
    Custom(Duration),
}

impl Window {
    /// Length of the window.
    pub fn as_duration(&self) -> Duration {
        match self {
            Window::Second => Duration::from_secs(1),
            Window::Minute => Duration::from_secs(60),
            Window::Hour => Duration::from_secs(60 * 60),
            Window::Day => Duration::from_secs(24 * 60 * 60),
            Window::Custom(duration) => *duration,
        }
    }
}

impl From<Duration> for Window {
    fn from(duration: Duration) -> Self {
        Window::Custom(duration)
    }
}

/// Immutable limiter configuration: at most `capacity` dispatches per `window`.
///
/// # Example
/// ```
/// use doc_throttle::{RateLimiterConfig, Window};
///
/// let config = RateLimiterConfig::new(Window::Minute, 10).unwrap();
/// assert_eq!(config.capacity(), 10);
///
/// assert!(RateLimiterConfig::new(Window::Second, 0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawConfig", into = "RawConfig")]
pub struct RateLimiterConfig {
    window: Window,
    capacity: u32,
}

impl RateLimiterConfig {
    /// Create a validated configuration.
    ///
    /// # Errors
    /// Returns `ConfigError::ZeroCapacity` if `capacity` is zero, or
    /// `ConfigError::ZeroWindow` if a custom window has zero length.
    pub fn new(window: Window, capacity: u32) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if window.as_duration().is_zero() {
            return Err(ConfigError::ZeroWindow);
        }
        Ok(Self { window, capacity })
    }

    /// `capacity` dispatches per second.
    pub fn per_second(capacity: u32) -> Result<Self, ConfigError> {
        Self::new(Window::Second, capacity)
    }

    /// `capacity` dispatches per minute.
    pub fn per_minute(capacity: u32) -> Result<Self, ConfigError> {
        Self::new(Window::Minute, capacity)
    }

    /// `capacity` dispatches per hour.
    pub fn per_hour(capacity: u32) -> Result<Self, ConfigError> {
        Self::new(Window::Hour, capacity)
    }

    /// The refill window.
    pub fn window(&self) -> Window {
        self.window
    }

    /// Tokens granted at every refill.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Refill period as a `Duration`.
    pub fn period(&self) -> Duration {
        self.window.as_duration()
    }
}

#[derive(Serialize, Deserialize)]
struct RawConfig {
    window: Window,
    capacity: u32,
}

impl TryFrom<RawConfig> for RateLimiterConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        Self::new(raw.window, raw.capacity)
    }
}

impl From<RateLimiterConfig> for RawConfig {
    fn from(config: RateLimiterConfig) -> Self {
        Self {
            window: config.window,
            capacity: config.capacity,
        }
    }
}
