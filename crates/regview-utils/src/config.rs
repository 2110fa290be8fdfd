//! # View Configuration
//!
//! Display and input settings for the register view, read from the
//! environment with defaults. Command-line flags override individual values
//! after loading.
//!
//! ## Environment Variables
//!
//! - `REGVIEW_CHANGED_COLOR`: color for registers changed since the last step (default: `red`)
//! - `REGVIEW_HEX_CASE`: `lower` or `upper` (default: `lower`)
//! - `REGVIEW_TICK_MS`: UI tick interval in milliseconds (default: `250`)
//! - `REGVIEW_DOUBLE_CLICK_MS`: maximum interval between the two presses of a double click (default: `400`)

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Case used when rendering hexadecimal register text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HexCase
{
    #[default]
    Lower,
    Upper,
}

impl FromStr for HexCase
{
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "lower" | "lowercase" => Ok(HexCase::Lower),
            "upper" | "uppercase" => Ok(HexCase::Upper),
            _ => Err(ConfigError::InvalidValue {
                key: "REGVIEW_HEX_CASE",
                value: s.to_string(),
                reason: "expected 'lower' or 'upper'".to_string(),
            }),
        }
    }
}

/// Register view settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewConfig
{
    /// Color name for changed registers; parsed by the UI
    pub changed_color: String,
    pub hex_case: HexCase,
    pub tick_rate: Duration,
    pub double_click: Duration,
}

impl Default for ViewConfig
{
    fn default() -> Self
    {
        Self {
            changed_color: "red".to_string(),
            hex_case: HexCase::Lower,
            tick_rate: Duration::from_millis(250),
            double_click: Duration::from_millis(400),
        }
    }
}

impl ViewConfig
{
    /// Load settings from the process environment
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable is set but cannot
    /// be parsed. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError>
    {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup
    ///
    /// ## Example
    ///
    /// ```rust
    /// use regview_utils::config::{HexCase, ViewConfig};
    ///
    /// let config = ViewConfig::from_lookup(|key| match key {
    ///     "REGVIEW_HEX_CASE" => Some("upper".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    /// assert_eq!(config.hex_case, HexCase::Upper);
    /// assert_eq!(config.changed_color, "red");
    /// ```
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(color) = lookup("REGVIEW_CHANGED_COLOR") {
            let color = color.trim();
            if color.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "REGVIEW_CHANGED_COLOR",
                    value: String::new(),
                    reason: "color name is empty".to_string(),
                });
            }
            config.changed_color = color.to_string();
        }
        if let Some(case) = lookup("REGVIEW_HEX_CASE") {
            config.hex_case = case.parse()?;
        }
        if let Some(ms) = lookup("REGVIEW_TICK_MS") {
            config.tick_rate = parse_millis("REGVIEW_TICK_MS", &ms)?;
        }
        if let Some(ms) = lookup("REGVIEW_DOUBLE_CLICK_MS") {
            config.double_click = parse_millis("REGVIEW_DOUBLE_CLICK_MS", &ms)?;
        }

        tracing::debug!(?config, "Loaded view configuration");
        Ok(config)
    }
}

fn parse_millis(key: &'static str, value: &str) -> Result<Duration, ConfigError>
{
    let invalid = |reason: &str| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    };
    let ms: u64 = value.trim().parse().map_err(|_| invalid("expected milliseconds"))?;
    if ms == 0 {
        return Err(invalid("interval must be non-zero"));
    }
    Ok(Duration::from_millis(ms))
}

/// Configuration error
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError
{
    /// An environment variable holds a value that cannot be used
    #[error("Invalid value {value:?} for {key}: {reason}")]
    InvalidValue
    {
        key: &'static str,
        value: String,
        reason: String,
    },
}
