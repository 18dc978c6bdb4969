//! Runtime configuration loaded from `TAKATRACK_*` environment variables.

use std::env::VarError;
use std::path::PathBuf;
use std::time::Duration;

use crate::bounds::BoundsSettings;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
/// Errors raised while reading configuration.
pub enum ConfigError {
    /// A variable is present but its value is unusable.
    #[error("Invalid value for {var}: {reason}")]
    InvalidEnvVar {
        /// Offending variable name.
        var: String,
        /// What is wrong with it.
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
/// Settings for the sync engine, the scheduler, and the HTTP source.
pub struct SyncConfig {
    /// Base URL of the bin registry.
    pub source_url: String,
    /// Path of the entity-list endpoint, appended to `source_url`.
    pub source_path: String,
    /// Time between cycle starts.
    pub refresh_interval: Duration,
    /// Per-request timeout for the fetch.
    pub fetch_timeout: Duration,
    /// Viewport padding and minimum span.
    pub bounds: BoundsSettings,
    /// User agent sent to the registry.
    pub user_agent: String,
    /// Fallback tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Where the terminal UI writes its log.
    pub log_file: PathBuf,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source_url: String::from("http://localhost:5000"),
            source_path: String::from("/bins"),
            refresh_interval: Duration::from_secs(15),
            fetch_timeout: Duration::from_secs(10),
            bounds: BoundsSettings::default(),
            user_agent: String::from("takatrack/0.1"),
            log_level: String::from("info"),
            log_file: PathBuf::from("takatrack.log"),
        }
    }
}

impl SyncConfig {
    /// Full URL of the entity-list endpoint.
    #[must_use]
    pub fn endpoint(&self) -> String {
        let base = self.source_url.trim_end_matches('/');
        let path = self.source_path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

/// Load configuration, reading a `.env` file first when one exists.
///
/// # Errors
///
/// Returns [`ConfigError`] if a variable holds an invalid value.
pub fn load_config() -> Result<SyncConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_config(|key| std::env::var(key))
}

/// Build configuration from an arbitrary variable lookup.
///
/// Unset variables take their defaults.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for the first variable that fails to parse
/// or is out of range.
pub fn build_config<F>(lookup: F) -> Result<SyncConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let defaults = SyncConfig::default();

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_owned())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_owned(),
        reason,
    };

    let parse_secs = |var: &str, default: Duration| -> Result<Duration, ConfigError> {
        let Ok(raw) = lookup(var) else {
            return Ok(default);
        };
        let secs = raw
            .trim()
            .parse::<u64>()
            .map_err(|err| invalid(var, err.to_string()))?;
        if secs == 0 {
            return Err(invalid(var, String::from("must be greater than zero")));
        }
        Ok(Duration::from_secs(secs))
    };

    let parse_f64 = |var: &str, default: f64| -> Result<f64, ConfigError> {
        let Ok(raw) = lookup(var) else {
            return Ok(default);
        };
        let value = raw
            .trim()
            .parse::<f64>()
            .map_err(|err| invalid(var, err.to_string()))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(invalid(var, String::from("must be a finite number")))
        }
    };

    let source_url = or_default("TAKATRACK_SOURCE_URL", &defaults.source_url);
    if !(source_url.starts_with("http://") || source_url.starts_with("https://")) {
        return Err(invalid(
            "TAKATRACK_SOURCE_URL",
            String::from("must start with http:// or https://"),
        ));
    }

    let padding = parse_f64("TAKATRACK_VIEWPORT_PADDING", defaults.bounds.padding)?;
    if padding < 0.0 {
        return Err(invalid(
            "TAKATRACK_VIEWPORT_PADDING",
            String::from("must not be negative"),
        ));
    }

    let min_span = parse_f64("TAKATRACK_MIN_SPAN", defaults.bounds.min_span)?;
    if min_span <= 0.0 {
        return Err(invalid(
            "TAKATRACK_MIN_SPAN",
            String::from("must be greater than zero"),
        ));
    }

    Ok(SyncConfig {
        source_url,
        source_path: or_default("TAKATRACK_SOURCE_PATH", &defaults.source_path),
        refresh_interval: parse_secs("TAKATRACK_REFRESH_SECS", defaults.refresh_interval)?,
        fetch_timeout: parse_secs("TAKATRACK_FETCH_TIMEOUT_SECS", defaults.fetch_timeout)?,
        bounds: BoundsSettings { padding, min_span },
        user_agent: or_default("TAKATRACK_USER_AGENT", &defaults.user_agent),
        log_level: or_default("TAKATRACK_LOG_LEVEL", &defaults.log_level),
        log_file: lookup("TAKATRACK_LOG_FILE").map_or(defaults.log_file, PathBuf::from),
    })
}
