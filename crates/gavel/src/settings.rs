//! Server settings read from the environment.
//!
//! | variable | meaning | default |
//! |---|---|---|
//! | `GAVEL_BIND` | listen address | `0.0.0.0:8080` |
//! | `GAVEL_CATALOG` | path to a JSON player catalog | built-in list |
//! | `GAVEL_COUNTDOWN_SECS` | seconds per bidding window | 30 |
//! | `GAVEL_FINALIZE` | `scheduled` or `lazy` | `scheduled` |
//! | `GAVEL_IDLE_TIMEOUT_SECS` | drop silent connections after | 60 |
//! | `GAVEL_ROOM_LINGER_SECS` | keep ended rooms readable for | 600 |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use gavel_auction::{AuctionConfig, FinalizeMode};

pub const ENV_BIND: &str = "GAVEL_BIND";
pub const ENV_CATALOG: &str = "GAVEL_CATALOG";
pub const ENV_COUNTDOWN: &str = "GAVEL_COUNTDOWN_SECS";
pub const ENV_FINALIZE: &str = "GAVEL_FINALIZE";
pub const ENV_IDLE_TIMEOUT: &str = "GAVEL_IDLE_TIMEOUT_SECS";
pub const ENV_ROOM_LINGER: &str = "GAVEL_ROOM_LINGER_SECS";

/// A variable was set to something unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{var}={value:?}: {reason}")]
pub struct SettingsError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub bind_addr: String,
    pub catalog_path: Option<PathBuf>,
    pub countdown_secs: Option<u32>,
    pub finalize_mode: Option<FinalizeMode>,
    pub idle_timeout: Duration,
    pub room_linger_secs: Option<u32>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            catalog_path: None,
            countdown_secs: None,
            finalize_mode: None,
            idle_timeout: Duration::from_secs(60),
            room_linger_secs: None,
        }
    }
}

impl ServerSettings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads settings through `lookup`; unset or blank variables keep their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut settings = Self::default();

        if let Some(bind) = get(ENV_BIND) {
            settings.bind_addr = bind.trim().to_owned();
        }
        settings.catalog_path = get(ENV_CATALOG).map(PathBuf::from);
        settings.countdown_secs = get(ENV_COUNTDOWN)
            .map(|v| parse_number(ENV_COUNTDOWN, &v))
            .transpose()?;
        settings.finalize_mode = get(ENV_FINALIZE)
            .map(|v| parse_finalize_mode(&v))
            .transpose()?;
        if let Some(v) = get(ENV_IDLE_TIMEOUT) {
            let secs: u64 = parse_number(ENV_IDLE_TIMEOUT, &v)?;
            if secs == 0 {
                return Err(SettingsError {
                    var: ENV_IDLE_TIMEOUT,
                    value: v,
                    reason: "must be at least 1".into(),
                });
            }
            settings.idle_timeout = Duration::from_secs(secs);
        }
        settings.room_linger_secs = get(ENV_ROOM_LINGER)
            .map(|v| parse_number(ENV_ROOM_LINGER, &v))
            .transpose()?;

        Ok(settings)
    }

    /// Applies the overrides in these settings on top of `base`.
    pub fn auction_config(&self, base: AuctionConfig) -> AuctionConfig {
        let mut config = base;
        if let Some(secs) = self.countdown_secs {
            config = config.with_countdown(secs);
        }
        if let Some(mode) = self.finalize_mode {
            config = config.with_finalize_mode(mode);
        }
        if let Some(secs) = self.room_linger_secs {
            config = config.with_ended_linger(secs);
        }
        config
    }
}

fn parse_number<T>(var: &'static str, value: &str) -> Result<T, SettingsError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| SettingsError {
        var,
        value: value.to_owned(),
        reason: e.to_string(),
    })
}

fn parse_finalize_mode(value: &str) -> Result<FinalizeMode, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "scheduled" => Ok(FinalizeMode::Scheduled),
        "lazy" => Ok(FinalizeMode::Lazy),
        _ => Err(SettingsError {
            var: ENV_FINALIZE,
            value: value.to_owned(),
            reason: "expected `scheduled` or `lazy`".into(),
        }),
    }
}
