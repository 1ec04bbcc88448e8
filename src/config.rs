//! config.rs — environment driven settings (`.env` merged by dotenvy in main)
use std::{str::FromStr, time::Duration};

use crate::error::{AppErr, AppResult};

pub const DEFAULT_LOG_CAPACITY: usize = 200;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr:     String,
    pub static_dir:    String,
    pub log_capacity:  usize,
    pub ping_interval: Duration,
    pub idle_timeout:  Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr:     "0.0.0.0:3000".into(),
            static_dir:    "static".into(),
            log_capacity:  DEFAULT_LOG_CAPACITY,
            ping_interval: Duration::from_secs(30),
            idle_timeout:  Duration::from_secs(90),
        }
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; unset keys keep their default.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let log_capacity = parse_or(&lookup, "SYNC_LOG_CAPACITY", d.log_capacity)?;
        if log_capacity == 0 {
            return Err(AppErr::Config("SYNC_LOG_CAPACITY must be at least 1".into()));
        }
        let ping_secs: u64 = parse_or(&lookup, "SYNC_PING_INTERVAL_SECS", d.ping_interval.as_secs())?;
        let idle_secs: u64 = parse_or(&lookup, "SYNC_IDLE_TIMEOUT_SECS", d.idle_timeout.as_secs())?;
        if ping_secs == 0 || idle_secs == 0 {
            return Err(AppErr::Config("ping interval and idle timeout must be non-zero".into()));
        }
        Ok(Self {
            bind_addr:     lookup("SYNC_BIND_ADDR").unwrap_or(d.bind_addr),
            static_dir:    lookup("SYNC_STATIC_DIR").unwrap_or(d.static_dir),
            log_capacity,
            ping_interval: Duration::from_secs(ping_secs),
            idle_timeout:  Duration::from_secs(idle_secs),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> AppResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None      => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppErr::Config(format!("{key}={raw:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn unset_keys_fall_back_to_defaults() {
        let cfg = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:3000");
        assert_eq!(cfg.log_capacity, DEFAULT_LOG_CAPACITY);
        assert_eq!(cfg.ping_interval, Duration::from_secs(30));
    }

    #[test]
    fn values_are_read_from_lookup() {
        let cfg = Config::from_lookup(lookup(&[
            ("SYNC_BIND_ADDR", "127.0.0.1:8080"),
            ("SYNC_LOG_CAPACITY", " 50 "),
            ("SYNC_IDLE_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:8080");
        assert_eq!(cfg.log_capacity, 50);
        assert_eq!(cfg.idle_timeout, Duration::from_secs(5));
    }

    #[test]
    fn garbage_is_a_config_error() {
        let err = Config::from_lookup(lookup(&[("SYNC_PING_INTERVAL_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, AppErr::Config(_)));
        for zero in ["SYNC_LOG_CAPACITY", "SYNC_PING_INTERVAL_SECS", "SYNC_IDLE_TIMEOUT_SECS"] {
            let err = Config::from_lookup(lookup(&[(zero, "0")])).unwrap_err();
            assert!(matches!(err, AppErr::Config(_)), "{zero}");
        }
    }
}
