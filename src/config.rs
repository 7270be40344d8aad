use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::ValueEnum;
use reqwest::Method;
use thiserror::Error;

pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
    #[error("MIN_DELAY ({min:?}) must not exceed MAX_DELAY ({max:?})")]
    DelayRange { min: Duration, max: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Testing,
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" | "default" => Ok(Profile::Development),
            "production" | "prod" => Ok(Profile::Production),
            "testing" | "test" => Ok(Profile::Testing),
            other => Err(ConfigError::Invalid {
                key: "APP_ENV".to_string(),
                value: other.to_string(),
                reason: "expected development, production or testing".to_string(),
            }),
        }
    }
}

/// Retry behaviour of the shared fetch client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Retries after the first attempt.
    pub total_retries: u32,
    /// Base of the exponential backoff: `backoff_factor * 2^(retry - 1)`.
    pub backoff_factor: Duration,
    pub retryable_status_codes: HashSet<u16>,
    pub retryable_methods: HashSet<Method>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            total_retries: 3,
            backoff_factor: Duration::from_secs(1),
            retryable_status_codes: HashSet::from([429, 500, 502, 503, 504]),
            retryable_methods: HashSet::from([Method::HEAD, Method::GET, Method::OPTIONS]),
        }
    }
}

/// Per-URL politeness delay and request timeout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckerConfig {
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub timeout: Duration,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        CheckerConfig {
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(2),
            timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub client: ClientConfig,
    pub checker: CheckerConfig,
    pub max_workers: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            client: ClientConfig::default(),
            checker: CheckerConfig::default(),
            max_workers: 3,
        }
    }
}

impl SearchConfig {
    /// No delays, no backoff. Handy for tests against local mock servers.
    pub fn immediate(max_workers: usize) -> Self {
        SearchConfig {
            client: ClientConfig {
                backoff_factor: Duration::ZERO,
                ..ClientConfig::default()
            },
            checker: CheckerConfig {
                min_delay: Duration::ZERO,
                max_delay: Duration::ZERO,
                timeout: Duration::from_secs(5),
            },
            max_workers,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SheetConfig {
    pub spreadsheet_id: Option<String>,
    pub access_token: Option<String>,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub profile: Profile,
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub sheet: SheetConfig,
    pub search: SearchConfig,
}

impl Config {
    /// Load configuration from the process environment (and `.env` if present).
    pub fn from_env(profile: Option<Profile>) -> Result<Config, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(profile, |key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(profile: Option<Profile>, lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let profile = match profile {
            Some(p) => p,
            None => match lookup("APP_ENV") {
                Some(v) => v.parse()?,
                None => Profile::default(),
            },
        };

        let (timeout_default, workers_default) = match profile {
            Profile::Production => (30.0, 2),
            Profile::Development | Profile::Testing => (15.0, 3),
        };
        let (min_delay_default, max_delay_default, backoff_default) = match profile {
            Profile::Testing => (0.0, 0.0, 0.0),
            Profile::Development | Profile::Production => (0.5, 2.0, 1.0),
        };

        let checker = CheckerConfig {
            min_delay: get_secs(&lookup, "MIN_DELAY", min_delay_default)?,
            max_delay: get_secs(&lookup, "MAX_DELAY", max_delay_default)?,
            timeout: get_secs(&lookup, "REQUEST_TIMEOUT", timeout_default)?,
        };
        if checker.min_delay > checker.max_delay {
            return Err(ConfigError::DelayRange {
                min: checker.min_delay,
                max: checker.max_delay,
            });
        }

        let client = ClientConfig {
            total_retries: get_parsed(&lookup, "HTTP_RETRIES", 3)?,
            backoff_factor: get_secs(&lookup, "BACKOFF_FACTOR", backoff_default)?,
            ..ClientConfig::default()
        };

        Ok(Config {
            profile,
            host: get_or_default(&lookup, "HOST", "0.0.0.0"),
            port: get_parsed(&lookup, "PORT", 5000)?,
            static_dir: PathBuf::from(get_or_default(&lookup, "STATIC_DIR", "static")),
            sheet: SheetConfig {
                spreadsheet_id: get_non_empty(&lookup, "SPREADSHEET_ID"),
                access_token: get_non_empty(&lookup, "GOOGLE_SHEETS_ACCESS_TOKEN"),
                api_base: get_or_default(&lookup, "SHEETS_API_BASE", DEFAULT_SHEETS_API_BASE),
            },
            search: SearchConfig {
                client,
                checker,
                max_workers: get_parsed(&lookup, "MAX_WORKERS", workers_default)?,
            },
        })
    }
}

fn get_non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn get_or_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    get_non_empty(lookup, key).unwrap_or_else(|| default.to_string())
}

fn get_parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_non_empty(lookup, key) {
        Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::Invalid {
            key: key.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn get_secs<F>(lookup: &F, key: &str, default: f64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: f64 = get_parsed(lookup, key, default)?;
    Duration::try_from_secs_f64(secs).map_err(|e| ConfigError::Invalid {
        key: key.to_string(),
        value: secs.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_development_defaults() {
        let config = Config::from_lookup(None, lookup_from(&[])).unwrap();
        assert_eq!(config.profile, Profile::Development);
        assert_eq!(config.port, 5000);
        assert_eq!(config.search.max_workers, 3);
        assert_eq!(config.search.checker.timeout, Duration::from_secs(15));
        assert_eq!(config.search.checker.min_delay, Duration::from_millis(500));
        assert_eq!(config.search.checker.max_delay, Duration::from_secs(2));
        assert_eq!(config.search.client.total_retries, 3);
        assert!(config.search.client.retryable_status_codes.contains(&503));
        assert!(config.sheet.access_token.is_none());
        assert_eq!(config.sheet.api_base, DEFAULT_SHEETS_API_BASE);
    }

    #[test]
    fn test_production_profile_is_conservative() {
        let config = Config::from_lookup(None, lookup_from(&[("APP_ENV", "production")])).unwrap();
        assert_eq!(config.profile, Profile::Production);
        assert_eq!(config.search.max_workers, 2);
        assert_eq!(config.search.checker.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_testing_profile_has_no_delays() {
        let config = Config::from_lookup(Some(Profile::Testing), lookup_from(&[])).unwrap();
        assert_eq!(config.search.checker.min_delay, Duration::ZERO);
        assert_eq!(config.search.checker.max_delay, Duration::ZERO);
        assert_eq!(config.search.client.backoff_factor, Duration::ZERO);
    }

    #[test]
    fn test_explicit_profile_wins_over_env() {
        let config = Config::from_lookup(
            Some(Profile::Testing),
            lookup_from(&[("APP_ENV", "production")]),
        )
        .unwrap();
        assert_eq!(config.profile, Profile::Testing);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(
            None,
            lookup_from(&[
                ("MAX_WORKERS", "8"),
                ("REQUEST_TIMEOUT", "2.5"),
                ("MIN_DELAY", "0"),
                ("MAX_DELAY", "0.25"),
                ("SPREADSHEET_ID", " sheet-1 "),
                ("GOOGLE_SHEETS_ACCESS_TOKEN", ""),
            ]),
        )
        .unwrap();
        assert_eq!(config.search.max_workers, 8);
        assert_eq!(config.search.checker.timeout, Duration::from_millis(2500));
        assert_eq!(config.search.checker.max_delay, Duration::from_millis(250));
        assert_eq!(config.sheet.spreadsheet_id.as_deref(), Some("sheet-1"));
        assert!(config.sheet.access_token.is_none());
    }

    #[test]
    fn test_invalid_number_names_the_key() {
        let err = Config::from_lookup(None, lookup_from(&[("MAX_WORKERS", "lots")])).unwrap_err();
        match err {
            ConfigError::Invalid { key, value, .. } => {
                assert_eq!(key, "MAX_WORKERS");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_negative_delay_rejected() {
        let err = Config::from_lookup(None, lookup_from(&[("MIN_DELAY", "-1")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_inverted_delay_range_rejected() {
        let err = Config::from_lookup(
            None,
            lookup_from(&[("MIN_DELAY", "3"), ("MAX_DELAY", "1")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DelayRange { .. }));
    }

    #[test]
    fn test_unknown_profile() {
        assert!("staging".parse::<Profile>().is_err());
        assert_eq!("PROD".parse::<Profile>().unwrap(), Profile::Production);
    }
}
