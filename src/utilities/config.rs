use std::fmt;
use std::time::Duration;

use url::Url;

use crate::handler::StalePolicy;

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/predict";
const DEFAULT_LOG_FILE: &str = ".log";

pub struct Config {
    pub endpoint: Url,
    pub request_timeout: Option<Duration>,
    pub stale_policy: StalePolicy,
    pub log_file: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidEndpoint(String, url::ParseError),
    InvalidTimeout(String),
    InvalidFlag(&'static str, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEndpoint(value, err) => {
                write!(f, "PREDICT_ENDPOINT {value:?} is not a valid URL: {err}")
            }
            Self::InvalidTimeout(value) => {
                write!(f, "REQUEST_TIMEOUT {value:?} is not a number of seconds")
            }
            Self::InvalidFlag(key, value) => {
                write!(f, "{key} {value:?} must be \"true\" or \"false\"")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let endpoint = match lookup("PREDICT_ENDPOINT") {
            Some(value) => {
                Url::parse(&value).map_err(|err| ConfigError::InvalidEndpoint(value, err))?
            }
            None => Url::parse(DEFAULT_ENDPOINT)
                .map_err(|err| ConfigError::InvalidEndpoint(DEFAULT_ENDPOINT.into(), err))?,
        };

        let request_timeout = lookup("REQUEST_TIMEOUT")
            .map(|value| {
                value
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|_| ConfigError::InvalidTimeout(value))
            })
            .transpose()?;

        let stale_policy = match lookup("DISCARD_STALE_RESPONSES").as_deref() {
            None | Some("true") => StalePolicy::LatestIssued,
            Some("false") => StalePolicy::LastResolved,
            Some(value) => {
                return Err(ConfigError::InvalidFlag("DISCARD_STALE_RESPONSES", value.into()));
            }
        };

        let log_file = lookup("LOG_FILE").unwrap_or_else(|| DEFAULT_LOG_FILE.into());

        Ok(Self { endpoint, request_timeout, stale_policy, log_file })
    }
}
