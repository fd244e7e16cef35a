//! Configuration management
//!
//! This module loads the `key=value` configuration file that drives a run.
//! Every line of the form `key=value` is considered; the first `=` separates
//! key from value, unknown keys are ignored and later lines override earlier
//! ones.

use log::{debug, error};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::core::constants::defaults;
use crate::core::error::{CheckerError, Result};

static KEY_VALUE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)=(.*)$").expect("Failed to compile key=value pattern"));

/// Keys that must be present for a run to start
pub const REQUIRED_KEYS: [&str; 5] = [
    "temp_directory",
    "mailing_list",
    "in_file",
    "smtp_server",
    "from_mail",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of concurrent workers
    pub process_count: Option<usize>,

    /// Per-request timeout in seconds
    pub timer: Option<u64>,

    /// File the URL list read from stdin is persisted to
    pub in_file: Option<String>,

    /// Directory for batch_NNNN and result_NNNN work files
    pub temp_directory: Option<String>,

    /// File of (partial) URLs that must not be probed
    pub exclude: Option<String>,

    /// Record-type directory: `type|name|recipients`
    pub mailing_list: Option<String>,

    /// Outbound mail server, `host` or `host:port`
    pub smtp_server: Option<String>,

    /// Sender address of the reports
    pub from_mail: Option<String>,

    /// Host of the local identifier resolver that gets a preliminary probe
    pub redirector_host: Option<String>,

    /// Overall deadline for the worker pool in seconds
    pub worker_deadline: Option<u64>,

    /// Custom User-Agent header
    pub user_agent: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            process_count: Some(defaults::PROCESS_COUNT),
            timer: Some(defaults::TIMER_SECONDS),
            in_file: None,
            temp_directory: None,
            exclude: None,
            mailing_list: None,
            smtp_server: None,
            from_mail: None,
            redirector_host: Some(defaults::REDIRECTOR_HOST.to_string()),
            worker_deadline: None, // Wait for every worker by default
            user_agent: None,
        }
    }
}

impl Config {
    /// Load configuration from file and validate it
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CheckerError::Config(format!(
                "couldn't open config. file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config = Self::parse_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse `key=value` lines on top of the defaults without validating.
    pub fn parse_str(content: &str) -> Result<Self> {
        let mut config = Self::default();

        for line in content.lines() {
            let Some(caps) = KEY_VALUE_PATTERN.captures(line) else {
                continue;
            };
            let key = caps[1].trim();
            let value = caps[2].trim();
            config.apply(key, value)?;
        }

        Ok(config)
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let text = || (!value.is_empty()).then(|| value.to_string());

        match key {
            "process_count" => self.process_count = Some(parse_number(key, value)?),
            "timer" => self.timer = Some(parse_number(key, value)?),
            "in_file" => self.in_file = text(),
            "temp_directory" => self.temp_directory = text(),
            "exclude" => self.exclude = text(),
            "mailing_list" => self.mailing_list = text(),
            "smtp_server" => self.smtp_server = text(),
            "from_mail" => self.from_mail = text(),
            "redirector_host" => self.redirector_host = text(),
            "worker_deadline" => {
                self.worker_deadline = if value.is_empty() {
                    None
                } else {
                    Some(parse_number(key, value)?)
                }
            }
            "user_agent" => self.user_agent = text(),
            other => debug!("Ignoring unknown configuration key '{other}'"),
        }
        Ok(())
    }

    /// Names of required keys that have no value
    pub fn missing_keys(&self) -> Vec<&'static str> {
        REQUIRED_KEYS
            .iter()
            .zip([
                &self.temp_directory,
                &self.mailing_list,
                &self.in_file,
                &self.smtp_server,
                &self.from_mail,
            ])
            .filter(|(_, value)| value.is_none())
            .map(|(key, _)| *key)
            .collect()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_keys();
        if !missing.is_empty() {
            for key in &missing {
                error!("{key} not specified");
            }
            return Err(CheckerError::Config(format!(
                "missing required entries: {}",
                missing.join(", ")
            )));
        }

        let process_count = self.process_count.unwrap_or(defaults::PROCESS_COUNT);
        if process_count == 0 {
            return Err(CheckerError::Config(
                "process count must not be zero".to_string(),
            ));
        }
        if process_count > defaults::MAX_PROCESS_COUNT {
            return Err(CheckerError::Config(format!(
                "process count of {process_count} is extremely high. Expected at most {}.",
                defaults::MAX_PROCESS_COUNT
            )));
        }

        if self.timer == Some(0) {
            return Err(CheckerError::Config(
                "timer cannot be 0. Expected a positive number of seconds.".to_string(),
            ));
        }

        if self.worker_deadline == Some(0) {
            return Err(CheckerError::Config(
                "worker_deadline cannot be 0. Leave it out to wait for every worker.".to_string(),
            ));
        }

        Ok(())
    }

    /// Number of workers requested
    pub fn process_count(&self) -> usize {
        self.process_count.unwrap_or(defaults::PROCESS_COUNT)
    }

    /// Get per-request timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timer.unwrap_or(defaults::TIMER_SECONDS))
    }

    /// Get the worker pool deadline as Duration, if any
    pub fn worker_deadline_duration(&self) -> Option<Duration> {
        self.worker_deadline.map(Duration::from_secs)
    }

    pub fn redirector_host(&self) -> &str {
        self.redirector_host
            .as_deref()
            .unwrap_or(defaults::REDIRECTOR_HOST)
    }

    pub fn in_file(&self) -> Result<&str> {
        required("in_file", &self.in_file)
    }

    pub fn temp_directory(&self) -> Result<&str> {
        required("temp_directory", &self.temp_directory)
    }

    pub fn mailing_list(&self) -> Result<&str> {
        required("mailing_list", &self.mailing_list)
    }

    pub fn smtp_server(&self) -> Result<&str> {
        required("smtp_server", &self.smtp_server)
    }

    pub fn from_mail(&self) -> Result<&str> {
        required("from_mail", &self.from_mail)
    }
}

fn required<'a>(key: &str, value: &'a Option<String>) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| CheckerError::Config(format!("{key} not specified")))
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse::<T>().map_err(|_| {
        CheckerError::Config(format!(
            "'{value}' is not a valid value for {key}. Expected a non-negative integer."
        ))
    })
}
