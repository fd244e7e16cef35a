//! HTTP probe seam
//!
//! The prober only needs "GET this URL without following redirects". That
//! operation sits behind [`HttpProbe`] so the pipeline can run against a
//! stub network; [`ReqwestProbe`] is the real implementation.

use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::config::Config;
use crate::core::error::Result;
use crate::validation::classifier::classify;

/// Status line and redirect target of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub location: Option<String>,
}

impl ProbeResponse {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            location: None,
        }
    }

    pub fn redirect(status: u16, location: impl Into<String>) -> Self {
        Self {
            status,
            location: Some(location.into()),
        }
    }
}

/// A request that produced no response at all
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub message: String,
}

impl TransportFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Synthetic result code for this failure
    pub fn code(&self) -> u16 {
        classify(&self.message)
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransportFailure {}

#[async_trait]
pub trait HttpProbe: Send + Sync {
    /// Issue a single GET with redirects disabled.
    async fn get(&self, url: &str) -> std::result::Result<ProbeResponse, TransportFailure>;
}

#[derive(Debug, Clone)]
pub struct ReqwestProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestProbe {
    /// Build a client where the connect phase and every read are each bounded
    /// by `timeout`, the (connect, read) pair of a classic HTTP client.
    pub fn new(timeout: Duration, user_agent: Option<&str>) -> Result<Self> {
        let user_agent = user_agent.unwrap_or(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));

        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .redirect(Policy::none())
            .user_agent(user_agent)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;

        Ok(Self { client, timeout })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.timeout_duration(), config.user_agent.as_deref())
    }
}

#[async_trait]
impl HttpProbe for ReqwestProbe {
    async fn get(&self, url: &str) -> std::result::Result<ProbeResponse, TransportFailure> {
        let parsed = check_url(url)?;

        match self.client.get(parsed.clone()).send().await {
            Ok(response) => Ok(ProbeResponse {
                status: response.status().as_u16(),
                location: response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string),
            }),
            Err(err) => Err(TransportFailure::new(describe_transport_error(
                &parsed,
                &err,
                self.timeout,
            ))),
        }
    }
}

/// Reject URLs no HTTP request can be built for, phrased for the classifier.
pub fn check_url(url: &str) -> std::result::Result<Url, TransportFailure> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(parsed),
        Ok(_) => Err(TransportFailure::new(format!(
            "No connection adapters were found for '{url}'"
        ))),
        Err(url::ParseError::RelativeUrlWithoutBase) => Err(TransportFailure::new(format!(
            "Invalid URL '{url}': No schema supplied"
        ))),
        Err(err) => Err(TransportFailure::new(format!("Invalid URL '{url}': {err}"))),
    }
}

/// Describe a reqwest failure so that the classifier can recognise it.
pub fn describe_transport_error(url: &Url, err: &reqwest::Error, timeout: Duration) -> String {
    let host = url.host_str().unwrap_or_default();
    let port = url.port_or_known_default().unwrap_or_default();
    let secs = timeout.as_secs();

    if err.is_connect() && err.is_timeout() {
        format!("Connection to {host}:{port} timed out (connect timeout={secs}s)")
    } else if err.is_timeout() {
        format!("Read timed out from {host}:{port} (read timeout={secs}s)")
    } else if err.is_connect() {
        format!(
            "Failed to establish a new connection to {host}:{port}: {}",
            root_cause(err)
        )
    } else {
        error_chain(err)
    }
}

fn root_cause(err: &(dyn std::error::Error + 'static)) -> String {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(source) = current {
        message.push_str(": ");
        message.push_str(&source.to_string());
        current = source.source();
    }
    message
}
