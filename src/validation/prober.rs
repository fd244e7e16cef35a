//! Per-batch URL probing
//!
//! A [`Prober`] walks one work batch in order, skipping malformed lines,
//! excluded URLs and adjacent duplicates, and emits a [`ProbeResult`] for
//! every URL that is unreachable or answers with an error status.

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use crate::core::constants::http_status;
use crate::core::error::Result;
use crate::core::types::{ProbeResult, UrlRecord};
use crate::validation::exclusion::ExclusionSet;
use crate::validation::probe::HttpProbe;

/// Redirect targets of the campus proxy carry the real URL in `url=`
static PROXIED_TARGET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\?url=(.*)").expect("Failed to compile proxy target pattern"));

/// Counters for one batch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub lines: usize,
    pub malformed: usize,
    pub excluded: usize,
    pub duplicates: usize,
    pub probed: usize,
    pub emitted: usize,
}

impl BatchStats {
    pub fn merge(&mut self, other: &BatchStats) {
        self.lines += other.lines;
        self.malformed += other.malformed;
        self.excluded += other.excluded;
        self.duplicates += other.duplicates;
        self.probed += other.probed;
        self.emitted += other.emitted;
    }
}

pub struct Prober {
    http: Arc<dyn HttpProbe>,
    exclusion: Arc<ExclusionSet>,
    redirector: Regex,
}

impl Prober {
    /// `redirector_host` names the identifier resolver whose URLs get a
    /// preliminary probe over https.
    pub fn new(
        http: Arc<dyn HttpProbe>,
        exclusion: Arc<ExclusionSet>,
        redirector_host: &str,
    ) -> Result<Self> {
        let redirector = Regex::new(&format!(
            r"^(http|https)://{}/(.*)$",
            regex::escape(redirector_host)
        ))?;

        Ok(Self {
            http,
            exclusion,
            redirector,
        })
    }

    /// Probe every line of a batch sequentially, handing each result to
    /// `emit` as soon as it is known.
    pub async fn probe_batch<F>(&self, lines: &[String], mut emit: F) -> BatchStats
    where
        F: FnMut(ProbeResult),
    {
        let mut stats = BatchStats::default();
        let mut previous_url: Option<&str> = None;

        for line in lines {
            stats.lines += 1;

            let record = match UrlRecord::parse_line(line) {
                Ok(record) => record,
                Err(err) => {
                    warn!("invalid input line '{line}': {err}");
                    stats.malformed += 1;
                    continue;
                }
            };

            if self.exclusion.is_excluded(&record.url) {
                debug!("excluded {}", record.url);
                stats.excluded += 1;
                continue;
            }

            if previous_url == Some(record.url.as_str()) {
                debug!("skipping repeated {}", record.url);
                stats.duplicates += 1;
                continue;
            }
            previous_url = Some(line_url(line));

            stats.probed += 1;
            if let Some(code) = self.probe_url(&record.url).await {
                debug!("{} -> {code}", record.url);
                stats.emitted += 1;
                emit(ProbeResult::new(&record, code, line));
            }
        }

        stats
    }

    /// Probe a single URL. Returns the result code to report, or `None` when
    /// the URL is reachable.
    pub async fn probe_url(&self, url: &str) -> Option<u16> {
        let mut target = url.to_string();

        if let Some(resolver_url) = self.redirector_url(url) {
            match self.http.get(&resolver_url).await {
                Err(failure) => {
                    debug!("{resolver_url}: {failure}");
                    return Some(failure.code());
                }
                Ok(response)
                    if matches!(
                        response.status,
                        http_status::MOVED_PERMANENTLY | http_status::FOUND
                    ) =>
                {
                    if let Some(inner) = response.location.as_deref().and_then(proxied_target) {
                        debug!("{url} resolves through proxy to {inner}");
                        target = inner;
                    }
                }
                Ok(response) if response.status > http_status::ERROR_THRESHOLD => {
                    return Some(response.status);
                }
                Ok(_) => {}
            }
        }

        match self.http.get(&target).await {
            Err(failure) => {
                debug!("{target}: {failure}");
                Some(failure.code())
            }
            Ok(response) if response.status > http_status::ERROR_THRESHOLD => {
                Some(response.status)
            }
            // 2xx and followed-redirect statuses count as reachable
            Ok(_) => None,
        }
    }

    /// https form of a resolver URL, or `None` for any other host.
    fn redirector_url(&self, url: &str) -> Option<String> {
        let caps = self.redirector.captures(url)?;
        if &caps[1] == "https" {
            return Some(url.to_string());
        }
        Some(format!("https{}", &url[caps[1].len()..]))
    }
}

/// URL field of a line that already parsed, borrowed from the line itself.
fn line_url(line: &str) -> &str {
    line.split(crate::core::constants::delimiters::INPUT)
        .next()
        .unwrap_or(line)
}

/// Inner URL of a proxy-wrapped `Location`, if it carries one.
pub fn proxied_target(location: &str) -> Option<String> {
    PROXIED_TARGET
        .captures(location)
        .map(|caps| caps[1].to_string())
}
