//! Collation of result streams into per-bucket, per-record-type reports

use log::{debug, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::core::constants::{http_status, result_codes};
use crate::core::types::{ProbeResult, RecordType};

/// Report category of a result code.
///
/// Declaration order is the order reports are sent in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    NotFound,
    UnknownHostname,
    UnsupportedProtocol,
    IllFormedUrl,
    ConnectionFailed,
    BadRequest,
    AuthRequired,
    Forbidden,
    InternalError,
    TimedOut,
    UnknownException,
}

impl Bucket {
    pub const ALL: [Bucket; 11] = [
        Bucket::NotFound,
        Bucket::UnknownHostname,
        Bucket::UnsupportedProtocol,
        Bucket::IllFormedUrl,
        Bucket::ConnectionFailed,
        Bucket::BadRequest,
        Bucket::AuthRequired,
        Bucket::Forbidden,
        Bucket::InternalError,
        Bucket::TimedOut,
        Bucket::UnknownException,
    ];

    /// Route a result code; `None` for codes no report covers.
    pub fn from_code(code: u16) -> Option<Self> {
        let bucket = match code {
            result_codes::UNKNOWN_HOSTNAME => Bucket::UnknownHostname,
            result_codes::READ_TIMEOUT => Bucket::TimedOut,
            result_codes::UNSUPPORTED_PROTOCOL | http_status::NOT_IMPLEMENTED => {
                Bucket::UnsupportedProtocol
            }
            result_codes::UNKNOWN_EXCEPTION => Bucket::UnknownException,
            result_codes::ILL_FORMED_URL => Bucket::IllFormedUrl,
            result_codes::CONNECTION_FAILED => Bucket::ConnectionFailed,
            http_status::BAD_REQUEST => Bucket::BadRequest,
            http_status::UNAUTHORIZED => Bucket::AuthRequired,
            http_status::FORBIDDEN => Bucket::Forbidden,
            http_status::NOT_FOUND | http_status::GONE => Bucket::NotFound,
            http_status::INTERNAL_SERVER_ERROR => Bucket::InternalError,
            _ => return None,
        };
        Some(bucket)
    }

    pub fn name(self) -> &'static str {
        match self {
            Bucket::NotFound => "not-found",
            Bucket::UnknownHostname => "unknown-hostname",
            Bucket::UnsupportedProtocol => "unsupported-protocol",
            Bucket::IllFormedUrl => "ill-formed-url",
            Bucket::ConnectionFailed => "connection-failed",
            Bucket::BadRequest => "bad-request",
            Bucket::AuthRequired => "auth-required",
            Bucket::Forbidden => "forbidden",
            Bucket::InternalError => "internal-error",
            Bucket::TimedOut => "timed-out",
            Bucket::UnknownException => "unknown-exception",
        }
    }

    /// Mail subject suffix
    pub fn subject(self) -> &'static str {
        match self {
            Bucket::NotFound => "URL not found (nicht gefunden)",
            Bucket::UnknownHostname => "unknown hostname (unbekannter gastgeber)",
            Bucket::UnsupportedProtocol => {
                "unsupported HTTP protocol (nicht unterstütztes Protokoll)"
            }
            Bucket::IllFormedUrl => "ill-formed URL",
            Bucket::ConnectionFailed => "connection failed",
            Bucket::BadRequest => "bad HTTP request",
            Bucket::AuthRequired => "permission required",
            Bucket::Forbidden => "access forbidden",
            Bucket::InternalError => "system error",
            Bucket::TimedOut => "connection timed out",
            Bucket::UnknownException => "unknown exception",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Report text per `(bucket, record type)` cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accumulator {
    cells: BTreeMap<(Bucket, RecordType), String>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one report line (a newline is added).
    pub fn append(&mut self, bucket: Bucket, record_type: RecordType, line: &str) {
        let cell = self.cells.entry((bucket, record_type)).or_default();
        cell.push_str(line);
        cell.push('\n');
    }

    pub fn cell(&self, bucket: Bucket, record_type: RecordType) -> Option<&str> {
        self.cells.get(&(bucket, record_type)).map(String::as_str)
    }

    /// Non-empty cells in send order
    pub fn cells(&self) -> impl Iterator<Item = (Bucket, RecordType, &str)> {
        self.cells
            .iter()
            .filter(|(_, text)| !text.is_empty())
            .map(|(&(bucket, record_type), text)| (bucket, record_type, text.as_str()))
    }

    /// Number of non-empty cells
    pub fn len(&self) -> usize {
        self.cells().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollationStats {
    pub lines: usize,
    pub routed: usize,
    pub malformed: usize,
    pub dropped: usize,
}

#[derive(Debug, Default)]
pub struct Collator {
    accumulator: Accumulator,
    stats: CollationStats,
}

impl Collator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route one result line. Returns the bucket it landed in.
    pub fn collate_line(&mut self, line: &str) -> Option<Bucket> {
        if line.trim().is_empty() {
            return None;
        }
        self.stats.lines += 1;

        let result = match ProbeResult::parse_line(line) {
            Ok(result) => result,
            Err(err) => {
                warn!("skipping result line '{line}': {err}");
                self.stats.malformed += 1;
                return None;
            }
        };

        let Some(bucket) = Bucket::from_code(result.result_code) else {
            debug!("no report for code {} ({})", result.result_code, result.target_url);
            self.stats.dropped += 1;
            return None;
        };

        self.accumulator
            .append(bucket, result.record_type, &result.report_line());
        self.stats.routed += 1;
        Some(bucket)
    }

    pub fn collate_stream<'a, I>(&mut self, lines: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for line in lines {
            self.collate_line(line);
        }
    }

    /// Collate persisted result files in the order given. Unreadable files
    /// are logged and skipped.
    pub fn collate_result_files<P: AsRef<Path>>(&mut self, paths: &[P]) {
        for path in paths {
            let path = path.as_ref();
            match fs::read_to_string(path) {
                Ok(content) => self.collate_stream(content.lines()),
                Err(err) => warn!("couldn't read {}: {err}", path.display()),
            }
        }
    }

    pub fn stats(&self) -> CollationStats {
        self.stats
    }

    pub fn finish(self) -> Accumulator {
        self.accumulator
    }
}
