use std::fmt;
use std::str::FromStr;

use crate::core::constants::{delimiters, report, result_codes};

/// Classification of a catalog record, used as the routing key for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordType {
    Bibliographic,
    Portfolio,
}

impl RecordType {
    /// Numeric code used in input lines and the mailing directory.
    pub fn code(self) -> u8 {
        match self {
            RecordType::Bibliographic => 1,
            RecordType::Portfolio => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(RecordType::Bibliographic),
            2 => Some(RecordType::Portfolio),
            _ => None,
        }
    }
}

impl FromStr for RecordType {
    type Err = RecordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(RecordType::from_code)
            .ok_or_else(|| RecordParseError::InvalidRecordType(s.to_string()))
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors that can occur when parsing an input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordParseError {
    /// Line does not split into url, record id and record type
    WrongFieldCount(usize),
    /// URL field is empty
    MissingUrl,
    /// Record type is not 1 or 2
    InvalidRecordType(String),
}

impl fmt::Display for RecordParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongFieldCount(n) => write!(f, "expected 3 fields, found {n}"),
            Self::MissingUrl => write!(f, "URL is required and cannot be empty"),
            Self::InvalidRecordType(t) => write!(f, "invalid record type '{t}'"),
        }
    }
}

impl std::error::Error for RecordParseError {}

/// One line of the URL list: `URL_|_record_id_|_record_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    pub url: String,
    pub record_id: String,
    pub record_type: RecordType,
}

impl UrlRecord {
    /// Parse an input line. A trailing line terminator is ignored.
    ///
    /// # Examples
    /// ```
    /// use urlchecker::core::types::{RecordType, UrlRecord};
    ///
    /// let record = UrlRecord::parse_line("http://example.org/x_|_123_|_1").unwrap();
    /// assert_eq!(record.url, "http://example.org/x");
    /// assert_eq!(record.record_id, "123");
    /// assert_eq!(record.record_type, RecordType::Bibliographic);
    /// ```
    pub fn parse_line(line: &str) -> Result<Self, RecordParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = line.split(delimiters::INPUT).collect();
        let [url, record_id, record_type] = fields.as_slice() else {
            return Err(RecordParseError::WrongFieldCount(fields.len()));
        };
        if url.is_empty() {
            return Err(RecordParseError::MissingUrl);
        }

        Ok(Self {
            url: (*url).to_string(),
            record_id: (*record_id).to_string(),
            record_type: record_type.parse()?,
        })
    }

    /// Report line for this record: `<url> mms_id: <record_id>`.
    pub fn report_line(&self) -> String {
        format!("{} {} {}", self.url, report::RECORD_ID_TAG, self.record_id)
    }
}

/// Short description written into a result line for a given code.
///
/// Real HTTP statuses carry no description.
pub fn result_description(code: u16) -> &'static str {
    match code {
        result_codes::UNKNOWN_HOSTNAME => "unknown hostname",
        result_codes::READ_TIMEOUT => "connection timed out",
        result_codes::UNSUPPORTED_PROTOCOL => "unsupported HTTP protocol",
        result_codes::UNKNOWN_EXCEPTION => "Unknown exception",
        result_codes::ILL_FORMED_URL => "Ill-formed URL",
        result_codes::CONNECTION_FAILED => "Connection to server failed",
        _ => "",
    }
}

/// Errors that can occur when parsing a probe result line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultLineError {
    /// Fewer than five `_@_` separated fields
    MissingFields(usize),
    /// Code field is not a number
    InvalidCode(String),
    /// Trailing input line is malformed
    Record(RecordParseError),
}

impl fmt::Display for ResultLineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFields(n) => write!(f, "expected 5 fields, found {n}"),
            Self::InvalidCode(c) => write!(f, "invalid result code '{c}'"),
            Self::Record(err) => write!(f, "invalid input line: {err}"),
        }
    }
}

impl std::error::Error for ResultLineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Record(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RecordParseError> for ResultLineError {
    fn from(err: RecordParseError) -> Self {
        Self::Record(err)
    }
}

/// Outcome of probing one URL that is worth reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub record_id: String,
    pub record_type: RecordType,
    pub target_url: String,
    pub result_code: u16,
    /// The input line exactly as read, without its terminator
    pub raw_line: String,
}

impl ProbeResult {
    pub fn new(record: &UrlRecord, result_code: u16, raw_line: &str) -> Self {
        Self {
            record_id: record.record_id.clone(),
            record_type: record.record_type,
            target_url: record.url.clone(),
            result_code,
            raw_line: raw_line.trim_end_matches(['\r', '\n']).to_string(),
        }
    }

    /// Serialize as `HTTP/1.1_@_<code>_@_<description>_@__@_<input line>`.
    pub fn to_line(&self) -> String {
        let sep = delimiters::RESULT;
        format!(
            "{}{sep}{}{sep}{}{sep}{sep}{}",
            report::PROTOCOL,
            self.result_code,
            result_description(self.result_code),
            self.raw_line
        )
    }

    /// Parse a line produced by [`ProbeResult::to_line`].
    ///
    /// Only the code and the trailing input line are significant.
    pub fn parse_line(line: &str) -> Result<Self, ResultLineError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = line.splitn(5, delimiters::RESULT).collect();
        if fields.len() < 5 {
            return Err(ResultLineError::MissingFields(fields.len()));
        }
        let result_code = fields[1]
            .trim()
            .parse::<u16>()
            .map_err(|_| ResultLineError::InvalidCode(fields[1].to_string()))?;
        let record = UrlRecord::parse_line(fields[4])?;

        Ok(Self::new(&record, result_code, fields[4]))
    }

    /// Report line for this result: `<target> mms_id: <record_id>`.
    pub fn report_line(&self) -> String {
        format!(
            "{} {} {}",
            self.target_url,
            report::RECORD_ID_TAG,
            self.record_id
        )
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.result_code, self.target_url)
    }
}
