/// Application-wide constants to avoid magic values throughout the codebase.
///
/// Delimiters, result codes and default values shared by the prober,
/// collator and notifier live here so the on-disk formats stay in one place.

/// Field delimiters of the line formats
pub mod delimiters {
    /// Separates url, record id and record type in an input line
    pub const INPUT: &str = "_|_";
    /// Separates the fields of a probe result line
    pub const RESULT: &str = "_@_";
    /// Separates the fields of a mailing directory line
    pub const DIRECTORY: char = '|';
    /// Separates recipients inside a mailing directory line
    pub const RECIPIENTS: char = ',';
}

/// Result codes written into probe result lines.
///
/// The 6xx values are a local convention for classified transport failures
/// and never collide with real HTTP statuses.
pub mod result_codes {
    /// Host could not be resolved or reached
    pub const UNKNOWN_HOSTNAME: u16 = 603;
    /// Response did not arrive within the timeout
    pub const READ_TIMEOUT: u16 = 605;
    /// URL scheme has no HTTP adapter
    pub const UNSUPPORTED_PROTOCOL: u16 = 607;
    /// Transport failure matching no known pattern
    pub const UNKNOWN_EXCEPTION: u16 = 608;
    /// URL could not be parsed
    pub const ILL_FORMED_URL: u16 = 609;
    /// Connection establishment timed out
    pub const CONNECTION_FAILED: u16 = 610;
}

/// HTTP status code constants
pub mod http_status {
    pub const MOVED_PERMANENTLY: u16 = 301;
    pub const FOUND: u16 = 302;
    pub const BAD_REQUEST: u16 = 400;
    pub const UNAUTHORIZED: u16 = 401;
    pub const FORBIDDEN: u16 = 403;
    pub const NOT_FOUND: u16 = 404;
    pub const GONE: u16 = 410;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
    pub const NOT_IMPLEMENTED: u16 = 501;

    /// Statuses above this value are reported as failures
    pub const ERROR_THRESHOLD: u16 = 399;
}

/// Default configuration values
pub mod defaults {
    /// Default number of concurrent workers
    pub const PROCESS_COUNT: usize = 6;
    /// Default per-request timeout in seconds
    pub const TIMER_SECONDS: u64 = 10;
    /// Host of the local persistent-identifier resolver
    pub const REDIRECTOR_HOST: &str = "pid.emory.edu";
    /// Timeout for each step of an SMTP conversation in seconds
    pub const SMTP_TIMEOUT_SECONDS: u64 = 10;
    /// Port used when `smtp_server` carries no explicit port
    pub const SMTP_PORT: u16 = 25;
    /// Upper bound on the worker count
    pub const MAX_PROCESS_COUNT: usize = 1000;
}

/// Work file naming inside the temp directory
pub mod work_files {
    /// Prefix of worker input files
    pub const BATCH_PREFIX: &str = "batch_";
    /// Prefix of worker output files
    pub const RESULT_PREFIX: &str = "result_";
}

/// Report formatting
pub mod report {
    /// Protocol marker leading every probe result line
    pub const PROTOCOL: &str = "HTTP/1.1";
    /// Tag placed between target and record id in a report body
    pub const RECORD_ID_TAG: &str = "mms_id:";
    /// Program name used in mail subjects
    pub const SUBJECT_TAG: &str = "urlchecker";
}
