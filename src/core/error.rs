use std::fmt;

/// Error types for urlchecker operations
#[derive(Debug)]
pub enum CheckerError {
    /// IO error (file operations, etc.)
    Io(std::io::Error),

    /// Configuration error
    Config(String),

    /// HTTP client error
    Http(reqwest::Error),

    /// Regex compilation error
    Regex(regex::Error),

    /// File not found error
    FileNotFound(String),

    /// Invalid argument error
    InvalidArgument(String),

    /// Nothing was supplied on standard input
    EmptyInput,

    /// Mail transport error
    Mail(String),

    /// Worker pool failure (deadline expired, worker panicked)
    WorkerPool(String),
}

impl fmt::Display for CheckerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckerError::Io(err) => write!(f, "IO error: {err}"),
            CheckerError::Config(msg) => write!(f, "Configuration error: {msg}"),
            CheckerError::Http(err) => write!(f, "HTTP error: {err}"),
            CheckerError::Regex(err) => write!(f, "Regex error: {err}"),
            CheckerError::FileNotFound(path) => write!(f, "File not found: {path}"),
            CheckerError::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
            CheckerError::EmptyInput => write!(f, "Input error: input file is empty"),
            CheckerError::Mail(msg) => write!(f, "Mail error: {msg}"),
            CheckerError::WorkerPool(msg) => write!(f, "Worker pool error: {msg}"),
        }
    }
}

impl std::error::Error for CheckerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckerError::Io(err) => Some(err),
            CheckerError::Http(err) => Some(err),
            CheckerError::Regex(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CheckerError {
    fn from(err: std::io::Error) -> Self {
        CheckerError::Io(err)
    }
}

impl From<reqwest::Error> for CheckerError {
    fn from(err: reqwest::Error) -> Self {
        CheckerError::Http(err)
    }
}

impl From<regex::Error> for CheckerError {
    fn from(err: regex::Error) -> Self {
        CheckerError::Regex(err)
    }
}

/// Type alias for Results using CheckerError
pub type Result<T> = std::result::Result<T, CheckerError>;
