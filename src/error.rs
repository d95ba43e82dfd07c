use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClasspilotError {
    #[error("Browser not running. Start Chrome with --remote-debugging-port and run 'classpilot connect <port>'.")]
    BrowserNotRunning,

    #[error("CDP connection failed: {0}")]
    CdpConnectionFailed(String),

    #[error("No course tab found. Open a lesson page first ('classpilot open <url>').")]
    CourseTabNotFound,

    #[error("No course item at position {0}")]
    ItemNotFound(usize),

    #[error("JavaScript execution failed: {0}")]
    JavaScriptError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ClasspilotError>;
