use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// Missing or empty credential, unusable configuration value.
    Config(String),
    /// Rejected before any request was sent.
    Validation(String),
    /// Network failure or timeout.
    Http(reqwest::Error),
    /// Non-2xx HTTP response.
    Status { status: u16, path: String },
    /// HTTP 200 whose envelope carries `statusCode != 100`.
    Api { code: i64, message: String },
    Parse(String),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "configuration error: {msg}"),
            Error::Validation(msg) => write!(f, "{msg}"),
            Error::Http(e) if e.is_timeout() => write!(f, "request timed out: {e}"),
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Status { status, path } => write!(f, "HTTP {status} from {path}"),
            Error::Api { code, message } => write!(f, "{message} (statusCode {code})"),
            Error::Parse(msg) => write!(f, "parse error: {msg}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
