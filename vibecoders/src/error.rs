//! Errors

use std::fmt;
use std::io;

/// The main error type of the library
#[derive(Debug)]
pub enum Error {
    /// An error related to performing a HTTP request
    Http(reqwest::Error),
    /// The backend answered with a non-success status
    Backend {
        /// HTTP status code of the response
        status: u16,
        /// Message from the response body, or a generic fallback
        message: String,
    },
    /// Client-side validation rejected the input before any request was made
    Validation(String),
    /// The action requires a signed-in viewer
    AuthRequired,
    /// An attempt to parse a string that was not a valid URL
    Url(url::ParseError),
    /// An I/O error
    Io(io::Error),
    /// User home directory could not be determined
    HomeNotFound,
    /// An error related to maintaining the cookie store
    CookieStore,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(err) => write!(f, "http error: {}", err),
            Error::Backend { status, message } => write!(f, "{} (status {})", message, status),
            Error::Validation(message) => write!(f, "{}", message),
            Error::AuthRequired => write!(f, "you must be logged in to do that"),
            Error::Url(err) => write!(f, "invalid url: {}", err),
            Error::Io(err) => write!(f, "io error: {}", err),
            Error::HomeNotFound => write!(f, "unable to determine home directory"),
            Error::CookieStore => write!(f, "cookie store error"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(err) => Some(err),
            Error::Url(err) => Some(err),
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(error: url::ParseError) -> Self {
        Error::Url(error)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}
