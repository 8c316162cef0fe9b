use std::fmt;
use std::io;

use vibecoders::url;

#[derive(Debug)]
pub enum Error {
    Api(vibecoders::Error),
    Cancelled,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Api(err) => err.fmt(f),
            Error::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl From<vibecoders::Error> for Error {
    fn from(err: vibecoders::Error) -> Self {
        Error::Api(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Api(vibecoders::Error::Io(err))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Api(vibecoders::Error::Url(err))
    }
}
